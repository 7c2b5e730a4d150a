//! Biomarker definitions.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// A measurement unit accepted for a biomarker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitConversion {
    /// Unit symbol as printed (e.g. "mmol/L")
    pub unit: String,

    /// Factor converting the canonical unit into this unit.
    ///
    /// A value printed in this unit is divided by the factor to obtain the
    /// canonical value.
    #[serde(default = "default_conversion")]
    pub conversion: f64,

    /// Alternative spellings of the unit
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
}

fn default_conversion() -> f64 {
    1.0
}

impl UnitConversion {
    /// Create a unit with the given conversion factor.
    pub fn new(unit: impl Into<String>, conversion: f64) -> Self {
        Self {
            unit: unit.into(),
            conversion,
            aliases: Vec::new(),
        }
    }

    /// Add an alternative spelling.
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    /// The unit symbol followed by its aliases.
    pub fn spellings(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.unit.as_str()).chain(self.aliases.iter().map(String::as_str))
    }
}

/// A clinical biomarker with its canonical unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Biomarker {
    /// Stable identifier (e.g. "glucose")
    pub id: String,

    /// Display name
    pub name: String,

    /// Canonical unit all measurements are normalized to
    pub unit: String,

    /// Alternative names, abbreviations and translations
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,

    /// Accepted units besides the canonical one
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub units: Vec<UnitConversion>,
}

impl Biomarker {
    /// Create a new biomarker.
    pub fn new(id: impl Into<String>, name: impl Into<String>, unit: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            unit: unit.into(),
            aliases: Vec::new(),
            units: Vec::new(),
        }
    }

    /// Add an alternative name.
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    /// Add an accepted unit.
    pub fn with_unit(mut self, unit: UnitConversion) -> Self {
        self.units.push(unit);
        self
    }

    /// The display name followed by the aliases.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.name.as_str()).chain(self.aliases.iter().map(String::as_str))
    }

    /// All accepted units, canonical first (factor 1.0).
    pub fn accepted_units(&self) -> Vec<Cow<'_, UnitConversion>> {
        let mut units = Vec::with_capacity(self.units.len() + 1);
        if !self.units.iter().any(|u| u.unit == self.unit) {
            units.push(Cow::Owned(UnitConversion::new(self.unit.clone(), 1.0)));
        }
        units.extend(self.units.iter().map(Cow::Borrowed));
        units
    }
}
