//! Biomarker and unit dictionary.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;

use super::text::{normalize_name, normalize_unit, similarity};
use super::{BiomarkerMatch, BiomarkerMatcher, UnitMatch, UnitMatcher};
use crate::error::{Error, Result};
use crate::model::{Biomarker, UnitConversion};

/// Minimum length of a normalized name before it can match anything.
const MIN_NAME_CHARS: usize = 3;

/// Confidence of a unit found as a token inside longer text.
const TOKEN_UNIT_CONFIDENCE: f32 = 0.8;

/// In-memory dictionary of biomarkers, their names and accepted units.
///
/// Names are compared after diacritic folding and case folding; near misses
/// (OCR typos) match with a confidence derived from their edit distance.
#[derive(Debug, Clone)]
pub struct Dictionary {
    biomarkers: Vec<Arc<Biomarker>>,
    /// Normalized name -> biomarker index, in definition order
    names: Vec<(String, usize)>,
    /// Normalized unit spelling -> display symbol, deduplicated
    units: Vec<(String, String)>,
    min_similarity: f32,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DictionaryFile {
    List(Vec<Biomarker>),
    Wrapped { biomarkers: Vec<Biomarker> },
}

impl Dictionary {
    /// Build a dictionary from biomarker definitions.
    pub fn new(biomarkers: Vec<Biomarker>) -> Self {
        let biomarkers: Vec<Arc<Biomarker>> = biomarkers.into_iter().map(Arc::new).collect();

        let mut names = Vec::new();
        let mut units: Vec<(String, String)> = Vec::new();

        for (idx, biomarker) in biomarkers.iter().enumerate() {
            for name in biomarker.names() {
                let key = normalize_name(name);
                if !key.is_empty() {
                    names.push((key, idx));
                }
            }
            for unit in biomarker.accepted_units() {
                for spelling in unit.spellings() {
                    let key = normalize_unit(spelling);
                    if !key.is_empty() && !units.iter().any(|(k, _)| *k == key) {
                        units.push((key, unit.unit.clone()));
                    }
                }
            }
        }

        Self {
            biomarkers,
            names,
            units,
            min_similarity: 0.8,
        }
    }

    /// Parse a dictionary from JSON.
    ///
    /// Accepts either an array of biomarkers or an object with a
    /// `biomarkers` array.
    pub fn from_json(json: &str) -> Result<Self> {
        let file: DictionaryFile = serde_json::from_str(json)?;
        let biomarkers = match file {
            DictionaryFile::List(list) => list,
            DictionaryFile::Wrapped { biomarkers } => biomarkers,
        };
        validate(&biomarkers)?;
        Ok(Self::new(biomarkers))
    }

    /// Load a dictionary from a JSON file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = fs::read_to_string(path.as_ref())?;
        let dictionary = Self::from_json(&json)?;
        log::info!(
            "Loaded {} biomarkers from {}",
            dictionary.len(),
            path.as_ref().display()
        );
        Ok(dictionary)
    }

    /// The bundled dictionary of common blood panel biomarkers.
    pub fn builtin() -> Self {
        Self::new(builtin_biomarkers())
    }

    /// Set the minimum similarity for fuzzy name matches.
    pub fn with_min_similarity(mut self, min_similarity: f32) -> Self {
        self.min_similarity = min_similarity.clamp(0.0, 1.0);
        self
    }

    /// Number of biomarkers.
    pub fn len(&self) -> usize {
        self.biomarkers.len()
    }

    /// Check if the dictionary has no biomarkers.
    pub fn is_empty(&self) -> bool {
        self.biomarkers.is_empty()
    }

    /// Look up a biomarker by id.
    pub fn get(&self, id: &str) -> Option<&Arc<Biomarker>> {
        self.biomarkers.iter().find(|b| b.id == id)
    }

    /// Iterate over all biomarkers.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Biomarker>> {
        self.biomarkers.iter()
    }
}

impl Default for Dictionary {
    fn default() -> Self {
        Self::builtin()
    }
}

impl BiomarkerMatcher for Dictionary {
    fn search_biomarkers(&self, text: &str) -> Vec<BiomarkerMatch> {
        let query = normalize_name(text);
        if query.chars().count() < MIN_NAME_CHARS {
            return vec![];
        }

        let mut best: HashMap<usize, f32> = HashMap::new();
        for (name, idx) in &self.names {
            let confidence = if *name == query {
                1.0
            } else {
                similarity(&query, name)
            };
            if confidence >= self.min_similarity {
                let entry = best.entry(*idx).or_insert(0.0);
                if confidence > *entry {
                    *entry = confidence;
                }
            }
        }

        let mut matches: Vec<(usize, f32)> = best.into_iter().collect();
        // Definition order breaks ties so results are deterministic
        matches.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.0.cmp(&b.0))
        });

        matches
            .into_iter()
            .map(|(idx, confidence)| BiomarkerMatch {
                item: Arc::clone(&self.biomarkers[idx]),
                confidence,
            })
            .collect()
    }
}

impl UnitMatcher for Dictionary {
    fn search_units(&self, text: &str) -> Vec<UnitMatch> {
        let query = normalize_unit(text);
        if query.is_empty() {
            return vec![];
        }

        self.units
            .iter()
            .filter(|(key, _)| *key == query)
            .map(|(_, unit)| UnitMatch {
                unit: unit.clone(),
                conversion: 1.0,
                confidence: 1.0,
            })
            .collect()
    }

    fn parse_units(&self, text: &str, biomarker: &Biomarker) -> Option<UnitMatch> {
        let query = normalize_unit(text);
        if query.is_empty() {
            return None;
        }
        let mut tokens: Vec<String> = Vec::new();
        for token in text.split_whitespace().map(normalize_unit) {
            let unit = unit_after_number(&token);
            tokens.push(token);
            tokens.extend(unit);
        }

        let mut best: Option<UnitMatch> = None;
        for unit in biomarker.accepted_units() {
            let confidence = unit_confidence(&unit, &query, &tokens);
            if confidence > best.as_ref().map_or(0.0, |b| b.confidence) {
                best = Some(UnitMatch {
                    unit: unit.unit.clone(),
                    conversion: unit.conversion,
                    confidence,
                });
            }
        }
        best
    }
}

fn unit_confidence(unit: &UnitConversion, query: &str, tokens: &[String]) -> f32 {
    let mut confidence = 0.0f32;
    for spelling in unit.spellings() {
        let key = normalize_unit(spelling);
        if key.is_empty() {
            continue;
        }
        if key == query {
            return 1.0;
        }
        if tokens.len() > 1 && tokens.iter().any(|t| *t == key) {
            confidence = TOKEN_UNIT_CONFIDENCE;
        }
    }
    confidence
}

/// The unit printed right after a number in the same token (`120mg/dl`).
fn unit_after_number(token: &str) -> Option<String> {
    let rest = token.trim_start_matches(|c: char| {
        c.is_ascii_digit() || matches!(c, '.' | ',' | '<' | '>' | '+' | '-')
    });
    (rest.len() < token.len() && !rest.is_empty()).then(|| rest.to_string())
}

fn validate(biomarkers: &[Biomarker]) -> Result<()> {
    for biomarker in biomarkers {
        if biomarker.id.trim().is_empty() {
            return Err(Error::Dictionary(format!(
                "biomarker '{}' has an empty id",
                biomarker.name
            )));
        }
        if biomarker.unit.trim().is_empty() {
            return Err(Error::Dictionary(format!(
                "biomarker '{}' has no canonical unit",
                biomarker.id
            )));
        }
        if let Some(unit) = biomarker
            .units
            .iter()
            .find(|u| !u.conversion.is_finite() || u.conversion <= 0.0)
        {
            return Err(Error::Dictionary(format!(
                "biomarker '{}' has invalid conversion {} for unit {}",
                biomarker.id, unit.conversion, unit.unit
            )));
        }
    }
    Ok(())
}

fn builtin_biomarkers() -> Vec<Biomarker> {
    vec![
        Biomarker::new("glucose", "Glucose", "mg/dL")
            .with_alias("Glucosio")
            .with_alias("Glicemia")
            .with_alias("Blood glucose")
            .with_alias("GLU")
            .with_unit(UnitConversion::new("mmol/L", 0.0555)),
        Biomarker::new("cholesterol", "Cholesterol", "mg/dL")
            .with_alias("Total cholesterol")
            .with_alias("Colesterolo")
            .with_alias("Colesterolo totale")
            .with_alias("CHOL")
            .with_unit(UnitConversion::new("mmol/L", 0.02586)),
        Biomarker::new("hdl", "HDL cholesterol", "mg/dL")
            .with_alias("HDL")
            .with_alias("Colesterolo HDL")
            .with_unit(UnitConversion::new("mmol/L", 0.02586)),
        Biomarker::new("ldl", "LDL cholesterol", "mg/dL")
            .with_alias("LDL")
            .with_alias("Colesterolo LDL")
            .with_unit(UnitConversion::new("mmol/L", 0.02586)),
        Biomarker::new("triglycerides", "Triglycerides", "mg/dL")
            .with_alias("Trigliceridi")
            .with_alias("TRIG")
            .with_unit(UnitConversion::new("mmol/L", 0.01129)),
        Biomarker::new("creatinine", "Creatinine", "mg/dL")
            .with_alias("Creatinina")
            .with_alias("CREA")
            .with_unit(UnitConversion::new("umol/L", 88.42)),
        Biomarker::new("erythrocytes", "Erythrocytes", "10^12/L")
            .with_alias("Red blood cells")
            .with_alias("RBC")
            .with_alias("Eritrociti")
            .with_alias("Globuli rossi")
            .with_unit(UnitConversion::new("10^12/L", 1.0).with_alias("x10^12/L").with_alias("T/L"))
            .with_unit(
                UnitConversion::new("10^6/uL", 1.0)
                    .with_alias("x10^6/uL")
                    .with_alias("10*6/uL")
                    .with_alias("mil/uL"),
            ),
        Biomarker::new("leukocytes", "Leukocytes", "10^9/L")
            .with_alias("White blood cells")
            .with_alias("WBC")
            .with_alias("Leucociti")
            .with_alias("Globuli bianchi")
            .with_unit(UnitConversion::new("10^9/L", 1.0).with_alias("x10^9/L").with_alias("G/L"))
            .with_unit(
                UnitConversion::new("10^3/uL", 1.0)
                    .with_alias("x10^3/uL")
                    .with_alias("10*3/uL")
                    .with_alias("K/uL"),
            ),
        Biomarker::new("hemoglobin", "Hemoglobin", "g/dL")
            .with_alias("Haemoglobin")
            .with_alias("Emoglobina")
            .with_alias("HGB")
            .with_unit(UnitConversion::new("g/L", 10.0))
            .with_unit(UnitConversion::new("mmol/L", 0.6206)),
        Biomarker::new("platelets", "Platelets", "10^9/L")
            .with_alias("Piastrine")
            .with_alias("PLT")
            .with_unit(UnitConversion::new("10^9/L", 1.0).with_alias("x10^9/L"))
            .with_unit(
                UnitConversion::new("10^3/uL", 1.0)
                    .with_alias("x10^3/uL")
                    .with_alias("10*3/uL")
                    .with_alias("K/uL"),
            ),
        Biomarker::new("tsh", "Thyrotropin", "mIU/L")
            .with_alias("TSH")
            .with_alias("Tirotropina")
            .with_unit(UnitConversion::new("uIU/mL", 1.0).with_alias("mU/L")),
        Biomarker::new("alt", "Alanine aminotransferase", "U/L")
            .with_alias("ALT")
            .with_alias("GPT")
            .with_alias("ALT/GPT")
            .with_unit(UnitConversion::new("IU/L", 1.0)),
        Biomarker::new("ast", "Aspartate aminotransferase", "U/L")
            .with_alias("AST")
            .with_alias("GOT")
            .with_alias("AST/GOT")
            .with_unit(UnitConversion::new("IU/L", 1.0)),
        Biomarker::new("hba1c", "HbA1c", "%")
            .with_alias("Glycated hemoglobin")
            .with_alias("Emoglobina glicata"),
        Biomarker::new("vitamin_d", "Vitamin D", "ng/mL")
            .with_alias("25-OH Vitamin D")
            .with_alias("Vitamina D")
            .with_unit(UnitConversion::new("nmol/L", 2.496)),
        Biomarker::new("ferritin", "Ferritin", "ng/mL")
            .with_alias("Ferritina")
            .with_unit(UnitConversion::new("ug/L", 1.0)),
        Biomarker::new("iron", "Iron", "ug/dL")
            .with_alias("Ferro")
            .with_alias("Sideremia")
            .with_unit(UnitConversion::new("umol/L", 0.179)),
    ]
}
