//! Geometry primitives for OCR word boxes.
//!
//! Coordinates are normalized to the page (0..1 on both axes) with the origin
//! at the top-left corner, which is how OCR services report vertices.

use serde::{Deserialize, Serialize};

/// A 2D point in normalized page coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal position (0 = left edge)
    #[serde(default)]
    pub x: f32,
    /// Vertical position (0 = top edge)
    #[serde(default)]
    pub y: f32,
}

impl Point {
    /// Create a new point.
    #[inline]
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// A quadrilateral made of four ordered vertices.
///
/// Vertices follow the OCR convention for upright text: top-left, top-right,
/// bottom-right, bottom-left.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BoundingBox {
    /// The four vertices.
    pub points: [Point; 4],
}

impl BoundingBox {
    /// Create a bounding box from its four vertices.
    pub fn new(points: [Point; 4]) -> Self {
        Self { points }
    }

    /// Create an axis-aligned box from edge coordinates.
    pub fn from_coords(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            points: [
                Point::new(left, top),
                Point::new(right, top),
                Point::new(right, bottom),
                Point::new(left, bottom),
            ],
        }
    }

    /// Build a box from a vertex list, which must contain exactly 4 points.
    pub fn from_slice(points: &[Point]) -> Option<Self> {
        let points: [Point; 4] = points.try_into().ok()?;
        Some(Self { points })
    }

    /// Leftmost x coordinate.
    pub fn left(&self) -> f32 {
        self.points.iter().map(|p| p.x).fold(f32::INFINITY, f32::min)
    }

    /// Rightmost x coordinate.
    pub fn right(&self) -> f32 {
        self.points.iter().map(|p| p.x).fold(f32::NEG_INFINITY, f32::max)
    }

    /// Topmost y coordinate.
    pub fn top(&self) -> f32 {
        self.points.iter().map(|p| p.y).fold(f32::INFINITY, f32::min)
    }

    /// Bottommost y coordinate.
    pub fn bottom(&self) -> f32 {
        self.points.iter().map(|p| p.y).fold(f32::NEG_INFINITY, f32::max)
    }

    pub fn width(&self) -> f32 {
        self.right() - self.left()
    }

    pub fn height(&self) -> f32 {
        self.bottom() - self.top()
    }

    pub fn center_x(&self) -> f32 {
        (self.left() + self.right()) / 2.0
    }

    pub fn center_y(&self) -> f32 {
        (self.top() + self.bottom()) / 2.0
    }

    /// Area of the axis-aligned envelope.
    pub fn area(&self) -> f32 {
        self.width() * self.height()
    }

    /// Angle in degrees of the top edge (first to second vertex).
    ///
    /// Upright text reads close to 0; text rotated by a quarter turn reads
    /// close to +/-90.
    pub fn skew_degrees(&self) -> f32 {
        let [a, b, _, _] = self.points;
        (b.y - a.y).atan2(b.x - a.x).to_degrees()
    }

    /// Check if the box is upright text within `max_skew` degrees.
    pub fn is_horizontal(&self, max_skew: f32) -> bool {
        let [a, b, _, _] = self.points;
        b.x > a.x && self.skew_degrees().abs() <= max_skew
    }

    /// Vertical overlap with another box, as a fraction of the shorter height.
    pub fn vertical_overlap(&self, other: &BoundingBox) -> f32 {
        let overlap = self.bottom().min(other.bottom()) - self.top().max(other.top());
        let min_height = self.height().min(other.height());
        if overlap <= 0.0 || min_height <= 0.0 {
            return 0.0;
        }
        (overlap / min_height).min(1.0)
    }

    /// Smallest axis-aligned box enclosing both boxes.
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox::from_coords(
            self.left().min(other.left()),
            self.top().min(other.top()),
            self.right().max(other.right()),
            self.bottom().max(other.bottom()),
        )
    }
}

/// Merge boxes into the minimal axis-aligned box covering all of them.
///
/// Returns `None` for an empty input.
pub fn merge_bounding_boxes(boxes: &[BoundingBox]) -> Option<BoundingBox> {
    let (first, rest) = boxes.split_first()?;
    Some(rest.iter().fold(*first, |acc, bbox| acc.union(bbox)))
}

/// Which edge of a box an alignment column was detected on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlignmentEdge {
    Left,
    Center,
    Right,
}

/// A column position shared by several boxes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnAlignment {
    /// Edge the boxes align on
    pub edge: AlignmentEdge,
    /// Normalized x coordinate of the column
    pub position: f32,
    /// Number of boxes aligned on this column
    pub count: usize,
    /// Share of the input boxes aligned on this column (0.0-1.0)
    pub confidence: f32,
}

/// Dominant column positions for one category of boxes on a page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Alignment {
    /// Number of boxes the alignment was computed from
    pub sample_size: usize,
    /// Detected columns, strongest first
    pub columns: Vec<ColumnAlignment>,
}

impl Alignment {
    /// The strongest column, if any.
    pub fn dominant(&self) -> Option<&ColumnAlignment> {
        self.columns.first()
    }

    /// Check if no column was detected.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}
