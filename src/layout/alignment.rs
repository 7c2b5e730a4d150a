//! Column alignment detection over sets of word boxes.
//!
//! Lab results are usually printed as tables, so the words of one kind
//! (names, values, units, ranges) tend to share a left, center or right edge.
//! Edge coordinates are bucketed and buckets supported by enough boxes are
//! reported as columns.

use std::collections::HashMap;

use crate::model::{Alignment, AlignmentEdge, BoundingBox, ColumnAlignment};

/// Configuration for alignment detection.
#[derive(Debug, Clone)]
pub struct AlignmentConfig {
    /// Width of an edge bucket (normalized units)
    pub bucket_size: f32,
    /// Minimum number of boxes sharing a column
    pub min_support: usize,
    /// Minimum share of boxes sharing a column (0.0-1.0)
    pub min_ratio: f32,
}

impl Default for AlignmentConfig {
    fn default() -> Self {
        Self {
            bucket_size: 0.005,
            min_support: 2,
            min_ratio: 0.3,
        }
    }
}

/// Detect dominant columns among `boxes` with the default configuration.
///
/// Never fails: too few boxes or no shared edge yield an empty alignment.
pub fn get_bounding_box_alignments(boxes: &[BoundingBox]) -> Alignment {
    get_bounding_box_alignments_with_config(boxes, &AlignmentConfig::default())
}

/// Detect dominant columns among `boxes`.
pub fn get_bounding_box_alignments_with_config(
    boxes: &[BoundingBox],
    config: &AlignmentConfig,
) -> Alignment {
    let sample_size = boxes.len();
    if sample_size < config.min_support.max(1) {
        return Alignment {
            sample_size,
            columns: vec![],
        };
    }

    let min_count = ((sample_size as f32 * config.min_ratio).ceil() as usize).max(config.min_support);

    let mut columns: Vec<ColumnAlignment> = [
        AlignmentEdge::Left,
        AlignmentEdge::Center,
        AlignmentEdge::Right,
    ]
    .into_iter()
    .flat_map(|edge| {
        let coords: Vec<f32> = boxes.iter().map(|b| edge_coordinate(b, edge)).collect();
        edge_columns(&coords, config.bucket_size)
            .into_iter()
            .filter(|(_, count)| *count >= min_count)
            .map(move |(position, count)| ColumnAlignment {
                edge,
                position,
                count,
                confidence: count as f32 / sample_size as f32,
            })
    })
    .collect();

    columns.sort_by(|a, b| b.count.cmp(&a.count));

    log::debug!(
        "alignments: {} boxes, {} columns, dominant {:?}",
        sample_size,
        columns.len(),
        columns.first().map(|c| (c.edge, c.position))
    );

    Alignment {
        sample_size,
        columns,
    }
}

fn edge_coordinate(bbox: &BoundingBox, edge: AlignmentEdge) -> f32 {
    match edge {
        AlignmentEdge::Left => bbox.left(),
        AlignmentEdge::Center => bbox.center_x(),
        AlignmentEdge::Right => bbox.right(),
    }
}

/// Bucket coordinates and merge adjacent buckets.
///
/// Returns `(mean position, count)` per merged bucket, left to right.
fn edge_columns(coords: &[f32], bucket_size: f32) -> Vec<(f32, usize)> {
    let mut buckets: HashMap<i32, (usize, f32)> = HashMap::new();
    for &x in coords.iter().filter(|x| x.is_finite()) {
        let bucket = (x / bucket_size).round() as i32;
        let entry = buckets.entry(bucket).or_insert((0, 0.0));
        entry.0 += 1;
        entry.1 += x;
    }

    let mut keys: Vec<i32> = buckets.keys().copied().collect();
    keys.sort_unstable();

    let mut merged: Vec<(i32, usize, f32)> = Vec::new();
    for key in keys {
        let (count, sum) = buckets[&key];
        match merged.last_mut() {
            Some((last_key, last_count, last_sum)) if key - *last_key <= 1 => {
                *last_key = key;
                *last_count += count;
                *last_sum += sum;
            }
            _ => merged.push((key, count, sum)),
        }
    }

    merged
        .into_iter()
        .map(|(_, count, sum)| (sum / count as f32, count))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column_of_boxes(left: f32, width: f32, rows: usize) -> Vec<BoundingBox> {
        (0..rows)
            .map(|i| {
                let top = 0.1 + i as f32 * 0.03;
                BoundingBox::from_coords(left, top, left + width, top + 0.02)
            })
            .collect()
    }

    #[test]
    fn test_left_aligned_column() {
        let boxes: Vec<BoundingBox> = (0..5)
            .map(|i| {
                let top = 0.1 + i as f32 * 0.03;
                BoundingBox::from_coords(0.1, top, 0.15 + i as f32 * 0.04, top + 0.02)
            })
            .collect();

        let alignment = get_bounding_box_alignments(&boxes);
        let dominant = alignment.dominant().unwrap();
        assert_eq!(dominant.edge, AlignmentEdge::Left);
        assert_eq!(dominant.count, 5);
        assert!((dominant.position - 0.1).abs() < 1e-4);
        assert!((dominant.confidence - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_right_aligned_values() {
        // numbers right-aligned at x = 0.6 with varying widths
        let boxes: Vec<BoundingBox> = [0.02, 0.035, 0.01, 0.05]
            .iter()
            .enumerate()
            .map(|(i, w)| {
                let top = 0.1 + i as f32 * 0.03;
                BoundingBox::from_coords(0.6 - w, top, 0.6, top + 0.02)
            })
            .collect();

        let alignment = get_bounding_box_alignments(&boxes);
        let right = alignment
            .columns
            .iter()
            .find(|c| c.edge == AlignmentEdge::Right)
            .unwrap();
        assert_eq!(right.count, 4);
        assert!(alignment
            .columns
            .iter()
            .all(|c| c.edge != AlignmentEdge::Left || c.count < 4));
    }

    #[test]
    fn test_two_columns() {
        let mut boxes = column_of_boxes(0.1, 0.1, 4);
        boxes.extend(column_of_boxes(0.5, 0.05, 4));

        let alignment = get_bounding_box_alignments(&boxes);
        let lefts: Vec<_> = alignment
            .columns
            .iter()
            .filter(|c| c.edge == AlignmentEdge::Left)
            .collect();
        assert_eq!(lefts.len(), 2);
    }

    #[test]
    fn test_too_few_boxes() {
        let boxes = column_of_boxes(0.1, 0.1, 1);
        let alignment = get_bounding_box_alignments(&boxes);
        assert!(alignment.is_empty());
        assert_eq!(alignment.sample_size, 1);

        assert!(get_bounding_box_alignments(&[]).is_empty());
    }

    #[test]
    fn test_scattered_boxes() {
        let boxes = vec![
            BoundingBox::from_coords(0.05, 0.1, 0.08, 0.12),
            BoundingBox::from_coords(0.33, 0.2, 0.41, 0.22),
            BoundingBox::from_coords(0.71, 0.3, 0.9, 0.32),
        ];
        assert!(get_bounding_box_alignments(&boxes).is_empty());
    }
}
