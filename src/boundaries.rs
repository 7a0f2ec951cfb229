//! Column boundary metadata consumed by interactive column resizing.

use crate::fragment::ColumnBoundary;
use crate::types::Pt;

pub const DEFAULT_MIN_COLUMN_WIDTH: i32 = 25;
pub const DEFAULT_MAX_COLUMN_WIDTH: i32 = 200;

/// Floor and ceiling for the minimum width a resize may shrink a column to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnWidthLimits {
    pub min: Pt,
    pub max: Pt,
}

impl Default for ColumnWidthLimits {
    fn default() -> Self {
        Self {
            min: Pt::from_i32(DEFAULT_MIN_COLUMN_WIDTH),
            max: Pt::from_i32(DEFAULT_MAX_COLUMN_WIDTH),
        }
    }
}

impl ColumnWidthLimits {
    pub fn clamp(&self, width: Pt) -> Pt {
        if width <= Pt::ZERO {
            return self.min;
        }
        self.min.max(self.max.min(width))
    }
}

pub fn compute_column_boundaries(column_widths: &[Pt]) -> Vec<ColumnBoundary> {
    compute_column_boundaries_with(column_widths, ColumnWidthLimits::default())
}

pub fn compute_column_boundaries_with(
    column_widths: &[Pt],
    limits: ColumnWidthLimits,
) -> Vec<ColumnBoundary> {
    let mut x = Pt::ZERO;
    let mut boundaries = Vec::with_capacity(column_widths.len());
    for (index, width) in column_widths.iter().copied().enumerate() {
        boundaries.push(ColumnBoundary {
            index,
            x,
            width,
            min_width: limits.clamp(width),
            resizable: true,
        });
        x += width;
    }
    boundaries
}

pub fn column_boundary(boundaries: &[ColumnBoundary], index: usize) -> Option<&ColumnBoundary> {
    boundaries.get(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn pts(values: &[f32]) -> Vec<Pt> {
        values.iter().map(|v| Pt::from_f32(*v)).collect()
    }

    #[test]
    fn empty_widths_produce_no_boundaries() {
        assert!(compute_column_boundaries(&[]).is_empty());
    }

    #[test]
    fn offsets_accumulate_and_min_width_clamps() {
        let boundaries = compute_column_boundaries(&pts(&[100.0, 10.0, 250.0, 0.0, -5.0]));
        assert_eq!(boundaries.len(), 5);
        let xs: Vec<f64> = boundaries.iter().map(|b| b.x.to_f64()).collect();
        assert_eq!(xs, vec![0.0, 100.0, 110.0, 360.0, 360.0]);
        let mins: Vec<f64> = boundaries.iter().map(|b| b.min_width.to_f64()).collect();
        assert_eq!(mins, vec![100.0, 25.0, 200.0, 25.0, 25.0]);
        assert!(boundaries.iter().all(|b| b.resizable));
        assert_eq!(boundaries[3].index, 3);
    }

    #[test]
    fn lookups_past_the_end_are_none() {
        let boundaries = compute_column_boundaries(&pts(&[50.0, 60.0]));
        assert!(column_boundary(&boundaries, 1).is_some());
        assert!(column_boundary(&boundaries, 2).is_none());
    }

    #[test]
    fn custom_limits_apply() {
        let limits = ColumnWidthLimits {
            min: Pt::from_i32(40),
            max: Pt::from_i32(80),
        };
        let boundaries = compute_column_boundaries_with(&pts(&[30.0, 60.0, 90.0]), limits);
        let mins: Vec<f64> = boundaries.iter().map(|b| b.min_width.to_f64()).collect();
        assert_eq!(mins, vec![40.0, 60.0, 80.0]);
    }

    proptest! {
        #[test]
        fn boundaries_match_widths(widths in proptest::collection::vec(-50i32..500, 1..24)) {
            let widths: Vec<Pt> = widths.into_iter().map(Pt::from_i32).collect();
            let first = compute_column_boundaries(&widths);
            prop_assert_eq!(&first, &compute_column_boundaries(&widths));
            prop_assert_eq!(first.len(), widths.len());
            let mut expected_x = Pt::ZERO;
            for (i, boundary) in first.iter().enumerate() {
                prop_assert_eq!(boundary.index, i);
                prop_assert_eq!(boundary.x, expected_x);
                prop_assert_eq!(boundary.width, widths[i]);
                prop_assert!(boundary.min_width >= Pt::from_i32(25));
                prop_assert!(boundary.min_width <= Pt::from_i32(200));
                let w = widths[i];
                if w <= Pt::ZERO {
                    prop_assert_eq!(boundary.min_width, Pt::from_i32(25));
                } else if w >= Pt::from_i32(200) {
                    prop_assert_eq!(boundary.min_width, Pt::from_i32(200));
                } else if w >= Pt::from_i32(25) {
                    prop_assert_eq!(boundary.min_width, w);
                }
                expected_x += w;
            }
        }
    }
}
