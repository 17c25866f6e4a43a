//! Contact location within one grid column.
//!
//! The column is scanned from the bottom upward and the first (deepest)
//! adjacent pair of cells that straddles the threshold defines the contact.
//! Starting at the bottom follows the convention that the OWC is the lowest
//! oil-bearing point, so noisy saturation swings higher up in the column
//! never produce a contact.

use crate::grid::{ColumnId, GridIndex};
use crate::types::OwcDefinition;

/// One cell of a column profile: representative depth and property value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProfileSample {
    pub depth: f64,
    pub value: f64,
}

/// Linear interpolation of the threshold crossing between two cells.
///
/// Equal values carry no gradient and yield the deeper cell's depth.
pub fn interpolate_crossing(deeper: ProfileSample, shallower: ProfileSample, threshold: f64) -> f64 {
    let span = shallower.value - deeper.value;
    if span == 0.0 {
        return deeper.depth;
    }
    deeper.depth + (shallower.depth - deeper.depth) * (threshold - deeper.value) / span
}

/// Locate the contact in a top-to-bottom profile.
///
/// NaN samples are dropped before pairing, so a pair may straddle an
/// undefined cell. Returns `None` when no crossing exists.
pub fn locate_in_profile(profile: &[ProfileSample], definition: &OwcDefinition) -> Option<f64> {
    let valid: Vec<ProfileSample> = profile
        .iter()
        .copied()
        .filter(|s| s.value.is_finite() && s.depth.is_finite())
        .collect();
    let keyword = definition.keyword;
    let threshold = definition.threshold;

    valid
        .windows(2)
        .rev()
        .find(|pair| {
            let (shallower, deeper) = (pair[0], pair[1]);
            keyword.is_below_contact(deeper.value, threshold)
                && !keyword.is_below_contact(shallower.value, threshold)
        })
        .map(|pair| interpolate_crossing(pair[1], pair[0], threshold))
}

/// Finds contact depths in grid columns.
#[derive(Debug, Clone, Copy)]
pub struct ContactLocator<'a> {
    index: &'a GridIndex,
}

impl<'a> ContactLocator<'a> {
    pub const fn new(index: &'a GridIndex) -> Self {
        Self { index }
    }

    /// Column profile of `field`, top to bottom, active cells only.
    pub fn profile(&self, column: ColumnId, field: &[f64]) -> Vec<ProfileSample> {
        self.index
            .column_cells(column)
            .iter()
            .map(|&cell| ProfileSample {
                depth: self.index.cell_depth(cell),
                value: field.get(cell).copied().unwrap_or(f64::NAN),
            })
            .collect()
    }

    /// Contact depth in `column` for the property `field` of one report step.
    pub fn locate(&self, column: ColumnId, field: &[f64], definition: &OwcDefinition) -> Option<f64> {
        locate_in_profile(&self.profile(column, field), definition)
    }
}
