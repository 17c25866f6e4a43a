//! Snap Engine
//!
//! Moves every point of a wellpath to a target depth above the oil-water
//! contact of the reservoir model at a given report date.
//!
//! ## Pipeline (per wellpath)
//!
//! 1. Resolve each point's grid column (fatal if outside the grid)
//! 2. Locate the contact in that column (`contact`)
//! 3. Offset it into a raw target depth (`targeter`)
//! 4. Smooth the targets under the dogleg constraint (`smoother`)
//! 5. Write new depths, recomputed MD and the requested log columns onto a
//!    copy of the input path
//!
//! The engine only borrows the grid index and property store, so one model
//! can serve any number of wellpaths in parallel.

pub mod contact;
pub mod smoother;
pub mod targeter;

use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;
use tracing::{debug, info, warn};

use crate::config::{SnapConfig, WellPathEntry};
use crate::error::SnapError;
use crate::grid::geometry::{distance_3d, horizontal_distance};
use crate::grid::{CellIndex, ColumnId, GridIndex};
use crate::properties::{PropertyError, PropertyStore};
use crate::reservoir_io::ReservoirModel;
use crate::types::{DepthAnchor, LogKind, OwcDefinition, OwcKeyword};
use crate::wellpath::{WellPath, MD_HEADER};
use contact::ContactLocator;
use smoother::{PathSample, PathSmoother, Target};

// ============================================================================
// Settings & Results
// ============================================================================

/// Effective parameters for snapping one wellpath.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapSettings {
    pub definition: OwcDefinition,
    pub offset: f64,
    pub delta_z: f64,
    pub anchor: DepthAnchor,
    pub logs: Vec<LogKind>,
    /// `None` disables the guard.
    pub max_vertical_adjustment: Option<f64>,
    pub avoid_even_depths: bool,
}

impl Default for SnapSettings {
    fn default() -> Self {
        Self::from_config(&SnapConfig::default())
    }
}

impl SnapSettings {
    /// Global settings, without per-wellpath overrides.
    pub fn from_config(config: &SnapConfig) -> Self {
        Self {
            definition: config.owc_definition,
            offset: config.owc_offset,
            delta_z: config.delta_z,
            anchor: DepthAnchor::None,
            logs: config.logs.clone(),
            max_vertical_adjustment: config.adjustment_limit(),
            avoid_even_depths: config.avoid_even_depths,
        }
    }

    /// Settings for one wellpath entry, overrides applied.
    pub fn for_entry(config: &SnapConfig, entry: &WellPathEntry) -> Self {
        Self {
            definition: config.definition_for(entry),
            offset: config.offset_for(entry),
            anchor: entry.anchor,
            ..Self::from_config(config)
        }
    }
}

/// Why a point kept its original depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnsnappedReason {
    /// No threshold crossing in the point's column.
    ContactNotFound,
    /// The target was further away than `max_vertical_adjustment`.
    ExcessiveAdjustment,
    /// Above the anchor: snapping starts at the anchored point.
    BeforeWindow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PointStatus {
    Snapped,
    Anchored,
    Unsnapped(UnsnappedReason),
}

/// Point counts for one or more snapped wellpaths.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SnapSummary {
    pub points: usize,
    pub snapped: usize,
    pub anchored: usize,
    pub contact_not_found: usize,
    pub excessive_adjustment: usize,
    pub before_window: usize,
}

impl SnapSummary {
    fn record(&mut self, status: PointStatus) {
        self.points += 1;
        match status {
            PointStatus::Snapped => self.snapped += 1,
            PointStatus::Anchored => self.anchored += 1,
            PointStatus::Unsnapped(UnsnappedReason::ContactNotFound) => self.contact_not_found += 1,
            PointStatus::Unsnapped(UnsnappedReason::ExcessiveAdjustment) => {
                self.excessive_adjustment += 1;
            }
            PointStatus::Unsnapped(UnsnappedReason::BeforeWindow) => self.before_window += 1,
        }
    }

    pub const fn unsnapped(&self) -> usize {
        self.contact_not_found + self.excessive_adjustment + self.before_window
    }

    pub fn merge(&mut self, other: &Self) {
        self.points += other.points;
        self.snapped += other.snapped;
        self.anchored += other.anchored;
        self.contact_not_found += other.contact_not_found;
        self.excessive_adjustment += other.excessive_adjustment;
        self.before_window += other.before_window;
    }
}

impl fmt::Display for SnapSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} points: {} snapped, {} anchored, {} unsnapped ({} without contact, {} beyond max adjustment, {} above anchor)",
            self.points,
            self.snapped,
            self.anchored,
            self.unsnapped(),
            self.contact_not_found,
            self.excessive_adjustment,
            self.before_window
        )
    }
}

/// Result of snapping one wellpath.
#[derive(Debug, Clone)]
pub struct SnapOutcome {
    /// Copy of the input path with new depths and log columns.
    pub wellpath: WellPath,
    pub statuses: Vec<PointStatus>,
    /// Contact depth per point, `None` where no crossing was found or the
    /// point lies above the anchor.
    pub contacts: Vec<Option<f64>>,
    /// Points whose new depth is not inside an active cell; their property
    /// logs are NaN.
    pub inactive_points: Vec<usize>,
    /// Report step actually used for the requested date.
    pub step_date: NaiveDate,
    pub summary: SnapSummary,
}

// ============================================================================
// Engine
// ============================================================================

/// Snaps wellpaths against one reservoir model.
#[derive(Debug, Clone, Copy)]
pub struct SnapEngine<'a> {
    index: &'a GridIndex,
    store: &'a PropertyStore,
}

impl<'a> SnapEngine<'a> {
    pub const fn new(index: &'a GridIndex, store: &'a PropertyStore) -> Self {
        Self { index, store }
    }

    pub const fn from_model(model: &'a ReservoirModel) -> Self {
        Self::new(&model.index, &model.store)
    }

    /// Snap `wellpath` to the contact at `date`. The input is not modified.
    pub fn snap(
        &self,
        wellpath: &WellPath,
        date: NaiveDate,
        settings: &SnapSettings,
    ) -> Result<SnapOutcome, SnapError> {
        let well = wellpath.name.as_str();
        let data_err = |source: PropertyError| SnapError::DataNotFound {
            well: well.to_string(),
            source,
        };

        let keyword = settings.definition.keyword;
        let field = self
            .store
            .values_at_date(date, keyword.as_str())
            .map_err(data_err)?;
        let step_date = self.store.step_date(date);
        if step_date != date {
            debug!(well, requested = %date, step = %step_date, "Using nearest report step");
        }

        let points = wellpath.points();
        let columns = points
            .iter()
            .enumerate()
            .map(|(idx, p)| {
                self.index
                    .resolve_column(p.x, p.y)
                    .ok_or_else(|| SnapError::ColumnNotFound {
                        well: well.to_string(),
                        point: idx,
                        x: p.x,
                        y: p.y,
                    })
            })
            .collect::<Result<Vec<ColumnId>, _>>()?;

        let lengths: Vec<f64> = std::iter::once(0.0)
            .chain(
                points
                    .windows(2)
                    .map(|w| horizontal_distance((w[0].x, w[0].y), (w[1].x, w[1].y))),
            )
            .take(points.len())
            .collect();

        let anchor = self.resolve_anchor(wellpath, settings.anchor)?;

        // Contacts, raw targets and point status
        let locator = ContactLocator::new(self.index);
        let mut contacts = Vec::with_capacity(points.len());
        let mut statuses = Vec::with_capacity(points.len());
        let mut samples = Vec::with_capacity(points.len());
        for (idx, point) in points.iter().enumerate() {
            let before_window = anchor.is_some_and(|(at, _)| idx < at);
            let contact = if before_window {
                None
            } else {
                locator.locate(columns[idx], field, &settings.definition)
            };
            contacts.push(contact);

            let (target, status) = match (anchor, contact) {
                _ if before_window => (
                    Target::Unresolved(point.z),
                    PointStatus::Unsnapped(UnsnappedReason::BeforeWindow),
                ),
                (Some((at, depth)), _) if at == idx => (Target::Anchored(depth), PointStatus::Anchored),
                (_, None) => (
                    Target::Unresolved(point.z),
                    PointStatus::Unsnapped(UnsnappedReason::ContactNotFound),
                ),
                (_, Some(owc)) => {
                    let raw = targeter::target_tvd(owc, settings.offset);
                    if targeter::within_adjustment(point.z, raw, settings.max_vertical_adjustment) {
                        (Target::Resolved(raw), PointStatus::Snapped)
                    } else {
                        debug!(
                            well,
                            point = idx,
                            tvd = point.z,
                            target = raw,
                            "Target beyond max vertical adjustment, point left in place"
                        );
                        (
                            Target::Unresolved(point.z),
                            PointStatus::Unsnapped(UnsnappedReason::ExcessiveAdjustment),
                        )
                    }
                }
            };
            samples.push(PathSample {
                length: lengths[idx],
                target,
            });
            statuses.push(status);
        }

        let mut depths = PathSmoother::new(settings.delta_z).smooth(&samples);
        if settings.avoid_even_depths {
            for (depth, status) in depths.iter_mut().zip(&statuses) {
                if *status == PointStatus::Snapped {
                    *depth = targeter::round_away_from_even(*depth);
                }
            }
        }

        let window_start = anchor.map_or(0, |(at, _)| at);
        let mut snapped = wellpath.clone();
        if wellpath.has_column(MD_HEADER) {
            snapped.set_column(MD_HEADER, recompute_md(wellpath, &depths, window_start))?;
        }
        snapped.set_depths(&depths);

        let cells: Vec<Option<CellIndex>> = columns
            .iter()
            .zip(&depths)
            .map(|(&col, &z)| self.index.cell_at(col, z))
            .collect();
        let inactive_points: Vec<usize> = (window_start..cells.len())
            .filter(|&idx| cells[idx].is_none())
            .collect();
        for &idx in &inactive_points {
            warn!(
                well,
                point = idx,
                x = points[idx].x,
                y = points[idx].y,
                tvd = depths[idx],
                "Wellpoint not in an active cell, property logs are NaN"
            );
        }

        self.append_logs(&mut snapped, wellpath, date, &cells, &depths, &contacts, &lengths, settings)?;

        let mut summary = SnapSummary::default();
        for status in &statuses {
            summary.record(*status);
        }
        info!(
            well,
            step = %step_date,
            owc = %settings.definition,
            points = summary.points,
            snapped = summary.snapped,
            unsnapped = summary.unsnapped(),
            "Wellpath snapped"
        );

        Ok(SnapOutcome {
            wellpath: snapped,
            statuses,
            contacts,
            inactive_points,
            step_date,
            summary,
        })
    }

    /// Point index and pinned depth of the anchor, if it applies.
    fn resolve_anchor(
        &self,
        wellpath: &WellPath,
        anchor: DepthAnchor,
    ) -> Result<Option<(usize, f64)>, SnapError> {
        let points = wellpath.points();
        let found = match anchor {
            DepthAnchor::None => return Ok(None),
            DepthAnchor::Md(md) => {
                if !wellpath.has_column(MD_HEADER) {
                    return Err(SnapError::MissingMdForAnchor {
                        well: wellpath.name.clone(),
                    });
                }
                (0..points.len())
                    .find(|&idx| wellpath.md(idx).is_some_and(|v| v >= md))
                    .map(|idx| (idx, points[idx].z))
            }
            DepthAnchor::Tvd(tvd) => points
                .iter()
                .position(|p| p.z >= tvd)
                .map(|idx| (idx, tvd)),
        };
        if found.is_none() {
            warn!(well = %wellpath.name, %anchor, "No point reaches the anchor depth, anchor ignored");
        }
        Ok(found)
    }

    #[allow(clippy::too_many_arguments)]
    fn append_logs(
        &self,
        snapped: &mut WellPath,
        original: &WellPath,
        date: NaiveDate,
        cells: &[Option<CellIndex>],
        depths: &[f64],
        contacts: &[Option<f64>],
        lengths: &[f64],
        settings: &SnapSettings,
    ) -> Result<(), SnapError> {
        let well = original.name.as_str();
        let data_err = |source: PropertyError| SnapError::DataNotFound {
            well: well.to_string(),
            source,
        };
        let sample = |field: &[f64]| -> Vec<f64> {
            cells
                .iter()
                .map(|c| c.and_then(|c| field.get(c).copied()).unwrap_or(f64::NAN))
                .collect()
        };

        for kind in &settings.logs {
            let values = match kind {
                LogKind::Owc => contacts.iter().map(|c| c.unwrap_or(f64::NAN)).collect(),
                LogKind::OldTvd => original.points().iter().map(|p| p.z).collect(),
                LogKind::TvdDiff => depths
                    .iter()
                    .zip(original.points())
                    .map(|(new, p)| new - p.z)
                    .collect(),
                LogKind::Length => lengths.to_vec(),
                LogKind::Swat | LogKind::Sgas => {
                    sample(self.store.values_at_date(date, kind.header()).map_err(data_err)?)
                }
                LogKind::Soil => {
                    let swat = sample(
                        self.store
                            .values_at_date(date, OwcKeyword::Swat.as_str())
                            .map_err(data_err)?,
                    );
                    let sgas = match self.store.values_at_date(date, OwcKeyword::Sgas.as_str()) {
                        Ok(field) => sample(field),
                        Err(e) => {
                            warn!(well, error = %e, "SGAS missing, SOIL computed as 1 - SWAT");
                            vec![0.0; swat.len()]
                        }
                    };
                    swat.iter().zip(&sgas).map(|(w, g)| 1.0 - (w + g)).collect()
                }
                LogKind::Permx => {
                    if !self.store.has_statics() {
                        warn!(well, "PERMX log requested but no init file given, log dropped");
                        continue;
                    }
                    sample(self.store.static_values(kind.header()).map_err(data_err)?)
                }
            };
            snapped.set_column(kind.header(), values)?;
        }
        Ok(())
    }
}

/// Measured depth along the new trajectory.
///
/// Points before `start` and the first point keep their MD; from `start` on
/// MD accumulates 3-D distances between the new points.
fn recompute_md(original: &WellPath, depths: &[f64], start: usize) -> Vec<f64> {
    let points = original.points();
    let mut md = Vec::with_capacity(points.len());
    for (idx, p) in points.iter().enumerate() {
        let value = match md.last() {
            Some(&prev_md) if idx >= start => {
                let prev = &points[idx - 1];
                prev_md + distance_3d([prev.x, prev.y, depths[idx - 1]], [p.x, p.y, depths[idx]])
            }
            _ => original.md(idx).unwrap_or(0.0),
        };
        md.push(value);
    }
    md
}
