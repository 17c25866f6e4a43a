//! snapwell: Wellpath Depth Optimization
//!
//! Re-targets well trajectories to a fixed distance above the oil-water
//! contact of a reservoir simulation model, under a maximum-slope
//! ("dogleg") constraint along the path.
//!
//! ## Architecture
//!
//! - **Grid Index**: maps (x, y) to grid columns and (x, y, z) to cells
//! - **Property Store**: restart report steps and static init properties
//! - **Snap Engine**: contact location, target depth, path smoothing, logs
//! - **Runner**: config-driven batch processing of many wellpaths

pub mod config;
pub mod error;
pub mod grid;
pub mod properties;
pub mod reservoir_io;
pub mod runner;
pub mod snap;
pub mod types;
pub mod wellpath;

// Re-export configuration
pub use config::{ConfigError, SnapConfig, WellPathEntry};

// Re-export commonly used types
pub use error::SnapError;
pub use grid::{Grid, GridIndex};
pub use properties::{PropertyStore, ReportStep};
pub use reservoir_io::ReservoirModel;
pub use snap::{PointStatus, SnapEngine, SnapOutcome, SnapSettings, SnapSummary, UnsnappedReason};
pub use types::{DepthAnchor, LogKind, OwcDefinition, OwcKeyword, ReportStepPolicy};
pub use wellpath::{OutputFormat, WellPath};
