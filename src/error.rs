//! Error types for snapping runs.

use thiserror::Error;

use crate::config::ConfigError;
use crate::properties::PropertyError;
use crate::reservoir_io::ModelError;
use crate::wellpath::WellPathError;

/// Errors that abort one wellpath (or the whole run, for config and model
/// errors). A contact that cannot be found is not an error; it shows up as
/// an unsnapped point in the summary.
#[derive(Debug, Error)]
pub enum SnapError {
    /// Keyword or report step missing from the restart/init data.
    #[error("{well}: data not found: {source}")]
    DataNotFound {
        well: String,
        #[source]
        source: PropertyError,
    },

    /// A wellpath point lies outside the grid footprint.
    #[error("{well}: point {point} at ({x:.2}, {y:.2}) is outside the grid")]
    ColumnNotFound {
        well: String,
        point: usize,
        x: f64,
        y: f64,
    },

    #[error("{well}: MD anchor requested but the wellpath has no MD column")]
    MissingMdForAnchor { well: String },

    #[error(transparent)]
    WellPath(#[from] WellPathError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Model(#[from] ModelError),
}
