//! Default values for snapping runs.
//!
//! Grouped by subsystem for easy discovery.

// ============================================================================
// Contact Definition
// ============================================================================

/// SWAT at or above which a cell counts as water-bearing.
pub const OWC_THRESHOLD: f64 = 0.7;

/// Metres above the contact the wellpath is placed.
pub const OWC_OFFSET: f64 = 0.5;

// ============================================================================
// Smoothing
// ============================================================================

/// Maximum TVD change per metre of horizontal length. Infinite means the
/// path follows the contact without a dogleg constraint.
pub const DELTA_Z: f64 = f64::INFINITY;

/// Largest vertical move allowed for a single point (metres).
///
/// Points whose target lies further away keep their original depth.
pub const MAX_VERTICAL_ADJUSTMENT: f64 = 100.0;

// ============================================================================
// Input / Output
// ============================================================================

/// Output directory when none is configured.
pub const OUTPUT_DIR: &str = ".";

/// Environment variable naming a config file, used when none is given on the
/// command line.
pub const CONFIG_ENV_VAR: &str = "SNAPWELL_CONFIG";

/// Config file extensions parsed as TOML. Anything else is read as the
/// keyword format.
pub const TOML_EXTENSIONS: &[&str] = &["toml"];
