//! Snap Configuration Module
//!
//! Provides the typed run configuration loaded from TOML files or from the
//! keyword format.
//!
//! ## Loading Order
//!
//! 1. Config path given on the command line
//! 2. `SNAPWELL_CONFIG` environment variable
//!
//! ## Usage
//!
//! ```ignore
//! let config = SnapConfig::load_from_file(Path::new("case.toml"))?;
//! for entry in &config.wellpaths {
//!     let offset = config.offset_for(entry);
//! }
//! ```

mod legacy;
mod snap_config;
pub mod defaults;
pub mod validation;

pub use snap_config::*;
