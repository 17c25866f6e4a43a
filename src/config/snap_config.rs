//! Snap run configuration: inputs, contact definition, smoothing and the
//! list of wellpaths to process.
//!
//! Every field has a default so a minimal TOML file only needs `grid`,
//! `restart` and one `[[wellpath]]` table.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::defaults;
use crate::types::{flexible_date, DepthAnchor, LogKind, OwcDefinition, ReportStepPolicy};

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration for one snapping run.
///
/// Load with `SnapConfig::load_from_file()`, which picks TOML or the legacy
/// keyword format by file extension.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapConfig {
    /// Reservoir grid file (JSON model).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grid: Option<PathBuf>,

    /// Restart report steps file (JSON model).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub restart: Option<PathBuf>,

    /// Optional static properties file, needed for the PERMX log.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub init: Option<PathBuf>,

    /// Output directory for snapped wellpaths.
    pub output: PathBuf,

    /// Replace existing output files.
    pub overwrite: bool,

    /// Maximum TVD change per metre of horizontal length (`inf` = unconstrained).
    pub delta_z: f64,

    pub owc_definition: OwcDefinition,

    /// Metres above the contact to place the wellpath.
    pub owc_offset: f64,

    /// Log columns appended to every snapped wellpath, in this order.
    pub logs: Vec<LogKind>,

    pub report_step_policy: ReportStepPolicy,

    /// Points whose target is further than this from their original TVD are
    /// left in place (`inf` = no limit).
    pub max_vertical_adjustment: f64,

    /// Nudge snapped depths away from even integers.
    pub avoid_even_depths: bool,

    #[serde(rename = "wellpath")]
    pub wellpaths: Vec<WellPathEntry>,
}

impl Default for SnapConfig {
    fn default() -> Self {
        Self {
            grid: None,
            restart: None,
            init: None,
            output: PathBuf::from(defaults::OUTPUT_DIR),
            overwrite: false,
            delta_z: defaults::DELTA_Z,
            owc_definition: OwcDefinition::default(),
            owc_offset: defaults::OWC_OFFSET,
            logs: Vec::new(),
            report_step_policy: ReportStepPolicy::default(),
            max_vertical_adjustment: defaults::MAX_VERTICAL_ADJUSTMENT,
            avoid_even_depths: false,
            wellpaths: Vec::new(),
        }
    }
}

/// One wellpath to snap, with optional per-well overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WellPathEntry {
    pub file: PathBuf,

    /// Report date whose saturations define the contact.
    #[serde(with = "flexible_date")]
    pub date: NaiveDate,

    #[serde(default, skip_serializing_if = "DepthAnchor::is_none")]
    pub anchor: DepthAnchor,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owc_offset: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owc_definition: Option<OwcDefinition>,
}

impl WellPathEntry {
    pub fn new(file: impl Into<PathBuf>, date: NaiveDate) -> Self {
        Self {
            file: file.into(),
            date,
            anchor: DepthAnchor::None,
            owc_offset: None,
            owc_definition: None,
        }
    }
}

impl SnapConfig {
    /// Load from a config file: TOML for `.toml`, the keyword format otherwise.
    ///
    /// Relative paths are resolved against the config file's directory and
    /// the result is validated.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;

        let is_toml = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| defaults::TOML_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()));

        let mut config = if is_toml {
            Self::from_toml_str(&contents, path)?
        } else {
            debug!(path = %path.display(), "Reading keyword-format config");
            super::legacy::parse(&contents, path)?
        };

        let base = path.parent().unwrap_or_else(|| Path::new(""));
        config.resolve_paths(base);
        config.dedup_logs();
        config.validate()?;
        info!(
            path = %path.display(),
            wellpaths = config.wellpaths.len(),
            owc = %config.owc_definition,
            "Loaded snap config"
        );
        Ok(config)
    }

    /// Parse TOML contents. `origin` only names the source in errors.
    ///
    /// Unknown keys are reported as warnings, not errors.
    pub fn from_toml_str(contents: &str, origin: &Path) -> Result<Self, ConfigError> {
        // Two-pass: check for unknown keys first (warnings only)
        for w in &super::validation::validate_unknown_keys(contents) {
            warn!("{}", w);
        }
        toml::from_str(contents).map_err(|e| ConfigError::Parse(origin.to_path_buf(), e))
    }

    /// Serialize the current config to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Make every relative path absolute with respect to `base`.
    pub fn resolve_paths(&mut self, base: &Path) {
        let resolve = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        for p in [&mut self.grid, &mut self.restart, &mut self.init]
            .into_iter()
            .flatten()
        {
            resolve(p);
        }
        resolve(&mut self.output);
        for entry in &mut self.wellpaths {
            resolve(&mut entry.file);
        }
    }

    /// Drop repeated log kinds, keeping the first occurrence.
    fn dedup_logs(&mut self) {
        let mut seen = Vec::with_capacity(self.logs.len());
        for log in self.logs.drain(..) {
            if seen.contains(&log) {
                warn!(log = %log.header(), "Log listed more than once, ignoring repeat");
            } else {
                seen.push(log);
            }
        }
        self.logs = seen;
    }

    /// Contact definition for `entry`: its override, else the global one.
    pub fn definition_for(&self, entry: &WellPathEntry) -> OwcDefinition {
        entry.owc_definition.unwrap_or(self.owc_definition)
    }

    /// Offset for `entry`: its override, else the global one.
    pub fn offset_for(&self, entry: &WellPathEntry) -> f64 {
        entry.owc_offset.unwrap_or(self.owc_offset)
    }

    /// `max_vertical_adjustment` with infinity mapped to "no limit".
    pub fn adjustment_limit(&self) -> Option<f64> {
        self.max_vertical_adjustment
            .is_finite()
            .then_some(self.max_vertical_adjustment)
    }

    /// Validate the whole config, collecting every problem into one error.
    ///
    /// Rules:
    /// - grid and restart files must be given
    /// - at least one wellpath
    /// - the output path must not be an existing regular file
    /// - physical ranges (see `validation::validate_physical_ranges`)
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors: Vec<String> = Vec::new();

        if self.grid.is_none() {
            errors.push("no grid file given".to_string());
        }
        if self.restart.is_none() {
            errors.push("no restart file given".to_string());
        }
        if self.wellpaths.is_empty() {
            errors.push("no wellpaths given".to_string());
        }
        if self.output.is_file() {
            errors.push(format!(
                "output {} is a file; delete it or choose a different output folder",
                self.output.display()
            ));
        }

        let (range_errors, range_warnings) = super::validation::validate_physical_ranges(self);
        errors.extend(range_errors);
        for w in &range_warnings {
            warn!("{}", w);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(PathBuf, std::io::Error),
    Parse(PathBuf, toml::de::Error),
    Keyword {
        path: PathBuf,
        line: usize,
        message: String,
    },
    Serialize(toml::ser::Error),
    Validation(Vec<String>),
    OutputExists(Vec<PathBuf>),
    /// Output files claimed by more than one wellpath.
    DuplicateOutput(Vec<PathBuf>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(path, e) => write!(f, "Config I/O error ({}): {}", path.display(), e),
            ConfigError::Parse(path, e) => {
                write!(f, "Config parse error ({}): {}", path.display(), e)
            }
            ConfigError::Keyword {
                path,
                line,
                message,
            } => write!(f, "Config parse error ({}:{}): {}", path.display(), line, message),
            ConfigError::Serialize(e) => write!(f, "Config serialization error: {}", e),
            ConfigError::Validation(errors) => {
                writeln!(f, "Config validation failed:")?;
                for e in errors {
                    writeln!(f, "  - {}", e)?;
                }
                Ok(())
            }
            ConfigError::OutputExists(paths) => {
                writeln!(
                    f,
                    "Output files exist, cannot overwrite unless explicitly told to:"
                )?;
                for p in paths {
                    writeln!(f, "  - {}", p.display())?;
                }
                Ok(())
            }
            ConfigError::DuplicateOutput(paths) => {
                writeln!(f, "Several wellpaths write the same output file:")?;
                for p in paths {
                    writeln!(f, "  - {}", p.display())?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(toml: &str) -> SnapConfig {
        SnapConfig::from_toml_str(toml, Path::new("test.toml")).unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = SnapConfig::default();
        assert_eq!(config.output, PathBuf::from("."));
        assert!(!config.overwrite);
        assert!(config.delta_z.is_infinite());
        assert!((config.owc_offset - 0.5).abs() < f64::EPSILON);
        assert_eq!(config.owc_definition, OwcDefinition::default());
        assert_eq!(config.report_step_policy, ReportStepPolicy::NearestPreceding);
        assert_eq!(config.adjustment_limit(), Some(100.0));
    }

    #[test]
    fn test_minimal_toml() {
        let config = parse(
            r#"
            grid = "model/grid.json"
            restart = "model/restart.json"

            [[wellpath]]
            file = "wells/a.w"
            date = "2022"
            "#,
        );
        assert_eq!(config.wellpaths.len(), 1);
        assert_eq!(
            config.wellpaths[0].date,
            NaiveDate::from_ymd_opt(2022, 1, 1).unwrap()
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_full_toml() {
        let config = parse(
            r#"
            grid = "g.json"
            restart = "r.json"
            init = "i.json"
            overwrite = true
            delta_z = 0.0167
            owc_offset = 0.88
            owc_definition = { keyword = "SGAS", threshold = 0.2 }
            logs = ["OWC", "LENGTH", "SOIL"]
            report_step_policy = "nearest"
            max_vertical_adjustment = inf

            [[wellpath]]
            file = "a.w"
            date = "2019-05-01"
            anchor = { md = 1500.0 }
            owc_offset = 0.1

            [[wellpath]]
            file = "b.w"
            date = "2020-06"
            anchor = { tvd = 1620.0 }
            owc_definition = { keyword = "SWAT", threshold = 0.8 }
            "#,
        );
        assert!(config.overwrite);
        assert_eq!(config.logs, vec![LogKind::Owc, LogKind::Length, LogKind::Soil]);
        assert_eq!(config.report_step_policy, ReportStepPolicy::Nearest);
        assert_eq!(config.adjustment_limit(), None);

        let a = &config.wellpaths[0];
        assert_eq!(a.anchor, DepthAnchor::Md(1500.0));
        assert!((config.offset_for(a) - 0.1).abs() < f64::EPSILON);
        assert_eq!(config.definition_for(a).threshold, 0.2);

        let b = &config.wellpaths[1];
        assert_eq!(b.anchor, DepthAnchor::Tvd(1620.0));
        assert!((config.offset_for(b) - 0.88).abs() < f64::EPSILON);
        assert_eq!(config.definition_for(b).threshold, 0.8);
    }

    #[test]
    fn test_unknown_log_kind_is_parse_error() {
        let err = SnapConfig::from_toml_str(
            r#"
            grid = "g.json"
            restart = "r.json"
            logs = ["OWC", "BANANA"]
            "#,
            Path::new("bad.toml"),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Parse(..)));
        assert!(err.to_string().contains("BANANA"));
    }

    #[test]
    fn test_validation_collects_all_errors() {
        let mut config = SnapConfig {
            delta_z: -1.0,
            ..SnapConfig::default()
        };
        config.owc_definition.threshold = 1.5;
        match config.validate() {
            Err(ConfigError::Validation(errors)) => {
                assert!(errors.iter().any(|e| e.contains("grid")));
                assert!(errors.iter().any(|e| e.contains("restart")));
                assert!(errors.iter().any(|e| e.contains("wellpaths")));
                assert!(errors.iter().any(|e| e.contains("delta_z")));
                assert!(errors.iter().any(|e| e.contains("threshold")));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_resolve_paths_against_config_dir() {
        let mut config = parse(
            r#"
            grid = "grid.json"
            restart = "/abs/restart.json"
            output = "out"
            [[wellpath]]
            file = "wells/a.w"
            date = "2020"
            "#,
        );
        config.resolve_paths(Path::new("/data/case"));
        assert_eq!(config.grid, Some(PathBuf::from("/data/case/grid.json")));
        assert_eq!(config.restart, Some(PathBuf::from("/abs/restart.json")));
        assert_eq!(config.output, PathBuf::from("/data/case/out"));
        assert_eq!(config.wellpaths[0].file, PathBuf::from("/data/case/wells/a.w"));
    }

    #[test]
    fn test_dedup_logs_keeps_first_order() {
        let mut config = SnapConfig {
            logs: vec![LogKind::Swat, LogKind::Owc, LogKind::Swat],
            ..SnapConfig::default()
        };
        config.dedup_logs();
        assert_eq!(config.logs, vec![LogKind::Swat, LogKind::Owc]);
    }

    #[test]
    fn test_toml_roundtrip_keeps_infinite_delta_z() {
        let mut config = SnapConfig::default();
        config.grid = Some(PathBuf::from("g.json"));
        config.wellpaths.push(WellPathEntry::new(
            "a.w",
            NaiveDate::from_ymd_opt(2021, 3, 1).unwrap(),
        ));
        let text = config.to_toml().unwrap();
        let back = parse(&text);
        assert!(back.delta_z.is_infinite());
        assert_eq!(back.wellpaths, config.wellpaths);
    }
}
