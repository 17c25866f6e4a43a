//! Batch runner: snaps every wellpath of a config against one reservoir model.
//!
//! Order of work:
//!
//! 1. Validate the config and read all wellpath files
//! 2. Create the output directory and refuse to run if two wellpaths share an
//!    output or any output exists (unless `overwrite`), before touching the
//!    reservoir model
//! 3. Load grid, restart and init once
//! 4. Snap and write wellpaths in parallel; a failing wellpath does not stop
//!    the others

use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{error, info};

use crate::config::{ConfigError, SnapConfig, WellPathEntry};
use crate::error::SnapError;
use crate::reservoir_io::ReservoirModel;
use crate::snap::{SnapEngine, SnapSettings, SnapSummary};
use crate::wellpath::{OutputFormat, WellPath};

/// Outcome for one configured wellpath.
#[derive(Debug)]
pub struct WellPathReport {
    pub file: PathBuf,
    /// Written file, when snapping succeeded.
    pub output: Option<PathBuf>,
    pub result: Result<SnapSummary, SnapError>,
}

/// Outcome of a whole run.
#[derive(Debug, Default)]
pub struct RunReport {
    pub wellpaths: Vec<WellPathReport>,
    pub summary: SnapSummary,
}

impl RunReport {
    pub fn failed(&self) -> usize {
        self.wellpaths.iter().filter(|w| w.result.is_err()).count()
    }

    pub fn succeeded(&self) -> usize {
        self.wellpaths.len() - self.failed()
    }
}

/// A wellpath read from disk together with where its result goes.
struct Loaded<'c> {
    entry: &'c WellPathEntry,
    wellpath: Result<(WellPath, PathBuf), SnapError>,
}

/// Run every wellpath in `config`.
///
/// Returns `Err` only for problems that stop the whole run (invalid config,
/// existing outputs, unreadable model). Per-wellpath failures are reported in
/// the returned `RunReport`.
pub fn run(config: &SnapConfig, format: OutputFormat) -> Result<RunReport, SnapError> {
    let started = Instant::now();
    config.validate()?;

    let loaded: Vec<Loaded<'_>> = config
        .wellpaths
        .iter()
        .map(|entry| Loaded {
            entry,
            wellpath: WellPath::from_file(&entry.file)
                .map(|wp| {
                    let out = wp.output_path(&config.output);
                    (wp, out)
                })
                .map_err(SnapError::from),
        })
        .collect();

    prepare_output_dir(&config.output)?;
    check_outputs_free(&loaded, config.overwrite)?;

    let (grid, restart) = match (&config.grid, &config.restart) {
        (Some(g), Some(r)) => (g, r),
        _ => {
            return Err(ConfigError::Validation(vec![
                "grid and restart files are required".to_string(),
            ])
            .into())
        }
    };
    let model = ReservoirModel::load(grid, restart, config.init.as_deref(), config.report_step_policy)?;
    let engine = SnapEngine::from_model(&model);

    let wellpaths: Vec<WellPathReport> = loaded
        .into_par_iter()
        .map(|item| {
            let file = item.entry.file.clone();
            let (wp, out) = match item.wellpath {
                Ok(pair) => pair,
                Err(e) => {
                    error!(file = %file.display(), error = %e, "Could not read wellpath");
                    return WellPathReport {
                        file,
                        output: None,
                        result: Err(e),
                    };
                }
            };
            let settings = SnapSettings::for_entry(config, item.entry);
            let result = engine
                .snap(&wp, item.entry.date, &settings)
                .and_then(|outcome| {
                    outcome
                        .wellpath
                        .write_file(&out, config.overwrite, format)
                        .map_err(SnapError::from)?;
                    info!(well = %wp.name, output = %out.display(), "Wrote snapped wellpath");
                    Ok(outcome.summary)
                });
            if let Err(e) = &result {
                error!(well = %wp.name, file = %file.display(), error = %e, "Wellpath failed");
            }
            WellPathReport {
                file,
                output: result.is_ok().then_some(out),
                result,
            }
        })
        .collect();

    let mut summary = SnapSummary::default();
    for report in &wellpaths {
        if let Ok(s) = &report.result {
            summary.merge(s);
        }
    }
    let report = RunReport { wellpaths, summary };
    info!(
        wellpaths = report.wellpaths.len(),
        failed = report.failed(),
        points = report.summary.points,
        snapped = report.summary.snapped,
        unsnapped = report.summary.unsnapped(),
        elapsed_ms = started.elapsed().as_millis(),
        "Snap run finished"
    );
    Ok(report)
}

fn prepare_output_dir(dir: &Path) -> Result<(), ConfigError> {
    if dir.is_file() {
        return Err(ConfigError::Validation(vec![format!(
            "output {} is a file; delete it or choose a different output folder",
            dir.display()
        )]));
    }
    if !dir.exists() {
        std::fs::create_dir_all(dir).map_err(|e| ConfigError::Io(dir.to_path_buf(), e))?;
        info!(path = %dir.display(), "Created output directory");
    }
    Ok(())
}

/// Fail when two wellpaths share an output file, then (unless `overwrite`)
/// with every output that already exists.
fn check_outputs_free(loaded: &[Loaded<'_>], overwrite: bool) -> Result<(), ConfigError> {
    let mut seen: Vec<&Path> = Vec::new();
    let mut duplicates: Vec<PathBuf> = Vec::new();
    let mut existing = Vec::new();
    for (_, out) in loaded.iter().filter_map(|l| l.wellpath.as_ref().ok()) {
        if seen.contains(&out.as_path()) {
            if !duplicates.contains(out) {
                duplicates.push(out.clone());
            }
            continue;
        }
        seen.push(out.as_path());
        if !overwrite && out.exists() {
            existing.push(out.clone());
        }
    }
    if !duplicates.is_empty() {
        return Err(ConfigError::DuplicateOutput(duplicates));
    }
    if existing.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::OutputExists(existing))
    }
}
