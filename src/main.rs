//! snapwell - wellpath depth optimization against the oil-water contact
//!
//! Reads a snap config, loads the reservoir model once and writes one
//! snapped wellpath per configured entry.
//!
//! # Usage
//!
//! ```bash
//! # Snap with the settings in the config
//! snapwell case.toml
//!
//! # Override contact definition and dogleg limit, write ResInsight files
//! snapwell case.sc -f SWAT:0.6 -d 0.0167 -o snapped -r
//!
//! # Show the effective config without running
//! snapwell case.sc --print-config
//! ```
//!
//! # Environment Variables
//!
//! - `SNAPWELL_CONFIG`: config file when none is given on the command line
//! - `RUST_LOG`: Logging level (default: info)

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;

use snapwell::config::defaults::CONFIG_ENV_VAR;
use snapwell::config::SnapConfig;
use snapwell::runner;
use snapwell::types::{OwcDefinition, ReportStepPolicy};
use snapwell::wellpath::OutputFormat;

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "snapwell")]
#[command(about = "Snap wellpaths to a target depth above the oil-water contact")]
#[command(version)]
struct CliArgs {
    /// Snap config file (.toml, anything else is read as the keyword format)
    #[arg(env = CONFIG_ENV_VAR)]
    config: PathBuf,

    /// Output directory for snapped wellpaths
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Metres above the contact to place the wellpath
    #[arg(short = 'z', long, allow_negative_numbers = true)]
    owc_offset: Option<f64>,

    /// Contact definition, e.g. SWAT:0.7 or SGAS:0.1
    #[arg(short = 'f', long, value_name = "KW:VALUE")]
    owc_definition: Option<OwcDefinition>,

    /// Maximum TVD change per metre of horizontal length
    #[arg(short, long)]
    delta_z: Option<f64>,

    /// Replace existing output files
    #[arg(short = 'w', long)]
    overwrite: bool,

    /// Write ResInsight files (name line, then x y tvd md rows)
    #[arg(short, long)]
    resinsight: bool,

    /// How the wellpath date is matched to a restart report step
    #[arg(long, value_enum)]
    report_step_policy: Option<ReportStepPolicy>,

    /// Print the effective config as TOML and exit
    #[arg(long)]
    print_config: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,
}

impl CliArgs {
    /// Command-line values take precedence over the config file.
    fn apply_overrides(&self, config: &mut SnapConfig) {
        if let Some(output) = &self.output {
            config.output.clone_from(output);
        }
        if let Some(offset) = self.owc_offset {
            config.owc_offset = offset;
        }
        if let Some(definition) = self.owc_definition {
            config.owc_definition = definition;
        }
        if let Some(delta_z) = self.delta_z {
            config.delta_z = delta_z;
        }
        if self.overwrite {
            config.overwrite = true;
        }
        if let Some(policy) = self.report_step_policy {
            config.report_step_policy = policy;
        }
    }

    const fn output_format(&self) -> OutputFormat {
        if self.resinsight {
            OutputFormat::ResInsight
        } else {
            OutputFormat::Rms
        }
    }
}

fn init_logging(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    }
}

// ============================================================================
// Main Entry Point
// ============================================================================

fn main() -> Result<ExitCode> {
    let args = CliArgs::parse();
    init_logging(args.log_json);

    let mut config = SnapConfig::load_from_file(&args.config)
        .with_context(|| format!("Failed to load config {}", args.config.display()))?;
    args.apply_overrides(&mut config);
    config.validate().context("Invalid config after command-line overrides")?;

    if args.print_config {
        print!("{}", config.to_toml()?);
        return Ok(ExitCode::SUCCESS);
    }

    info!(
        config = %args.config.display(),
        output = %config.output.display(),
        owc = %config.owc_definition,
        owc_offset = config.owc_offset,
        delta_z = config.delta_z,
        "Starting snap run"
    );
    let report = runner::run(&config, args.output_format()).context("Snap run aborted")?;

    for w in &report.wellpaths {
        match (&w.result, &w.output) {
            (Ok(summary), Some(out)) => {
                println!("{} -> {}: {}", w.file.display(), out.display(), summary);
            }
            (Err(e), _) => eprintln!("{}: FAILED: {}", w.file.display(), e),
            (Ok(summary), None) => println!("{}: {}", w.file.display(), summary),
        }
    }
    println!(
        "{} of {} wellpaths snapped ({})",
        report.succeeded(),
        report.wellpaths.len(),
        report.summary
    );

    Ok(if report.failed() == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
