//! Config Validation Tests
//!
//! Typo detection, range validation and loading of both config formats.
//!
//! These tests exercise the config layer independently from the reservoir
//! model and the snap engine.

use chrono::NaiveDate;
use snapwell::config::validation::{
    known_config_keys, suggest_correction, validate_physical_ranges, validate_unknown_keys,
};
use snapwell::config::{ConfigError, SnapConfig, WellPathEntry};
use snapwell::types::{DepthAnchor, LogKind, OwcDefinition, OwcKeyword};
use std::path::PathBuf;

fn minimal() -> SnapConfig {
    let mut config = SnapConfig {
        grid: Some(PathBuf::from("grid.json")),
        restart: Some(PathBuf::from("restart.json")),
        ..SnapConfig::default()
    };
    config.wellpaths.push(WellPathEntry::new(
        "a.w",
        NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
    ));
    config
}

// ============================================================================
// Typo Detection Tests
// ============================================================================

#[test]
fn typo_in_top_level_key_warns_with_suggestion() {
    let toml_str = r#"
grid = "grid.json"
restart = "restart.json"
owc_ofset = 0.5
"#;
    let warnings = validate_unknown_keys(toml_str);
    assert_eq!(warnings.len(), 1, "Expected exactly 1 warning");
    assert_eq!(warnings[0].field, "owc_ofset");
    assert_eq!(warnings[0].suggestion.as_deref(), Some("owc_offset"));
}

#[test]
fn typo_in_owc_definition_table_warns() {
    let toml_str = r#"
[owc_definition]
keyword = "SWAT"
treshold = 0.6
"#;
    let warnings = validate_unknown_keys(toml_str);
    assert_eq!(warnings.len(), 1);
    assert_eq!(
        warnings[0].suggestion.as_deref(),
        Some("owc_definition.threshold")
    );
}

#[test]
fn valid_config_produces_zero_warnings() {
    let toml_str = r#"
grid = "model/grid.json"
restart = "model/restart.json"
init = "model/init.json"
output = "snapped"
overwrite = true
delta_z = 0.0167
owc_offset = 0.5
logs = ["OWC", "OLD_TVD", "TVD_DIFF", "LENGTH", "SWAT", "SGAS", "SOIL", "PERMX"]
report_step_policy = "nearest"
max_vertical_adjustment = 50.0
avoid_even_depths = true

[owc_definition]
keyword = "SWAT"
threshold = 0.7

[[wellpath]]
file = "wells/a.w"
date = "2019-05-01"
anchor = { md = 1500.0 }

[[wellpath]]
file = "wells/b.w"
date = "2020"
anchor = { tvd = 1600.0 }
owc_offset = 0.2
owc_definition = { keyword = "SGAS", threshold = 0.1 }
"#;
    let warnings = validate_unknown_keys(toml_str);
    assert!(
        warnings.is_empty(),
        "Valid config should produce 0 warnings, got: {:?}",
        warnings.iter().map(|w| &w.field).collect::<Vec<_>>()
    );
}

#[test]
fn multiple_typos_all_warned() {
    let toml_str = r#"
detla_z = 0.01

[[wellpath]]
flie = "a.w"
date = "2020"
"#;
    let warnings = validate_unknown_keys(toml_str);
    assert_eq!(
        warnings.len(),
        2,
        "Expected 2 warnings for 2 typos, got {}",
        warnings.len()
    );
}

#[test]
fn empty_toml_produces_zero_warnings() {
    let warnings = validate_unknown_keys("");
    assert!(warnings.is_empty());
}

#[test]
fn known_keys_set_is_complete() {
    // Serialize a config with every optional field set and check all keys are known
    let mut config = minimal();
    config.init = Some(PathBuf::from("init.json"));
    config.logs = vec![LogKind::Owc, LogKind::Permx];
    let mut entry = WellPathEntry::new("b.w", NaiveDate::from_ymd_opt(2021, 6, 1).unwrap());
    entry.anchor = DepthAnchor::Md(1500.0);
    entry.owc_offset = Some(0.3);
    entry.owc_definition = Some(OwcDefinition {
        keyword: OwcKeyword::Sgas,
        threshold: 0.2,
    });
    config.wellpaths.push(entry);

    let toml_str = config.to_toml().expect("Config should serialize");
    let warnings = validate_unknown_keys(&toml_str);
    assert!(
        warnings.is_empty(),
        "Config serialization should produce 0 unknown-key warnings, got: {:?}",
        warnings.iter().map(|w| &w.field).collect::<Vec<_>>()
    );
}

#[test]
fn suggest_correction_finds_close_match() {
    let known = known_config_keys();
    let s = suggest_correction("wellpath.ancor", &known);
    assert_eq!(s.as_deref(), Some("wellpath.anchor"));
}

#[test]
fn suggest_correction_returns_none_for_garbage() {
    let known = known_config_keys();
    let s = suggest_correction("zzz_completely_invalid_xyz_12345", &known);
    assert!(s.is_none(), "Garbage string should not match anything");
}

// ============================================================================
// Range Validation Tests
// ============================================================================

#[test]
fn negative_delta_z_is_error() {
    let mut config = minimal();
    config.delta_z = -0.1;
    let (errors, _) = validate_physical_ranges(&config);
    assert!(errors.iter().any(|e| e.contains("delta_z")));
}

#[test]
fn nan_delta_z_is_error() {
    let mut config = minimal();
    config.delta_z = f64::NAN;
    let (errors, _) = validate_physical_ranges(&config);
    assert!(errors.iter().any(|e| e.contains("delta_z")));
}

#[test]
fn infinite_delta_z_is_valid() {
    let config = minimal();
    assert!(config.delta_z.is_infinite());
    let (errors, warnings) = validate_physical_ranges(&config);
    assert!(errors.is_empty(), "{errors:?}");
    assert!(warnings.is_empty());
}

#[test]
fn steep_delta_z_is_warning() {
    let mut config = minimal();
    config.delta_z = 2.0;
    let (errors, warnings) = validate_physical_ranges(&config);
    assert!(errors.is_empty());
    assert!(warnings.iter().any(|w| w.field == "delta_z"));
}

#[test]
fn threshold_outside_unit_interval_is_error() {
    let mut config = minimal();
    config.owc_definition.threshold = 1.2;
    let (errors, _) = validate_physical_ranges(&config);
    assert!(errors.iter().any(|e| e.contains("threshold")));
}

#[test]
fn per_wellpath_threshold_is_checked() {
    let mut config = minimal();
    config.wellpaths[0].owc_definition = Some(OwcDefinition {
        keyword: OwcKeyword::Swat,
        threshold: -0.5,
    });
    let (errors, _) = validate_physical_ranges(&config);
    assert!(
        errors.iter().any(|e| e.contains("wellpath[1]")),
        "{errors:?}"
    );
}

#[test]
fn large_offset_is_warning() {
    let mut config = minimal();
    config.owc_offset = 80.0;
    let (errors, warnings) = validate_physical_ranges(&config);
    assert!(errors.is_empty());
    assert!(warnings.iter().any(|w| w.field == "owc_offset"));
}

#[test]
fn zero_max_adjustment_is_error() {
    let mut config = minimal();
    config.max_vertical_adjustment = 0.0;
    assert!(config.validate().is_err());
}

#[test]
fn minimal_config_passes_validation() {
    assert!(minimal().validate().is_ok());
}

// ============================================================================
// Loading
// ============================================================================

#[test]
fn toml_and_keyword_formats_agree() {
    let dir = tempfile::tempdir().unwrap();
    let toml_path = dir.path().join("case.toml");
    let sc_path = dir.path().join("case.sc");
    std::fs::write(
        &toml_path,
        r#"
grid = "grid.json"
restart = "restart.json"
delta_z = 0.02
owc_offset = 1.5
owc_definition = { keyword = "SWAT", threshold = 0.6 }
logs = ["OWC", "LENGTH"]

[[wellpath]]
file = "a.w"
date = "2020-02-01"
anchor = { tvd = 1650.0 }
owc_offset = 0.25
"#,
    )
    .unwrap();
    std::fs::write(
        &sc_path,
        "\
GRID grid.json
RESTART restart.json
DELTA_Z 0.02
OWC_OFFSET 1.5
OWC_DEFINITION SWAT 0.6
LOG OWC
LOG LENGTH
WELLPATH a.w 2020-02-01 TVD 1650 OWC_OFFSET 0.25
",
    )
    .unwrap();

    let from_toml = SnapConfig::load_from_file(&toml_path).unwrap();
    let from_sc = SnapConfig::load_from_file(&sc_path).unwrap();
    assert_eq!(from_toml.grid, from_sc.grid);
    assert_eq!(from_toml.grid, Some(dir.path().join("grid.json")));
    assert_eq!(from_toml.wellpaths, from_sc.wellpaths);
    assert_eq!(from_toml.logs, from_sc.logs);
    assert_eq!(from_toml.owc_definition, from_sc.owc_definition);
    assert!((from_toml.delta_z - from_sc.delta_z).abs() < f64::EPSILON);
}

#[test]
fn missing_wellpaths_fail_validation_on_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("case.toml");
    std::fs::write(&path, "grid = \"g.json\"\nrestart = \"r.json\"\n").unwrap();
    match SnapConfig::load_from_file(&path) {
        Err(ConfigError::Validation(errors)) => {
            assert!(errors.iter().any(|e| e.contains("wellpaths")));
        }
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[test]
fn output_that_is_a_file_fails_validation() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("not_a_dir");
    std::fs::write(&file, "x").unwrap();
    let mut config = minimal();
    config.output = file;
    assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
}

#[test]
fn missing_config_file_is_io_error() {
    let err = SnapConfig::load_from_file(std::path::Path::new("/nonexistent/case.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::Io(..)));
}
