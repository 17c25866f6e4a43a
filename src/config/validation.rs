//! Config validation: unknown-key detection with Levenshtein suggestions
//! and physical range checks.
//!
//! Two-pass parse approach: first deserialize raw TOML into `toml::Value`,
//! walk the key tree, compare against known field names, and emit warnings
//! with "did you mean?" suggestions. Then proceed with normal serde
//! deserialization. Unknown keys only warn; range violations are errors.

use std::collections::HashSet;

/// A non-fatal config warning (typo, suspicious value).
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub field: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(ref s) = self.suggestion {
            write!(f, " (did you mean '{s}'?)")?;
        }
        Ok(())
    }
}

// ============================================================================
// Known Config Keys
// ============================================================================

/// Returns the complete set of valid dotted key paths for `SnapConfig`.
///
/// Maintained by hand to match the struct hierarchy in snap_config.rs.
/// Entries of the `[[wellpath]]` array share one key path per field.
pub fn known_config_keys() -> HashSet<&'static str> {
    let keys: &[&str] = &[
        // input / output
        "grid",
        "restart",
        "init",
        "output",
        "overwrite",
        // snapping
        "delta_z",
        "owc_offset",
        "owc_definition",
        "owc_definition.keyword",
        "owc_definition.threshold",
        "logs",
        "report_step_policy",
        "max_vertical_adjustment",
        "avoid_even_depths",
        // [[wellpath]]
        "wellpath",
        "wellpath.file",
        "wellpath.date",
        "wellpath.anchor",
        "wellpath.anchor.md",
        "wellpath.anchor.tvd",
        "wellpath.owc_offset",
        "wellpath.owc_definition",
        "wellpath.owc_definition.keyword",
        "wellpath.owc_definition.threshold",
    ];
    keys.iter().copied().collect()
}

// ============================================================================
// TOML Key Walking
// ============================================================================

/// Recursively walks a `toml::Value` tree and collects all dotted key paths.
///
/// For example, a table `{ a = { b = 1, c = 2 } }` yields:
/// `["a", "a.b", "a.c"]`. Arrays of tables contribute their fields under the
/// array's own path, without indices.
pub fn walk_toml_keys(value: &toml::Value, prefix: &str) -> Vec<String> {
    let mut keys = Vec::new();
    if let Some(table) = value.as_table() {
        for (k, v) in table {
            let path = if prefix.is_empty() {
                k.clone()
            } else {
                format!("{prefix}.{k}")
            };
            keys.push(path.clone());
            match v {
                toml::Value::Table(_) => keys.extend(walk_toml_keys(v, &path)),
                toml::Value::Array(items) => {
                    for item in items.iter().filter(|i| i.is_table()) {
                        for key in walk_toml_keys(item, &path) {
                            if !keys.contains(&key) {
                                keys.push(key);
                            }
                        }
                    }
                }
                _ => {}
            }
        }
    }
    keys
}

// ============================================================================
// Levenshtein Distance
// ============================================================================

/// Compute the Levenshtein edit distance between two strings.
fn levenshtein(a: &str, b: &str) -> usize {
    let b_len = b.chars().count();
    if a.is_empty() {
        return b_len;
    }
    if b_len == 0 {
        return a.chars().count();
    }

    let mut prev: Vec<usize> = (0..=b_len).collect();
    let mut curr = vec![0; b_len + 1];

    for (i, ca) in a.chars().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.chars().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b_len]
}

/// Suggest the closest known key for an unknown key, if within edit distance 3.
///
/// Ties resolve to the alphabetically first candidate.
pub fn suggest_correction(unknown: &str, known: &HashSet<&str>) -> Option<String> {
    let mut candidates: Vec<&str> = known.iter().copied().collect();
    candidates.sort_unstable();
    let mut best: Option<(&str, usize)> = None;
    for k in candidates {
        let dist = levenshtein(unknown, k);
        if dist <= 3 && best.map_or(true, |(_, best_dist)| dist < best_dist) {
            best = Some((k, dist));
        }
    }
    best.map(|(k, _)| k.to_string())
}

// ============================================================================
// Unknown Key Validation (entry point)
// ============================================================================

/// Parse a raw TOML string and return warnings for any unknown config keys.
///
/// This does NOT fail on unknown keys; it only warns.
pub fn validate_unknown_keys(raw_toml: &str) -> Vec<ValidationWarning> {
    let value: toml::Value = match raw_toml.parse() {
        Ok(v) => v,
        Err(_) => return Vec::new(), // parse errors are handled by serde later
    };

    let known = known_config_keys();
    walk_toml_keys(&value, "")
        .into_iter()
        .filter(|key| !known.contains(key.as_str()))
        .map(|key| {
            let suggestion = suggest_correction(&key, &known);
            ValidationWarning {
                message: format!("Unknown config key '{key}'"),
                field: key,
                suggestion,
            }
        })
        .collect()
}

// ============================================================================
// Physical Range Validation
// ============================================================================

/// Validate physical ranges on a parsed `SnapConfig`.
///
/// Returns (errors, warnings): errors are impossible values that must
/// prevent a run; warnings are suspicious but not fatal.
pub fn validate_physical_ranges(
    config: &super::SnapConfig,
) -> (Vec<String>, Vec<ValidationWarning>) {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    // delta_z: a slope; negative or NaN makes no sense, +inf means unconstrained
    if config.delta_z.is_nan() || config.delta_z < 0.0 {
        errors.push(format!("delta_z = {} must be >= 0 (or inf)", config.delta_z));
    } else if config.delta_z.is_finite() && config.delta_z > 1.0 {
        warnings.push(ValidationWarning {
            field: "delta_z".to_string(),
            message: format!(
                "delta_z = {:.4} allows more than 45 degrees of vertical change, usual values are 0.01-0.05",
                config.delta_z
            ),
            suggestion: None,
        });
    }

    if config.max_vertical_adjustment.is_nan() || config.max_vertical_adjustment <= 0.0 {
        errors.push(format!(
            "max_vertical_adjustment = {} must be > 0 (or inf to disable)",
            config.max_vertical_adjustment
        ));
    }

    check_owc_definition(&config.owc_definition, "owc_definition", &mut errors);
    check_offset(config.owc_offset, "owc_offset", &mut errors, &mut warnings);

    for (idx, entry) in config.wellpaths.iter().enumerate() {
        let name = format!("wellpath[{}] ({})", idx + 1, entry.file.display());
        if let Some(def) = &entry.owc_definition {
            check_owc_definition(def, &format!("{name}.owc_definition"), &mut errors);
        }
        if let Some(offset) = entry.owc_offset {
            check_offset(offset, &format!("{name}.owc_offset"), &mut errors, &mut warnings);
        }
        match entry.anchor {
            crate::types::DepthAnchor::Md(v) | crate::types::DepthAnchor::Tvd(v) if !v.is_finite() => {
                errors.push(format!("{name}.anchor must be a finite depth, got {v}"));
            }
            _ => {}
        }
    }

    (errors, warnings)
}

fn check_owc_definition(def: &crate::types::OwcDefinition, field: &str, errors: &mut Vec<String>) {
    if !(0.0..=1.0).contains(&def.threshold) {
        errors.push(format!(
            "{field}: threshold {} for {} is outside [0, 1]",
            def.threshold, def.keyword
        ));
    }
}

fn check_offset(
    offset: f64,
    field: &str,
    errors: &mut Vec<String>,
    warnings: &mut Vec<ValidationWarning>,
) {
    if !offset.is_finite() {
        errors.push(format!("{field} = {offset} must be a finite number of metres"));
    } else if offset.abs() > 50.0 {
        warnings.push(ValidationWarning {
            field: field.to_string(),
            message: format!("{field} = {offset:.2} m is unusually far from the contact"),
            suggestion: None,
        });
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levenshtein_identical() {
        assert_eq!(levenshtein("delta_z", "delta_z"), 0);
    }

    #[test]
    fn test_levenshtein_one_edit() {
        assert_eq!(levenshtein("owc_ofset", "owc_offset"), 1);
    }

    #[test]
    fn test_levenshtein_empty() {
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("abc", ""), 3);
    }

    #[test]
    fn test_walk_toml_keys_flat() {
        let toml: toml::Value = r#"
            grid = "a.json"
            overwrite = true
        "#
        .parse()
        .unwrap();
        let keys = walk_toml_keys(&toml, "");
        assert!(keys.contains(&"grid".to_string()));
        assert!(keys.contains(&"overwrite".to_string()));
    }

    #[test]
    fn test_walk_toml_keys_array_of_tables() {
        let toml: toml::Value = r#"
            [[wellpath]]
            file = "a.w"
            date = "2020"

            [[wellpath]]
            file = "b.w"
            date = "2021"
            anchor = { md = 1500.0 }
        "#
        .parse()
        .unwrap();
        let keys = walk_toml_keys(&toml, "");
        assert!(keys.contains(&"wellpath".to_string()));
        assert!(keys.contains(&"wellpath.anchor.md".to_string()));
        assert_eq!(keys.iter().filter(|k| *k == "wellpath.file").count(), 1);
    }

    #[test]
    fn test_suggest_correction() {
        let known = known_config_keys();
        assert_eq!(suggest_correction("detla_z", &known).as_deref(), Some("delta_z"));
        assert!(suggest_correction("completely_unrelated_key", &known).is_none());
    }

    #[test]
    fn test_unknown_wellpath_key_warns() {
        let warnings = validate_unknown_keys(
            r#"
            grid = "g.json"
            restart = "r.json"
            [[wellpath]]
            file = "a.w"
            date = "2020"
            owc_offest = 0.3
            "#,
        );
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].field, "wellpath.owc_offest");
        assert_eq!(warnings[0].suggestion.as_deref(), Some("wellpath.owc_offset"));
    }
}
