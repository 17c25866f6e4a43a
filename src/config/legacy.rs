//! Keyword-format config reader.
//!
//! One keyword per line followed by its arguments; a token starting with `--`
//! begins a comment. `--` inside a path is kept.
//!
//! ```text
//! GRID       model/grid.json
//! RESTART    model/restart.json
//! OWC_OFFSET 0.5
//! OWC_DEFINITION SWAT 0.7
//! LOG OWC
//! WELLPATH wells/a.w 2020-01-01 MD 1500 OWC_OFFSET 0.2
//! ```
//!
//! Per-wellpath `OWC_DEFINITION` takes a threshold only; the keyword comes
//! from the global definition.

use std::path::{Path, PathBuf};

use super::validation::suggest_correction;
use super::{ConfigError, SnapConfig, WellPathEntry};
use crate::types::{parse_date, DepthAnchor, LogKind, OwcDefinition, OwcKeyword};

const KEYWORDS: &[&str] = &[
    "GRID",
    "RESTART",
    "INIT",
    "OUTPUT",
    "OVERWRITE",
    "OWC_OFFSET",
    "DELTA_Z",
    "OWC_DEFINITION",
    "LOG",
    "WELLPATH",
];

const WELLPATH_SETTINGS: &[&str] = &["MD", "TVD", "OWC_OFFSET", "OWC_DEFINITION"];

/// Per-entry threshold override, bound to the global keyword once every line
/// has been read.
struct PendingEntry {
    entry: WellPathEntry,
    threshold: Option<f64>,
}

/// Parse keyword-format `contents`. Paths are kept as written.
pub fn parse(contents: &str, path: &Path) -> Result<SnapConfig, ConfigError> {
    let err = |line: usize, message: String| ConfigError::Keyword {
        path: path.to_path_buf(),
        line,
        message,
    };

    let mut config = SnapConfig::default();
    let mut pending: Vec<PendingEntry> = Vec::new();

    for (idx, raw) in contents.lines().enumerate() {
        let line_no = idx + 1;
        let tokens: Vec<&str> = raw
            .split_whitespace()
            .take_while(|t| !t.starts_with("--"))
            .collect();
        if tokens.is_empty() {
            continue;
        }
        let (keyword, args) = (tokens[0].to_ascii_uppercase(), &tokens[1..]);

        let single = |what: &str| single_arg(args, what).map_err(|m| err(line_no, m));
        let float = |what: &str, token: &str| -> Result<f64, ConfigError> {
            token
                .parse::<f64>()
                .map_err(|e| err(line_no, format!("{what}: could not parse '{token}': {e}")))
        };

        match keyword.as_str() {
            "GRID" => config.grid = Some(PathBuf::from(single("GRID")?)),
            "RESTART" => config.restart = Some(PathBuf::from(single("RESTART")?)),
            "INIT" => config.init = Some(PathBuf::from(single("INIT")?)),
            "OUTPUT" => config.output = PathBuf::from(single("OUTPUT")?),
            "OVERWRITE" => {
                config.overwrite = single("OVERWRITE")?.eq_ignore_ascii_case("true");
            }
            "OWC_OFFSET" => config.owc_offset = float("OWC_OFFSET", single("OWC_OFFSET")?)?,
            "DELTA_Z" => config.delta_z = float("DELTA_Z", single("DELTA_Z")?)?,
            "OWC_DEFINITION" => {
                let [kw, value] = args else {
                    return Err(err(
                        line_no,
                        format!(
                            "OWC_DEFINITION needs a keyword and a value, e.g. SWAT 0.7, got {}",
                            args.join(" ")
                        ),
                    ));
                };
                config.owc_definition = OwcDefinition {
                    keyword: kw.parse::<OwcKeyword>().map_err(|m| err(line_no, m))?,
                    threshold: float("OWC_DEFINITION", *value)?,
                };
            }
            "LOG" => {
                if args.is_empty() {
                    return Err(err(line_no, "LOG needs at least one log keyword".to_string()));
                }
                for token in args {
                    let kind = token.parse::<LogKind>().map_err(|m| {
                        let known = LogKind::ALL.iter().map(|k| k.header()).collect();
                        match suggest_correction(&token.to_ascii_uppercase(), &known) {
                            Some(s) => err(line_no, format!("{m} (did you mean '{s}'?)")),
                            None => err(line_no, m),
                        }
                    })?;
                    config.logs.push(kind);
                }
            }
            "WELLPATH" => pending.push(parse_wellpath(args, line_no, &err)?),
            other => {
                let known = KEYWORDS.iter().copied().collect();
                let message = match suggest_correction(other, &known) {
                    Some(s) => format!("unknown keyword '{other}' (did you mean '{s}'?)"),
                    None => format!("unknown keyword '{other}'"),
                };
                return Err(err(line_no, message));
            }
        }
    }

    let keyword = config.owc_definition.keyword;
    config.wellpaths = pending
        .into_iter()
        .map(|p| {
            let mut entry = p.entry;
            entry.owc_definition = p.threshold.map(|threshold| OwcDefinition { keyword, threshold });
            entry
        })
        .collect();
    Ok(config)
}

fn single_arg<'a>(args: &[&'a str], keyword: &str) -> Result<&'a str, String> {
    match args {
        [value] => Ok(*value),
        _ => Err(format!(
            "{keyword} takes exactly one argument, got {}",
            args.len()
        )),
    }
}

/// `WELLPATH <file> <date> [KEY value]...`
fn parse_wellpath(
    args: &[&str],
    line_no: usize,
    err: &dyn Fn(usize, String) -> ConfigError,
) -> Result<PendingEntry, ConfigError> {
    let [file, date, settings @ ..] = args else {
        return Err(err(
            line_no,
            "WELLPATH needs a file and a date".to_string(),
        ));
    };
    if settings.len() % 2 != 0 {
        return Err(err(
            line_no,
            format!(
                "WELLPATH settings come in KEY value pairs, got {} tokens",
                settings.len()
            ),
        ));
    }
    let date = parse_date(date).map_err(|m| err(line_no, m))?;
    let mut pending = PendingEntry {
        entry: WellPathEntry::new(*file, date),
        threshold: None,
    };

    let mut seen: Vec<String> = Vec::new();
    for pair in settings.chunks_exact(2) {
        let key = pair[0].to_ascii_uppercase();
        if seen.contains(&key) {
            return Err(err(line_no, format!("WELLPATH setting {key} given twice")));
        }
        let value = pair[1]
            .parse::<f64>()
            .map_err(|e| err(line_no, format!("{key}: could not parse '{}': {e}", pair[1])))?;
        match key.as_str() {
            "MD" | "TVD" if !pending.entry.anchor.is_none() => {
                return Err(err(
                    line_no,
                    "WELLPATH takes at most one of MD and TVD".to_string(),
                ));
            }
            "MD" => pending.entry.anchor = DepthAnchor::Md(value),
            "TVD" => pending.entry.anchor = DepthAnchor::Tvd(value),
            "OWC_OFFSET" => pending.entry.owc_offset = Some(value),
            "OWC_DEFINITION" => pending.threshold = Some(value),
            other => {
                let known = WELLPATH_SETTINGS.iter().copied().collect();
                let message = match suggest_correction(other, &known) {
                    Some(s) => format!("unknown WELLPATH setting '{other}' (did you mean '{s}'?)"),
                    None => format!("unknown WELLPATH setting '{other}'"),
                };
                return Err(err(line_no, message));
            }
        }
        seen.push(key);
    }
    Ok(pending)
}
