//! Shared value types for the snapping pipeline
//!
//! These are the small, strongly-typed records that flow between the config
//! layer, the reservoir model and the snap engine:
//! - `OwcDefinition`: which saturation keyword defines the contact, and at what threshold
//! - `DepthAnchor`: optional MD/TVD pin for one wellpath
//! - `LogKind`: the closed set of auxiliary log columns the engine can emit
//! - `ReportStepPolicy`: how a requested date maps onto restart report steps

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// OWC Definition
// ============================================================================

/// Restart keyword used to locate the fluid contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum OwcKeyword {
    /// Water saturation. Wet (water) side lies below the contact.
    #[default]
    Swat,
    /// Gas saturation. Gas cap lies above the contact.
    Sgas,
}

impl OwcKeyword {
    /// Restart keyword name as stored in report steps.
    pub const fn as_str(self) -> &'static str {
        match self {
            OwcKeyword::Swat => "SWAT",
            OwcKeyword::Sgas => "SGAS",
        }
    }

    /// Whether `value` lies on the deep side of the contact for this keyword.
    ///
    /// SWAT: deep side is `value >= threshold`.
    /// SGAS: deep side is `value < threshold` (gas accumulates on top).
    pub fn is_below_contact(self, value: f64, threshold: f64) -> bool {
        match self {
            OwcKeyword::Swat => value >= threshold,
            OwcKeyword::Sgas => value < threshold,
        }
    }
}

impl fmt::Display for OwcKeyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OwcKeyword {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "SWAT" => Ok(OwcKeyword::Swat),
            "SGAS" => Ok(OwcKeyword::Sgas),
            other => Err(format!(
                "unsupported OWC definition keyword '{other}' (expected SWAT or SGAS)"
            )),
        }
    }
}

/// Contact definition: keyword plus saturation threshold in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OwcDefinition {
    pub keyword: OwcKeyword,
    pub threshold: f64,
}

impl Default for OwcDefinition {
    fn default() -> Self {
        Self {
            keyword: OwcKeyword::Swat,
            threshold: crate::config::defaults::OWC_THRESHOLD,
        }
    }
}

impl fmt::Display for OwcDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:.3}", self.keyword, self.threshold)
    }
}

/// Parses the CLI form `SWAT:0.7`.
impl FromStr for OwcDefinition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (kw, value) = s
            .split_once(':')
            .ok_or_else(|| "owc definition is malformed: missing ':'".to_string())?;
        if value.contains(':') {
            return Err("owc definition is malformed: more than one ':'".to_string());
        }
        let keyword = kw.parse::<OwcKeyword>()?;
        let threshold = value
            .trim()
            .parse::<f64>()
            .map_err(|e| format!("owc definition is malformed: could not parse value '{value}': {e}"))?;
        Ok(Self { keyword, threshold })
    }
}

// ============================================================================
// Depth Anchor
// ============================================================================

/// Optional depth pin for one wellpath.
///
/// In TOML: `anchor = { md = 1500.0 }` or `anchor = { tvd = 1620.0 }`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DepthAnchor {
    #[default]
    None,
    Md(f64),
    Tvd(f64),
}

impl DepthAnchor {
    pub const fn is_none(&self) -> bool {
        matches!(self, DepthAnchor::None)
    }
}

impl fmt::Display for DepthAnchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DepthAnchor::None => write!(f, "none"),
            DepthAnchor::Md(v) => write!(f, "MD {v:.2}"),
            DepthAnchor::Tvd(v) => write!(f, "TVD {v:.2}"),
        }
    }
}

// ============================================================================
// Log Columns
// ============================================================================

/// Auxiliary log columns appended to snapped wellpaths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LogKind {
    #[serde(rename = "OWC")]
    Owc,
    #[serde(rename = "OLD_TVD")]
    OldTvd,
    #[serde(rename = "TVD_DIFF")]
    TvdDiff,
    #[serde(rename = "LENGTH")]
    Length,
    #[serde(rename = "SWAT")]
    Swat,
    #[serde(rename = "SGAS")]
    Sgas,
    #[serde(rename = "SOIL")]
    Soil,
    #[serde(rename = "PERMX")]
    Permx,
}

impl LogKind {
    pub const ALL: [LogKind; 8] = [
        LogKind::Owc,
        LogKind::OldTvd,
        LogKind::TvdDiff,
        LogKind::Length,
        LogKind::Swat,
        LogKind::Sgas,
        LogKind::Soil,
        LogKind::Permx,
    ];

    /// Column header written to the wellpath file.
    pub const fn header(self) -> &'static str {
        match self {
            LogKind::Owc => "OWC",
            LogKind::OldTvd => "OLD_TVD",
            LogKind::TvdDiff => "TVD_DIFF",
            LogKind::Length => "LENGTH",
            LogKind::Swat => "SWAT",
            LogKind::Sgas => "SGAS",
            LogKind::Soil => "SOIL",
            LogKind::Permx => "PERMX",
        }
    }
}

impl fmt::Display for LogKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.header())
    }
}

impl FromStr for LogKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_uppercase();
        LogKind::ALL
            .into_iter()
            .find(|k| k.header() == wanted)
            .ok_or_else(|| format!("unknown log keyword '{}'", s.trim()))
    }
}

// ============================================================================
// Report Step Selection
// ============================================================================

/// How a requested date is mapped onto the available restart report steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ReportStepPolicy {
    /// Latest step not after the date; earliest step if none precedes it.
    #[default]
    NearestPreceding,
    /// Step closest in time, ties resolved to the earlier step.
    Nearest,
}

impl fmt::Display for ReportStepPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportStepPolicy::NearestPreceding => write!(f, "nearest_preceding"),
            ReportStepPolicy::Nearest => write!(f, "nearest"),
        }
    }
}

// ============================================================================
// Dates
// ============================================================================

/// Parse a report date given as `YYYY`, `YYYY-MM` or `YYYY-MM-DD`.
///
/// Missing month/day default to 01.
pub fn parse_date(s: &str) -> Result<NaiveDate, String> {
    let s = s.trim();
    let parts: Vec<&str> = s.split('-').collect();
    let field = |idx: usize| -> Result<u32, String> {
        parts.get(idx).map_or(Ok(1), |p| {
            p.parse::<u32>()
                .map_err(|_| format!("invalid date component '{p}' in '{s}'"))
        })
    };
    if parts.is_empty() || parts.len() > 3 || parts[0].len() != 4 {
        return Err(format!(
            "provide a date on the form YYYY-MM-DD, YYYY-MM, or YYYY, not '{s}'"
        ));
    }
    let year = parts[0]
        .parse::<i32>()
        .map_err(|_| format!("invalid year in date '{s}'"))?;
    let month = field(1)?;
    let day = field(2)?;
    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| format!("date out of range: '{s}'"))
}

/// Serde adapter for dates written with `parse_date` granularity.
pub mod flexible_date {
    use super::{parse_date, Deserialize, Deserializer, NaiveDate, Serializer};

    pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&date.format("%Y-%m-%d").to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse_date(&raw).map_err(serde::de::Error::custom)
    }
}
