//! Property Store
//!
//! Time-dependent (restart) and static (init) per-cell property arrays,
//! keyed by the grid's global cell index.
//!
//! Restart data is a sequence of report steps strictly ordered by date. A
//! requested date is mapped onto one step according to a `ReportStepPolicy`.
//! Inactive cells are masked to NaN when the store is bound to a grid, so
//! they can never be picked up as a contact or a log value.

use crate::types::ReportStepPolicy;
use chrono::NaiveDate;
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum PropertyError {
    #[error("keyword {keyword} not found in report step {date}")]
    KeywordNotFound { keyword: String, date: NaiveDate },

    #[error("static keyword {0} not found in init archive")]
    StaticKeywordNotFound(String),

    #[error("restart archive has no report steps")]
    NoReportSteps,

    #[error("report steps must be strictly ordered by date: {previous} is followed by {next}")]
    UnorderedSteps { previous: NaiveDate, next: NaiveDate },

    #[error("keyword {keyword} has {actual} values, grid has {expected} cells")]
    LengthMismatch {
        keyword: String,
        expected: usize,
        actual: usize,
    },
}

/// One simulator snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportStep {
    pub date: NaiveDate,
    pub keywords: BTreeMap<String, Vec<f64>>,
}

impl ReportStep {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            keywords: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_keyword(mut self, keyword: &str, values: Vec<f64>) -> Self {
        self.keywords.insert(keyword.to_ascii_uppercase(), values);
        self
    }
}

/// Read-only restart + init property archive.
#[derive(Debug, Clone)]
pub struct PropertyStore {
    steps: Vec<ReportStep>,
    statics: BTreeMap<String, Vec<f64>>,
    policy: ReportStepPolicy,
}

impl PropertyStore {
    /// Create a store from restart report steps.
    ///
    /// Steps must be strictly increasing in date.
    pub fn new(steps: Vec<ReportStep>) -> Result<Self, PropertyError> {
        if steps.is_empty() {
            return Err(PropertyError::NoReportSteps);
        }
        for pair in steps.windows(2) {
            if pair[1].date <= pair[0].date {
                return Err(PropertyError::UnorderedSteps {
                    previous: pair[0].date,
                    next: pair[1].date,
                });
            }
        }
        Ok(Self {
            steps,
            statics: BTreeMap::new(),
            policy: ReportStepPolicy::default(),
        })
    }

    /// Attach static (INIT) properties such as PERMX.
    #[must_use]
    pub fn with_statics(mut self, statics: BTreeMap<String, Vec<f64>>) -> Self {
        self.statics = statics
            .into_iter()
            .map(|(k, v)| (k.to_ascii_uppercase(), v))
            .collect();
        self
    }

    #[must_use]
    pub const fn with_policy(mut self, policy: ReportStepPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub const fn policy(&self) -> ReportStepPolicy {
        self.policy
    }

    pub fn has_statics(&self) -> bool {
        !self.statics.is_empty()
    }

    pub fn steps(&self) -> &[ReportStep] {
        &self.steps
    }

    /// Validate array lengths against the grid and set inactive cells to NaN.
    pub fn bind_to_grid(mut self, active: &[bool]) -> Result<Self, PropertyError> {
        let expected = active.len();
        let arrays = self
            .steps
            .iter_mut()
            .flat_map(|s| s.keywords.iter_mut())
            .chain(self.statics.iter_mut());
        for (keyword, values) in arrays {
            if values.len() != expected {
                return Err(PropertyError::LengthMismatch {
                    keyword: keyword.clone(),
                    expected,
                    actual: values.len(),
                });
            }
            for (v, &is_active) in values.iter_mut().zip(active) {
                if !is_active {
                    *v = f64::NAN;
                }
            }
        }
        Ok(self)
    }

    /// Index of the report step used for `date` under the store's policy.
    pub fn step_index(&self, date: NaiveDate) -> usize {
        match self.policy {
            ReportStepPolicy::NearestPreceding => self
                .steps
                .iter()
                .rposition(|s| s.date <= date)
                .unwrap_or(0),
            ReportStepPolicy::Nearest => {
                let mut best = 0;
                let mut best_gap = i64::MAX;
                for (idx, step) in self.steps.iter().enumerate() {
                    let gap = (step.date - date).num_days().abs();
                    if gap < best_gap {
                        best = idx;
                        best_gap = gap;
                    }
                }
                best
            }
        }
    }

    /// Date of the report step selected for `date`.
    pub fn step_date(&self, date: NaiveDate) -> NaiveDate {
        self.steps[self.step_index(date)].date
    }

    /// Per-cell values of `keyword` at the step selected for `date`.
    pub fn values_at_date(&self, date: NaiveDate, keyword: &str) -> Result<&[f64], PropertyError> {
        let step = &self.steps[self.step_index(date)];
        step.keywords
            .get(&keyword.to_ascii_uppercase())
            .map(Vec::as_slice)
            .ok_or_else(|| PropertyError::KeywordNotFound {
                keyword: keyword.to_string(),
                date: step.date,
            })
    }

    /// Static per-cell values from the init archive.
    pub fn static_values(&self, keyword: &str) -> Result<&[f64], PropertyError> {
        self.statics
            .get(&keyword.to_ascii_uppercase())
            .map(Vec::as_slice)
            .ok_or_else(|| PropertyError::StaticKeywordNotFound(keyword.to_string()))
    }
}
