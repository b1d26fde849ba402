use crate::model::SubstanceMeasurement;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Per-substance compliance level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Classification {
    Safe,
    Vigilance,
    Critical,
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Classification::Safe => write!(f, "SAFE"),
            Classification::Vigilance => write!(f, "VIGILANCE"),
            Classification::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// Scoring of one (detected, limit) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Score {
    /// detected / limit, rounded to 4 decimals.
    pub ratio: Decimal,
    /// True iff the detected value strictly exceeds the limit.
    pub hard_fail: bool,
    /// Headroom score in [0, 100], rounded to 1 decimal.
    pub score: Decimal,
    pub classification: Classification,
}

/// Compliance result for one substance of a lot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceResult {
    /// The measurement this result was computed from.
    pub measurement: SubstanceMeasurement,
    pub ratio: Decimal,
    pub hard_fail: bool,
    pub score: Decimal,
    pub classification: Classification,
    /// The lab LOQ lies above the MRL, so a non-detect does not demonstrate
    /// compliance. Informational; the verdict fields ignore it.
    #[serde(default)]
    pub loq_above_mrl: bool,
    /// Human-readable explanation of the result.
    pub reason: String,
}

impl ComplianceResult {
    pub fn substance_name(&self) -> &str {
        &self.measurement.substance_name
    }
}

/// Lot-level export status. Ordered so that the worst status is the maximum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LotStatus {
    Safe,
    Vigilance,
    Critical,
}

impl LotStatus {
    /// Decision sentence shown for this status.
    pub fn label(self) -> &'static str {
        match self {
            LotStatus::Critical => "REJECTED - non-compliant for export",
            LotStatus::Vigilance => "VIGILANCE - at-risk product",
            LotStatus::Safe => "COMPLIANT - exportable product",
        }
    }
}

impl fmt::Display for LotStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LotStatus::Safe => write!(f, "SAFE"),
            LotStatus::Vigilance => write!(f, "VIGILANCE"),
            LotStatus::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// Single export decision across all substances of a lot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LotDecision {
    pub status: LotStatus,
    pub label: String,
    /// Substances whose result sets the status, sorted by name.
    pub determining_substances: Vec<String>,
}

/// A measurement that could not be scored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubstanceFailure {
    pub substance: String,
    pub reason: String,
}

/// Everything produced by evaluating one lot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LotEvaluation {
    pub results: Vec<ComplianceResult>,
    /// Measurements rejected as invalid input.
    pub failures: Vec<SubstanceFailure>,
    /// Requested substances without a residue match.
    pub unresolved: Vec<String>,
    /// Decision over `results`; absent when nothing could be scored.
    pub decision: Option<LotDecision>,
}

impl LotEvaluation {
    /// True when every requested substance was matched and scored.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty() && self.unresolved.is_empty()
    }
}

/// Result list and decision after editing one measurement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LotUpdate {
    pub results: Vec<ComplianceResult>,
    pub decision: Option<LotDecision>,
}
