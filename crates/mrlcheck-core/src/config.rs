use crate::error::MrlError;
use crate::model::DEFAULT_MRL_MG_KG;
use crate::parsing::lenient;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Confidence below which an extracted row should be checked by a person.
pub const DEFAULT_VALIDATION_CONFIDENCE: Decimal = Decimal::from_parts(95, 0, 0, false, 2);

/// How extracted substance names are compared with requested names.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    /// Byte-for-byte equality.
    #[default]
    Exact,
    /// Equality after case folding, diacritic stripping and separator collapse.
    Normalized,
}

impl MatchMode {
    pub fn from_str_loose(s: &str) -> Option<MatchMode> {
        match s.trim().to_lowercase().as_str() {
            "exact" => Some(MatchMode::Exact),
            "normalized" | "normalised" => Some(MatchMode::Normalized),
            _ => None,
        }
    }
}

fn default_limit() -> Decimal {
    DEFAULT_MRL_MG_KG
}

fn default_validation_confidence() -> Decimal {
    DEFAULT_VALIDATION_CONFIDENCE
}

fn default_true() -> bool {
    true
}

/// Knobs for a lot evaluation. Every field has a default, so `{}` is a
/// valid options file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationOptions {
    /// Limit in mg/kg used when no substance-specific MRL is available.
    #[serde(default = "default_limit", deserialize_with = "lenient::decimal")]
    pub default_limit: Decimal,
    #[serde(default)]
    pub matching: MatchMode,
    /// Flag measurements whose LOQ lies above the MRL.
    #[serde(default = "default_true")]
    pub loq_check: bool,
    #[serde(
        default = "default_validation_confidence",
        deserialize_with = "lenient::decimal"
    )]
    pub validation_confidence: Decimal,
}

impl Default for EvaluationOptions {
    fn default() -> Self {
        EvaluationOptions {
            default_limit: DEFAULT_MRL_MG_KG,
            matching: MatchMode::Exact,
            loq_check: true,
            validation_confidence: DEFAULT_VALIDATION_CONFIDENCE,
        }
    }
}

/// Load evaluation options from a JSON file.
pub fn load_options(path: &Path) -> Result<EvaluationOptions, MrlError> {
    let content = std::fs::read_to_string(path).map_err(|e| MrlError::ConfigLoad {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    let options: EvaluationOptions =
        serde_json::from_str(&content).map_err(|e| MrlError::ConfigLoad {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
    validate_options(&options).map_err(|e| MrlError::ConfigLoad {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    Ok(options)
}

/// Parse evaluation options from a JSON string (no file path context).
pub fn parse_options_str(json: &str) -> Result<EvaluationOptions, MrlError> {
    let options: EvaluationOptions = serde_json::from_str(json)?;
    validate_options(&options)?;
    Ok(options)
}

pub fn validate_options(options: &EvaluationOptions) -> Result<(), MrlError> {
    if options.default_limit <= Decimal::ZERO {
        return Err(MrlError::InvalidInput(format!(
            "default_limit must be positive, got {}",
            options.default_limit
        )));
    }
    if options.validation_confidence < Decimal::ZERO
        || options.validation_confidence > Decimal::ONE
    {
        return Err(MrlError::InvalidInput(format!(
            "validation_confidence must be within [0, 1], got {}",
            options.validation_confidence
        )));
    }
    Ok(())
}
