use crate::error::MrlError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// A concentration as written on a lab report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportedValue {
    Quantified(Decimal),
    /// Below the limit of quantification. Carries the LOQ when the report
    /// prints one (e.g. "< 0.01").
    BelowLoq(Option<Decimal>),
}

impl ReportedValue {
    /// Value used for scoring: below-LOQ reports count as zero.
    pub fn scoring_value(&self) -> Decimal {
        match self {
            ReportedValue::Quantified(v) => *v,
            ReportedValue::BelowLoq(_) => Decimal::ZERO,
        }
    }

    pub fn is_below_loq(&self) -> bool {
        matches!(self, ReportedValue::BelowLoq(_))
    }
}

const NOT_DETECTED: &[&str] = &[
    "nd",
    "n.d.",
    "n.d",
    "not detected",
    "non détecté",
    "non detecte",
    "< loq",
    "<loq",
    "loq",
];

/// Parse a value string from a residue lab report.
///
/// Handles formats like:
/// - "0.05" -> Quantified(0.05)
/// - "0,05" -> Quantified(0.05) (decimal comma)
/// - "< 0.01" -> BelowLoq(Some(0.01))
/// - "<LOQ", "nd", "non détecté" -> BelowLoq(None)
/// - "-", "—", "N/A" or empty -> None
pub fn parse_value(s: &str) -> Result<Option<ReportedValue>, MrlError> {
    let s = s.trim();

    if s.is_empty() || s == "-" || s == "—" || s.eq_ignore_ascii_case("n/a") {
        return Ok(None);
    }

    let lower = s.to_lowercase();
    if NOT_DETECTED.contains(&lower.as_str()) {
        return Ok(Some(ReportedValue::BelowLoq(None)));
    }

    if let Some(rest) = s.strip_prefix('<') {
        let loq = parse_decimal(rest)?;
        return Ok(Some(ReportedValue::BelowLoq(Some(loq))));
    }

    let decimal = parse_decimal(s)?;
    Ok(Some(ReportedValue::Quantified(decimal)))
}

/// Parse a published MRL value. Footnote markers (`*`) and comparison
/// signs are stripped; placeholders mean "no value".
pub fn parse_mrl(s: &str) -> Option<Decimal> {
    let s = s.trim();
    if s.is_empty() || s == "—" || s.eq_ignore_ascii_case("n/a") {
        return None;
    }
    let cleaned: String = s.chars().filter(|c| !matches!(c, '*' | '<' | '>')).collect();
    parse_decimal(&cleaned).ok()
}

/// Parse a decimal value, accepting a decimal comma and scientific notation.
pub fn parse_decimal(s: &str) -> Result<Decimal, MrlError> {
    let s = s.trim();
    let normalized = s.replace(',', ".");
    Decimal::from_str(&normalized)
        .or_else(|_| Decimal::from_scientific(&normalized))
        .map_err(|e| MrlError::ParseError(format!("invalid number '{}': {}", s, e)))
}
