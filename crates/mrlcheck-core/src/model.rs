use crate::parsing::lenient;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Limit applied when no substance-specific MRL is published (0.01 mg/kg).
pub const DEFAULT_MRL_MG_KG: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

const MILLI: Decimal = Decimal::from_parts(1, 0, 0, false, 3);

/// Concentration units found on residue lab reports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Unit {
    #[serde(rename = "mg/kg")]
    #[default]
    MgPerKg,
    #[serde(rename = "ppm")]
    Ppm,
    #[serde(rename = "ppb")]
    Ppb,
    #[serde(rename = "µg/kg")]
    UgPerKg,
    #[serde(rename = "µg/g")]
    UgPerG,
    #[serde(rename = "ng/g")]
    NgPerG,
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Unit::MgPerKg => write!(f, "mg/kg"),
            Unit::Ppm => write!(f, "ppm"),
            Unit::Ppb => write!(f, "ppb"),
            Unit::UgPerKg => write!(f, "µg/kg"),
            Unit::UgPerG => write!(f, "µg/g"),
            Unit::NgPerG => write!(f, "ng/g"),
        }
    }
}

impl Unit {
    /// Recognize a unit string as printed on a report. Accepts both the
    /// micro sign and the greek mu, and a plain `u`.
    pub fn from_str_loose(s: &str) -> Option<Unit> {
        let lower = s.trim().to_lowercase().replace(['µ', 'μ'], "u");
        match lower.as_str() {
            "mg/kg" | "mg kg-1" | "mg.kg-1" => Some(Unit::MgPerKg),
            "ppm" => Some(Unit::Ppm),
            "ppb" => Some(Unit::Ppb),
            "ug/kg" | "ug kg-1" => Some(Unit::UgPerKg),
            "ug/g" => Some(Unit::UgPerG),
            "ng/g" => Some(Unit::NgPerG),
            _ => None,
        }
    }

    /// Multiplier that converts a value in this unit to mg/kg.
    pub fn mg_per_kg_factor(self) -> Decimal {
        match self {
            Unit::MgPerKg | Unit::Ppm | Unit::UgPerG => Decimal::ONE,
            Unit::Ppb | Unit::UgPerKg | Unit::NgPerG => MILLI,
        }
    }

    pub fn to_mg_kg(self, value: Decimal) -> Decimal {
        value * self.mg_per_kg_factor()
    }
}

/// Opaque identifier of a regulatory residue entry. The lookup service
/// hands out numeric ids, but text ids are accepted as well.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResidueId {
    Numeric(u64),
    Text(String),
}

impl fmt::Display for ResidueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResidueId::Numeric(id) => write!(f, "{id}"),
            ResidueId::Text(id) => write!(f, "{id}"),
        }
    }
}

fn default_unit() -> String {
    "mg/kg".to_string()
}

/// One row of a lab report as returned by OCR extraction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionRow {
    pub substance: String,
    /// Detected value in `unit`. Absent when the lab reported nothing
    /// quantifiable.
    #[serde(default, deserialize_with = "lenient::opt_decimal")]
    pub detected_value: Option<Decimal>,
    #[serde(default)]
    pub below_loq: bool,
    #[serde(default, deserialize_with = "lenient::opt_decimal")]
    pub loq_value: Option<Decimal>,
    #[serde(default = "default_unit")]
    pub unit: String,
    #[serde(default, deserialize_with = "lenient::opt_decimal")]
    pub confidence: Option<Decimal>,
    #[serde(default)]
    pub requires_validation: bool,
}

/// A residue lookup answer for one requested substance name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CandidateMatch {
    /// The substance name exactly as it was sent to the lookup.
    pub input_name: String,
    #[serde(default)]
    pub residue_id: Option<ResidueId>,
    #[serde(default)]
    pub residue_name: Option<String>,
    /// Applicable MRL in mg/kg for the product/residue pair, if published.
    #[serde(default, deserialize_with = "lenient::opt_decimal")]
    pub regulatory_limit: Option<Decimal>,
    #[serde(default)]
    pub limit_source: Option<LimitSource>,
}

/// Where an applicable limit came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LimitSource {
    /// A current MRL published for the product/residue pair.
    Regulatory,
    /// The residue was found but no current MRL is published.
    Default,
    /// No product was identified, so no product-specific MRL could be looked up.
    NoProductMatch,
}

impl LimitSource {
    pub fn is_fallback(self) -> bool {
        !matches!(self, LimitSource::Regulatory)
    }
}

impl fmt::Display for LimitSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LimitSource::Regulatory => write!(f, "EU Pesticides Database (current)"),
            LimitSource::Default => write!(f, "EU default 0.01 mg/kg"),
            LimitSource::NoProductMatch => write!(f, "Default (no product match)"),
        }
    }
}

/// A reconciled measurement, ready for scoring. Values are in mg/kg.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubstanceMeasurement {
    pub substance_name: String,
    #[serde(default)]
    pub residue_id: Option<ResidueId>,
    #[serde(deserialize_with = "lenient::decimal")]
    pub detected_value: Decimal,
    #[serde(deserialize_with = "lenient::decimal")]
    pub mrl_value: Decimal,
    /// True when `mrl_value` is the default limit rather than a published one.
    #[serde(default)]
    pub used_default_limit: bool,
    /// Limit of quantification of the lab method, in mg/kg.
    #[serde(default, deserialize_with = "lenient::opt_decimal")]
    pub loq_value: Option<Decimal>,
}

impl SubstanceMeasurement {
    pub fn new(
        substance_name: impl Into<String>,
        detected_value: Decimal,
        mrl_value: Decimal,
    ) -> Self {
        SubstanceMeasurement {
            substance_name: substance_name.into(),
            residue_id: None,
            detected_value,
            mrl_value,
            used_default_limit: false,
            loq_value: None,
        }
    }
}
