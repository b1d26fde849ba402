pub mod catalog;

use crate::error::MrlError;
use crate::model::{CandidateMatch, LimitSource, ResidueId};
use crate::parsing::{lenient, parse_mrl};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Residue entry as returned by the residue search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResidueRecord {
    #[serde(default, alias = "PESTICIDE_RESIDUE_ID")]
    pub pesticide_residue_id: Option<ResidueId>,
    #[serde(default, alias = "PESTICIDE_RESIDUE_NAME")]
    pub pesticide_residue_name: Option<String>,
}

/// MRL entry for a residue/product pair as returned by the MRL search.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MrlRecord {
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub mrl_value: Option<String>,
    /// Bare numeric MRL, preferred over `mrl_value` when present.
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub mrl_value_only: Option<String>,
    /// "1" marks a limit currently in force.
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub applicability: Option<String>,
    #[serde(default)]
    pub regulation_number: Option<String>,
}

impl MrlRecord {
    pub fn is_current(&self) -> bool {
        self.applicability.as_deref().map(str::trim) == Some("1")
    }

    pub fn numeric_value(&self) -> Option<Decimal> {
        self.mrl_value_only
            .as_deref()
            .or(self.mrl_value.as_deref())
            .and_then(parse_mrl)
    }
}

/// The limit chosen for one residue/product pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitResolution {
    /// Published limit in mg/kg; `None` when the default must be used.
    pub limit: Option<Decimal>,
    pub source: LimitSource,
}

/// Pick the applicable MRL: the lowest value among the limits currently in
/// force. Superseded or unparseable records are ignored.
pub fn resolve_limit(records: &[MrlRecord]) -> LimitResolution {
    let lowest = records
        .iter()
        .filter(|r| r.is_current())
        .filter_map(MrlRecord::numeric_value)
        .min();

    match lowest {
        Some(limit) => LimitResolution {
            limit: Some(limit),
            source: LimitSource::Regulatory,
        },
        None => LimitResolution {
            limit: None,
            source: LimitSource::Default,
        },
    }
}

/// Build the candidate for one requested name from lookup answers.
///
/// Returns `None` when the residue search found nothing. The first residue
/// hit is taken. Without a product id, or without a residue id, no
/// product-specific limit can be looked up.
pub fn candidate_from_lookup(
    input_name: &str,
    residues: &[ResidueRecord],
    product_known: bool,
    mrls: &[MrlRecord],
) -> Option<CandidateMatch> {
    let residue = residues.first()?;

    let resolution = if product_known && residue.pesticide_residue_id.is_some() {
        resolve_limit(mrls)
    } else {
        LimitResolution {
            limit: None,
            source: LimitSource::NoProductMatch,
        }
    };

    Some(CandidateMatch {
        input_name: input_name.to_string(),
        residue_id: residue.pesticide_residue_id.clone(),
        residue_name: residue.pesticide_residue_name.clone(),
        regulatory_limit: resolution.limit,
        limit_source: Some(resolution.source),
    })
}

/// The residue/MRL lookup service, seen from the engine.
pub trait ResidueLookup: Send + Sync {
    /// Look up every substance name, optionally for one product code.
    /// Names the service cannot resolve are simply absent from the answer.
    fn multi_search(
        &self,
        substances: &[String],
        product_code: Option<&str>,
    ) -> Result<Vec<CandidateMatch>, MrlError>;

    /// Name of this lookup backend (for diagnostics).
    fn backend_name(&self) -> &str;
}
