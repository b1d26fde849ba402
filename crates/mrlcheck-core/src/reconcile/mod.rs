pub mod matcher;

use crate::model::{CandidateMatch, ExtractionRow, SubstanceMeasurement, Unit};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub use matcher::{matcher_for, ExactMatcher, NormalizedMatcher, SubstanceMatcher};

/// Output of reconciliation: one measurement per resolved substance, in
/// request order, plus the requested names the lookup could not resolve.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Reconciliation {
    pub measurements: Vec<SubstanceMeasurement>,
    pub unresolved: Vec<String>,
}

/// Merge lookup candidates and extracted rows into measurements.
///
/// Candidates are keyed by the exact name sent to the lookup. Extracted rows
/// are paired through `matcher`; the first matching row wins. A requested
/// name without a candidate is reported in `unresolved`, never scored.
pub fn reconcile(
    requested: &[String],
    candidates: &[CandidateMatch],
    rows: &[ExtractionRow],
    matcher: &dyn SubstanceMatcher,
    default_limit: Decimal,
) -> Reconciliation {
    let mut out = Reconciliation::default();

    for name in requested {
        let Some(candidate) = candidates.iter().find(|c| c.input_name == *name) else {
            tracing::warn!(substance = %name, "no residue match; substance not evaluated");
            out.unresolved.push(name.clone());
            continue;
        };

        let row = rows.iter().find(|r| matcher.matches(name, &r.substance));
        let (detected_value, loq_value) = match row {
            Some(row) => row_values(row),
            None => {
                tracing::debug!(substance = %name, "no extracted row; detected value set to 0");
                (Decimal::ZERO, None)
            }
        };

        let fallback = candidate.limit_source.is_some_and(|s| s.is_fallback());
        let (mrl_value, used_default_limit) = match candidate.regulatory_limit {
            Some(limit) => (limit, fallback),
            None => (default_limit, true),
        };
        if used_default_limit {
            tracing::warn!(
                substance = %name,
                limit = %mrl_value,
                "no published MRL; using default limit"
            );
        }

        let substance_name = candidate
            .residue_name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(name.as_str())
            .to_string();

        tracing::debug!(
            requested = %name,
            substance = %substance_name,
            detected = %detected_value,
            mrl = %mrl_value,
            matcher = matcher.name(),
            "reconciled substance"
        );

        out.measurements.push(SubstanceMeasurement {
            substance_name,
            residue_id: candidate.residue_id.clone(),
            detected_value,
            mrl_value,
            used_default_limit,
            loq_value,
        });
    }

    out
}

/// Detected value and LOQ of a row, converted to mg/kg. A below-LOQ row
/// scores as zero whatever value it carries.
fn row_values(row: &ExtractionRow) -> (Decimal, Option<Decimal>) {
    let unit = Unit::from_str_loose(&row.unit).unwrap_or_else(|| {
        tracing::warn!(
            substance = %row.substance,
            unit = %row.unit,
            "unrecognized unit; treating as mg/kg"
        );
        Unit::MgPerKg
    });

    let loq = row.loq_value.map(|v| unit.to_mg_kg(v));
    let detected = if row.below_loq {
        Decimal::ZERO
    } else {
        row.detected_value
            .map(|v| unit.to_mg_kg(v))
            .unwrap_or(Decimal::ZERO)
    };
    (detected, loq)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{LimitSource, ResidueId, DEFAULT_MRL_MG_KG};
    use rust_decimal_macros::dec;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn candidate(input: &str, residue: Option<&str>, limit: Option<Decimal>) -> CandidateMatch {
        CandidateMatch {
            input_name: input.into(),
            residue_id: residue.map(|_| ResidueId::Numeric(7)),
            residue_name: residue.map(String::from),
            regulatory_limit: limit,
            limit_source: limit.map(|_| LimitSource::Regulatory),
        }
    }

    fn row(substance: &str, value: Option<Decimal>, below_loq: bool, unit: &str) -> ExtractionRow {
        ExtractionRow {
            substance: substance.into(),
            detected_value: value,
            below_loq,
            loq_value: None,
            unit: unit.into(),
            confidence: None,
            requires_validation: false,
        }
    }

    #[test]
    fn test_below_loq_row_maps_to_zero() {
        let out = reconcile(
            &names(&["Glyphosate"]),
            &[candidate("Glyphosate", Some("Glyphosate"), Some(dec!(0.05)))],
            &[row("Glyphosate", Some(dec!(0.3)), true, "mg/kg")],
            &ExactMatcher,
            DEFAULT_MRL_MG_KG,
        );
        let m = &out.measurements[0];
        assert_eq!(m.detected_value, dec!(0));
        assert_eq!(m.mrl_value, dec!(0.05));
        assert!(!m.used_default_limit);
    }

    #[test]
    fn test_detected_value_taken_from_row() {
        let out = reconcile(
            &names(&["Captan"]),
            &[candidate("Captan", Some("Captan"), Some(dec!(3)))],
            &[row("Captan", Some(dec!(0.42)), false, "mg/kg")],
            &ExactMatcher,
            DEFAULT_MRL_MG_KG,
        );
        assert_eq!(out.measurements[0].detected_value, dec!(0.42));
    }

    #[test]
    fn test_missing_row_or_value_is_zero() {
        let out = reconcile(
            &names(&["Captan", "Folpet"]),
            &[
                candidate("Captan", Some("Captan"), Some(dec!(3))),
                candidate("Folpet", Some("Folpet"), Some(dec!(3))),
            ],
            &[row("Folpet", None, false, "mg/kg")],
            &ExactMatcher,
            DEFAULT_MRL_MG_KG,
        );
        assert_eq!(out.measurements[0].detected_value, dec!(0));
        assert_eq!(out.measurements[1].detected_value, dec!(0));
    }

    #[test]
    fn test_default_limit_when_no_regulatory_value() {
        let out = reconcile(
            &names(&["Novaluron"]),
            &[candidate("Novaluron", Some("Novaluron"), None)],
            &[],
            &ExactMatcher,
            DEFAULT_MRL_MG_KG,
        );
        let m = &out.measurements[0];
        assert_eq!(m.mrl_value, dec!(0.01));
        assert!(m.used_default_limit);
    }

    #[test]
    fn test_default_source_flagged_even_with_value() {
        let mut c = candidate("Novaluron", Some("Novaluron"), Some(dec!(0.01)));
        c.limit_source = Some(LimitSource::NoProductMatch);
        let out = reconcile(&names(&["Novaluron"]), &[c], &[], &ExactMatcher, DEFAULT_MRL_MG_KG);
        assert!(out.measurements[0].used_default_limit);
    }

    #[test]
    fn test_display_name_falls_back_to_requested() {
        let out = reconcile(
            &names(&["acetamiprid"]),
            &[candidate("acetamiprid", None, Some(dec!(0.3)))],
            &[],
            &ExactMatcher,
            DEFAULT_MRL_MG_KG,
        );
        assert_eq!(out.measurements[0].substance_name, "acetamiprid");
        assert!(out.measurements[0].residue_id.is_none());
    }

    #[test]
    fn test_display_name_from_candidate() {
        let out = reconcile(
            &names(&["chlorpyriphos"]),
            &[candidate("chlorpyriphos", Some("Chlorpyrifos"), Some(dec!(0.01)))],
            &[],
            &ExactMatcher,
            DEFAULT_MRL_MG_KG,
        );
        assert_eq!(out.measurements[0].substance_name, "Chlorpyrifos");
        assert_eq!(out.measurements[0].residue_id, Some(ResidueId::Numeric(7)));
    }

    #[test]
    fn test_unresolved_substances_reported() {
        let out = reconcile(
            &names(&["Captan", "Mystery"]),
            &[candidate("Captan", Some("Captan"), Some(dec!(3)))],
            &[],
            &ExactMatcher,
            DEFAULT_MRL_MG_KG,
        );
        assert_eq!(out.measurements.len(), 1);
        assert_eq!(out.unresolved, vec!["Mystery"]);
    }

    #[test]
    fn test_exact_matching_misses_case_variants() {
        let candidates = [candidate("Glyphosate", Some("Glyphosate"), Some(dec!(0.1)))];
        let rows = [row("GLYPHOSATE", Some(dec!(0.08)), false, "mg/kg")];

        let exact = reconcile(
            &names(&["Glyphosate"]),
            &candidates,
            &rows,
            &ExactMatcher,
            DEFAULT_MRL_MG_KG,
        );
        assert_eq!(exact.measurements[0].detected_value, dec!(0));

        let normalized = reconcile(
            &names(&["Glyphosate"]),
            &candidates,
            &rows,
            &NormalizedMatcher,
            DEFAULT_MRL_MG_KG,
        );
        assert_eq!(normalized.measurements[0].detected_value, dec!(0.08));
    }

    #[test]
    fn test_units_converted_to_mg_kg() {
        let mut r = row("Boscalid", Some(dec!(40)), false, "µg/kg");
        r.loq_value = Some(dec!(10));
        let out = reconcile(
            &names(&["Boscalid"]),
            &[candidate("Boscalid", Some("Boscalid"), Some(dec!(2)))],
            &[r],
            &ExactMatcher,
            DEFAULT_MRL_MG_KG,
        );
        assert_eq!(out.measurements[0].detected_value, dec!(0.04));
        assert_eq!(out.measurements[0].loq_value, Some(dec!(0.01)));
    }

    #[test]
    fn test_unknown_unit_treated_as_mg_kg() {
        let out = reconcile(
            &names(&["Boscalid"]),
            &[candidate("Boscalid", Some("Boscalid"), Some(dec!(2)))],
            &[row("Boscalid", Some(dec!(0.4)), false, "parts")],
            &ExactMatcher,
            DEFAULT_MRL_MG_KG,
        );
        assert_eq!(out.measurements[0].detected_value, dec!(0.4));
    }

    #[test]
    fn test_request_order_preserved() {
        let out = reconcile(
            &names(&["B", "A"]),
            &[
                candidate("A", Some("A"), Some(dec!(1))),
                candidate("B", Some("B"), Some(dec!(1))),
            ],
            &[],
            &ExactMatcher,
            DEFAULT_MRL_MG_KG,
        );
        let order: Vec<&str> = out
            .measurements
            .iter()
            .map(|m| m.substance_name.as_str())
            .collect();
        assert_eq!(order, vec!["B", "A"]);
    }
}
