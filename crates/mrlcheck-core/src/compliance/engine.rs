use crate::compliance::outcome::{
    Classification, ComplianceResult, LotDecision, LotStatus, LotUpdate, Score, SubstanceFailure,
};
use crate::config::EvaluationOptions;
use crate::error::MrlError;
use crate::model::SubstanceMeasurement;
use rust_decimal::{Decimal, RoundingStrategy};

const SAFE_MIN_SCORE: Decimal = Decimal::from_parts(80, 0, 0, false, 0);
const SAFE_MAX_RATIO: Decimal = Decimal::from_parts(5, 0, 0, false, 1);
const VIGILANCE_MIN_SCORE: Decimal = Decimal::from_parts(40, 0, 0, false, 0);

const RATIO_DP: u32 = 4;
const SCORE_DP: u32 = 1;

/// Unrounded inputs to classification.
struct RawScore {
    ratio: Decimal,
    hard_fail: bool,
    score: Decimal,
}

/// Classification rules, tried in order; the first that applies wins.
/// Reordering changes outcomes at the boundaries.
#[derive(Debug, Clone, Copy)]
enum Rule {
    HardFail,
    Clearance,
    Headroom,
    Fallback,
}

const DECISION_LIST: [Rule; 4] = [Rule::HardFail, Rule::Clearance, Rule::Headroom, Rule::Fallback];

impl Rule {
    fn applies(self, raw: &RawScore) -> bool {
        match self {
            Rule::HardFail => raw.hard_fail,
            Rule::Clearance => raw.score > SAFE_MIN_SCORE && raw.ratio < SAFE_MAX_RATIO,
            Rule::Headroom => raw.score >= VIGILANCE_MIN_SCORE,
            Rule::Fallback => true,
        }
    }

    fn outcome(self) -> Classification {
        match self {
            Rule::HardFail => Classification::Critical,
            Rule::Clearance => Classification::Safe,
            Rule::Headroom => Classification::Vigilance,
            Rule::Fallback => Classification::Critical,
        }
    }
}

fn classify(raw: &RawScore) -> Classification {
    DECISION_LIST
        .iter()
        .find(|rule| rule.applies(raw))
        .map(|rule| rule.outcome())
        .unwrap_or(Classification::Critical)
}

fn round_half_up(value: Decimal, dp: u32) -> Decimal {
    value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
}

/// Score a detected concentration against its limit, both in mg/kg.
///
/// The score is the linear headroom left under the limit: 100 when nothing
/// was detected, 0 at or above the limit. Classification is taken on the
/// unrounded values; ratio and score are rounded afterwards.
pub fn score(detected_value: Decimal, mrl_value: Decimal) -> Result<Score, MrlError> {
    if mrl_value <= Decimal::ZERO {
        return Err(MrlError::InvalidInput(format!(
            "MRL must be positive, got {mrl_value}"
        )));
    }
    if detected_value < Decimal::ZERO {
        return Err(MrlError::InvalidInput(format!(
            "detected value must not be negative, got {detected_value}"
        )));
    }

    let ratio = detected_value.checked_div(mrl_value).ok_or_else(|| {
        MrlError::InvalidInput(format!(
            "ratio of {detected_value} to {mrl_value} is out of range"
        ))
    })?;
    let hard_fail = ratio > Decimal::ONE;
    // ratio <= 1 here, so the product cannot overflow
    let score = if hard_fail {
        Decimal::ZERO
    } else {
        (Decimal::ONE_HUNDRED * (Decimal::ONE - ratio)).clamp(Decimal::ZERO, Decimal::ONE_HUNDRED)
    };

    let raw = RawScore {
        ratio,
        hard_fail,
        score,
    };
    let classification = classify(&raw);

    Ok(Score {
        ratio: round_half_up(raw.ratio, RATIO_DP),
        hard_fail,
        score: round_half_up(raw.score, SCORE_DP),
        classification,
    })
}

/// Score a reconciled measurement and explain the outcome.
///
/// With `loq_check` enabled, a measurement whose lab LOQ lies above the MRL
/// gets `loq_above_mrl` set and a reason naming the LOQ. The verdict fields
/// are those of `score(detected, mrl)` either way.
pub fn assess(
    measurement: &SubstanceMeasurement,
    options: &EvaluationOptions,
) -> Result<ComplianceResult, MrlError> {
    let scored = score(measurement.detected_value, measurement.mrl_value)?;

    let mut result = ComplianceResult {
        measurement: measurement.clone(),
        ratio: scored.ratio,
        hard_fail: scored.hard_fail,
        score: scored.score,
        classification: scored.classification,
        loq_above_mrl: false,
        reason: String::new(),
    };

    if scored.hard_fail {
        result.reason = format!(
            "Detected ({} mg/kg) exceeds MRL ({} mg/kg)",
            measurement.detected_value.normalize(),
            measurement.mrl_value.normalize()
        );
    } else if let Some(loq) = measurement.loq_value.filter(|_| options.loq_check) {
        if loq < Decimal::ZERO {
            return Err(MrlError::InvalidInput(format!(
                "LOQ must not be negative, got {loq}"
            )));
        }
        if loq > measurement.mrl_value {
            tracing::warn!(
                substance = %measurement.substance_name,
                loq = %loq,
                mrl = %measurement.mrl_value,
                "LOQ above MRL"
            );
            result.loq_above_mrl = true;
            result.reason = format!(
                "LOQ ({} mg/kg) is above MRL ({} mg/kg); method not sensitive enough",
                loq.normalize(),
                measurement.mrl_value.normalize()
            );
        }
    }

    if result.reason.is_empty() {
        result.reason = format!(
            "Within limit ({}% of MRL)",
            (scored.ratio * Decimal::ONE_HUNDRED).normalize()
        );
    }
    if measurement.used_default_limit {
        result.reason.push_str(", default MRL applied");
    }

    tracing::debug!(
        substance = %measurement.substance_name,
        ratio = %result.ratio,
        score = %result.score,
        classification = %result.classification,
        "scored measurement"
    );

    Ok(result)
}

/// Assess every measurement of a lot. An invalid measurement becomes a
/// failure entry; the others are still scored.
pub fn assess_all(
    measurements: &[SubstanceMeasurement],
    options: &EvaluationOptions,
) -> (Vec<ComplianceResult>, Vec<SubstanceFailure>) {
    let mut results = Vec::new();
    let mut failures = Vec::new();

    for measurement in measurements {
        match assess(measurement, options) {
            Ok(result) => results.push(result),
            Err(e) => {
                tracing::warn!(
                    substance = %measurement.substance_name,
                    error = %e,
                    "measurement could not be scored"
                );
                failures.push(SubstanceFailure {
                    substance: measurement.substance_name.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }

    (results, failures)
}

fn lot_status(result: &ComplianceResult) -> LotStatus {
    if result.hard_fail {
        return LotStatus::Critical;
    }
    match result.classification {
        Classification::Critical => LotStatus::Critical,
        Classification::Vigilance => LotStatus::Vigilance,
        Classification::Safe => LotStatus::Safe,
    }
}

/// Derive the lot decision. CRITICAL dominates VIGILANCE dominates SAFE;
/// the order of `results` does not matter. Returns `None` for an empty lot.
pub fn decide(results: &[ComplianceResult]) -> Option<LotDecision> {
    let status = results.iter().map(lot_status).max()?;

    let mut determining: Vec<String> = results
        .iter()
        .filter(|r| lot_status(r) == status)
        .map(|r| r.measurement.substance_name.clone())
        .collect();
    determining.sort();

    Some(LotDecision {
        status,
        label: status.label().to_string(),
        determining_substances: determining,
    })
}

/// Replace the detected value of the result at `index`, rescoring it
/// against its unchanged limit and recomputing the lot decision. The input
/// slice is left untouched.
pub fn update_one(
    results: &[ComplianceResult],
    index: usize,
    new_detected_value: Decimal,
    options: &EvaluationOptions,
) -> Result<LotUpdate, MrlError> {
    let current = results.get(index).ok_or_else(|| {
        MrlError::InvalidInput(format!(
            "index {index} is out of range for {} results",
            results.len()
        ))
    })?;

    let mut measurement = current.measurement.clone();
    measurement.detected_value = new_detected_value;
    let rescored = assess(&measurement, options)?;

    let mut updated = results.to_vec();
    updated[index] = rescored;
    let decision = decide(&updated);

    Ok(LotUpdate {
        results: updated,
        decision,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use rust_decimal_macros::dec;

    fn measurement(name: &str, detected: Decimal, mrl: Decimal) -> SubstanceMeasurement {
        SubstanceMeasurement::new(name, detected, mrl)
    }

    fn result(name: &str, detected: Decimal, mrl: Decimal) -> ComplianceResult {
        assess(&measurement(name, detected, mrl), &EvaluationOptions::default()).unwrap()
    }

    #[test]
    fn test_zero_detected_is_safe() {
        let s = score(dec!(0), dec!(0.01)).unwrap();
        assert_eq!(s.ratio, dec!(0));
        assert_eq!(s.score, dec!(100.0));
        assert!(!s.hard_fail);
        assert_eq!(s.classification, Classification::Safe);
    }

    #[test]
    fn test_above_limit_is_hard_fail() {
        for detected in [dec!(0.0101), dec!(0.02), dec!(5000)] {
            let s = score(detected, dec!(0.01)).unwrap();
            assert!(s.hard_fail);
            assert_eq!(s.score, dec!(0.0));
            assert_eq!(s.classification, Classification::Critical);
        }
    }

    #[test]
    fn test_ratio_exactly_one_is_not_hard_fail_but_critical() {
        let s = score(dec!(0.05), dec!(0.05)).unwrap();
        assert_eq!(s.ratio, dec!(1));
        assert!(!s.hard_fail);
        assert_eq!(s.score, dec!(0.0));
        assert_eq!(s.classification, Classification::Critical);
    }

    #[test]
    fn test_ratio_one_half_is_vigilance() {
        let s = score(dec!(0.005), dec!(0.01)).unwrap();
        assert_eq!(s.ratio, dec!(0.5));
        assert_eq!(s.score, dec!(50.0));
        assert_eq!(s.classification, Classification::Vigilance);
    }

    #[test]
    fn test_score_80_is_not_safe() {
        let s = score(dec!(0.002), dec!(0.01)).unwrap();
        assert_eq!(s.ratio, dec!(0.2));
        assert_eq!(s.score, dec!(80.0));
        assert_eq!(s.classification, Classification::Vigilance);
    }

    #[test]
    fn test_score_90_is_safe() {
        let s = score(dec!(0.001), dec!(0.01)).unwrap();
        assert_eq!(s.ratio, dec!(0.1));
        assert_eq!(s.score, dec!(90.0));
        assert_eq!(s.classification, Classification::Safe);
    }

    #[test]
    fn test_score_40_is_vigilance_below_is_critical() {
        let s = score(dec!(0.6), dec!(1)).unwrap();
        assert_eq!(s.score, dec!(40.0));
        assert_eq!(s.classification, Classification::Vigilance);

        let s = score(dec!(0.61), dec!(1)).unwrap();
        assert_eq!(s.score, dec!(39.0));
        assert_eq!(s.classification, Classification::Critical);
    }

    #[test]
    fn test_rounding_half_up() {
        // 1/3 -> ratio 0.3333, score 66.666.. -> 66.7
        let s = score(dec!(1), dec!(3)).unwrap();
        assert_eq!(s.ratio, dec!(0.3333));
        assert_eq!(s.score, dec!(66.7));

        // 0.00005 exactly on the 4th-decimal midpoint
        let s = score(dec!(0.00005), dec!(1)).unwrap();
        assert_eq!(s.ratio, dec!(0.0001));
    }

    #[test]
    fn test_classification_uses_unrounded_score() {
        // score 80.004 rounds to 80.0 for display but is above 80
        let s = score(dec!(0.19996), dec!(1)).unwrap();
        assert_eq!(s.score, dec!(80.0));
        assert_eq!(s.classification, Classification::Safe);
    }

    #[test]
    fn test_invalid_inputs() {
        assert_matches!(score(dec!(-0.1), dec!(0.01)), Err(MrlError::InvalidInput(_)));
        assert_matches!(score(dec!(0.1), dec!(0)), Err(MrlError::InvalidInput(_)));
        assert_matches!(score(dec!(0.1), dec!(-1)), Err(MrlError::InvalidInput(_)));
    }

    #[test]
    fn test_assess_reason_for_hard_fail() {
        let r = result("Chlorpyrifos", dec!(0.03), dec!(0.01));
        assert!(r.hard_fail);
        assert!(r.reason.contains("exceeds MRL"));
        assert!(r.reason.contains("0.03"));
    }

    #[test]
    fn test_assess_loq_above_mrl_is_flagged_without_changing_verdict() {
        let mut m = measurement("Imazalil", dec!(0), dec!(0.01));
        m.loq_value = Some(dec!(0.02));
        let r = assess(&m, &EvaluationOptions::default()).unwrap();
        assert!(r.loq_above_mrl);
        assert!(!r.hard_fail);
        assert_eq!(r.score, dec!(100.0));
        assert_eq!(r.classification, Classification::Safe);
        assert!(r.reason.contains("LOQ"));
        assert_eq!(decide(&[r]).unwrap().status, LotStatus::Safe);
    }

    #[test]
    fn test_assess_loq_check_can_be_disabled() {
        let mut m = measurement("Imazalil", dec!(0), dec!(0.01));
        m.loq_value = Some(dec!(0.02));
        let options = EvaluationOptions {
            loq_check: false,
            ..EvaluationOptions::default()
        };
        let r = assess(&m, &options).unwrap();
        assert!(!r.loq_above_mrl);
        assert!(r.reason.starts_with("Within limit"));
    }

    #[test]
    fn test_assess_mentions_default_limit() {
        let mut m = measurement("Unknownazole", dec!(0), dec!(0.01));
        m.used_default_limit = true;
        let r = assess(&m, &EvaluationOptions::default()).unwrap();
        assert!(r.reason.contains("default MRL"));
    }

    #[test]
    fn test_assess_all_isolates_failures() {
        let measurements = vec![
            measurement("Captan", dec!(0.001), dec!(0.01)),
            measurement("Broken", dec!(-1), dec!(0.01)),
            measurement("Boscalid", dec!(0.5), dec!(2)),
        ];
        let (results, failures) = assess_all(&measurements, &EvaluationOptions::default());
        assert_eq!(results.len(), 2);
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].substance, "Broken");
    }

    #[test]
    fn test_decide_empty_is_none() {
        assert!(decide(&[]).is_none());
    }

    #[test]
    fn test_decide_vigilance_dominates_safe() {
        let results = vec![
            result("A", dec!(0.001), dec!(0.01)),
            result("B", dec!(0.004), dec!(0.01)),
            result("C", dec!(0), dec!(0.01)),
        ];
        let d = decide(&results).unwrap();
        assert_eq!(d.status, LotStatus::Vigilance);
        assert_eq!(d.label, LotStatus::Vigilance.label());
        assert_eq!(d.determining_substances, vec!["B"]);
    }

    #[test]
    fn test_decide_critical_dominates() {
        let results = vec![
            result("A", dec!(0.004), dec!(0.01)),
            result("B", dec!(0.02), dec!(0.01)),
        ];
        assert_eq!(decide(&results).unwrap().status, LotStatus::Critical);
    }

    #[test]
    fn test_decide_all_safe() {
        let results = vec![result("A", dec!(0), dec!(0.01))];
        let d = decide(&results).unwrap();
        assert_eq!(d.status, LotStatus::Safe);
        assert!(d.label.contains("exportable"));
    }

    #[test]
    fn test_decide_hard_fail_counts_as_critical() {
        let mut r = result("A", dec!(0), dec!(0.01));
        r.hard_fail = true;
        assert_eq!(decide(&[r]).unwrap().status, LotStatus::Critical);
    }

    #[test]
    fn test_decide_order_independent() {
        let a = result("A", dec!(0.001), dec!(0.01));
        let b = result("B", dec!(0.004), dec!(0.01));
        let c = result("C", dec!(0.009), dec!(0.01));
        let d = result("D", dec!(0.003), dec!(0.01));
        let forward = decide(&[a.clone(), b.clone(), c.clone(), d.clone()]);
        let backward = decide(&[d.clone(), c.clone(), b.clone(), a.clone()]);
        let shuffled = decide(&[c, a, d, b]);
        assert_eq!(forward, backward);
        assert_eq!(forward, shuffled);
    }

    #[test]
    fn test_update_one_rescores_and_redecides() {
        let results = vec![
            result("A", dec!(0.001), dec!(0.01)),
            result("B", dec!(0.001), dec!(0.01)),
        ];
        let options = EvaluationOptions::default();
        let update = update_one(&results, 1, dec!(0.05), &options).unwrap();

        assert_eq!(update.results[0], results[0]);
        assert!(update.results[1].hard_fail);
        assert_eq!(update.results[1].measurement.mrl_value, dec!(0.01));
        assert_eq!(update.decision.unwrap().status, LotStatus::Critical);
        // input untouched
        assert!(!results[1].hard_fail);
    }

    #[test]
    fn test_update_one_with_original_value_restores_result() {
        let results = vec![
            result("A", dec!(0.0042), dec!(0.01)),
            result("B", dec!(0.001), dec!(0.05)),
        ];
        let options = EvaluationOptions::default();
        let changed = update_one(&results, 0, dec!(0.5), &options).unwrap();
        let restored = update_one(&changed.results, 0, dec!(0.0042), &options).unwrap();
        assert_eq!(restored.results, results);
        assert_eq!(restored.decision, decide(&results));
    }

    #[test]
    fn test_update_one_out_of_range() {
        let results = vec![result("A", dec!(0), dec!(0.01))];
        assert_matches!(
            update_one(&results, 3, dec!(0), &EvaluationOptions::default()),
            Err(MrlError::InvalidInput(_))
        );
    }

    #[test]
    fn test_update_one_rejects_negative_value() {
        let results = vec![result("A", dec!(0), dec!(0.01))];
        assert_matches!(
            update_one(&results, 0, dec!(-0.5), &EvaluationOptions::default()),
            Err(MrlError::InvalidInput(_))
        );
    }
}
