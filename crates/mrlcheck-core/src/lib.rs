pub mod compliance;
pub mod config;
pub mod error;
pub mod extraction;
pub mod limits;
pub mod model;
pub mod parsing;
pub mod reconcile;

use compliance::outcome::LotEvaluation;
use config::EvaluationOptions;
use error::MrlError;
use extraction::ReportExtractor;
use limits::ResidueLookup;
use model::{CandidateMatch, ExtractionRow};
use serde::{Deserialize, Serialize};

/// Everything needed to evaluate one lot: the substances asked about, the
/// lookup answers for them, and the extracted report rows (if any).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LotInput {
    #[serde(default)]
    pub lot_number: Option<String>,
    #[serde(default)]
    pub product_code: Option<String>,
    pub substances: Vec<String>,
    #[serde(default)]
    pub candidates: Vec<CandidateMatch>,
    #[serde(default)]
    pub extraction: Vec<ExtractionRow>,
}

/// Main API entry point: reconcile and score one lot.
///
/// Unresolved substances and invalid measurements are reported next to the
/// scored results; the decision covers the scored results only.
pub fn evaluate_lot(input: &LotInput, options: &EvaluationOptions) -> LotEvaluation {
    let matcher = reconcile::matcher_for(options.matching);
    let reconciled = reconcile::reconcile(
        &input.substances,
        &input.candidates,
        &input.extraction,
        matcher.as_ref(),
        options.default_limit,
    );

    let (results, failures) = compliance::assess_all(&reconciled.measurements, options);
    let decision = compliance::decide(&results);

    match &decision {
        Some(d) => tracing::info!(
            lot = input.lot_number.as_deref().unwrap_or("-"),
            status = %d.status,
            scored = results.len(),
            failed = failures.len(),
            unresolved = reconciled.unresolved.len(),
            "lot evaluated"
        ),
        None => tracing::info!(
            lot = input.lot_number.as_deref().unwrap_or("-"),
            "no substance could be scored; no decision"
        ),
    }

    LotEvaluation {
        results,
        failures,
        unresolved: reconciled.unresolved,
        decision,
    }
}

/// Reconcile and score a single substance of a lot.
pub fn evaluate_substance(
    name: &str,
    input: &LotInput,
    options: &EvaluationOptions,
) -> Result<compliance::ComplianceResult, MrlError> {
    let matcher = reconcile::matcher_for(options.matching);
    let reconciled = reconcile::reconcile(
        &[name.to_string()],
        &input.candidates,
        &input.extraction,
        matcher.as_ref(),
        options.default_limit,
    );
    let measurement = reconciled
        .measurements
        .first()
        .ok_or_else(|| MrlError::UnresolvedSubstance(name.to_string()))?;
    compliance::assess(measurement, options)
}

/// Evaluate a PDF lab report end to end: extract rows, look up every
/// extracted substance for the product, then reconcile and score.
///
/// `product` may be an EU product code or a catalog name. Without it, the
/// product named on the report is used when the catalog knows it.
pub fn evaluate_report(
    pdf_bytes: &[u8],
    extractor: &dyn ReportExtractor,
    lookup: &dyn ResidueLookup,
    product: Option<&str>,
    options: &EvaluationOptions,
) -> Result<LotEvaluation, MrlError> {
    let mut document = extractor.extract(pdf_bytes)?;
    document.flag_for_validation(options.validation_confidence);
    tracing::debug!(
        backend = extractor.backend_name(),
        rows = document.results.len(),
        "report extracted"
    );

    if document.results.is_empty() {
        return Err(MrlError::Extraction(
            "no residue rows found in the report".into(),
        ));
    }

    let catalog = limits::catalog::load_builtin()?;
    let product_code =
        catalog.resolve_code(product, document.metadata.product_name.as_deref());

    let substances = document.substance_names();
    let candidates = lookup.multi_search(&substances, product_code.as_deref())?;
    tracing::debug!(
        backend = lookup.backend_name(),
        candidates = candidates.len(),
        "residues looked up"
    );

    let input = LotInput {
        lot_number: document.metadata.batch_id.clone(),
        product_code,
        substances,
        candidates,
        extraction: document.results,
    };
    Ok(evaluate_lot(&input, options))
}
