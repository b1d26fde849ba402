use crate::config::DEFAULT_VALIDATION_CONFIDENCE;
use crate::error::MrlError;
use crate::model::ExtractionRow;
use crate::parsing::lenient::decimal_from_json;
use crate::parsing::{parse_value, ReportedValue};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Header fields read from a lab report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportMetadata {
    pub product_name: Option<String>,
    pub batch_id: Option<String>,
    pub sampling_date: Option<String>,
    pub country_of_origin: Option<String>,
    pub lab_name: Option<String>,
}

impl ReportMetadata {
    fn filled_fields(&self) -> usize {
        [
            &self.product_name,
            &self.batch_id,
            &self.sampling_date,
            &self.country_of_origin,
            &self.lab_name,
        ]
        .iter()
        .filter(|f| f.is_some())
        .count()
    }
}

/// A lab report after OCR and normalization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionDocument {
    pub metadata: ReportMetadata,
    pub results: Vec<ExtractionRow>,
    /// Overall extraction confidence in [0, 1].
    pub confidence: Decimal,
}

impl ExtractionDocument {
    /// Substance names in report order, as sent to the residue lookup.
    pub fn substance_names(&self) -> Vec<String> {
        self.results.iter().map(|r| r.substance.clone()).collect()
    }

    /// Re-mark rows for manual validation against `threshold`. Rows without
    /// a confidence are left as they are.
    pub fn flag_for_validation(&mut self, threshold: Decimal) {
        for row in &mut self.results {
            if let Some(confidence) = row.confidence {
                row.requires_validation = confidence < threshold;
            }
        }
    }
}

/// Trait for lab report OCR backends.
pub trait ReportExtractor: Send + Sync {
    /// Extract structured rows from a PDF lab report.
    fn extract(&self, pdf_bytes: &[u8]) -> Result<ExtractionDocument, MrlError>;

    /// Name of this extraction backend (for diagnostics).
    fn backend_name(&self) -> &str;
}

const ROW_CONFIDENCE: Decimal = DEFAULT_VALIDATION_CONFIDENCE;
const EMPTY_RESULTS_SCORE: Decimal = Decimal::from_parts(5, 0, 0, false, 1);
const METADATA_WEIGHT: Decimal = Decimal::from_parts(4, 0, 0, false, 1);
const RESULTS_WEIGHT: Decimal = Decimal::from_parts(6, 0, 0, false, 1);
const METADATA_FIELDS: usize = 5;

/// Parse the raw text answer of an OCR backend. A surrounding Markdown code
/// fence (optionally tagged `json`) is stripped first.
pub fn parse_extraction_str(
    text: &str,
    validation_confidence: Decimal,
) -> Result<ExtractionDocument, MrlError> {
    let mut body = text.trim();
    if body.starts_with("```") {
        body = body.split("```").nth(1).unwrap_or_default();
        body = body.strip_prefix("json").unwrap_or(body).trim();
    }
    let raw: Value = serde_json::from_str(body)?;
    normalize_extraction(&raw, validation_confidence)
}

/// Normalize a raw OCR payload (`metadata` + `results`) into a document.
///
/// Rows without a substance name are dropped. Values may be JSON numbers or
/// lab notation strings ("< 0.01", "nd"); anything unreadable is treated as
/// missing rather than failing the whole report.
pub fn normalize_extraction(
    raw: &Value,
    validation_confidence: Decimal,
) -> Result<ExtractionDocument, MrlError> {
    let obj = raw
        .as_object()
        .ok_or_else(|| MrlError::Extraction("expected a JSON object".into()))?;

    let empty = Map::new();
    let meta = obj
        .get("metadata")
        .and_then(Value::as_object)
        .unwrap_or(&empty);
    let metadata = ReportMetadata {
        product_name: text_field(meta, "product_name"),
        batch_id: text_field(meta, "batch_id"),
        sampling_date: text_field(meta, "sampling_date"),
        country_of_origin: text_field(meta, "country_of_origin"),
        lab_name: text_field(meta, "lab_name"),
    };

    let results: Vec<ExtractionRow> = obj
        .get("results")
        .and_then(Value::as_array)
        .map(|rows| {
            rows.iter()
                .filter_map(Value::as_object)
                .filter_map(|row| normalize_row(row, validation_confidence))
                .collect()
        })
        .unwrap_or_default();

    let confidence = document_confidence(&metadata, !results.is_empty());
    tracing::debug!(
        rows = results.len(),
        confidence = %confidence,
        "normalized extraction"
    );

    Ok(ExtractionDocument {
        metadata,
        results,
        confidence,
    })
}

fn normalize_row(
    row: &Map<String, Value>,
    validation_confidence: Decimal,
) -> Option<ExtractionRow> {
    let substance = text_field(row, "substance")?;

    let mut below_loq = row.get("below_loq").map(truthy).unwrap_or(false);
    let mut loq_value = row.get("loq_value").and_then(lenient_number);

    let detected_value = match row.get("detected_value") {
        Some(Value::String(s)) => match parse_value(s) {
            Ok(Some(ReportedValue::Quantified(v))) => Some(v),
            Ok(Some(ReportedValue::BelowLoq(loq))) => {
                below_loq = true;
                loq_value = loq_value.or(loq);
                None
            }
            Ok(None) => None,
            Err(e) => {
                tracing::debug!(substance = %substance, error = %e, "unreadable detected value");
                None
            }
        },
        Some(v) => lenient_number(v),
        None => None,
    };

    let unit = text_field(row, "unit").unwrap_or_else(|| "mg/kg".to_string());
    let confidence = row
        .get("confidence")
        .and_then(lenient_number)
        .unwrap_or(ROW_CONFIDENCE);

    Some(ExtractionRow {
        substance,
        detected_value,
        below_loq,
        loq_value,
        unit,
        confidence: Some(confidence),
        requires_validation: confidence < validation_confidence,
    })
}

/// Weighted mix of metadata completeness and whether any row survived,
/// rounded to 3 decimals and clamped to [0, 1].
fn document_confidence(metadata: &ReportMetadata, has_results: bool) -> Decimal {
    let meta_score =
        Decimal::from(metadata.filled_fields()) / Decimal::from(METADATA_FIELDS);
    let results_score = if has_results {
        ROW_CONFIDENCE
    } else {
        EMPTY_RESULTS_SCORE
    };
    (meta_score * METADATA_WEIGHT + results_score * RESULTS_WEIGHT)
        .round_dp_with_strategy(3, RoundingStrategy::MidpointAwayFromZero)
        .clamp(Decimal::ZERO, Decimal::ONE)
}

fn text_field(obj: &Map<String, Value>, key: &str) -> Option<String> {
    match obj.get(key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn lenient_number(value: &Value) -> Option<Decimal> {
    decimal_from_json(value).ok().flatten()
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => matches!(s.trim().to_lowercase().as_str(), "true" | "yes" | "1"),
        _ => false,
    }
}
