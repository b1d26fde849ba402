use mrlcheck_core::compliance::{Classification, LotEvaluation, Score};
use mrlcheck_core::extraction::ExtractionDocument;
use mrlcheck_core::limits::catalog::Product;
use mrlcheck_core::parsing::ReportedValue;
use mrlcheck_core::LotInput;
use rust_decimal::Decimal;

pub fn print_score(
    reported: &ReportedValue,
    detected_mg_kg: Decimal,
    mrl: Decimal,
    scored: &Score,
) {
    let detected = match reported {
        ReportedValue::Quantified(_) => format!("{} mg/kg", detected_mg_kg.normalize()),
        ReportedValue::BelowLoq(Some(loq)) => format!("< {} (scored as 0)", loq.normalize()),
        ReportedValue::BelowLoq(None) => "< LOQ (scored as 0)".to_string(),
    };
    println!("  Detected:       {}", detected);
    println!("  MRL:            {} mg/kg", mrl.normalize());
    println!("  Ratio to MRL:   {}", scored.ratio.normalize());
    println!("  Score:          {:.1}", scored.score);
    println!(
        "  Classification: {}{}",
        scored.classification,
        if scored.hard_fail { " (MRL exceeded)" } else { "" }
    );
}

pub fn print_evaluation(
    input: &LotInput,
    product: Option<&Product>,
    evaluation: &LotEvaluation,
    verbose: bool,
) {
    if let Some(ref lot) = input.lot_number {
        println!("--- Lot: {} ---\n", lot);
    }
    match (product, input.product_code.as_deref()) {
        (Some(p), _) => println!("  Product:  {} ({})", p.name, p.code),
        (None, Some(code)) => println!("  Product:  {}", code),
        (None, None) => {}
    }

    match evaluation.decision {
        Some(ref d) => {
            println!("  Decision: {}", d.label);
            if d.determining_substances.len() < evaluation.results.len() {
                println!("  Determined by: {}", d.determining_substances.join(", "));
            }
        }
        None => println!("  Decision: none (no substance could be scored)"),
    }
    println!();

    if !evaluation.results.is_empty() {
        let max_name = evaluation
            .results
            .iter()
            .map(|r| r.substance_name().len())
            .max()
            .unwrap_or(10)
            .max("Substance".len());

        println!(
            "  {:<width$}  {:>12}  {:>12}  {:>8}  {:>6}  Status",
            "Substance",
            "Detected",
            "MRL",
            "Ratio",
            "Score",
            width = max_name
        );
        for r in &evaluation.results {
            let marker = match (r.classification, r.measurement.used_default_limit) {
                (_, true) => " (default MRL)",
                (Classification::Critical, false) if r.hard_fail => " (exceeded)",
                _ if r.loq_above_mrl => " (LOQ > MRL)",
                _ => "",
            };
            println!(
                "  {:<width$}  {:>12}  {:>12}  {:>7}%  {:>6.1}  {}{}",
                r.substance_name(),
                format!("{:.4}", r.measurement.detected_value),
                format!("{:.4}", r.measurement.mrl_value),
                (r.ratio * Decimal::ONE_HUNDRED).round_dp(1),
                r.score,
                r.classification,
                marker,
                width = max_name
            );
            if verbose {
                println!("    {}", r.reason);
            }
        }
        println!();
    }

    if !evaluation.unresolved.is_empty() {
        println!(
            "  Not found in residue lookup: {}",
            evaluation.unresolved.join(", ")
        );
    }
    for f in &evaluation.failures {
        println!("  Could not evaluate {}: {}", f.substance, f.reason);
    }
}

pub fn format_extraction(document: &ExtractionDocument) -> String {
    let mut out = String::new();
    let meta = &document.metadata;

    let fields = [
        ("Product", &meta.product_name),
        ("Batch", &meta.batch_id),
        ("Sampled", &meta.sampling_date),
        ("Origin", &meta.country_of_origin),
        ("Laboratory", &meta.lab_name),
    ];
    for (label, value) in fields {
        if let Some(v) = value {
            out.push_str(&format!("  {:<11} {}\n", format!("{label}:"), v));
        }
    }
    out.push_str(&format!("  Confidence: {}\n\n", document.confidence));

    let max_name = document
        .results
        .iter()
        .map(|r| r.substance.len())
        .max()
        .unwrap_or(10);

    for row in &document.results {
        let value = if row.below_loq {
            match row.loq_value {
                Some(loq) => format!("< {}", loq.normalize()),
                None => "< LOQ".to_string(),
            }
        } else {
            match row.detected_value {
                Some(v) => v.normalize().to_string(),
                None => "-".to_string(),
            }
        };
        let flag = if row.requires_validation { "  (check)" } else { "" };
        out.push_str(&format!(
            "  {:<width$}  {:>10} {}{}\n",
            row.substance,
            value,
            row.unit,
            flag,
            width = max_name
        ));
    }

    out
}
