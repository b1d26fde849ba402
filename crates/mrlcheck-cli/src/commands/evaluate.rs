use mrlcheck_core::config::{self, EvaluationOptions, MatchMode};
use mrlcheck_core::error::MrlError;
use mrlcheck_core::limits::catalog;
use mrlcheck_core::LotInput;
use std::path::PathBuf;

use crate::output;

pub fn run(
    input_file: PathBuf,
    config_file: Option<PathBuf>,
    matching: Option<String>,
    output_format: &str,
    verbose: bool,
) -> Result<(), MrlError> {
    let mut options = match config_file {
        Some(path) => config::load_options(&path)?,
        None => EvaluationOptions::default(),
    };
    if let Some(mode) = matching {
        options.matching = MatchMode::from_str_loose(&mode).ok_or_else(|| {
            MrlError::InvalidInput(format!(
                "unknown match mode '{mode}'. Available: exact, normalized"
            ))
        })?;
    }

    let json_bytes = std::fs::read(&input_file)?;
    let mut input: LotInput = serde_json::from_slice(&json_bytes)?;
    let catalog = catalog::load_builtin()?;
    input.product_code = catalog.resolve_code(input.product_code.as_deref(), None);
    let product = input.product_code.as_deref().and_then(|code| catalog.find(code));
    tracing::debug!(
        path = %input_file.display(),
        substances = input.substances.len(),
        matching = ?options.matching,
        "lot loaded"
    );
    let evaluation = mrlcheck_core::evaluate_lot(&input, &options);

    match output_format {
        "json" => output::json::print(&evaluation)?,
        _ => output::table::print_evaluation(&input, product, &evaluation, verbose),
    }

    if !evaluation.is_complete() {
        eprintln!(
            "warning: {} substance(s) unresolved, {} could not be scored; the decision does not cover them",
            evaluation.unresolved.len(),
            evaluation.failures.len()
        );
    }

    Ok(())
}
