use mrlcheck_core::config::{self, EvaluationOptions};
use mrlcheck_core::error::MrlError;
use mrlcheck_core::extraction;
use std::path::PathBuf;

use crate::output;

pub fn run(
    input_file: PathBuf,
    config_file: Option<PathBuf>,
    output_format: &str,
) -> Result<(), MrlError> {
    let options = match config_file {
        Some(path) => config::load_options(&path)?,
        None => EvaluationOptions::default(),
    };
    let text = std::fs::read_to_string(&input_file)?;
    let document = extraction::parse_extraction_str(&text, options.validation_confidence)?;

    match output_format {
        "json" => output::json::print(&document)?,
        _ => print!("{}", output::table::format_extraction(&document)),
    }

    let to_validate = document
        .results
        .iter()
        .filter(|r| r.requires_validation)
        .count();
    if to_validate > 0 {
        eprintln!("  {to_validate} row(s) need manual validation");
    }

    Ok(())
}
