use mrlcheck_core::compliance;
use mrlcheck_core::error::MrlError;
use mrlcheck_core::model::Unit;
use mrlcheck_core::parsing::{parse_mrl, parse_value};

use crate::output;

pub fn run(detected: &str, mrl: &str, unit: &str, output_format: &str) -> Result<(), MrlError> {
    let unit = Unit::from_str_loose(unit)
        .ok_or_else(|| MrlError::InvalidInput(format!("unknown unit '{unit}'")))?;
    let reported = parse_value(detected)?
        .ok_or_else(|| MrlError::InvalidInput(format!("no detected value in '{detected}'")))?;
    let mrl_value = parse_mrl(mrl)
        .ok_or_else(|| MrlError::InvalidInput(format!("invalid MRL '{mrl}'")))?;

    let detected_mg_kg = unit.to_mg_kg(reported.scoring_value());
    let scored = compliance::score(detected_mg_kg, mrl_value)?;

    match output_format {
        "json" => output::json::print(&scored)?,
        _ => output::table::print_score(&reported, detected_mg_kg, mrl_value, &scored),
    }

    Ok(())
}
