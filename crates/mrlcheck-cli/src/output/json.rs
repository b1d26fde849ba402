use mrlcheck_core::error::MrlError;
use serde::Serialize;

pub fn print<T: Serialize>(value: &T) -> Result<(), MrlError> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{json}");
    Ok(())
}
