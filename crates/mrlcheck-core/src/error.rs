use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum MrlError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("substance '{0}' could not be resolved against the residue lookup")]
    UnresolvedSubstance(String),

    #[error("failed to parse value: {0}")]
    ParseError(String),

    #[error("failed to load options from {path}: {reason}")]
    ConfigLoad { path: PathBuf, reason: String },

    #[error("invalid product catalog: {0}")]
    CatalogInvalid(String),

    #[error("report extraction failed: {0}")]
    Extraction(String),

    #[error("residue lookup failed: {0}")]
    Lookup(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
