use crate::config::MatchMode;
use crate::parsing::normalize_substance;

/// Decides whether an extracted substance name refers to a requested one.
pub trait SubstanceMatcher: Send + Sync {
    fn matches(&self, requested: &str, extracted: &str) -> bool;

    /// Name of this matching strategy (for diagnostics).
    fn name(&self) -> &str;
}

/// Exact string equality, no normalization.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExactMatcher;

impl SubstanceMatcher for ExactMatcher {
    fn matches(&self, requested: &str, extracted: &str) -> bool {
        requested == extracted
    }

    fn name(&self) -> &str {
        "exact"
    }
}

/// Equality of normalized keys, so case, accents and separators are ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct NormalizedMatcher;

impl SubstanceMatcher for NormalizedMatcher {
    fn matches(&self, requested: &str, extracted: &str) -> bool {
        normalize_substance(requested) == normalize_substance(extracted)
    }

    fn name(&self) -> &str {
        "normalized"
    }
}

pub fn matcher_for(mode: MatchMode) -> Box<dyn SubstanceMatcher> {
    match mode {
        MatchMode::Exact => Box::new(ExactMatcher),
        MatchMode::Normalized => Box::new(NormalizedMatcher),
    }
}
