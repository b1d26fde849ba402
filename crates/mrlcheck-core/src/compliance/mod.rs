pub mod engine;
pub mod outcome;

pub use engine::{assess, assess_all, decide, score, update_one};
pub use outcome::{
    Classification, ComplianceResult, LotDecision, LotEvaluation, LotStatus, LotUpdate, Score,
    SubstanceFailure,
};
