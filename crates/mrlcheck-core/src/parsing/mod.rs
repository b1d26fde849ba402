pub mod lenient;
pub mod normalize;
pub mod values;

pub use normalize::normalize_substance;
pub use values::{parse_mrl, parse_value, ReportedValue};
