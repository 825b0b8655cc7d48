pub mod duration;
pub mod language;
pub mod parse;
pub mod record;
pub mod tier;

pub use duration::expiration_from_duration;
pub use language::detect_language_heuristic;
pub use parse::parse_analysis;
pub use record::{
    AnalysisOutcome, AnalysisRecord, AnalysisRequest, CompensationTerms, Feedback, Level,
    Opportunity, Risk,
};
pub use tier::Tier;
