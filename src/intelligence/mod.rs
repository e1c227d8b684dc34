/// Intelligence module
///
/// Profiles a student from their history and turns the catalog into a
/// ranked list of practice questions.

pub mod candidate_filter;
pub mod metrics;
pub mod ranker;
pub mod recommender;
pub mod scorer;

pub use candidate_filter::{CandidateFilter, SubjectWhitelist};
pub use metrics::{MetricsCalculator, StudentPerformanceProfile, SuccessRates, NEUTRAL_SUCCESS_RATE};
pub use ranker::{Ranker, ScoredCandidate};
pub use recommender::Recommender;
pub use scorer::{ScoreBreakdown, Scorer, ScoringWeights};
