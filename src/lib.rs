/// study-recommend library
///
/// Picks and ranks practice questions for a student from their solved and
/// attempted history.

pub mod config;
pub mod core;
pub mod db;
pub mod error;
pub mod intelligence;

// Re-exports for convenience
pub use config::RecommenderConfig;
pub use db::Database;
pub use error::{RecommendError, Result};
pub use intelligence::Recommender;
