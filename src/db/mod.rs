/// Database module for study-recommend
///
/// Reference SQLite store for the catalog and student history, using sqlx.
/// Implements connection pooling for performance.

pub mod connection;
pub mod models;
pub mod queries;

pub use connection::{Database, DatabaseStats};
pub use models::*;
