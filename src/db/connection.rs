/// The bundled SQLite history store
///
/// Holds the question catalog plus solved and attempted history behind one
/// shared pool.

use crate::error::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::ConnectOptions;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

/// Upper bound on pooled connections. History fetches run four at a time.
const MAX_CONNECTIONS: u32 = 5;

/// Handle to the history store, cheap to clone
#[derive(Clone)]
pub struct Database {
    pool: Arc<SqlitePool>,
    db_path: PathBuf,
}

impl Database {
    /// Open (or create) the store at `db_path` and make sure the schema exists
    ///
    /// Missing parent directories are created.
    ///
    /// # Examples
    /// ```no_run
    /// use study_recommend_lib::db::Database;
    ///
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let db = Database::new("/var/lib/study-recommend/history.db").await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let db_path = db_path.as_ref().to_path_buf();

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", db_path.display()))?
            .create_if_missing(true)
            .disable_statement_logging();

        let pool = SqlitePoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .connect_with(options)
            .await?;

        let db = Self {
            pool: Arc::new(pool),
            db_path,
        };

        db.initialize_schema().await?;
        log::debug!("Opened history store at {}", db.db_path.display());

        Ok(db)
    }

    /// Create a test database in memory
    ///
    /// Each pooled connection to `:memory:` would get its own empty database,
    /// so the test pool is pinned to a single connection that never expires.
    #[cfg(test)]
    pub async fn new_test() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        let db = Self {
            pool: Arc::new(pool),
            db_path: PathBuf::from(":memory:"),
        };

        db.initialize_schema().await?;

        Ok(db)
    }

    /// Run `schema.sql`. Every statement is `IF NOT EXISTS`, so reopening is safe.
    async fn initialize_schema(&self) -> Result<()> {
        let schema = include_str!("../../database/schema.sql");

        // sqlx executes one statement per query, so split the file
        for statement in schema.split(';') {
            let trimmed = statement.trim();
            if !trimmed.is_empty() {
                sqlx::query(trimmed).execute(self.pool.as_ref()).await?;
            }
        }

        Ok(())
    }

    /// Raw pool, for queries and transactions
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Where the store lives on disk (`:memory:` in tests)
    pub fn path(&self) -> &Path {
        &self.db_path
    }

    /// Wait for in-flight queries, then drop every connection
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Row counts per table, distinct students and pool occupancy
    pub async fn stats(&self) -> Result<DatabaseStats> {
        let question_count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM questions")
            .fetch_one(self.pool.as_ref())
            .await?;

        let solved_count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM solved_questions")
            .fetch_one(self.pool.as_ref())
            .await?;

        let attempt_count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM attempted_questions")
            .fetch_one(self.pool.as_ref())
            .await?;

        let student_count: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM (SELECT student_id FROM solved_questions UNION SELECT student_id FROM attempted_questions)",
        )
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(DatabaseStats {
            total_questions: question_count.0,
            total_solved: solved_count.0,
            total_attempts: attempt_count.0,
            total_students: student_count.0,
            pool_size: self.pool.size(),
            idle_connections: self.pool.num_idle(),
        })
    }
}

/// Snapshot printed by `study-recommend status`
#[derive(Debug, Clone)]
pub struct DatabaseStats {
    pub total_questions: i64,
    pub total_solved: i64,
    pub total_attempts: i64,
    pub total_students: i64,
    pub pool_size: u32,
    pub idle_connections: usize,
}
