/// Interaction history sources
///
/// The engine never talks to storage directly. It reads history through
/// these three narrow interfaces, which the platform (or the bundled SQLite
/// `Database`) implements.

use crate::db::{AttemptRecord, Database, Question, SolvedRecord};
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Restricts a history id lookup to one student and, optionally, one course
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryFilter {
    pub student_id: String,
    pub course_name: Option<String>,
}

impl HistoryFilter {
    pub fn for_student(student_id: impl Into<String>) -> Self {
        Self {
            student_id: student_id.into(),
            course_name: None,
        }
    }

    pub fn with_course(mut self, course_name: impl Into<String>) -> Self {
        self.course_name = Some(course_name.into());
        self
    }
}

/// Store of solved-question evidence
#[async_trait]
pub trait SolvedHistorySource: Send + Sync {
    /// Every solved record for the student, empty for a new student
    async fn get_solved_records(&self, student_id: &str) -> Result<Vec<SolvedRecord>>;

    /// Distinct ids of questions the filter's student has solved
    async fn get_solved_question_ids(&self, filter: &HistoryFilter) -> Result<Vec<String>>;
}

/// Store of attempts, successful or not
#[async_trait]
pub trait AttemptHistorySource: Send + Sync {
    async fn get_attempted_records(&self, student_id: &str) -> Result<Vec<AttemptRecord>>;

    async fn get_attempted_question_ids(&self, filter: &HistoryFilter) -> Result<Vec<String>>;
}

/// The question pool
#[async_trait]
pub trait QuestionCatalog: Send + Sync {
    /// All questions, in a stable enumeration order
    async fn get_all(&self) -> Result<Vec<Question>>;
}

/// The three collaborators bundled for the engine
#[derive(Clone)]
pub struct HistorySources {
    pub solved: Arc<dyn SolvedHistorySource>,
    pub attempts: Arc<dyn AttemptHistorySource>,
    pub catalog: Arc<dyn QuestionCatalog>,
}

impl HistorySources {
    pub fn new(
        solved: Arc<dyn SolvedHistorySource>,
        attempts: Arc<dyn AttemptHistorySource>,
        catalog: Arc<dyn QuestionCatalog>,
    ) -> Self {
        Self {
            solved,
            attempts,
            catalog,
        }
    }

    /// Serve all three interfaces from one SQLite store
    pub fn from_database(db: Arc<Database>) -> Self {
        Self {
            solved: Arc::clone(&db) as Arc<dyn SolvedHistorySource>,
            attempts: Arc::clone(&db) as Arc<dyn AttemptHistorySource>,
            catalog: db,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_filter_builder() {
        let filter = HistoryFilter::for_student("s1").with_course("Physics");

        assert_eq!(filter.student_id, "s1");
        assert_eq!(filter.course_name.as_deref(), Some("Physics"));
    }

    #[tokio::test]
    async fn test_sources_from_database() {
        let db = Arc::new(Database::new_test().await.unwrap());
        let sources = HistorySources::from_database(db);

        assert!(sources.catalog.get_all().await.unwrap().is_empty());
        assert!(sources
            .solved
            .get_solved_records("nobody")
            .await
            .unwrap()
            .is_empty());
        assert!(sources
            .attempts
            .get_attempted_question_ids(&HistoryFilter::for_student("nobody"))
            .await
            .unwrap()
            .is_empty());
    }
}
