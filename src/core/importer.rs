// Loads a JSON seed file into the history store
//
// Everything is validated before the first write, and the writes share one
// transaction, so a bad file leaves the store untouched.

use crate::db::{AttemptRecord, Database, Question, SolvedRecord};
use crate::error::{RecommendError, Result};
use chrono::Utc;
use log::info;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

/// Contents of a seed file. Any section may be left out.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SeedFile {
    pub questions: Vec<Question>,
    pub solved: Vec<SolvedRecord>,
    pub attempts: Vec<AttemptRecord>,
}

/// What an import wrote
#[derive(Debug, Clone)]
pub struct ImportReport {
    pub questions: usize,
    pub solved: usize,
    pub attempts: usize,
    pub imported_at: String, // RFC 3339
}

pub struct Importer {
    db: Arc<Database>,
}

impl Importer {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Read and import a seed file
    pub async fn import_file<P: AsRef<Path>>(&self, path: P) -> Result<ImportReport> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let seed: SeedFile = serde_json::from_str(&raw)?;

        self.import(seed).await
    }

    pub async fn import(&self, seed: SeedFile) -> Result<ImportReport> {
        let seed = Self::sanitize(seed);
        Self::validate(&seed)?;

        self.db
            .insert_batch(&seed.questions, &seed.solved, &seed.attempts)
            .await?;

        let report = ImportReport {
            questions: seed.questions.len(),
            solved: seed.solved.len(),
            attempts: seed.attempts.len(),
            imported_at: Utc::now().to_rfc3339(),
        };

        info!(
            "Imported {} question(s), {} solve(s), {} attempt(s)",
            report.questions, report.solved, report.attempts
        );

        Ok(report)
    }

    // Trim stray whitespace around ids and names
    fn sanitize(mut seed: SeedFile) -> SeedFile {
        for q in &mut seed.questions {
            q.id = q.id.trim().to_string();
            q.course_name = q.course_name.trim().to_string();
        }
        for r in &mut seed.solved {
            r.student_id = r.student_id.trim().to_string();
            r.question_id = r.question_id.trim().to_string();
            r.course_name = r.course_name.trim().to_string();
        }
        for r in &mut seed.attempts {
            r.student_id = r.student_id.trim().to_string();
            r.question_id = r.question_id.trim().to_string();
            r.course_name = r.course_name.trim().to_string();
        }
        seed
    }

    fn validate(seed: &SeedFile) -> Result<()> {
        for (i, q) in seed.questions.iter().enumerate() {
            if q.id.is_empty() || q.course_name.is_empty() {
                return Err(invalid(format!("question #{} needs an id and a course", i + 1)));
            }
            if q.chapter < 1 {
                return Err(invalid(format!("question {} has chapter 0", q.id)));
            }
        }

        for (i, r) in seed.solved.iter().enumerate() {
            if r.student_id.is_empty() || r.question_id.is_empty() {
                return Err(invalid(format!(
                    "solved record #{} needs a student and a question",
                    i + 1
                )));
            }
            if !r.grade.is_finite() {
                return Err(invalid(format!(
                    "solved record #{} has a non-numeric grade",
                    i + 1
                )));
            }
        }

        for (i, r) in seed.attempts.iter().enumerate() {
            if r.student_id.is_empty() || r.question_id.is_empty() {
                return Err(invalid(format!(
                    "attempt #{} needs a student and a question",
                    i + 1
                )));
            }
        }

        Ok(())
    }
}

fn invalid(message: String) -> RecommendError {
    RecommendError::InvalidArgument(format!("Bad seed data: {}", message))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SEED: &str = r#"{
        "questions": [
            {"id": "q1", "courseName": "Mathematics", "chapter": 1, "difficulty": "Easy", "questionType": "MultipleChoice"},
            {"id": " q2 ", "courseName": "Physics", "chapter": 4, "difficulty": "Hard", "questionType": "Code"}
        ],
        "solved": [
            {"studentId": "s1", "questionId": "q1", "difficulty": "Easy", "courseName": "Mathematics", "grade": 92.5, "solveCount": 2}
        ],
        "attempts": [
            {"studentId": "s1", "questionId": "q2", "courseName": "Physics", "questionType": "Code"}
        ]
    }"#;

    async fn create_test_importer() -> (Importer, Arc<Database>) {
        let db = Arc::new(Database::new_test().await.unwrap());
        (Importer::new(Arc::clone(&db)), db)
    }

    #[tokio::test]
    async fn test_import_file() {
        let (importer, db) = create_test_importer().await;
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", SEED).unwrap();

        let report = importer.import_file(file.path()).await.unwrap();
        assert_eq!(report.questions, 2);
        assert_eq!(report.solved, 1);
        assert_eq!(report.attempts, 1);

        let stats = db.stats().await.unwrap();
        assert_eq!(stats.total_questions, 2);
        assert_eq!(stats.total_students, 1);

        // ids are trimmed on the way in
        let ids: Vec<String> = db
            .get_all_questions()
            .await
            .unwrap()
            .into_iter()
            .map(|q| q.id)
            .collect();
        assert_eq!(ids, vec!["q1".to_string(), "q2".to_string()]);
    }

    #[tokio::test]
    async fn test_partial_seed() {
        let (importer, db) = create_test_importer().await;
        let seed: SeedFile = serde_json::from_str(
            r#"{"questions": [{"id": "q1", "courseName": "English", "chapter": 2, "difficulty": "Medium", "questionType": "TrueFalse"}]}"#,
        )
        .unwrap();

        let report = importer.import(seed).await.unwrap();
        assert_eq!(report.questions, 1);
        assert_eq!(report.solved, 0);
        assert_eq!(db.get_all_questions().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_seed_writes_nothing() {
        let (importer, db) = create_test_importer().await;
        let mut seed: SeedFile = serde_json::from_str(SEED).unwrap();
        seed.solved[0].grade = f64::NAN;

        let result = importer.import(seed).await;
        match result {
            Err(RecommendError::InvalidArgument(msg)) => assert!(msg.contains("grade")),
            _ => panic!("Expected InvalidArgument error"),
        }

        let stats = db.stats().await.unwrap();
        assert_eq!(stats.total_questions, 0);
    }

    #[tokio::test]
    async fn test_store_failure_leaves_no_partial_import() {
        let (importer, db) = create_test_importer().await;
        sqlx::query("DROP TABLE attempted_questions")
            .execute(db.pool())
            .await
            .unwrap();

        let seed: SeedFile = serde_json::from_str(SEED).unwrap();
        let result = importer.import(seed).await;
        assert!(matches!(result, Err(RecommendError::Database(_))));

        assert!(db.get_all_questions().await.unwrap().is_empty());
        assert!(db.get_solved_records("s1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rejects_chapter_zero() {
        let (importer, _db) = create_test_importer().await;
        let mut seed: SeedFile = serde_json::from_str(SEED).unwrap();
        seed.questions[0].chapter = 0;

        assert!(importer.import(seed).await.is_err());
    }

    #[tokio::test]
    async fn test_rejects_blank_student() {
        let (importer, _db) = create_test_importer().await;
        let mut seed: SeedFile = serde_json::from_str(SEED).unwrap();
        seed.attempts[0].student_id = "   ".to_string();

        assert!(importer.import(seed).await.is_err());
    }

    #[tokio::test]
    async fn test_malformed_file() {
        let (importer, _db) = create_test_importer().await;
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{{\"questions\": [{{\"id\": 3}}]}}").unwrap();

        let result = importer.import_file(file.path()).await;
        assert!(matches!(result, Err(RecommendError::Serialization(_))));
    }
}
