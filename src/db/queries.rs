/// SQL query functions for database operations
///
/// Inherent methods cover reads and writes; the bottom of the file wires them
/// into the collaborator traits the engine consumes.

use crate::core::{AttemptHistorySource, HistoryFilter, QuestionCatalog, SolvedHistorySource};
use crate::db::models::*;
use crate::db::Database;
use crate::error::Result;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Executor, Row, Sqlite};

impl Database {
    /// Insert a question, replacing any existing row with the same id
    pub async fn insert_question(&self, question: &Question) -> Result<()> {
        upsert_question(self.pool(), question).await
    }

    /// Record a solve
    ///
    /// # Returns
    /// * `Ok(i64)` - The new record id
    pub async fn record_solved(&self, record: &SolvedRecord) -> Result<i64> {
        insert_solved(self.pool(), record).await
    }

    /// Record an attempt
    pub async fn record_attempt(&self, record: &AttemptRecord) -> Result<i64> {
        insert_attempt(self.pool(), record).await
    }

    /// Write a batch of questions and history in one transaction
    ///
    /// Either every row lands or none does.
    pub async fn insert_batch(
        &self,
        questions: &[Question],
        solved: &[SolvedRecord],
        attempts: &[AttemptRecord],
    ) -> Result<()> {
        let mut tx = self.pool().begin().await?;

        for question in questions {
            upsert_question(&mut *tx, question).await?;
        }
        for record in solved {
            insert_solved(&mut *tx, record).await?;
        }
        for record in attempts {
            insert_attempt(&mut *tx, record).await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Get every question in insertion order
    pub async fn get_all_questions(&self) -> Result<Vec<Question>> {
        let rows = sqlx::query_as::<_, QuestionRow>(
            "SELECT id, course_name, chapter, difficulty, question_type FROM questions ORDER BY rowid",
        )
        .fetch_all(self.pool())
        .await?;

        rows.into_iter().map(Question::try_from).collect()
    }

    /// Get all solved records for a student, oldest first
    pub async fn get_solved_records(&self, student_id: &str) -> Result<Vec<SolvedRecord>> {
        let rows = sqlx::query_as::<_, SolvedRow>(
            "SELECT * FROM solved_questions WHERE student_id = ? ORDER BY id",
        )
        .bind(student_id)
        .fetch_all(self.pool())
        .await?;

        rows.into_iter().map(SolvedRecord::try_from).collect()
    }

    /// Get distinct solved question ids
    ///
    /// # Arguments
    /// * `filter` - Student plus optional course restriction
    pub async fn get_solved_question_ids(&self, filter: &HistoryFilter) -> Result<Vec<String>> {
        let ids: Vec<(String,)> = if let Some(course) = &filter.course_name {
            sqlx::query_as(
                "SELECT DISTINCT question_id FROM solved_questions WHERE student_id = ? AND course_name = ? ORDER BY question_id",
            )
            .bind(&filter.student_id)
            .bind(course)
            .fetch_all(self.pool())
            .await?
        } else {
            sqlx::query_as(
                "SELECT DISTINCT question_id FROM solved_questions WHERE student_id = ? ORDER BY question_id",
            )
            .bind(&filter.student_id)
            .fetch_all(self.pool())
            .await?
        };

        Ok(ids.into_iter().map(|(id,)| id).collect())
    }

    /// Get all attempt records for a student, oldest first
    pub async fn get_attempted_records(&self, student_id: &str) -> Result<Vec<AttemptRecord>> {
        let rows = sqlx::query_as::<_, AttemptRow>(
            "SELECT * FROM attempted_questions WHERE student_id = ? ORDER BY id",
        )
        .bind(student_id)
        .fetch_all(self.pool())
        .await?;

        rows.into_iter().map(AttemptRecord::try_from).collect()
    }

    /// Get distinct attempted question ids
    pub async fn get_attempted_question_ids(&self, filter: &HistoryFilter) -> Result<Vec<String>> {
        let ids: Vec<(String,)> = if let Some(course) = &filter.course_name {
            sqlx::query_as(
                "SELECT DISTINCT question_id FROM attempted_questions WHERE student_id = ? AND course_name = ? ORDER BY question_id",
            )
            .bind(&filter.student_id)
            .bind(course)
            .fetch_all(self.pool())
            .await?
        } else {
            sqlx::query_as(
                "SELECT DISTINCT question_id FROM attempted_questions WHERE student_id = ? ORDER BY question_id",
            )
            .bind(&filter.student_id)
            .fetch_all(self.pool())
            .await?
        };

        Ok(ids.into_iter().map(|(id,)| id).collect())
    }
}

async fn upsert_question<'c, E>(executor: E, question: &Question) -> Result<()>
where
    E: Executor<'c, Database = Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO questions (id, course_name, chapter, difficulty, question_type)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            course_name = excluded.course_name,
            chapter = excluded.chapter,
            difficulty = excluded.difficulty,
            question_type = excluded.question_type
        "#,
    )
    .bind(&question.id)
    .bind(&question.course_name)
    .bind(i64::from(question.chapter))
    .bind(question.difficulty.as_str())
    .bind(question.question_type.as_str())
    .execute(executor)
    .await?;

    Ok(())
}

async fn insert_solved<'c, E>(executor: E, record: &SolvedRecord) -> Result<i64>
where
    E: Executor<'c, Database = Sqlite>,
{
    let now = Utc::now().to_rfc3339();

    let result = sqlx::query(
        r#"
        INSERT INTO solved_questions (student_id, question_id, difficulty, course_name, grade, solve_count, solved_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(&record.student_id)
    .bind(&record.question_id)
    .bind(record.difficulty.as_str())
    .bind(&record.course_name)
    .bind(record.grade)
    .bind(i64::from(record.solve_count))
    .bind(now)
    .fetch_one(executor)
    .await?;

    Ok(result.get(0))
}

async fn insert_attempt<'c, E>(executor: E, record: &AttemptRecord) -> Result<i64>
where
    E: Executor<'c, Database = Sqlite>,
{
    let now = Utc::now().to_rfc3339();

    let result = sqlx::query(
        r#"
        INSERT INTO attempted_questions (student_id, question_id, course_name, question_type, attempted_at)
        VALUES (?, ?, ?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(&record.student_id)
    .bind(&record.question_id)
    .bind(&record.course_name)
    .bind(record.question_type.as_str())
    .bind(now)
    .fetch_one(executor)
    .await?;

    Ok(result.get(0))
}

#[async_trait]
impl SolvedHistorySource for Database {
    async fn get_solved_records(&self, student_id: &str) -> Result<Vec<SolvedRecord>> {
        Database::get_solved_records(self, student_id).await
    }

    async fn get_solved_question_ids(&self, filter: &HistoryFilter) -> Result<Vec<String>> {
        Database::get_solved_question_ids(self, filter).await
    }
}

#[async_trait]
impl AttemptHistorySource for Database {
    async fn get_attempted_records(&self, student_id: &str) -> Result<Vec<AttemptRecord>> {
        Database::get_attempted_records(self, student_id).await
    }

    async fn get_attempted_question_ids(&self, filter: &HistoryFilter) -> Result<Vec<String>> {
        Database::get_attempted_question_ids(self, filter).await
    }
}

#[async_trait]
impl QuestionCatalog for Database {
    async fn get_all(&self) -> Result<Vec<Question>> {
        self.get_all_questions().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(id: &str, course: &str) -> Question {
        Question {
            id: id.to_string(),
            course_name: course.to_string(),
            chapter: 1,
            difficulty: Difficulty::Easy,
            question_type: QuestionType::MultipleChoice,
        }
    }

    fn solved(student: &str, question_id: &str, course: &str) -> SolvedRecord {
        SolvedRecord {
            student_id: student.to_string(),
            question_id: question_id.to_string(),
            difficulty: Difficulty::Easy,
            course_name: course.to_string(),
            grade: 75.0,
            solve_count: 1,
        }
    }

    #[tokio::test]
    async fn test_insert_and_list_questions_in_order() {
        let db = Database::new_test().await.unwrap();

        for id in ["q3", "q1", "q2"] {
            db.insert_question(&question(id, "Mathematics")).await.unwrap();
        }

        let all = db.get_all_questions().await.unwrap();
        let ids: Vec<&str> = all.iter().map(|q| q.id.as_str()).collect();
        assert_eq!(ids, vec!["q3", "q1", "q2"]);
    }

    #[tokio::test]
    async fn test_insert_question_replaces_existing() {
        let db = Database::new_test().await.unwrap();

        db.insert_question(&question("q1", "Mathematics")).await.unwrap();
        db.insert_question(&question("q1", "Physics")).await.unwrap();

        let all = db.get_all_questions().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].course_name, "Physics");
    }

    #[tokio::test]
    async fn test_solved_records_roundtrip() {
        let db = Database::new_test().await.unwrap();

        let id = db.record_solved(&solved("s1", "q1", "Mathematics")).await.unwrap();
        assert!(id > 0);

        let records = db.get_solved_records("s1").await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].grade, 75.0);
        assert!(db.get_solved_records("s2").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_solved_ids_are_distinct_and_filtered() {
        let db = Database::new_test().await.unwrap();

        db.record_solved(&solved("s1", "q1", "Mathematics")).await.unwrap();
        db.record_solved(&solved("s1", "q1", "Mathematics")).await.unwrap();
        db.record_solved(&solved("s1", "q2", "English")).await.unwrap();
        db.record_solved(&solved("s2", "q3", "English")).await.unwrap();

        let all = db
            .get_solved_question_ids(&HistoryFilter::for_student("s1"))
            .await
            .unwrap();
        assert_eq!(all, vec!["q1".to_string(), "q2".to_string()]);

        let english = db
            .get_solved_question_ids(&HistoryFilter::for_student("s1").with_course("English"))
            .await
            .unwrap();
        assert_eq!(english, vec!["q2".to_string()]);
    }

    #[tokio::test]
    async fn test_attempt_records() {
        let db = Database::new_test().await.unwrap();

        db.record_attempt(&AttemptRecord {
            student_id: "s1".to_string(),
            question_id: "q9".to_string(),
            course_name: "Physics".to_string(),
            question_type: QuestionType::Code,
        })
        .await
        .unwrap();

        let records = db.get_attempted_records("s1").await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].question_type, QuestionType::Code);

        let ids = db
            .get_attempted_question_ids(&HistoryFilter::for_student("s1").with_course("Physics"))
            .await
            .unwrap();
        assert_eq!(ids, vec!["q9".to_string()]);
    }

    #[tokio::test]
    async fn test_insert_batch_commits_everything() {
        let db = Database::new_test().await.unwrap();

        db.insert_batch(
            &[question("q1", "Mathematics"), question("q2", "English")],
            &[solved("s1", "q1", "Mathematics")],
            &[],
        )
        .await
        .unwrap();

        let stats = db.stats().await.unwrap();
        assert_eq!(stats.total_questions, 2);
        assert_eq!(stats.total_solved, 1);
    }

    #[tokio::test]
    async fn test_insert_batch_rolls_back_on_failure() {
        let db = Database::new_test().await.unwrap();
        sqlx::query("DROP TABLE attempted_questions")
            .execute(db.pool())
            .await
            .unwrap();

        let attempt = AttemptRecord {
            student_id: "s1".to_string(),
            question_id: "q1".to_string(),
            course_name: "Mathematics".to_string(),
            question_type: QuestionType::MultipleChoice,
        };
        let result = db
            .insert_batch(
                &[question("q1", "Mathematics")],
                &[solved("s1", "q1", "Mathematics")],
                &[attempt],
            )
            .await;
        assert!(matches!(result, Err(crate::error::RecommendError::Database(_))));

        // Questions and solves written before the failing insert are gone too
        assert!(db.get_all_questions().await.unwrap().is_empty());
        assert!(db.get_solved_records("s1").await.unwrap().is_empty());
    }
}
