/// Data models for catalog and history entities
///
/// Domain types are plain serde structs. Rows come out of sqlx as `*Row`
/// structs with text columns and are converted with `TryFrom`, so a bad
/// value in the store surfaces as `CorruptRecord` instead of a panic.

use crate::error::RecommendError;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::str::FromStr;

/// Question difficulty, ordered Easy < Medium < Hard
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    /// Integer position used for ordinal distance
    pub fn ordinal(self) -> i32 {
        match self {
            Difficulty::Easy => 0,
            Difficulty::Medium => 1,
            Difficulty::Hard => 2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        }
    }
}

impl FromStr for Difficulty {
    type Err = RecommendError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Easy" => Ok(Difficulty::Easy),
            "Medium" => Ok(Difficulty::Medium),
            "Hard" => Ok(Difficulty::Hard),
            other => Err(RecommendError::CorruptRecord(format!(
                "unknown difficulty '{}'",
                other
            ))),
        }
    }
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Question format
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum QuestionType {
    MultipleChoice,
    TrueFalse,
    ProblemSolving,
    Code,
}

impl QuestionType {
    pub const ALL: [QuestionType; 4] = [
        QuestionType::MultipleChoice,
        QuestionType::TrueFalse,
        QuestionType::ProblemSolving,
        QuestionType::Code,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionType::MultipleChoice => "MultipleChoice",
            QuestionType::TrueFalse => "TrueFalse",
            QuestionType::ProblemSolving => "ProblemSolving",
            QuestionType::Code => "Code",
        }
    }
}

impl FromStr for QuestionType {
    type Err = RecommendError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "MultipleChoice" => Ok(QuestionType::MultipleChoice),
            "TrueFalse" => Ok(QuestionType::TrueFalse),
            "ProblemSolving" => Ok(QuestionType::ProblemSolving),
            "Code" => Ok(QuestionType::Code),
            other => Err(RecommendError::CorruptRecord(format!(
                "unknown question type '{}'",
                other
            ))),
        }
    }
}

impl std::fmt::Display for QuestionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A question from the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: String,
    pub course_name: String,
    pub chapter: u32,
    pub difficulty: Difficulty,
    pub question_type: QuestionType,
}

/// Evidence that a student solved a question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolvedRecord {
    pub student_id: String,
    pub question_id: String,
    pub difficulty: Difficulty,
    pub course_name: String,
    /// Mastery quality of the solve
    pub grade: f64,
    #[serde(default = "default_solve_count")]
    pub solve_count: u32,
}

fn default_solve_count() -> u32 {
    1
}

/// Evidence that a student engaged with a question, solved or not
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptRecord {
    pub student_id: String,
    pub question_id: String,
    pub course_name: String,
    pub question_type: QuestionType,
}

/// Row shape of the `questions` table
#[derive(Debug, Clone, FromRow)]
pub struct QuestionRow {
    pub id: String,
    pub course_name: String,
    pub chapter: i64,
    pub difficulty: String,
    pub question_type: String,
}

impl TryFrom<QuestionRow> for Question {
    type Error = RecommendError;

    fn try_from(row: QuestionRow) -> Result<Self, Self::Error> {
        let chapter = u32::try_from(row.chapter).map_err(|_| {
            RecommendError::CorruptRecord(format!(
                "question {} has chapter {}",
                row.id, row.chapter
            ))
        })?;

        Ok(Question {
            difficulty: row.difficulty.parse()?,
            question_type: row.question_type.parse()?,
            id: row.id,
            course_name: row.course_name,
            chapter,
        })
    }
}

/// Row shape of the `solved_questions` table
#[derive(Debug, Clone, FromRow)]
pub struct SolvedRow {
    pub id: i64,
    pub student_id: String,
    pub question_id: String,
    pub difficulty: String,
    pub course_name: String,
    pub grade: f64,
    pub solve_count: i64,
    pub solved_at: String, // ISO 8601
}

impl TryFrom<SolvedRow> for SolvedRecord {
    type Error = RecommendError;

    fn try_from(row: SolvedRow) -> Result<Self, Self::Error> {
        Ok(SolvedRecord {
            difficulty: row.difficulty.parse()?,
            student_id: row.student_id,
            question_id: row.question_id,
            course_name: row.course_name,
            grade: row.grade,
            // negative counts only come from hand-edited rows; treat as unsolved
            solve_count: u32::try_from(row.solve_count.max(0)).unwrap_or(u32::MAX),
        })
    }
}

/// Row shape of the `attempted_questions` table
#[derive(Debug, Clone, FromRow)]
pub struct AttemptRow {
    pub id: i64,
    pub student_id: String,
    pub question_id: String,
    pub course_name: String,
    pub question_type: String,
    pub attempted_at: String, // ISO 8601
}

impl TryFrom<AttemptRow> for AttemptRecord {
    type Error = RecommendError;

    fn try_from(row: AttemptRow) -> Result<Self, Self::Error> {
        Ok(AttemptRecord {
            question_type: row.question_type.parse()?,
            student_id: row.student_id,
            question_id: row.question_id,
            course_name: row.course_name,
        })
    }
}
