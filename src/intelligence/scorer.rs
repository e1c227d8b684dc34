/// Scoring algorithms for candidate questions
///
/// Seven bounded sub-scores, combined as a weighted sum. Every sub-score sits
/// in [0, 1] and the weights sum to 1.0, so the total does too.

use crate::db::Question;
use crate::error::{RecommendError, Result};
use crate::intelligence::StudentPerformanceProfile;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

// Each ordinal step away from the preferred difficulty costs this much
const DIFFICULTY_STEP_PENALTY: f64 = 0.3;

// Score for a type/subject outside the student's top picks
const NON_PREFERRED_SCORE: f64 = 0.5;

// Progress alignment when the student has no progress in the subject
const UNKNOWN_PROGRESS_SCORE: f64 = 0.5;

// Attempted-but-unsolved questions are discouraged, not excluded
const ATTEMPTED_SCORE: f64 = 0.7;
const NOT_ATTEMPTED_SCORE: f64 = 1.0;

const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// Weights for the seven scoring factors
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ScoringWeights {
    pub difficulty_match: f64,
    pub type_preference: f64,
    pub subject_preference: f64,
    pub progress_alignment: f64,
    pub type_success: f64,
    pub subject_success: f64,
    pub attempt_penalty: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            difficulty_match: 0.25,
            type_preference: 0.15,
            subject_preference: 0.20,
            progress_alignment: 0.15,
            type_success: 0.10,
            subject_success: 0.10,
            attempt_penalty: 0.05,
        }
    }
}

impl ScoringWeights {
    fn as_array(&self) -> [f64; 7] {
        [
            self.difficulty_match,
            self.type_preference,
            self.subject_preference,
            self.progress_alignment,
            self.type_success,
            self.subject_success,
            self.attempt_penalty,
        ]
    }

    pub fn total(&self) -> f64 {
        self.as_array().iter().sum()
    }

    /// Weights must be non-negative and sum to 1.0
    pub fn validate(&self) -> Result<()> {
        if self.as_array().iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(RecommendError::Config(
                "scoring weights must be finite and non-negative".to_string(),
            ));
        }

        let total = self.total();
        if (total - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(RecommendError::Config(format!(
                "scoring weights must sum to 1.0, got {:.4}",
                total
            )));
        }

        Ok(())
    }
}

/// Per-factor sub-scores for one question, each in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    pub difficulty_match: f64,
    pub type_preference: f64,
    pub subject_preference: f64,
    pub progress_alignment: f64,
    pub type_success: f64,
    pub subject_success: f64,
    pub attempt_penalty: f64,
}

impl ScoreBreakdown {
    /// Straight weighted sum, no renormalization
    pub fn weighted_total(&self, weights: &ScoringWeights) -> f64 {
        let score = self.difficulty_match * weights.difficulty_match
            + self.type_preference * weights.type_preference
            + self.subject_preference * weights.subject_preference
            + self.progress_alignment * weights.progress_alignment
            + self.type_success * weights.type_success
            + self.subject_success * weights.subject_success
            + self.attempt_penalty * weights.attempt_penalty;

        // absorbs float drift when the weights add to 1.0000000000000002
        score.clamp(0.0, 1.0)
    }
}

/// Scorer for candidate questions
#[derive(Debug, Clone)]
pub struct Scorer {
    weights: ScoringWeights,
    chapters_per_course: u32,
}

impl Scorer {
    pub fn new(weights: ScoringWeights, chapters_per_course: u32) -> Self {
        Self {
            weights,
            // a zero chapter count would divide by zero; config validation rejects it anyway
            chapters_per_course: chapters_per_course.max(1),
        }
    }

    pub fn weights(&self) -> &ScoringWeights {
        &self.weights
    }

    /// Calculate the relevance score of a question for a student
    ///
    /// # Returns
    /// * Score between 0.0 and 1.0
    pub fn score(
        &self,
        question: &Question,
        profile: &StudentPerformanceProfile,
        attempted_ids: &HashSet<String>,
    ) -> f64 {
        self.breakdown(question, profile, attempted_ids)
            .weighted_total(&self.weights)
    }

    /// Calculate every sub-score without combining them
    pub fn breakdown(
        &self,
        question: &Question,
        profile: &StudentPerformanceProfile,
        attempted_ids: &HashSet<String>,
    ) -> ScoreBreakdown {
        ScoreBreakdown {
            difficulty_match: Self::difficulty_match(question, profile),
            type_preference: Self::type_preference(question, profile),
            subject_preference: Self::subject_preference(question, profile),
            progress_alignment: self.progress_alignment(question, profile),
            type_success: profile
                .success_rate_by_type
                .rate(&question.question_type)
                .clamp(0.0, 1.0),
            subject_success: profile
                .success_rate_by_subject
                .rate(question.course_name.as_str())
                .clamp(0.0, 1.0),
            attempt_penalty: Self::attempt_penalty(question, attempted_ids),
        }
    }

    /// 1.0 at the preferred difficulty, 0.3 less per ordinal step, never negative
    pub fn difficulty_match(question: &Question, profile: &StudentPerformanceProfile) -> f64 {
        let distance =
            (question.difficulty.ordinal() - profile.preferred_difficulty.ordinal()).abs();

        (1.0 - DIFFICULTY_STEP_PENALTY * distance as f64).max(0.0)
    }

    pub fn type_preference(question: &Question, profile: &StudentPerformanceProfile) -> f64 {
        if profile.preferred_types.contains(&question.question_type) {
            1.0
        } else {
            NON_PREFERRED_SCORE
        }
    }

    pub fn subject_preference(question: &Question, profile: &StudentPerformanceProfile) -> f64 {
        if profile
            .preferred_subjects
            .iter()
            .any(|s| s == &question.course_name)
        {
            1.0
        } else {
            NON_PREFERRED_SCORE
        }
    }

    /// How close the question's chapter sits to where the student is in the course
    ///
    /// Chapter position is mapped onto 0-100 assuming `chapters_per_course` chapters.
    pub fn progress_alignment(&self, question: &Question, profile: &StudentPerformanceProfile) -> f64 {
        match profile.course_progress.get(&question.course_name) {
            Some(progress) => {
                let chapter_position =
                    question.chapter as f64 / self.chapters_per_course as f64 * 100.0;
                let gap = (progress - chapter_position).abs();

                (1.0 - gap / 100.0).clamp(0.0, 1.0)
            }
            None => UNKNOWN_PROGRESS_SCORE,
        }
    }

    pub fn attempt_penalty(question: &Question, attempted_ids: &HashSet<String>) -> f64 {
        if attempted_ids.contains(&question.id) {
            ATTEMPTED_SCORE
        } else {
            NOT_ATTEMPTED_SCORE
        }
    }
}
