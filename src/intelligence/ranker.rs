/// Ranker
///
/// Orders scored candidates and cuts the list to the requested size.

use crate::db::Question;
use crate::intelligence::ScoreBreakdown;
use serde::Serialize;
use std::cmp::Ordering;

/// A question paired with its score
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredCandidate {
    pub question: Question,
    /// Relevance in [0.0, 1.0]
    pub score: f64,
    pub breakdown: ScoreBreakdown,
}

pub struct Ranker;

impl Ranker {
    /// Sort by score, highest first, and keep at most `limit`
    ///
    /// The sort is stable, so equal scores keep catalog order.
    /// `limit <= 0` returns nothing; a limit above the candidate count returns all.
    pub fn rank(mut scored: Vec<ScoredCandidate>, limit: i64) -> Vec<ScoredCandidate> {
        if limit <= 0 {
            return Vec::new();
        }

        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        scored.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        scored
    }

    /// Rank and strip scores
    pub fn select(scored: Vec<ScoredCandidate>, limit: i64) -> Vec<Question> {
        Self::rank(scored, limit)
            .into_iter()
            .map(|c| c.question)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{Difficulty, QuestionType};

    fn candidate(id: &str, score: f64) -> ScoredCandidate {
        ScoredCandidate {
            question: Question {
                id: id.to_string(),
                course_name: "Mathematics".to_string(),
                chapter: 1,
                difficulty: Difficulty::Easy,
                question_type: QuestionType::Code,
            },
            score,
            breakdown: ScoreBreakdown {
                difficulty_match: score,
                type_preference: score,
                subject_preference: score,
                progress_alignment: score,
                type_success: score,
                subject_success: score,
                attempt_penalty: score,
            },
        }
    }

    fn ids(questions: &[Question]) -> Vec<&str> {
        questions.iter().map(|q| q.id.as_str()).collect()
    }

    #[test]
    fn test_rank_descending() {
        let scored = vec![candidate("a", 0.2), candidate("b", 0.9), candidate("c", 0.5)];

        let selected = Ranker::select(scored, 5);
        assert_eq!(ids(&selected), vec!["b", "c", "a"]);
    }

    #[test]
    fn test_ties_keep_input_order() {
        let scored = vec![
            candidate("first", 0.6),
            candidate("top", 0.8),
            candidate("second", 0.6),
            candidate("third", 0.6),
        ];

        let selected = Ranker::select(scored, 10);
        assert_eq!(ids(&selected), vec!["top", "first", "second", "third"]);
    }

    #[test]
    fn test_limit_truncates() {
        let scored = vec![candidate("a", 0.2), candidate("b", 0.9), candidate("c", 0.5)];

        let selected = Ranker::select(scored, 2);
        assert_eq!(ids(&selected), vec!["b", "c"]);
    }

    #[test]
    fn test_non_positive_limit_is_empty() {
        assert!(Ranker::select(vec![candidate("a", 0.2)], 0).is_empty());
        assert!(Ranker::select(vec![candidate("a", 0.2)], -3).is_empty());
    }

    #[test]
    fn test_limit_above_candidate_count() {
        let scored = vec![candidate("a", 0.2), candidate("b", 0.9), candidate("c", 0.5)];

        let ranked = Ranker::rank(scored, 100);
        assert_eq!(ranked.len(), 3);
        assert!(ranked.windows(2).all(|w| w[0].score >= w[1].score));
    }
}
