/// Candidate filter
///
/// Narrows the catalog to questions worth recommending: not yet solved and,
/// when asked, from one subject. Never relaxes a filter that matches nothing.

use crate::db::Question;
use crate::error::{RecommendError, Result};
use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;
use std::collections::HashSet;
use std::sync::Arc;

/// Source of the subjects a caller may filter by
pub trait SubjectWhitelist: Send + Sync {
    fn known_subjects(&self) -> &[String];

    /// Exact, case-sensitive membership
    fn is_known_subject(&self, subject: &str) -> bool {
        self.known_subjects().iter().any(|s| s == subject)
    }
}

pub struct CandidateFilter {
    whitelist: Arc<dyn SubjectWhitelist>,
    matcher: SkimMatcherV2,
}

impl CandidateFilter {
    pub fn new(whitelist: Arc<dyn SubjectWhitelist>) -> Self {
        Self {
            whitelist,
            matcher: SkimMatcherV2::default(),
        }
    }

    /// Check a requested subject against the whitelist
    ///
    /// # Returns
    /// * `Ok(None)` - No filter (absent, empty or blank subject)
    /// * `Ok(Some(subject))` - A known subject
    /// * `Err(InvalidArgument)` - Anything else
    pub fn validate_subject<'a>(&self, subject: Option<&'a str>) -> Result<Option<&'a str>> {
        let subject = match subject {
            Some(s) if !s.trim().is_empty() => s,
            _ => return Ok(None),
        };

        if self.whitelist.is_known_subject(subject) {
            return Ok(Some(subject));
        }

        let message = match self.closest_subject(subject) {
            Some(guess) => format!("Unknown subject '{}'. Did you mean '{}'?", subject, guess),
            None => format!("Unknown subject '{}'", subject),
        };

        Err(RecommendError::InvalidArgument(message))
    }

    /// Best fuzzy match among known subjects, if any
    pub fn closest_subject(&self, input: &str) -> Option<&str> {
        self.whitelist
            .known_subjects()
            .iter()
            .filter_map(|s| self.matcher.fuzzy_match(s, input).map(|score| (s, score)))
            .max_by_key(|(_, score)| *score)
            .map(|(s, _)| s.as_str())
    }

    /// Keep only questions from `subject`, or everything when there is no filter
    pub fn restrict_to_subject(questions: Vec<Question>, subject: Option<&str>) -> Vec<Question> {
        match subject {
            Some(subject) => questions
                .into_iter()
                .filter(|q| q.course_name == subject)
                .collect(),
            None => questions,
        }
    }

    /// Drop questions the student has already solved
    pub fn drop_solved(questions: Vec<Question>, solved_ids: &HashSet<String>) -> Vec<Question> {
        questions
            .into_iter()
            .filter(|q| !solved_ids.contains(&q.id))
            .collect()
    }

    /// Validate the subject, then apply both filters, preserving catalog order
    ///
    /// Single-shot form of the filter. `Recommender` runs the same two steps
    /// separately so it can stop before loading history when the subject is empty.
    pub fn filter_candidates(
        &self,
        all_questions: Vec<Question>,
        solved_ids: &HashSet<String>,
        subject: Option<&str>,
    ) -> Result<Vec<Question>> {
        let subject = self.validate_subject(subject)?;
        let in_subject = Self::restrict_to_subject(all_questions, subject);

        Ok(Self::drop_solved(in_subject, solved_ids))
    }
}
