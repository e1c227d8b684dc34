// Builds a student's performance profile from their history
//
// Everything here degrades to defaults. A student with no history still gets
// a full profile, so they still get a full recommendation list.

use crate::config::{RecommenderConfig, DEFAULT_FALLBACK_SUBJECTS};
use crate::core::HistorySources;
use crate::db::{AttemptRecord, Difficulty, Question, QuestionType, SolvedRecord};
use crate::error::Result;
use log::{debug, warn};
use serde::Serialize;
use std::borrow::Borrow;
use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;

/// Rate used when we have no attempts to judge from
pub const NEUTRAL_SUCCESS_RATE: f64 = 0.5;

// How many types / subjects make the "preferred" list
const TOP_PREFERENCES: usize = 2;

const DEFAULT_DIFFICULTY: Difficulty = Difficulty::Medium;
const DEFAULT_TYPES: [QuestionType; 2] = [QuestionType::MultipleChoice, QuestionType::TrueFalse];

/// Success rates keyed by a closed set of values
///
/// Lookups for a key that was never recorded return `NEUTRAL_SUCCESS_RATE`,
/// so "unknown" is neither rewarded nor penalized.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SuccessRates<K: Ord> {
    rates: BTreeMap<K, f64>,
}

impl<K: Ord> SuccessRates<K> {
    pub fn new() -> Self {
        Self {
            rates: BTreeMap::new(),
        }
    }

    /// Store a rate, clamped to [0, 1]
    pub fn insert(&mut self, key: K, rate: f64) {
        let rate = if rate.is_finite() {
            rate.clamp(0.0, 1.0)
        } else {
            NEUTRAL_SUCCESS_RATE
        };
        self.rates.insert(key, rate);
    }

    pub fn rate<Q>(&self, key: &Q) -> f64
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.rates.get(key).copied().unwrap_or(NEUTRAL_SUCCESS_RATE)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, f64)> {
        self.rates.iter().map(|(k, v)| (k, *v))
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}

impl<K: Ord> Default for SuccessRates<K> {
    fn default() -> Self {
        Self::new()
    }
}

/// Derived per-request summary of how a student performs
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentPerformanceProfile {
    pub average_score: f64,
    pub preferred_difficulty: Difficulty,
    pub preferred_types: Vec<QuestionType>,
    pub preferred_subjects: Vec<String>,
    /// Subject -> percent complete, 0-100
    pub course_progress: BTreeMap<String, f64>,
    pub success_rate_by_type: SuccessRates<QuestionType>,
    pub success_rate_by_subject: SuccessRates<String>,
}

impl Default for StudentPerformanceProfile {
    fn default() -> Self {
        Self {
            average_score: 0.0,
            preferred_difficulty: DEFAULT_DIFFICULTY,
            preferred_types: DEFAULT_TYPES.to_vec(),
            preferred_subjects: DEFAULT_FALLBACK_SUBJECTS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            course_progress: BTreeMap::new(),
            success_rate_by_type: SuccessRates::new(),
            success_rate_by_subject: SuccessRates::new(),
        }
    }
}

/// Performance metrics calculator
#[derive(Debug, Clone)]
pub struct MetricsCalculator {
    known_subjects: Vec<String>,
    fallback_subjects: Vec<String>,
}

impl MetricsCalculator {
    pub fn new(config: &RecommenderConfig) -> Self {
        Self {
            known_subjects: config.known_subjects.clone(),
            fallback_subjects: config.fallback_subjects.clone(),
        }
    }

    /// Fetch a student's history and build their profile
    ///
    /// # Arguments
    /// * `student_id` - Student to profile
    /// * `subject` - Only scopes the course-progress map
    /// * `pool` - Questions used to look up the type of each solved question
    pub async fn compute_profile(
        &self,
        sources: &HistorySources,
        student_id: &str,
        subject: Option<&str>,
        pool: &[Question],
    ) -> Result<StudentPerformanceProfile> {
        let (solved, attempted) = tokio::try_join!(
            sources.solved.get_solved_records(student_id),
            sources.attempts.get_attempted_records(student_id),
        )?;

        Ok(self.build_profile(&solved, &attempted, subject, pool))
    }

    /// Build a profile from already-fetched history
    pub fn build_profile(
        &self,
        solved: &[SolvedRecord],
        attempted: &[AttemptRecord],
        subject: Option<&str>,
        pool: &[Question],
    ) -> StudentPerformanceProfile {
        let type_by_id: HashMap<&str, QuestionType> = pool
            .iter()
            .map(|q| (q.id.as_str(), q.question_type))
            .collect();

        let solved_types: Vec<(QuestionType, f64)> = solved
            .iter()
            .filter_map(|r| {
                type_by_id
                    .get(r.question_id.as_str())
                    .map(|t| (*t, r.grade))
            })
            .collect();

        let unmatched = solved.len() - solved_types.len();
        if unmatched > 0 {
            warn!(
                "{} solved record(s) reference questions missing from the catalog",
                unmatched
            );
        }

        let profile = StudentPerformanceProfile {
            average_score: Self::average_score(solved),
            preferred_difficulty: Self::preferred_difficulty(solved),
            preferred_types: Self::preferred_types(&solved_types),
            preferred_subjects: self.preferred_subjects(solved),
            course_progress: Self::course_progress(solved, subject),
            success_rate_by_type: Self::success_rate_by_type(&solved_types, attempted),
            success_rate_by_subject: self.success_rate_by_subject(solved, attempted),
        };

        debug!(
            "Profile: avg {:.1}, difficulty {}, types {:?}, subjects {:?}, progress {:?}",
            profile.average_score,
            profile.preferred_difficulty,
            profile.preferred_types,
            profile.preferred_subjects,
            profile.course_progress
        );

        profile
    }

    fn average_score(solved: &[SolvedRecord]) -> f64 {
        if solved.is_empty() {
            return 0.0;
        }

        solved.iter().map(|r| r.grade).sum::<f64>() / solved.len() as f64
    }

    /// Difficulty with the highest mean grade
    fn preferred_difficulty(solved: &[SolvedRecord]) -> Difficulty {
        ranked_by_mean(solved.iter().map(|r| (r.difficulty, r.grade)))
            .first()
            .map(|(d, _)| *d)
            .unwrap_or(DEFAULT_DIFFICULTY)
    }

    fn preferred_types(solved_types: &[(QuestionType, f64)]) -> Vec<QuestionType> {
        let ranked = ranked_by_mean(solved_types.iter().copied());
        if ranked.is_empty() {
            return DEFAULT_TYPES.to_vec();
        }

        ranked
            .into_iter()
            .take(TOP_PREFERENCES)
            .map(|(t, _)| t)
            .collect()
    }

    fn preferred_subjects(&self, solved: &[SolvedRecord]) -> Vec<String> {
        let ranked = ranked_by_mean(solved.iter().map(|r| (r.course_name.as_str(), r.grade)));
        if ranked.is_empty() {
            return self.fallback_subjects.clone();
        }

        ranked
            .into_iter()
            .take(TOP_PREFERENCES)
            .map(|(s, _)| s.to_string())
            .collect()
    }

    /// Share of each subject's records that count at least one solve
    fn course_progress(solved: &[SolvedRecord], subject: Option<&str>) -> BTreeMap<String, f64> {
        let mut counts: BTreeMap<&str, (usize, usize)> = BTreeMap::new();

        for record in solved {
            if subject.is_some_and(|s| s != record.course_name) {
                continue;
            }

            let entry = counts.entry(record.course_name.as_str()).or_insert((0, 0));
            entry.1 += 1;
            if record.solve_count > 0 {
                entry.0 += 1;
            }
        }

        counts
            .into_iter()
            .map(|(course, (completed, total))| {
                (course.to_string(), completed as f64 / total as f64 * 100.0)
            })
            .collect()
    }

    fn success_rate_by_type(
        solved_types: &[(QuestionType, f64)],
        attempted: &[AttemptRecord],
    ) -> SuccessRates<QuestionType> {
        let mut rates = SuccessRates::new();

        for question_type in QuestionType::ALL {
            let solved_count = solved_types
                .iter()
                .filter(|(t, _)| *t == question_type)
                .count();
            let attempted_count = attempted
                .iter()
                .filter(|a| a.question_type == question_type)
                .count();

            rates.insert(question_type, success_rate(solved_count, attempted_count));
        }

        rates
    }

    fn success_rate_by_subject(
        &self,
        solved: &[SolvedRecord],
        attempted: &[AttemptRecord],
    ) -> SuccessRates<String> {
        let mut rates = SuccessRates::new();

        for subject in &self.known_subjects {
            let solved_count = solved.iter().filter(|r| &r.course_name == subject).count();
            let attempted_count = attempted
                .iter()
                .filter(|a| &a.course_name == subject)
                .count();

            rates.insert(subject.clone(), success_rate(solved_count, attempted_count));
        }

        rates
    }
}

fn success_rate(solved_count: usize, attempted_count: usize) -> f64 {
    if attempted_count == 0 {
        NEUTRAL_SUCCESS_RATE
    } else {
        solved_count as f64 / attempted_count as f64
    }
}

/// Group values by key and rank groups by mean, highest first
///
/// Groups keep first-appearance order and the sort is stable, so equal means
/// resolve to whichever key showed up first in the history.
fn ranked_by_mean<K, I>(items: I) -> Vec<(K, f64)>
where
    K: Eq + Hash + Copy,
    I: IntoIterator<Item = (K, f64)>,
{
    let mut index: HashMap<K, usize> = HashMap::new();
    let mut groups: Vec<(K, f64, usize)> = Vec::new();

    for (key, value) in items {
        let slot = *index.entry(key).or_insert_with(|| {
            groups.push((key, 0.0, 0));
            groups.len() - 1
        });
        groups[slot].1 += value;
        groups[slot].2 += 1;
    }

    let mut ranked: Vec<(K, f64)> = groups
        .into_iter()
        .map(|(key, sum, count)| (key, sum / count as f64))
        .collect();

    ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    ranked
}
