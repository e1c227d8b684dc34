/// Recommendation engine
///
/// Coordinates the pipeline: validate subject, load catalog, filter,
/// profile the student, score, rank.

use crate::config::RecommenderConfig;
use crate::core::{HistoryFilter, HistorySources};
use crate::db::{Database, Question};
use crate::error::Result;
use crate::intelligence::{
    CandidateFilter, MetricsCalculator, Ranker, ScoredCandidate, Scorer,
    StudentPerformanceProfile,
};
use log::{debug, info};
use std::collections::HashSet;
use std::sync::Arc;

/// Question recommender
pub struct Recommender {
    sources: HistorySources,
    config: Arc<RecommenderConfig>,
    filter: CandidateFilter,
    metrics: MetricsCalculator,
    scorer: Scorer,
}

impl Recommender {
    /// Create a recommender backed by the SQLite store
    pub fn new(db: Arc<Database>, config: RecommenderConfig) -> Self {
        Self::with_sources(HistorySources::from_database(db), config)
    }

    /// Create a recommender over arbitrary history collaborators
    pub fn with_sources(sources: HistorySources, config: RecommenderConfig) -> Self {
        let config = Arc::new(config);
        let filter = CandidateFilter::new(config.clone());
        let metrics = MetricsCalculator::new(&config);
        let scorer = Scorer::new(config.weights, config.chapters_per_course);

        Self {
            sources,
            config,
            filter,
            metrics,
            scorer,
        }
    }

    pub fn config(&self) -> &RecommenderConfig {
        &self.config
    }

    /// Recommend questions for a student
    ///
    /// # Arguments
    /// * `student_id` - Student asking for practice
    /// * `subject` - Optional subject, must be whitelisted
    /// * `limit` - Maximum number of questions; `<= 0` returns nothing
    ///
    /// # Returns
    /// * `Ok(Vec<Question>)` - Best questions first, never one already solved
    /// * `Err(RecommendError::InvalidArgument)` - Unknown subject
    pub async fn get_recommendations(
        &self,
        student_id: &str,
        subject: Option<&str>,
        limit: i64,
    ) -> Result<Vec<Question>> {
        let ranked = self
            .explain_recommendations(student_id, subject, limit)
            .await?;

        Ok(ranked.into_iter().map(|c| c.question).collect())
    }

    /// Recommend with the configured default limit
    pub async fn recommend(&self, student_id: &str, subject: Option<&str>) -> Result<Vec<Question>> {
        self.get_recommendations(student_id, subject, self.config.default_limit)
            .await
    }

    /// Same pipeline as `get_recommendations`, keeping scores and breakdowns
    pub async fn explain_recommendations(
        &self,
        student_id: &str,
        subject: Option<&str>,
        limit: i64,
    ) -> Result<Vec<ScoredCandidate>> {
        let subject = self.filter.validate_subject(subject)?;

        let catalog = self.sources.catalog.get_all().await?;
        if catalog.is_empty() {
            debug!("Catalog is empty, nothing to recommend");
            return Ok(Vec::new());
        }

        let in_subject = CandidateFilter::restrict_to_subject(catalog.clone(), subject);
        if in_subject.is_empty() {
            debug!("No questions for subject {:?}", subject);
            return Ok(Vec::new());
        }

        let history_filter = HistoryFilter::for_student(student_id);
        let (solved, attempted, solved_ids, attempted_ids) = tokio::try_join!(
            self.sources.solved.get_solved_records(student_id),
            self.sources.attempts.get_attempted_records(student_id),
            self.sources.solved.get_solved_question_ids(&history_filter),
            self.sources.attempts.get_attempted_question_ids(&history_filter),
        )?;

        let profile = self
            .metrics
            .build_profile(&solved, &attempted, subject, &catalog);

        let solved_ids: HashSet<String> = solved_ids.into_iter().collect();
        let attempted_ids: HashSet<String> = attempted_ids.into_iter().collect();

        let candidates = CandidateFilter::drop_solved(in_subject, &solved_ids);
        let candidate_count = candidates.len();

        let scored: Vec<ScoredCandidate> = candidates
            .into_iter()
            .map(|question| {
                let breakdown = self.scorer.breakdown(&question, &profile, &attempted_ids);
                let score = breakdown.weighted_total(self.scorer.weights());

                ScoredCandidate {
                    question,
                    score,
                    breakdown,
                }
            })
            .collect();

        let ranked = Ranker::rank(scored, limit);

        info!(
            "Recommended {} of {} candidate(s) for student {} (subject: {})",
            ranked.len(),
            candidate_count,
            student_id,
            subject.unwrap_or("any")
        );

        Ok(ranked)
    }

    /// Build the student's current performance profile
    pub async fn profile(
        &self,
        student_id: &str,
        subject: Option<&str>,
    ) -> Result<StudentPerformanceProfile> {
        let subject = self.filter.validate_subject(subject)?;
        let catalog = self.sources.catalog.get_all().await?;

        self.metrics
            .compute_profile(&self.sources, student_id, subject, &catalog)
            .await
    }
}
