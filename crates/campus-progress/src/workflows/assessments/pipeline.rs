use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use tracing::{info, instrument, warn};

use super::cache::PassCache;
use super::domain::{
    AssessmentId, AssessmentKind, AttemptRecord, LearnerId, LearnerSummary, Lookup,
    ResolvedItem, SubjectEnrollment, SubmissionRecord,
};
use super::flatten::flatten_kind;
use super::resolve::resolve_settled;
use crate::config::PipelineConfig;
use crate::workflows::source::{ProgressSource, SourceError};

/// Committed result of one learner pass.
#[derive(Debug, Clone, Serialize)]
pub struct LearnerSnapshot {
    pub learner_id: LearnerId,
    pub generation: u64,
    pub items: Vec<ResolvedItem>,
    pub summary: LearnerSummary,
    pub refreshed_at: DateTime<Utc>,
}

/// Error raised by a pass.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PassError {
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error("pass for learner {learner_id} was superseded by a context change")]
    Superseded { learner_id: LearnerId },
    #[error("hierarchy pass {generation} was superseded by a newer refresh")]
    HierarchySuperseded { generation: u64 },
    #[error("no learner selected")]
    NoLearner,
}

impl PassError {
    /// Whole-pass transport failures may be retried; the previous snapshot stays in place.
    pub fn is_retryable(&self) -> bool {
        matches!(self, PassError::Source(SourceError::Transport(_)))
    }
}

/// Runs fetch → flatten → fan-out → resolve for one learner.
pub struct PassRunner<S: ?Sized> {
    source: Arc<S>,
    config: PipelineConfig,
}

impl<S> PassRunner<S>
where
    S: ProgressSource + ?Sized,
{
    pub fn new(source: Arc<S>, config: PipelineConfig) -> Self {
        Self { source, config }
    }

    pub fn source(&self) -> &Arc<S> {
        &self.source
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// The enrollment fetch is the only call whose failure fails the pass. Per-item lookups
    /// are isolated and default to `NotFound`.
    #[instrument(skip_all, fields(learner_id = %learner_id, generation = generation))]
    pub async fn run(
        &self,
        learner_id: &LearnerId,
        generation: u64,
        now: DateTime<Utc>,
    ) -> Result<LearnerSnapshot, PassError> {
        let subjects = self.source.fetch_enrollment(learner_id).await?;
        let cache = self.gather(learner_id, generation, &subjects).await;

        let items = resolve_settled(&subjects, &cache, now);
        let summary = LearnerSummary::from_items(&items);
        info!(
            generation,
            subjects = subjects.len(),
            items = items.len(),
            lookups = cache.lookup_count(),
            pending = summary.pending,
            locked = summary.locked,
            "learner pass resolved"
        );

        // The snapshot carries the identity of the cache it was resolved from; the session
        // checks it against the live context before committing.
        Ok(LearnerSnapshot {
            learner_id: cache.learner_id().clone(),
            generation: cache.generation(),
            items,
            summary,
            refreshed_at: now,
        })
    }

    /// Both fan-outs run concurrently; the cache is returned only once every lookup settled.
    pub async fn gather(
        &self,
        learner_id: &LearnerId,
        generation: u64,
        subjects: &[SubjectEnrollment],
    ) -> PassCache {
        let assignment_ids: Vec<AssessmentId> =
            flatten_kind(subjects, AssessmentKind::Assignment)
                .map(|item| item.definition.id.clone())
                .collect();
        let examination_ids: Vec<AssessmentId> =
            flatten_kind(subjects, AssessmentKind::Examination)
                .filter(|item| item.completion().unlocks_examinations())
                .map(|item| item.definition.id.clone())
                .collect();

        let (submissions, attempts) = tokio::join!(
            self.fetch_submissions(learner_id, assignment_ids),
            self.fetch_attempts(learner_id, examination_ids),
        );

        let mut cache = PassCache::new(learner_id.clone(), generation);
        for (id, lookup) in submissions {
            cache.record_submission(id, lookup);
        }
        for (id, lookup) in attempts {
            cache.record_attempt(id, lookup);
        }
        cache
    }

    async fn fetch_submissions(
        &self,
        learner_id: &LearnerId,
        ids: Vec<AssessmentId>,
    ) -> Vec<(AssessmentId, Lookup<SubmissionRecord>)> {
        let source = &self.source;
        stream::iter(ids)
            .map(|id| async move {
                match source.fetch_submission_status(learner_id, &id).await {
                    Ok(status) => {
                        let lookup = status.into_lookup(&id);
                        (id, lookup)
                    }
                    Err(err) => {
                        warn!(assessment_id = %id, error = %err, "submission lookup failed; defaulting to no record");
                        (id, Lookup::NotFound)
                    }
                }
            })
            .buffer_unordered(self.config.fan_out_limit.max(1))
            .collect()
            .await
    }

    async fn fetch_attempts(
        &self,
        learner_id: &LearnerId,
        ids: Vec<AssessmentId>,
    ) -> Vec<(AssessmentId, Lookup<AttemptRecord>)> {
        let source = &self.source;
        stream::iter(ids)
            .map(|id| async move {
                match source.fetch_attempt_status(learner_id, &id).await {
                    Ok(status) => {
                        let lookup = status.into_lookup(&id);
                        (id, lookup)
                    }
                    Err(err) => {
                        warn!(assessment_id = %id, error = %err, "attempt lookup failed; defaulting to no record");
                        (id, Lookup::NotFound)
                    }
                }
            })
            .buffer_unordered(self.config.fan_out_limit.max(1))
            .collect()
            .await
    }
}
