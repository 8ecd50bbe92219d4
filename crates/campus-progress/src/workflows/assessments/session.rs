use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use super::domain::{LearnerId, ResolvedItem};
use super::filter::ItemFilter;
use super::pipeline::{LearnerSnapshot, PassError, PassRunner};
use crate::config::PipelineConfig;
use crate::workflows::source::ProgressSource;

#[derive(Debug, Default)]
struct SessionState {
    learner_id: Option<LearnerId>,
    generation: u64,
    // Latest refresh claimed; only that refresh may commit.
    pass: u64,
    snapshot: Option<Arc<LearnerSnapshot>>,
}

/// Learner-facing view over the pass pipeline.
///
/// The committed snapshot is swapped as a whole. A pass is discarded if the learner changed
/// or a newer refresh was started before it finished.
pub struct LearnerSession<S: ?Sized> {
    runner: PassRunner<S>,
    state: RwLock<SessionState>,
}

impl<S> LearnerSession<S>
where
    S: ProgressSource + ?Sized,
{
    pub fn new(source: Arc<S>, config: PipelineConfig) -> Self {
        Self {
            runner: PassRunner::new(source, config),
            state: RwLock::new(SessionState::default()),
        }
    }

    pub fn learner_id(&self) -> Option<LearnerId> {
        self.read(|state| state.learner_id.clone())
    }

    pub fn generation(&self) -> u64 {
        self.read(|state| state.generation)
    }

    /// Selects the active learner. Selecting a different learner drops the committed snapshot
    /// and invalidates in-flight passes; reselecting the current one is a no-op.
    pub fn switch_learner(&self, learner_id: LearnerId) -> u64 {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if state.learner_id.as_ref() == Some(&learner_id) {
            return state.generation;
        }

        state.generation += 1;
        state.snapshot = None;
        info!(%learner_id, generation = state.generation, "learner context switched");
        state.learner_id = Some(learner_id);
        state.generation
    }

    pub async fn refresh(&self) -> Result<Arc<LearnerSnapshot>, PassError> {
        self.refresh_at(Utc::now()).await
    }

    /// Runs one pass and commits it if the learner context is unchanged and no newer refresh
    /// was claimed meanwhile. On failure the previous snapshot is kept.
    pub async fn refresh_at(&self, now: DateTime<Utc>) -> Result<Arc<LearnerSnapshot>, PassError> {
        let (learner_id, generation, pass) = {
            let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
            let learner_id = state.learner_id.clone().ok_or(PassError::NoLearner)?;
            state.pass += 1;
            (learner_id, state.generation, state.pass)
        };

        let snapshot = match self.runner.run(&learner_id, generation, now).await {
            Ok(snapshot) => Arc::new(snapshot),
            Err(err) => {
                warn!(%learner_id, error = %err, "learner pass failed; keeping previous snapshot");
                return Err(err);
            }
        };

        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let current = state.learner_id.as_ref() == Some(&snapshot.learner_id)
            && state.generation == snapshot.generation;
        if !current || state.pass != pass {
            warn!(
                %learner_id,
                stale_generation = generation,
                current_generation = state.generation,
                stale_pass = pass,
                current_pass = state.pass,
                "discarding superseded learner pass"
            );
            return Err(PassError::Superseded { learner_id });
        }

        state.snapshot = Some(Arc::clone(&snapshot));
        Ok(snapshot)
    }

    /// `None` until the first pass for the current learner commits.
    pub fn snapshot(&self) -> Option<Arc<LearnerSnapshot>> {
        self.read(|state| state.snapshot.clone())
    }

    pub fn items(&self, filter: &ItemFilter) -> Vec<ResolvedItem> {
        self.snapshot()
            .map(|snapshot| filter.apply(&snapshot.items))
            .unwrap_or_default()
    }

    fn read<T>(&self, f: impl FnOnce(&SessionState) -> T) -> T {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        f(&state)
    }
}
