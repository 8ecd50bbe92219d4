use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, instrument, warn};

use super::aggregate::aggregate;
use super::domain::HierarchyNode;
use super::filter::HierarchyFilter;
use super::ranking::{rank_departments, DepartmentRanking, RankOrder};
use crate::workflows::assessments::pipeline::PassError;
use crate::workflows::source::ProgressSource;

/// Committed result of one supervisor pass.
#[derive(Debug, Clone, Serialize)]
pub struct HierarchySnapshot {
    pub generation: u64,
    pub filter: HierarchyFilter,
    pub nodes: Vec<HierarchyNode>,
    pub refreshed_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct DashboardState {
    generation: u64,
    snapshot: Option<Arc<HierarchySnapshot>>,
}

/// Supervisor-facing aggregation over the hierarchy fetch.
pub struct HierarchyDashboard<S: ?Sized> {
    source: Arc<S>,
    state: RwLock<DashboardState>,
}

impl<S> HierarchyDashboard<S>
where
    S: ProgressSource + ?Sized,
{
    pub fn new(source: Arc<S>) -> Self {
        Self {
            source,
            state: RwLock::new(DashboardState::default()),
        }
    }

    pub async fn refresh(
        &self,
        filter: HierarchyFilter,
    ) -> Result<Arc<HierarchySnapshot>, PassError> {
        self.refresh_at(filter, Utc::now()).await
    }

    /// Each refresh claims a new generation; an older refresh finishing later is discarded so
    /// a slow pass never overwrites a newer scope.
    #[instrument(skip_all)]
    pub async fn refresh_at(
        &self,
        filter: HierarchyFilter,
        now: DateTime<Utc>,
    ) -> Result<Arc<HierarchySnapshot>, PassError> {
        let generation = {
            let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
            state.generation += 1;
            state.generation
        };

        let forest = match self.source.fetch_hierarchy(&filter).await {
            Ok(forest) => forest,
            Err(err) => {
                warn!(generation, error = %err, "hierarchy fetch failed; keeping previous snapshot");
                return Err(err.into());
            }
        };

        let nodes = filter.apply(&aggregate(&forest, now));

        let snapshot = Arc::new(HierarchySnapshot {
            generation,
            filter,
            nodes,
            refreshed_at: now,
        });

        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if state.generation != generation {
            warn!(
                stale_generation = generation,
                current_generation = state.generation,
                "discarding superseded hierarchy pass"
            );
            return Err(PassError::HierarchySuperseded { generation });
        }

        info!(
            generation,
            institutions = snapshot.nodes.len(),
            learners = snapshot
                .nodes
                .iter()
                .map(|node| node.stats.total_learners)
                .sum::<usize>(),
            "hierarchy pass aggregated"
        );
        state.snapshot = Some(Arc::clone(&snapshot));
        Ok(snapshot)
    }

    pub fn snapshot(&self) -> Option<Arc<HierarchySnapshot>> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        state.snapshot.clone()
    }

    /// Re-filters the committed snapshot without another fetch.
    pub fn nodes(&self, filter: &HierarchyFilter) -> Option<Vec<HierarchyNode>> {
        self.snapshot().map(|snapshot| filter.apply(&snapshot.nodes))
    }

    pub fn rankings(&self, order: RankOrder, limit: Option<usize>) -> Option<Vec<DepartmentRanking>> {
        self.snapshot()
            .map(|snapshot| rank_departments(&snapshot.nodes, order, limit))
    }
}
