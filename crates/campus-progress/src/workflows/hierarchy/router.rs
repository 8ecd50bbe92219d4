use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use super::dashboard::HierarchyDashboard;
use super::filter::HierarchyFilter;
use super::ranking::RankOrder;
use crate::workflows::assessments::router::{loading_response, pass_error_response};
use crate::workflows::source::ProgressSource;

#[derive(Debug, Default, Deserialize)]
pub(crate) struct RankingQuery {
    #[serde(default)]
    pub(crate) order: RankOrder,
    #[serde(default)]
    pub(crate) limit: Option<usize>,
}

/// Router exposing the supervisor dashboard.
pub fn hierarchy_router<S>(dashboard: Arc<HierarchyDashboard<S>>) -> Router
where
    S: ProgressSource + ?Sized + 'static,
{
    Router::new()
        .route("/api/v1/hierarchy/refresh", post(refresh_handler::<S>))
        .route("/api/v1/hierarchy", get(tree_handler::<S>))
        .route("/api/v1/hierarchy/rankings", get(rankings_handler::<S>))
        .with_state(dashboard)
}

pub(crate) async fn refresh_handler<S>(
    State(dashboard): State<Arc<HierarchyDashboard<S>>>,
    Json(filter): Json<HierarchyFilter>,
) -> Response
where
    S: ProgressSource + ?Sized + 'static,
{
    match dashboard.refresh(filter).await {
        Ok(snapshot) => {
            let payload = json!({
                "generation": snapshot.generation,
                "refreshed_at": snapshot.refreshed_at,
                "institutions": snapshot.nodes.len(),
            });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(err) => pass_error_response(err),
    }
}

pub(crate) async fn tree_handler<S>(
    State(dashboard): State<Arc<HierarchyDashboard<S>>>,
    Query(filter): Query<HierarchyFilter>,
) -> Response
where
    S: ProgressSource + ?Sized + 'static,
{
    match dashboard.nodes(&filter) {
        Some(nodes) => (StatusCode::OK, Json(nodes)).into_response(),
        None => loading_response(),
    }
}

pub(crate) async fn rankings_handler<S>(
    State(dashboard): State<Arc<HierarchyDashboard<S>>>,
    Query(query): Query<RankingQuery>,
) -> Response
where
    S: ProgressSource + ?Sized + 'static,
{
    match dashboard.rankings(query.order, query.limit) {
        Some(rankings) => {
            let payload = json!({
                "order": query.order.label(),
                "departments": rankings,
            });
            (StatusCode::OK, Json(payload)).into_response()
        }
        None => loading_response(),
    }
}
