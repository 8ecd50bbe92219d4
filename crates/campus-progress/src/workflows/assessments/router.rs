use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::LearnerId;
use super::filter::ItemFilter;
use super::pipeline::PassError;
use super::session::LearnerSession;
use crate::workflows::source::{ProgressSource, SourceError};

#[derive(Debug, Deserialize)]
pub(crate) struct SwitchLearnerRequest {
    pub(crate) learner_id: LearnerId,
}

/// Router exposing the learner session to the presentation layer.
pub fn session_router<S>(session: Arc<LearnerSession<S>>) -> Router
where
    S: ProgressSource + ?Sized + 'static,
{
    Router::new()
        .route("/api/v1/session/learner", put(switch_handler::<S>))
        .route("/api/v1/session/refresh", post(refresh_handler::<S>))
        .route("/api/v1/session/items", get(items_handler::<S>))
        .route("/api/v1/session/summary", get(summary_handler::<S>))
        .with_state(session)
}

pub(crate) async fn switch_handler<S>(
    State(session): State<Arc<LearnerSession<S>>>,
    Json(request): Json<SwitchLearnerRequest>,
) -> Response
where
    S: ProgressSource + ?Sized + 'static,
{
    let generation = session.switch_learner(request.learner_id.clone());
    let payload = json!({
        "learner_id": request.learner_id,
        "generation": generation,
    });
    (StatusCode::OK, Json(payload)).into_response()
}

pub(crate) async fn refresh_handler<S>(State(session): State<Arc<LearnerSession<S>>>) -> Response
where
    S: ProgressSource + ?Sized + 'static,
{
    match session.refresh().await {
        Ok(snapshot) => {
            let payload = json!({
                "learner_id": snapshot.learner_id,
                "generation": snapshot.generation,
                "refreshed_at": snapshot.refreshed_at,
                "summary": snapshot.summary,
            });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(err) => pass_error_response(err),
    }
}

pub(crate) async fn items_handler<S>(
    State(session): State<Arc<LearnerSession<S>>>,
    Query(filter): Query<ItemFilter>,
) -> Response
where
    S: ProgressSource + ?Sized + 'static,
{
    match session.snapshot() {
        Some(snapshot) => {
            let items = filter.apply(&snapshot.items);
            (StatusCode::OK, Json(items)).into_response()
        }
        None => loading_response(),
    }
}

pub(crate) async fn summary_handler<S>(State(session): State<Arc<LearnerSession<S>>>) -> Response
where
    S: ProgressSource + ?Sized + 'static,
{
    match session.snapshot() {
        Some(snapshot) => (StatusCode::OK, Json(snapshot.summary)).into_response(),
        None => loading_response(),
    }
}

/// No committed pass yet: presentation should show a loading state.
pub(crate) fn loading_response() -> Response {
    (StatusCode::ACCEPTED, Json(json!({ "status": "loading" }))).into_response()
}

pub(crate) fn pass_error_response(err: PassError) -> Response {
    let status = match &err {
        PassError::Source(SourceError::Transport(_)) => StatusCode::BAD_GATEWAY,
        PassError::Source(SourceError::Unauthorized(_)) => StatusCode::UNAUTHORIZED,
        PassError::Superseded { .. } | PassError::HierarchySuperseded { .. } => {
            StatusCode::CONFLICT
        }
        PassError::NoLearner => StatusCode::PRECONDITION_REQUIRED,
    };
    let payload = json!({
        "error": err.to_string(),
        "retryable": err.is_retryable(),
    });
    (status, Json(payload)).into_response()
}
