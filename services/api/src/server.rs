use crate::cli::ServeArgs;
use crate::infra::{load_source, AppState};
use crate::routes::with_progress_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use campus_progress::config::AppConfig;
use campus_progress::error::AppError;
use campus_progress::telemetry;
use campus_progress::workflows::assessments::LearnerSession;
use campus_progress::workflows::hierarchy::HierarchyDashboard;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }
    if let Some(fixture) = args.fixture.take() {
        config.pipeline.fixture_path = Some(fixture);
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let source = load_source(&config.pipeline)?;
    let session = Arc::new(LearnerSession::new(
        Arc::clone(&source),
        config.pipeline.clone(),
    ));
    let dashboard = Arc::new(HierarchyDashboard::new(source));

    let app = with_progress_routes(session, dashboard)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        fan_out_limit = config.pipeline.fan_out_limit,
        "campus progress service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
