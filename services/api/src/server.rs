use crate::cli::ServeArgs;
use crate::infra::{AppState, InMemoryRequestRepository};
use crate::routes::with_prioritization_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use civic_queue::config::AppConfig;
use civic_queue::error::AppError;
use civic_queue::telemetry;
use civic_queue::workflows::intake::SnapshotImporter;
use civic_queue::workflows::prioritization::PriorityRefreshService;
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

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let engine = config.prioritization.engine();
    let urgent_threshold_days = config.prioritization.urgent_threshold_days;
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
        engine: Arc::new(engine.clone()),
        urgent_threshold_days,
    };

    let repository = match args.snapshot.take() {
        Some(path) => {
            let snapshot = SnapshotImporter::from_path(&path)?;
            info!(
                path = %path.display(),
                records = snapshot.len(),
                skipped = snapshot.skipped_rows,
                "request store seeded from snapshot"
            );
            InMemoryRequestRepository::seeded(snapshot.records)
        }
        None => InMemoryRequestRepository::default(),
    };
    let refresh_service = Arc::new(
        PriorityRefreshService::new(Arc::new(repository), engine)
            .with_urgent_threshold(urgent_threshold_days),
    );

    let app = with_prioritization_routes(refresh_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "request prioritization service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
