use crate::cli::ServeArgs;
use crate::infra::{load_store, shutdown_signal, AppState};
use crate::routes::with_operational_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use campus_nest::config::AppConfig;
use campus_nest::error::AppError;
use campus_nest::telemetry;
use campus_nest::{api_router, ApiState};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }
    if let Some(seed) = args.seed.take() {
        config.seed_path = Some(seed);
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let store = Arc::new(load_store(config.seed_path.as_deref())?);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let api_state = Arc::new(ApiState::new(store, config.deadlines, shutdown_rx));

    let app = with_operational_routes(api_router(api_state))
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "placement analytics service ready");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(readiness_flag, shutdown_tx))
        .await?;
    info!("placement analytics service stopped");
    Ok(())
}
