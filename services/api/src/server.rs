use crate::cli::ServeArgs;
use crate::infra::{load_store, AppState};
use crate::routes::with_chances_routes;
use admit_chances::cohort::AdmissionCycle;
use admit_chances::config::{AppConfig, ConfigError};
use admit_chances::error::AppError;
use admit_chances::service::ChancesService;
use admit_chances::telemetry;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
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
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let store = Arc::new(load_store(&config.data, AdmissionCycle::current())?);
    let chances_service = Arc::new(
        ChancesService::new(
            store.clone(),
            store,
            config.engine.clone(),
            config.cache.clone(),
        )
        .map_err(ConfigError::Engine)?,
    );

    let app = with_chances_routes(chances_service, config.request_timeout)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        timeout_ms = config.request_timeout.as_millis() as u64,
        "admission chances service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
