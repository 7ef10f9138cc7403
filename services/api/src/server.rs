use crate::cli::ServeArgs;
use crate::infra::{configured_sink, AppState};
use crate::routes::with_registration_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use hacksprint::config::AppConfig;
use hacksprint::error::AppError;
use hacksprint::registration::RegistrationService;
use hacksprint::telemetry;
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

    let sink = configured_sink(&config.registration)?;
    let registration_service = Arc::new(RegistrationService::new(
        Arc::new(sink),
        &config.registration,
    ));

    let transport = registration_service.transport();
    let sink_label = transport.sink().label();
    let fallback_enabled = transport.fallback_enabled();
    let max_attachment_bytes = registration_service.validator().policy().max_bytes();

    let app = with_registration_routes(registration_service.clone())
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        sink = sink_label,
        event = %config.registration.event_name,
        fallback = fallback_enabled,
        max_attachment_bytes,
        "registration service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
