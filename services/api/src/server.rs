use crate::cli::ServeArgs;
use crate::infra::AppState;
use crate::routes::with_operational_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use enrollment_wizard::config::AppConfig;
use enrollment_wizard::error::AppError;
use enrollment_wizard::telemetry;
use enrollment_wizard::workflows::enrollment::{
    CountrySource, EnrollmentService, HttpSubmissionGateway, RestCountriesClient,
    SubmissionGateway,
};
use enrollment_wizard::workflows::relay::HttpWebhookForwarder;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

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
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let gateway = Arc::new(HttpSubmissionGateway::from_config(&config.integrations)?);
    let countries = Arc::new(RestCountriesClient::from_config(&config.integrations)?);
    let enrollment_service = Arc::new(
        EnrollmentService::new(gateway.clone(), countries)
            .with_idle_timeout(config.sessions.idle_timeout),
    );
    spawn_idle_sweeper(enrollment_service.clone(), config.sessions.idle_timeout);

    let forwarder = Arc::new(HttpWebhookForwarder::from_config(&config.integrations)?);
    if !forwarder.is_configured() {
        warn!("ENROLLMENT_WEBHOOK_URL is not set; relayed submissions will fail");
    }

    let app = with_operational_routes(enrollment_service, forwarder)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        submission_endpoint = gateway.endpoint(),
        "enrollment wizard ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}

// Sessions closed without an explicit abandon are reclaimed here.
fn spawn_idle_sweeper<G, C>(service: Arc<EnrollmentService<G, C>>, idle_timeout: Duration)
where
    G: SubmissionGateway + 'static,
    C: CountrySource + 'static,
{
    let period = (idle_timeout / 4).max(Duration::from_secs(1));
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        loop {
            ticker.tick().await;
            if let Err(err) = service.evict_idle() {
                warn!(error = %err, "idle session sweep failed");
            }
        }
    });
}
