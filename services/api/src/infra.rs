use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use enrollment_wizard::workflows::enrollment::{
    GatewayError, SubmissionGateway, SubmissionPayload,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Accepts every submission and keeps it in memory instead of posting it anywhere.
#[derive(Default, Clone)]
pub(crate) struct DryRunGateway {
    delivered: Arc<Mutex<Vec<SubmissionPayload>>>,
}

#[async_trait]
impl SubmissionGateway for DryRunGateway {
    async fn deliver(&self, payload: &SubmissionPayload) -> Result<(), GatewayError> {
        info!(
            email = %payload.record.email,
            selected_date = %payload.selected_date,
            "dry run: submission accepted without delivery"
        );
        self.delivered
            .lock()
            .map_err(|_| GatewayError::Transport("dry-run store poisoned".to_string()))?
            .push(payload.clone());
        Ok(())
    }
}

impl DryRunGateway {
    pub(crate) fn delivered(&self) -> Vec<SubmissionPayload> {
        self.delivered
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

/// Accepts RFC 3339 timestamps or a bare `YYYY-MM-DD`, read as midnight UTC.
pub(crate) fn parse_selected_date(raw: &str) -> Result<DateTime<Utc>, String> {
    let raw = raw.trim();
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(raw) {
        return Ok(timestamp.with_timezone(&Utc));
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| format!("failed to parse '{raw}' as RFC 3339 or YYYY-MM-DD"))
}
