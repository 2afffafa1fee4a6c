use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::domain::FormRecord;
use crate::config::IntegrationConfig;

/// Body delivered to the submission endpoint: every record field plus the chosen date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionPayload {
    #[serde(flatten)]
    pub record: FormRecord,
    /// ISO-8601 UTC timestamp with millisecond precision.
    pub selected_date: String,
}

impl SubmissionPayload {
    pub fn new(record: FormRecord, selected_date: DateTime<Utc>) -> Self {
        Self {
            record,
            selected_date: selected_date.to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}

/// Delivery failure. Every variant is retryable from the confirmation screen.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    #[error("submission endpoint responded with HTTP {status}")]
    Rejected { status: u16 },
    #[error("submission timed out after {0:?}")]
    TimedOut(Duration),
    #[error("submission transport failure: {0}")]
    Transport(String),
}

/// Outbound hand-off of a finalized enrollment.
#[async_trait]
pub trait SubmissionGateway: Send + Sync {
    async fn deliver(&self, payload: &SubmissionPayload) -> Result<(), GatewayError>;
}

/// Posts the payload as JSON; any 2xx is success.
#[derive(Debug, Clone)]
pub struct HttpSubmissionGateway {
    client: reqwest::Client,
    endpoint: String,
    timeout: Duration,
}

impl HttpSubmissionGateway {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            timeout,
        })
    }

    pub fn from_config(config: &IntegrationConfig) -> Result<Self, reqwest::Error> {
        Self::new(config.submission_url.clone(), config.request_timeout)
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl SubmissionGateway for HttpSubmissionGateway {
    async fn deliver(&self, payload: &SubmissionPayload) -> Result<(), GatewayError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(payload)
            .send()
            .await
            .map_err(|err| {
                warn!(endpoint = %self.endpoint, error = %err, "submission request failed");
                if err.is_timeout() {
                    GatewayError::TimedOut(self.timeout)
                } else {
                    GatewayError::Transport(err.to_string())
                }
            })?;

        let status = response.status();
        if status.is_success() {
            info!(endpoint = %self.endpoint, %status, "enrollment submission delivered");
            Ok(())
        } else {
            warn!(endpoint = %self.endpoint, %status, "submission endpoint rejected enrollment");
            Err(GatewayError::Rejected {
                status: status.as_u16(),
            })
        }
    }
}
