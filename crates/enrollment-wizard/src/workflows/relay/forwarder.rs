use std::time::Duration;

use async_trait::async_trait;
use axum::body::Bytes;
use reqwest::header::CONTENT_TYPE;
use tracing::{error, info, warn};

use crate::config::IntegrationConfig;

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("no webhook URL is configured")]
    NotConfigured,
    #[error("webhook responded with HTTP {status}")]
    Upstream { status: u16 },
    #[error("webhook request failed: {0}")]
    Transport(String),
}

/// Outbound leg of the relay.
#[async_trait]
pub trait WebhookForwarder: Send + Sync {
    /// Send `body` unchanged; success means the webhook answered 2xx.
    async fn forward(&self, body: Bytes) -> Result<(), RelayError>;
}

#[derive(Debug, Clone)]
pub struct HttpWebhookForwarder {
    client: reqwest::Client,
    webhook_url: Option<String>,
}

impl HttpWebhookForwarder {
    pub fn new(webhook_url: Option<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            webhook_url,
        })
    }

    pub fn from_config(config: &IntegrationConfig) -> Result<Self, reqwest::Error> {
        Self::new(config.webhook_url.clone(), config.request_timeout)
    }

    pub fn is_configured(&self) -> bool {
        self.webhook_url.is_some()
    }
}

#[async_trait]
impl WebhookForwarder for HttpWebhookForwarder {
    async fn forward(&self, body: Bytes) -> Result<(), RelayError> {
        let Some(url) = self.webhook_url.as_deref() else {
            error!("relay received a submission but no webhook is configured");
            return Err(RelayError::NotConfigured);
        };

        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|err| {
                error!(error = %err, "error submitting form to webhook");
                RelayError::Transport(err.to_string())
            })?;

        let status = response.status();
        if status.is_success() {
            info!(%status, "submission forwarded to webhook");
            Ok(())
        } else {
            warn!(%status, "webhook rejected forwarded submission");
            Err(RelayError::Upstream {
                status: status.as_u16(),
            })
        }
    }
}
