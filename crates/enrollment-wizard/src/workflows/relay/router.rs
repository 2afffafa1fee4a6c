use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde_json::json;

use super::forwarder::{RelayError, WebhookForwarder};

pub const RELAY_PATH: &str = "/api/v1/enrollment/submissions";

/// Router builder for the relay endpoint.
pub fn relay_router<F>(forwarder: Arc<F>) -> Router
where
    F: WebhookForwarder + 'static,
{
    Router::new()
        .route(RELAY_PATH, post(relay_handler::<F>))
        .with_state(forwarder)
}

// Body is checked to be JSON and then forwarded byte for byte.
pub(crate) async fn relay_handler<F>(State(forwarder): State<Arc<F>>, body: Bytes) -> Response
where
    F: WebhookForwarder + 'static,
{
    if serde_json::from_slice::<serde_json::Value>(&body).is_err() {
        let payload = json!({ "message": "Request body must be valid JSON." });
        return (StatusCode::BAD_REQUEST, Json(payload)).into_response();
    }

    match forwarder.forward(body).await {
        Ok(()) => {
            let payload = json!({ "message": "Form submitted successfully!" });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(RelayError::Upstream { .. }) => {
            let payload = json!({ "message": "Failed to submit the form to the webhook." });
            (StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response()
        }
        Err(RelayError::NotConfigured | RelayError::Transport(_)) => {
            let payload = json!({ "message": "An error occurred while submitting the form." });
            (StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response()
        }
    }
}
