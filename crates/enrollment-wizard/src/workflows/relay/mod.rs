//! Pass-through endpoint that forwards completed enrollments to a third-party webhook.

pub mod forwarder;
pub mod router;

pub use forwarder::{HttpWebhookForwarder, RelayError, WebhookForwarder};
pub use router::{relay_router, RELAY_PATH};
