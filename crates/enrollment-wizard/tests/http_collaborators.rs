use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::{header, Request, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{TimeZone, Utc};
use enrollment_wizard::workflows::enrollment::{
    CountrySource, FormRecord, GatewayError, HttpSubmissionGateway, RestCountriesClient,
    SubmissionGateway, SubmissionPayload,
};
use enrollment_wizard::workflows::relay::{relay_router, HttpWebhookForwarder, RELAY_PATH};
use serde_json::{json, Value};
use tower::ServiceExt;

#[derive(Clone, Default)]
struct Upstream {
    received: Arc<Mutex<Vec<Bytes>>>,
}

impl Upstream {
    fn received(&self) -> Vec<Bytes> {
        self.received.lock().expect("upstream mutex poisoned").clone()
    }
}

async fn accept(State(upstream): State<Upstream>, body: Bytes) -> StatusCode {
    upstream
        .received
        .lock()
        .expect("upstream mutex poisoned")
        .push(body);
    StatusCode::CREATED
}

async fn reject() -> StatusCode {
    StatusCode::SERVICE_UNAVAILABLE
}

async fn stall() -> StatusCode {
    tokio::time::sleep(Duration::from_secs(5)).await;
    StatusCode::OK
}

async fn countries() -> impl IntoResponse {
    Json(json!([
        { "name": { "common": "Nigeria", "official": "Federal Republic of Nigeria" } },
        { "name": { "common": "Benin" } },
        { "name": { "common": " Ghana " } }
    ]))
}

async fn spawn_upstream(upstream: Upstream) -> SocketAddr {
    let app = Router::new()
        .route("/accept", post(accept))
        .route("/reject", post(reject))
        .route("/stall", post(stall))
        .route("/countries", get(countries))
        .route("/broken-countries", get(|| async { "not json" }))
        .with_state(upstream);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("loopback listener binds");
    let addr = listener.local_addr().expect("listener has an address");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("upstream serves");
    });
    addr
}

fn sample_payload() -> SubmissionPayload {
    let record = FormRecord {
        first_name: "Ada".to_string(),
        last_name: "Lovelace".to_string(),
        email: "ada@x.com".to_string(),
        program_category: "Salesforce".to_string(),
        ..FormRecord::default()
    };
    let date = Utc
        .with_ymd_and_hms(2025, 3, 14, 9, 30, 0)
        .single()
        .expect("valid timestamp");
    SubmissionPayload::new(record, date)
}

#[tokio::test]
async fn gateway_posts_json_payload_and_accepts_any_2xx() {
    let upstream = Upstream::default();
    let addr = spawn_upstream(upstream.clone()).await;
    let gateway = HttpSubmissionGateway::new(format!("http://{addr}/accept"), Duration::from_secs(2))
        .expect("client builds");

    gateway
        .deliver(&sample_payload())
        .await
        .expect("201 counts as success");

    let received = upstream.received();
    assert_eq!(received.len(), 1);
    let body: Value = serde_json::from_slice(&received[0]).expect("json body");
    assert_eq!(body["firstName"], "Ada");
    assert_eq!(body["selectedDate"], "2025-03-14T09:30:00.000Z");
}

#[tokio::test]
async fn gateway_reports_non_2xx_as_rejection() {
    let addr = spawn_upstream(Upstream::default()).await;
    let gateway = HttpSubmissionGateway::new(format!("http://{addr}/reject"), Duration::from_secs(2))
        .expect("client builds");

    let err = gateway
        .deliver(&sample_payload())
        .await
        .expect_err("503 is a failure");

    assert_eq!(err, GatewayError::Rejected { status: 503 });
}

#[tokio::test]
async fn gateway_times_out_slow_endpoints() {
    let addr = spawn_upstream(Upstream::default()).await;
    let timeout = Duration::from_millis(200);
    let gateway =
        HttpSubmissionGateway::new(format!("http://{addr}/stall"), timeout).expect("client builds");

    let err = gateway
        .deliver(&sample_payload())
        .await
        .expect_err("endpoint never answers in time");

    assert_eq!(err, GatewayError::TimedOut(timeout));
}

#[tokio::test]
async fn country_client_normalizes_common_names() {
    let addr = spawn_upstream(Upstream::default()).await;
    let client = RestCountriesClient::new(format!("http://{addr}/countries"), Duration::from_secs(2))
        .expect("client builds");

    let names = client.fetch_countries().await.expect("countries load");

    assert_eq!(names, vec!["Benin", "Ghana", "Nigeria"]);
}

#[tokio::test]
async fn country_client_surfaces_undecodable_bodies() {
    let addr = spawn_upstream(Upstream::default()).await;
    let client = RestCountriesClient::new(
        format!("http://{addr}/broken-countries"),
        Duration::from_secs(2),
    )
    .expect("client builds");

    assert!(client.fetch_countries().await.is_err());
}

#[tokio::test]
async fn relay_forwards_to_live_webhook_byte_for_byte() {
    let upstream = Upstream::default();
    let addr = spawn_upstream(upstream.clone()).await;
    let forwarder = HttpWebhookForwarder::new(
        Some(format!("http://{addr}/accept")),
        Duration::from_secs(2),
    )
    .expect("client builds");
    let raw = r#"{"firstName":"Ada","course":["DevOps Engineering"],"selectedDate":"2025-03-14T09:30:00.000Z"}"#;

    let response = relay_router(Arc::new(forwarder))
        .oneshot(
            Request::post(RELAY_PATH)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(raw))
                .expect("request builds"),
        )
        .await
        .expect("relay responds");

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body readable");
    let body: Value = serde_json::from_slice(&bytes).expect("json body");
    assert_eq!(body["message"], "Form submitted successfully!");
    assert_eq!(upstream.received(), vec![Bytes::from_static(raw.as_bytes())]);
}

#[tokio::test]
async fn relay_maps_webhook_rejection_to_server_error() {
    let addr = spawn_upstream(Upstream::default()).await;
    let forwarder = HttpWebhookForwarder::new(
        Some(format!("http://{addr}/reject")),
        Duration::from_secs(2),
    )
    .expect("client builds");

    let response = relay_router(Arc::new(forwarder))
        .oneshot(
            Request::post(RELAY_PATH)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"firstName":"Ada"}"#))
                .expect("request builds"),
        )
        .await
        .expect("relay responds");

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}
