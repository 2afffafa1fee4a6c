use std::collections::{BTreeSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::http::StatusCode;
use axum::response::Response;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

use crate::workflows::enrollment::countries::{CountryFetchError, CountrySource};
use crate::workflows::enrollment::domain::{
    Campus, Gender, MaritalStatus, PartialFormRecord, TrainingMethod, WizardStep,
};
use crate::workflows::enrollment::gateway::{GatewayError, SubmissionGateway, SubmissionPayload};
use crate::workflows::enrollment::{enrollment_router, EnrollmentService, WizardController};

/// Replays queued outcomes (default success) and records every payload it was handed.
#[derive(Default)]
pub(super) struct RecordingGateway {
    outcomes: Mutex<VecDeque<Result<(), GatewayError>>>,
    delivered: Mutex<Vec<SubmissionPayload>>,
}

impl RecordingGateway {
    pub(super) fn failing_once(error: GatewayError) -> Self {
        let gateway = Self::default();
        gateway
            .outcomes
            .lock()
            .expect("gateway mutex poisoned")
            .push_back(Err(error));
        gateway
    }

    pub(super) fn delivered(&self) -> Vec<SubmissionPayload> {
        self.delivered
            .lock()
            .expect("gateway mutex poisoned")
            .clone()
    }
}

#[async_trait]
impl SubmissionGateway for RecordingGateway {
    async fn deliver(&self, payload: &SubmissionPayload) -> Result<(), GatewayError> {
        self.delivered
            .lock()
            .expect("gateway mutex poisoned")
            .push(payload.clone());
        self.outcomes
            .lock()
            .expect("gateway mutex poisoned")
            .pop_front()
            .unwrap_or(Ok(()))
    }
}

/// Never answers its first delivery; every later one succeeds.
#[derive(Default)]
pub(super) struct StallsOnceGateway {
    calls: AtomicUsize,
}

impl StallsOnceGateway {
    pub(super) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SubmissionGateway for StallsOnceGateway {
    async fn deliver(&self, _payload: &SubmissionPayload) -> Result<(), GatewayError> {
        if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
            std::future::pending::<()>().await;
        }
        Ok(())
    }
}

pub(super) struct StaticCountries(pub(super) Vec<&'static str>);

#[async_trait]
impl CountrySource for StaticCountries {
    async fn fetch_countries(&self) -> Result<Vec<String>, CountryFetchError> {
        Ok(self.0.iter().map(|name| name.to_string()).collect())
    }
}

pub(super) struct UnreachableCountries;

#[async_trait]
impl CountrySource for UnreachableCountries {
    async fn fetch_countries(&self) -> Result<Vec<String>, CountryFetchError> {
        Err(CountryFetchError::Transport("connection refused".to_string()))
    }
}

pub(super) fn courses(values: &[&str]) -> BTreeSet<String> {
    values.iter().map(|value| value.to_string()).collect()
}

pub(super) fn personal_details() -> PartialFormRecord {
    PartialFormRecord {
        first_name: Some("Ada".to_string()),
        last_name: Some("Lovelace".to_string()),
        email: Some("ada@x.com".to_string()),
        phone_number: Some("+1234567890".to_string()),
        address: Some("Nigeria".to_string()),
        program_category: Some("AWS".to_string()),
        ..PartialFormRecord::default()
    }
}

pub(super) fn program_preferences() -> PartialFormRecord {
    PartialFormRecord {
        course: Some(courses(&["DevOps Engineering"])),
        preferred_location: Some(Campus::Lagos),
        training_method: Some(TrainingMethod::Hybrid),
        gender: Some(Gender::Female),
        date_of_birth: Some("1815-12-10".to_string()),
        ..PartialFormRecord::default()
    }
}

pub(super) fn final_details() -> PartialFormRecord {
    PartialFormRecord {
        marital_status: Some(MaritalStatus::Married),
        notes: Some("I want to build analytical engines in the cloud.".to_string()),
        ..PartialFormRecord::default()
    }
}

pub(super) fn appointment() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 14, 9, 30, 0)
        .single()
        .expect("valid appointment")
}

/// A controller sitting on `step` with every earlier step filled in validly.
pub(super) fn controller_at(step: WizardStep) -> WizardController {
    let mut controller = WizardController::new();
    controller
        .update(personal_details())
        .expect("step one editable");
    if step == WizardStep::PersonalDetails {
        return controller;
    }

    controller.next().expect("step one valid");
    controller
        .update(program_preferences())
        .expect("step two editable");
    if step == WizardStep::ProgramPreferences {
        return controller;
    }

    controller.next().expect("step two valid");
    controller
        .update(final_details())
        .expect("step three editable");
    if step == WizardStep::FinalDetails {
        return controller;
    }

    controller.on_captcha_verify(true).expect("captcha shown");
    controller.submit().expect("step three valid");
    assert_eq!(step, WizardStep::Confirmation, "helper stops at confirmation");
    controller
}

pub(super) type TestService = EnrollmentService<RecordingGateway, StaticCountries>;

pub(super) fn build_service(gateway: RecordingGateway) -> (Arc<TestService>, Arc<RecordingGateway>) {
    let gateway = Arc::new(gateway);
    let countries = Arc::new(StaticCountries(vec!["Ghana", "Nigeria"]));
    let service = Arc::new(EnrollmentService::new(gateway.clone(), countries));
    (service, gateway)
}

pub(super) fn router_for(service: Arc<TestService>) -> axum::Router {
    enrollment_router(service)
}

pub(super) async fn json_body(response: Response) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body readable");
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}
