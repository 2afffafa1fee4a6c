use std::sync::Arc;
use std::time::Duration;

use super::common::*;
use crate::workflows::enrollment::countries::CountrySource;
use crate::workflows::enrollment::domain::WizardStep;
use crate::workflows::enrollment::gateway::{GatewayError, SubmissionGateway};
use crate::workflows::enrollment::service::{
    EnrollmentService, EnrollmentServiceError, SessionId,
};

fn drive_to_confirmation<G, C>(service: &EnrollmentService<G, C>, id: &SessionId)
where
    G: SubmissionGateway + 'static,
    C: CountrySource + 'static,
{
    service.update(id, personal_details()).expect("editable");
    service.next(id).expect("step one valid");
    service.update(id, program_preferences()).expect("editable");
    service.next(id).expect("step two valid");
    service.update(id, final_details()).expect("editable");
    service.verify_captcha(id, true).expect("captcha shown");
    let view = service.submit(id).expect("step three valid");
    assert_eq!(view.current_step, WizardStep::Confirmation);
}

#[tokio::test]
async fn dropped_confirm_request_leaves_session_retryable() {
    let gateway = Arc::new(StallsOnceGateway::default());
    let service = EnrollmentService::new(gateway.clone(), Arc::new(StaticCountries(vec![])));
    let id = service.start().await.expect("session starts").session_id;
    drive_to_confirmation(&service, &id);

    let attempt =
        tokio::time::timeout(Duration::from_millis(50), service.confirm(&id, appointment())).await;
    assert!(attempt.is_err(), "first delivery never answers");

    let view = service.view(&id).expect("session kept");
    assert!(!view.submitting);
    assert_eq!(view.current_step, WizardStep::Confirmation);
    assert!(view.submission_error.is_some());

    let view = service
        .confirm(&id, appointment())
        .await
        .expect("retry is accepted");
    assert_eq!(view.current_step, WizardStep::Success);
    assert_eq!(gateway.calls(), 2);
}

#[tokio::test]
async fn successful_confirm_releases_the_session() {
    let (service, gateway) = build_service(RecordingGateway::default());
    let id = service.start().await.expect("session starts").session_id;
    drive_to_confirmation(service.as_ref(), &id);
    assert_eq!(service.active_sessions().expect("store available"), 1);

    let view = service
        .confirm(&id, appointment())
        .await
        .expect("gateway accepts");

    assert_eq!(view.current_step, WizardStep::Success);
    assert_eq!(view.selected_date.as_deref(), Some("2025-03-14T09:30:00.000Z"));
    assert_eq!(gateway.delivered().len(), 1);
    assert_eq!(service.active_sessions().expect("store available"), 0);
    assert!(matches!(
        service.view(&id),
        Err(EnrollmentServiceError::SessionNotFound(_))
    ));
}

#[tokio::test]
async fn failed_confirm_keeps_the_session() {
    let (service, _) = build_service(RecordingGateway::failing_once(GatewayError::TimedOut(
        Duration::from_secs(10),
    )));
    let id = service.start().await.expect("session starts").session_id;
    drive_to_confirmation(service.as_ref(), &id);

    let err = service
        .confirm(&id, appointment())
        .await
        .expect_err("first delivery times out");

    assert!(matches!(err, EnrollmentServiceError::Rejected { .. }));
    assert_eq!(service.active_sessions().expect("store available"), 1);
}

#[tokio::test]
async fn idle_sessions_are_evicted() {
    let service = EnrollmentService::new(
        Arc::new(RecordingGateway::default()),
        Arc::new(StaticCountries(vec![])),
    )
    .with_idle_timeout(Duration::ZERO);

    let first = service.start().await.expect("session starts").session_id;
    let second = service.start().await.expect("session starts").session_id;

    // starting the second session swept the first
    assert!(service.view(&first).is_err());
    assert_eq!(service.evict_idle().expect("store available"), 1);
    assert!(service.view(&second).is_err());
    assert_eq!(service.active_sessions().expect("store available"), 0);
}

#[tokio::test]
async fn recently_used_sessions_survive_a_sweep() {
    let (service, _) = build_service(RecordingGateway::default());
    let id = service.start().await.expect("session starts").session_id;

    assert_eq!(service.evict_idle().expect("store available"), 0);
    assert!(service.view(&id).is_ok());
}
