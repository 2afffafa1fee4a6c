use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;

use super::catalog::PROGRAM_CATALOG;
use super::controller::WizardError;
use super::countries::CountrySource;
use super::domain::PartialFormRecord;
use super::gateway::SubmissionGateway;
use super::service::{EnrollmentService, EnrollmentServiceError, SessionId, SessionView};

#[derive(Debug, Deserialize)]
pub(crate) struct CaptchaRequest {
    pub(crate) verified: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ConfirmRequest {
    #[serde(default)]
    pub(crate) selected_date: Option<DateTime<Utc>>,
}

type SharedService<G, C> = Arc<EnrollmentService<G, C>>;

/// Router builder exposing the wizard session endpoints and the program catalog.
pub fn enrollment_router<G, C>(service: SharedService<G, C>) -> Router
where
    G: SubmissionGateway + 'static,
    C: CountrySource + 'static,
{
    Router::new()
        .route("/api/v1/enrollment/programs", get(programs_handler))
        .route("/api/v1/enrollment/sessions", post(start_handler::<G, C>))
        .route(
            "/api/v1/enrollment/sessions/:session_id",
            get(view_handler::<G, C>).delete(abandon_handler::<G, C>),
        )
        .route(
            "/api/v1/enrollment/sessions/:session_id/countries",
            get(countries_handler::<G, C>),
        )
        .route(
            "/api/v1/enrollment/sessions/:session_id/record",
            patch(update_handler::<G, C>),
        )
        .route(
            "/api/v1/enrollment/sessions/:session_id/next",
            post(next_handler::<G, C>),
        )
        .route(
            "/api/v1/enrollment/sessions/:session_id/back",
            post(back_handler::<G, C>),
        )
        .route(
            "/api/v1/enrollment/sessions/:session_id/captcha",
            post(captcha_handler::<G, C>),
        )
        .route(
            "/api/v1/enrollment/sessions/:session_id/submit",
            post(submit_handler::<G, C>),
        )
        .route(
            "/api/v1/enrollment/sessions/:session_id/confirm",
            post(confirm_handler::<G, C>),
        )
        .with_state(service)
}

pub(crate) async fn programs_handler() -> Response {
    (StatusCode::OK, Json(PROGRAM_CATALOG)).into_response()
}

pub(crate) async fn start_handler<G, C>(State(service): State<SharedService<G, C>>) -> Response
where
    G: SubmissionGateway + 'static,
    C: CountrySource + 'static,
{
    respond(service.start().await, StatusCode::CREATED)
}

pub(crate) async fn view_handler<G, C>(
    State(service): State<SharedService<G, C>>,
    Path(session_id): Path<String>,
) -> Response
where
    G: SubmissionGateway + 'static,
    C: CountrySource + 'static,
{
    respond(service.view(&SessionId(session_id)), StatusCode::OK)
}

pub(crate) async fn countries_handler<G, C>(
    State(service): State<SharedService<G, C>>,
    Path(session_id): Path<String>,
) -> Response
where
    G: SubmissionGateway + 'static,
    C: CountrySource + 'static,
{
    match service.countries(&SessionId(session_id)) {
        Ok(countries) => (StatusCode::OK, Json(json!({ "countries": countries }))).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn update_handler<G, C>(
    State(service): State<SharedService<G, C>>,
    Path(session_id): Path<String>,
    Json(partial): Json<PartialFormRecord>,
) -> Response
where
    G: SubmissionGateway + 'static,
    C: CountrySource + 'static,
{
    respond(service.update(&SessionId(session_id), partial), StatusCode::OK)
}

pub(crate) async fn next_handler<G, C>(
    State(service): State<SharedService<G, C>>,
    Path(session_id): Path<String>,
) -> Response
where
    G: SubmissionGateway + 'static,
    C: CountrySource + 'static,
{
    respond(service.next(&SessionId(session_id)), StatusCode::OK)
}

pub(crate) async fn back_handler<G, C>(
    State(service): State<SharedService<G, C>>,
    Path(session_id): Path<String>,
) -> Response
where
    G: SubmissionGateway + 'static,
    C: CountrySource + 'static,
{
    respond(service.back(&SessionId(session_id)), StatusCode::OK)
}

pub(crate) async fn captcha_handler<G, C>(
    State(service): State<SharedService<G, C>>,
    Path(session_id): Path<String>,
    Json(request): Json<CaptchaRequest>,
) -> Response
where
    G: SubmissionGateway + 'static,
    C: CountrySource + 'static,
{
    respond(
        service.verify_captcha(&SessionId(session_id), request.verified),
        StatusCode::OK,
    )
}

pub(crate) async fn submit_handler<G, C>(
    State(service): State<SharedService<G, C>>,
    Path(session_id): Path<String>,
) -> Response
where
    G: SubmissionGateway + 'static,
    C: CountrySource + 'static,
{
    respond(service.submit(&SessionId(session_id)), StatusCode::OK)
}

pub(crate) async fn confirm_handler<G, C>(
    State(service): State<SharedService<G, C>>,
    Path(session_id): Path<String>,
    Json(request): Json<ConfirmRequest>,
) -> Response
where
    G: SubmissionGateway + 'static,
    C: CountrySource + 'static,
{
    let selected_date = request.selected_date.unwrap_or_else(Utc::now);
    respond(
        service
            .confirm(&SessionId(session_id), selected_date)
            .await,
        StatusCode::OK,
    )
}

pub(crate) async fn abandon_handler<G, C>(
    State(service): State<SharedService<G, C>>,
    Path(session_id): Path<String>,
) -> Response
where
    G: SubmissionGateway + 'static,
    C: CountrySource + 'static,
{
    match service.abandon(&SessionId(session_id)) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => error_response(err),
    }
}

fn respond(result: Result<SessionView, EnrollmentServiceError>, success: StatusCode) -> Response {
    match result {
        Ok(view) => (success, Json(view)).into_response(),
        Err(err) => error_response(err),
    }
}

fn error_response(err: EnrollmentServiceError) -> Response {
    match err {
        EnrollmentServiceError::SessionNotFound(session_id) => {
            let payload = json!({
                "error": format!("enrollment session {session_id} not found"),
                "sessionId": session_id,
            });
            (StatusCode::NOT_FOUND, Json(payload)).into_response()
        }
        EnrollmentServiceError::Rejected { source, view } => {
            let status = match &source {
                WizardError::StepBlocked { .. } | WizardError::CaptchaNotVerified => {
                    StatusCode::UNPROCESSABLE_ENTITY
                }
                WizardError::Submission(_) => StatusCode::BAD_GATEWAY,
                WizardError::InvalidTransition { .. }
                | WizardError::RecordFinalized { .. }
                | WizardError::CaptchaNotPresented { .. }
                | WizardError::SubmissionInFlight
                | WizardError::StaleSubmission => StatusCode::CONFLICT,
            };
            let payload = json!({
                "error": source.to_string(),
                "errors": view.errors,
                "session": view,
            });
            (status, Json(payload)).into_response()
        }
        EnrollmentServiceError::StoreUnavailable => {
            let payload = json!({ "error": EnrollmentServiceError::StoreUnavailable.to_string() });
            (StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response()
        }
    }
}
