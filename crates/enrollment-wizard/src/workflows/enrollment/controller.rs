use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use super::catalog::{is_offered, sub_options_for};
use super::countries::CountrySource;
use super::domain::{
    FieldErrors, FormField, FormRecord, PartialFormRecord, WizardEvent, WizardStep,
};
use super::gateway::{GatewayError, SubmissionGateway, SubmissionPayload};
use super::record::FormRecordStore;
use super::validation::{validate, validate_captcha, StepValidation};
use super::widgets::{CaptchaWidget, DatePicker};

/// Snapshot of the wizard: where the applicant is, what they entered, and what is wrong.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WizardState {
    pub current_step: WizardStep,
    pub errors: FieldErrors,
    pub record: FormRecord,
}

/// Ticket for a submission handed to the gateway. Only the outstanding ticket can complete
/// it; tickets are single-use and cannot be copied.
#[derive(Debug, PartialEq, Eq)]
pub struct PendingSubmission {
    ticket: u64,
    pub payload: SubmissionPayload,
    pub selected_date: DateTime<Utc>,
}

impl PendingSubmission {
    pub(crate) fn ticket(&self) -> u64 {
        self.ticket
    }
}

#[derive(Debug, thiserror::Error)]
pub enum WizardError {
    #[error("{step} has {} invalid field(s)", .fields.len())]
    StepBlocked {
        step: WizardStep,
        fields: Vec<FormField>,
    },
    #[error("please verify the CAPTCHA before submitting")]
    CaptchaNotVerified,
    #[error("{event:?} is not available from {step}")]
    InvalidTransition { step: WizardStep, event: WizardEvent },
    #[error("the enrollment record is read-only once the wizard reaches {step}")]
    RecordFinalized { step: WizardStep },
    #[error("no CAPTCHA is presented on {step}")]
    CaptchaNotPresented { step: WizardStep },
    #[error("a submission is already in flight")]
    SubmissionInFlight,
    #[error("submission ticket is no longer outstanding; result ignored")]
    StaleSubmission,
    #[error(transparent)]
    Submission(#[from] GatewayError),
}

const INTERRUPTED_SUBMISSION: &str =
    "submission was interrupted before the endpoint answered; please confirm again";

/// Drives the three-step enrollment form, its confirmation screen, and the final hand-off.
#[derive(Debug, Default)]
pub struct WizardController {
    step: WizardStep,
    errors: FieldErrors,
    store: FormRecordStore,
    captcha_verified: bool,
    countries: Vec<String>,
    issued_tickets: u64,
    in_flight: Option<u64>,
    submission_error: Option<String>,
    selected_date: Option<DateTime<Utc>>,
}

impl WizardController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> WizardState {
        WizardState {
            current_step: self.step,
            errors: self.errors.clone(),
            record: self.store.snapshot(),
        }
    }

    pub fn current_step(&self) -> WizardStep {
        self.step
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn record(&self) -> &FormRecord {
        self.store.record()
    }

    pub fn captcha_verified(&self) -> bool {
        self.captcha_verified
    }

    pub fn countries(&self) -> &[String] {
        &self.countries
    }

    pub fn submission_error(&self) -> Option<&str> {
        self.submission_error.as_deref()
    }

    pub fn selected_date(&self) -> Option<DateTime<Utc>> {
        self.selected_date
    }

    pub fn is_submitting(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Courses offered for the currently selected program category.
    pub fn sub_options(&self) -> &'static [&'static str] {
        sub_options_for(&self.store.record().program_category)
    }

    /// Validity of the current step, CAPTCHA included on the final step. Does not touch the
    /// visible errors.
    pub fn step_validation(&self) -> StepValidation {
        let mut validation = validate(self.store.record(), self.step);
        if self.step == WizardStep::FinalDetails {
            if let Err((field, message)) = validate_captcha(self.captcha_verified) {
                validation.errors.insert(field, message);
                validation.is_step_valid = false;
            }
        }
        validation
    }

    pub fn can_advance(&self) -> bool {
        self.step.is_form_step() && self.step_validation().is_step_valid
    }

    /// Apply a field-change event and recompute validity.
    ///
    /// Visible errors for fields that now pass are dropped; new errors only appear on an
    /// attempt to advance.
    pub fn update(&mut self, partial: PartialFormRecord) -> Result<StepValidation, WizardError> {
        if !self.step.is_form_step() {
            return Err(WizardError::RecordFinalized { step: self.step });
        }

        let partial = self.restrict_courses(partial);
        self.store.merge(partial);

        let validation = self.step_validation();
        self.errors
            .retain(|field, _| validation.errors.contains_key(field));
        Ok(validation)
    }

    pub fn next(&mut self) -> Result<WizardStep, WizardError> {
        self.advance(WizardEvent::Next)
    }

    pub fn submit(&mut self) -> Result<WizardStep, WizardError> {
        self.advance(WizardEvent::Submit)
    }

    /// Move one step backward without validating. A no-op where no previous step exists.
    pub fn back(&mut self) -> WizardStep {
        if let Some(target) = self.step.target(WizardEvent::Back) {
            if self.step == WizardStep::FinalDetails {
                // leaving the final step unmounts the challenge
                self.captcha_verified = false;
            }
            debug!(from = ?self.step, to = ?target, "wizard moved back");
            self.step = target;
        }
        self.step
    }

    /// Record the CAPTCHA widget's latest answer.
    pub fn on_captcha_verify(&mut self, verified: bool) -> Result<(), WizardError> {
        if self.step != WizardStep::FinalDetails {
            return Err(WizardError::CaptchaNotPresented { step: self.step });
        }
        self.captcha_verified = verified;
        if verified {
            self.errors.remove(&FormField::CaptchaVerified);
        }
        Ok(())
    }

    pub fn verify_captcha_with(&mut self, widget: &dyn CaptchaWidget) -> Result<(), WizardError> {
        self.on_captcha_verify(widget.verify())
    }

    /// Freeze the record and issue the payload for the gateway.
    pub fn begin_confirmation(
        &mut self,
        selected_date: DateTime<Utc>,
    ) -> Result<PendingSubmission, WizardError> {
        if self.step.target(WizardEvent::Confirm).is_none() {
            return Err(WizardError::InvalidTransition {
                step: self.step,
                event: WizardEvent::Confirm,
            });
        }
        if self.in_flight.is_some() {
            return Err(WizardError::SubmissionInFlight);
        }

        self.issued_tickets = self.issued_tickets.wrapping_add(1);
        self.in_flight = Some(self.issued_tickets);
        self.submission_error = None;
        Ok(PendingSubmission {
            ticket: self.issued_tickets,
            payload: SubmissionPayload::new(self.store.snapshot(), selected_date),
            selected_date,
        })
    }

    /// Apply the gateway's answer for `pending`. Tickets that are no longer outstanding
    /// (abandoned, cancelled, or already completed) change nothing.
    pub fn complete_confirmation(
        &mut self,
        pending: PendingSubmission,
        outcome: Result<(), GatewayError>,
    ) -> Result<WizardStep, WizardError> {
        if self.step != WizardStep::Confirmation || self.in_flight != Some(pending.ticket) {
            info!(
                ticket = pending.ticket,
                outstanding = ?self.in_flight,
                step = ?self.step,
                "ignoring submission result for a ticket that is no longer outstanding"
            );
            return Err(WizardError::StaleSubmission);
        }

        self.in_flight = None;
        match outcome {
            Ok(()) => {
                self.selected_date = Some(pending.selected_date);
                self.step = WizardStep::Success;
                info!(selected_date = %pending.payload.selected_date, "enrollment submitted");
                Ok(self.step)
            }
            Err(err) => {
                warn!(error = %err, "enrollment submission failed; confirmation can be retried");
                self.submission_error = Some(err.to_string());
                Err(WizardError::Submission(err))
            }
        }
    }

    /// Release the outstanding ticket without an answer from the gateway, leaving the
    /// confirmation screen retryable. Returns `false` when `ticket` is not outstanding.
    pub(crate) fn cancel_confirmation(&mut self, ticket: u64) -> bool {
        if self.in_flight != Some(ticket) {
            return false;
        }
        warn!(ticket, "submission abandoned before the gateway answered");
        self.in_flight = None;
        self.submission_error = Some(INTERRUPTED_SUBMISSION.to_string());
        true
    }

    /// Deliver through `gateway` and apply the outcome. Dropping the returned future before
    /// it resolves releases the ticket.
    pub async fn confirm<G>(
        &mut self,
        gateway: &G,
        selected_date: DateTime<Utc>,
    ) -> Result<WizardStep, WizardError>
    where
        G: SubmissionGateway + ?Sized,
    {
        let pending = self.begin_confirmation(selected_date)?;
        let mut release = ReleaseOnDrop {
            controller: Some(self),
            ticket: pending.ticket,
        };
        let outcome = gateway.deliver(&pending.payload).await;
        match release.controller.take() {
            Some(controller) => controller.complete_confirmation(pending, outcome),
            None => Err(WizardError::StaleSubmission),
        }
    }

    pub async fn confirm_with_picker<G>(
        &mut self,
        gateway: &G,
        picker: &dyn DatePicker,
    ) -> Result<WizardStep, WizardError>
    where
        G: SubmissionGateway + ?Sized,
    {
        let selected_date = picker.pick_date();
        self.confirm(gateway, selected_date).await
    }

    /// Populate the country list. Failures leave it empty and the wizard usable.
    pub async fn load_countries<S>(&mut self, source: &S)
    where
        S: CountrySource + ?Sized,
    {
        match source.fetch_countries().await {
            Ok(countries) => {
                debug!(count = countries.len(), "country list loaded");
                self.countries = countries;
            }
            Err(err) => {
                warn!(error = %err, "unable to load country list");
                self.countries.clear();
            }
        }
    }

    /// Discard everything entered so far. Submissions still in flight become stale.
    pub fn abandon(&mut self) {
        self.step = WizardStep::PersonalDetails;
        self.errors.clear();
        self.store.clear();
        self.captcha_verified = false;
        self.in_flight = None;
        self.submission_error = None;
        self.selected_date = None;
    }

    fn advance(&mut self, event: WizardEvent) -> Result<WizardStep, WizardError> {
        let from = self.step;
        let target = from
            .target(event)
            .ok_or(WizardError::InvalidTransition { step: from, event })?;

        let validation = self.step_validation();
        if !validation.is_step_valid {
            let fields = validation.invalid_fields();
            debug!(step = ?from, ?event, ?fields, "wizard transition blocked");
            self.errors = validation.errors;

            if fields == [FormField::CaptchaVerified] {
                return Err(WizardError::CaptchaNotVerified);
            }
            return Err(WizardError::StepBlocked { step: from, fields });
        }

        self.errors.clear();
        self.step = target;
        debug!(from = ?from, to = ?target, "wizard advanced");
        Ok(target)
    }

    // Drops courses the resulting category does not offer.
    fn restrict_courses(&self, mut partial: PartialFormRecord) -> PartialFormRecord {
        let category = partial
            .program_category
            .clone()
            .unwrap_or_else(|| self.store.record().program_category.clone());

        if let Some(courses) = partial.course.as_mut() {
            let before = courses.len();
            courses.retain(|course| is_offered(&category, course));
            if courses.len() != before {
                debug!(
                    %category,
                    dropped = before - courses.len(),
                    "discarded courses not offered for program category"
                );
            }
        }
        partial
    }
}

// Held across the gateway call in `WizardController::confirm`.
struct ReleaseOnDrop<'a> {
    controller: Option<&'a mut WizardController>,
    ticket: u64,
}

impl Drop for ReleaseOnDrop<'_> {
    fn drop(&mut self) {
        if let Some(controller) = self.controller.take() {
            controller.cancel_confirmation(self.ticket);
        }
    }
}
