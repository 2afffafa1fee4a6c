//! Three-step enrollment wizard: field validation, per-step gating, record accumulation,
//! and the confirmation hand-off to the submission endpoint.

pub mod catalog;
pub mod controller;
pub mod countries;
pub mod domain;
pub mod gateway;
pub mod record;
pub mod router;
pub mod service;
pub mod validation;
pub mod widgets;

#[cfg(test)]
mod tests;

pub use catalog::{sub_options_for, ProgramOffering, PROGRAM_CATALOG};
pub use controller::{PendingSubmission, WizardController, WizardError, WizardState};
pub use countries::{CountryFetchError, CountrySource, RestCountriesClient};
pub use domain::{
    Campus, FieldErrors, FormField, FormRecord, Gender, MaritalStatus, PartialFormRecord,
    TrainingMethod, WizardEvent, WizardStep,
};
pub use gateway::{GatewayError, HttpSubmissionGateway, SubmissionGateway, SubmissionPayload};
pub use record::FormRecordStore;
pub use router::enrollment_router;
pub use service::{EnrollmentService, EnrollmentServiceError, SessionId, SessionView};
pub use validation::StepValidation;
pub use widgets::{AutoVerifyCaptcha, CaptchaWidget, DatePicker, FixedDatePicker, TodayPicker};
