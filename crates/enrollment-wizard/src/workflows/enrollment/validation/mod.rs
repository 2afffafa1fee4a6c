//! Field-level validators and the per-step policy built on top of them.

mod policy;
mod rules;

pub use policy::{validate, validate_captcha, StepValidation};
pub use rules::{email_shape, non_empty_set, required, required_choice, FieldIssue};
