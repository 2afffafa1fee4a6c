use serde::Serialize;

use super::super::catalog::sub_options_for;
use super::super::domain::{FieldErrors, FormField, FormRecord, WizardStep};
use super::rules::{email_shape, non_empty_set, required, required_choice, FieldIssue};

/// Outcome of checking every field a step requires.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepValidation {
    pub errors: FieldErrors,
    pub is_step_valid: bool,
}

impl StepValidation {
    fn from_errors(errors: FieldErrors) -> Self {
        let is_step_valid = errors.is_empty();
        Self {
            errors,
            is_step_valid,
        }
    }

    pub fn invalid_fields(&self) -> Vec<FormField> {
        self.errors.keys().copied().collect()
    }
}

/// Check the fields owned by `step`. Confirmation and Success own no fields.
///
/// The CAPTCHA is not part of the record; see [`validate_captcha`].
pub fn validate(record: &FormRecord, step: WizardStep) -> StepValidation {
    let mut errors = FieldErrors::new();
    let mut check = |field: FormField, result: Result<(), FieldIssue>| {
        if let Err(issue) = result {
            errors.insert(field, issue.message(field));
        }
    };

    match step {
        WizardStep::PersonalDetails => {
            check(FormField::FirstName, required(&record.first_name));
            check(FormField::LastName, required(&record.last_name));
            check(FormField::Email, email_shape(&record.email));
            check(FormField::PhoneNumber, required(&record.phone_number));
            check(FormField::Address, required(&record.address));
            check(FormField::ProgramCategory, required(&record.program_category));
        }
        WizardStep::ProgramPreferences => {
            if !sub_options_for(&record.program_category).is_empty() {
                check(FormField::Course, non_empty_set(&record.course));
            }
            check(
                FormField::PreferredLocation,
                required_choice(record.preferred_location.as_ref()),
            );
            check(
                FormField::TrainingMethod,
                required_choice(record.training_method.as_ref()),
            );
            check(FormField::Gender, required_choice(record.gender.as_ref()));
            check(FormField::DateOfBirth, required(&record.date_of_birth));
        }
        WizardStep::FinalDetails => {
            check(
                FormField::MaritalStatus,
                required_choice(record.marital_status.as_ref()),
            );
            check(FormField::Notes, required(&record.notes));
        }
        WizardStep::Confirmation | WizardStep::Success => {}
    }

    StepValidation::from_errors(errors)
}

/// The submit-time CAPTCHA guard, reported under [`FormField::CaptchaVerified`].
pub fn validate_captcha(verified: bool) -> Result<(), (FormField, String)> {
    if verified {
        Ok(())
    } else {
        let field = FormField::CaptchaVerified;
        Err((field, FieldIssue::Unverified.message(field)))
    }
}
