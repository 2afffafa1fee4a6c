use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

/// Screens of the enrollment wizard, in the order an applicant moves through them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    #[default]
    PersonalDetails,
    ProgramPreferences,
    FinalDetails,
    Confirmation,
    Success,
}

impl WizardStep {
    pub const fn ordered() -> [Self; 5] {
        [
            Self::PersonalDetails,
            Self::ProgramPreferences,
            Self::FinalDetails,
            Self::Confirmation,
            Self::Success,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::PersonalDetails => "Step 1: Personal Details",
            Self::ProgramPreferences => "Step 2: Program Preferences",
            Self::FinalDetails => "Step 3: Final Details",
            Self::Confirmation => "Admission Appointment",
            Self::Success => "Submitted",
        }
    }

    /// Position among the three form steps; `None` once the form is complete.
    pub const fn number(self) -> Option<u8> {
        match self {
            Self::PersonalDetails => Some(1),
            Self::ProgramPreferences => Some(2),
            Self::FinalDetails => Some(3),
            Self::Confirmation | Self::Success => None,
        }
    }

    pub const fn is_form_step(self) -> bool {
        self.number().is_some()
    }

    /// Structural transition table. Guards are evaluated by the controller.
    pub const fn target(self, event: WizardEvent) -> Option<Self> {
        match (self, event) {
            (Self::PersonalDetails, WizardEvent::Next) => Some(Self::ProgramPreferences),
            (Self::ProgramPreferences, WizardEvent::Back) => Some(Self::PersonalDetails),
            (Self::ProgramPreferences, WizardEvent::Next) => Some(Self::FinalDetails),
            (Self::FinalDetails, WizardEvent::Back) => Some(Self::ProgramPreferences),
            (Self::FinalDetails, WizardEvent::Submit) => Some(Self::Confirmation),
            (Self::Confirmation, WizardEvent::Confirm) => Some(Self::Success),
            _ => None,
        }
    }
}

impl fmt::Display for WizardStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Navigation requests accepted by the wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardEvent {
    Next,
    Back,
    Submit,
    Confirm,
}

/// Every field the wizard can report an error against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FormField {
    FirstName,
    LastName,
    Email,
    PhoneNumber,
    Address,
    State,
    ProgramCategory,
    Course,
    PreferredLocation,
    TrainingMethod,
    Gender,
    DateOfBirth,
    MaritalStatus,
    Notes,
    CaptchaVerified,
}

impl FormField {
    pub const fn key(self) -> &'static str {
        match self {
            Self::FirstName => "firstName",
            Self::LastName => "lastName",
            Self::Email => "email",
            Self::PhoneNumber => "phoneNumber",
            Self::Address => "address",
            Self::State => "state",
            Self::ProgramCategory => "programCategory",
            Self::Course => "course",
            Self::PreferredLocation => "preferredLocation",
            Self::TrainingMethod => "trainingMethod",
            Self::Gender => "gender",
            Self::DateOfBirth => "dateOfBirth",
            Self::MaritalStatus => "maritalStatus",
            Self::Notes => "notes",
            Self::CaptchaVerified => "captchaVerified",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::FirstName => "First name",
            Self::LastName => "Last name",
            Self::Email => "Email",
            Self::PhoneNumber => "Phone number",
            Self::Address => "Country",
            Self::State => "State",
            Self::ProgramCategory => "Program category",
            Self::Course => "Course",
            Self::PreferredLocation => "Preferred location",
            Self::TrainingMethod => "Preferred training method",
            Self::Gender => "Gender",
            Self::DateOfBirth => "Date of birth",
            Self::MaritalStatus => "Marital status",
            Self::Notes => "Reason for attending",
            Self::CaptchaVerified => "CAPTCHA",
        }
    }
}

impl fmt::Display for FormField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Field-keyed error messages surfaced next to the inputs of the current step.
pub type FieldErrors = BTreeMap<FormField, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Male => "Male",
            Self::Female => "Female",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MaritalStatus {
    Single,
    Married,
    Divorced,
    Widowed,
}

impl MaritalStatus {
    pub const fn ordered() -> [Self; 4] {
        [Self::Single, Self::Married, Self::Divorced, Self::Widowed]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Single => "Single",
            Self::Married => "Married",
            Self::Divorced => "Divorced",
            Self::Widowed => "Widowed",
        }
    }
}

/// Training campuses an applicant can choose from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Campus {
    Lagos,
    Abuja,
    Kaduna,
    Yola,
    Enugu,
    Asaba,
}

impl Campus {
    pub const fn ordered() -> [Self; 6] {
        [
            Self::Lagos,
            Self::Abuja,
            Self::Kaduna,
            Self::Yola,
            Self::Enugu,
            Self::Asaba,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Lagos => "Lagos",
            Self::Abuja => "Abuja",
            Self::Kaduna => "Kaduna",
            Self::Yola => "Yola",
            Self::Enugu => "Enugu",
            Self::Asaba => "Asaba",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrainingMethod {
    #[serde(rename = "In-Person ILT")]
    InPerson,
    #[serde(rename = "Virtual ILT")]
    Virtual,
    #[serde(rename = "Both (In-Person & Virtual)")]
    Hybrid,
}

impl TrainingMethod {
    pub const fn ordered() -> [Self; 3] {
        [Self::InPerson, Self::Virtual, Self::Hybrid]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::InPerson => "In-Person ILT",
            Self::Virtual => "Virtual ILT",
            Self::Hybrid => "Both (In-Person & Virtual)",
        }
    }
}

/// The applicant record accumulated across all three steps.
///
/// Unset text fields are empty strings and unset choices are `None`, matching what the
/// submission endpoint receives for fields an applicant never touched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FormRecord {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: String,
    /// Country of residence.
    pub address: String,
    pub state: String,
    pub program_category: String,
    pub course: BTreeSet<String>,
    pub preferred_location: Option<Campus>,
    pub training_method: Option<TrainingMethod>,
    pub gender: Option<Gender>,
    #[serde(alias = "year")]
    pub date_of_birth: String,
    pub marital_status: Option<MaritalStatus>,
    pub notes: String,
}

/// A field-change event: only the keys that are present overwrite the stored record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct PartialFormRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub program_category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub course: Option<BTreeSet<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferred_location: Option<Campus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub training_method: Option<TrainingMethod>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
    #[serde(alias = "year", skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marital_status: Option<MaritalStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl PartialFormRecord {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}
