//! Host UI capabilities the wizard consults but does not render.

use chrono::{DateTime, Utc};

/// A human-verification challenge; the latest answer is authoritative.
pub trait CaptchaWidget {
    fn verify(&self) -> bool;
}

/// The appointment calendar on the confirmation screen.
pub trait DatePicker {
    fn pick_date(&self) -> DateTime<Utc>;
}

/// Always passes. Suitable for scripted runs and local development.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoVerifyCaptcha;

impl CaptchaWidget for AutoVerifyCaptcha {
    fn verify(&self) -> bool {
        true
    }
}

/// Defaults the appointment to the moment the picker is consulted.
#[derive(Debug, Clone, Copy, Default)]
pub struct TodayPicker;

impl DatePicker for TodayPicker {
    fn pick_date(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FixedDatePicker(pub DateTime<Utc>);

impl DatePicker for FixedDatePicker {
    fn pick_date(&self) -> DateTime<Utc> {
        self.0
    }
}
