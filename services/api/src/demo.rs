use crate::infra::{parse_selected_date, DryRunGateway};
use chrono::{DateTime, Utc};
use clap::Args;
use enrollment_wizard::config::AppConfig;
use enrollment_wizard::error::AppError;
use enrollment_wizard::workflows::enrollment::{
    AutoVerifyCaptcha, Campus, DatePicker, FixedDatePicker, Gender, HttpSubmissionGateway,
    MaritalStatus, PartialFormRecord, RestCountriesClient, SubmissionGateway, TodayPicker,
    TrainingMethod, WizardController, WizardError, PROGRAM_CATALOG,
};

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Post the finished enrollment to this URL instead of a dry run.
    #[arg(long)]
    pub(crate) endpoint: Option<String>,
    /// Appointment date (RFC 3339 or YYYY-MM-DD). Defaults to now.
    #[arg(long, value_parser = parse_selected_date)]
    pub(crate) selected_date: Option<DateTime<Utc>>,
    /// Load the country list from the configured source before starting.
    #[arg(long)]
    pub(crate) fetch_countries: bool,
}

pub(crate) fn print_programs() {
    println!("Program catalog");
    for offering in PROGRAM_CATALOG {
        if offering.sub_options.is_empty() {
            println!("- {} (no course selection)", offering.category);
            continue;
        }
        println!("- {}", offering.category);
        for course in offering.sub_options {
            println!("    * {course}");
        }
    }
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        endpoint,
        selected_date,
        fetch_countries,
    } = args;
    let config = AppConfig::load()?;

    let dry_run = DryRunGateway::default();
    let live = endpoint
        .map(|url| HttpSubmissionGateway::new(url, config.integrations.request_timeout))
        .transpose()?;
    let gateway: &dyn SubmissionGateway = match &live {
        Some(gateway) => gateway,
        None => &dry_run,
    };

    let mut wizard = WizardController::new();
    println!("Enrollment wizard demo");

    if fetch_countries {
        let source = RestCountriesClient::from_config(&config.integrations)?;
        wizard.load_countries(&source).await;
        println!("Loaded {} countries", wizard.countries().len());
    }

    banner(&wizard);
    wizard.update(PartialFormRecord {
        first_name: Some("Ada".to_string()),
        last_name: Some("Lovelace".to_string()),
        email: Some("ada.lovelace".to_string()),
        phone_number: Some("+2348012345678".to_string()),
        address: Some("Nigeria".to_string()),
        state: Some("Lagos".to_string()),
        program_category: Some("AWS".to_string()),
        ..PartialFormRecord::default()
    })?;
    if let Err(err) = wizard.next() {
        println!("  Next refused: {err}");
        for (field, message) in wizard.errors() {
            println!("    {}: {message}", field.label());
        }
    }
    wizard.update(PartialFormRecord {
        email: Some("ada@example.com".to_string()),
        ..PartialFormRecord::default()
    })?;
    wizard.next()?;

    banner(&wizard);
    println!("  Courses offered: {}", wizard.sub_options().join(", "));
    wizard.update(PartialFormRecord {
        course: Some(["DevOps Engineering".to_string()].into_iter().collect()),
        preferred_location: Some(Campus::Lagos),
        training_method: Some(TrainingMethod::Hybrid),
        gender: Some(Gender::Female),
        date_of_birth: Some("1990-12-10".to_string()),
        ..PartialFormRecord::default()
    })?;
    wizard.next()?;

    banner(&wizard);
    wizard.update(PartialFormRecord {
        marital_status: Some(MaritalStatus::Single),
        notes: Some("Moving from analytics into cloud operations.".to_string()),
        ..PartialFormRecord::default()
    })?;
    if let Err(WizardError::CaptchaNotVerified) = wizard.submit() {
        println!("  Submit refused until the CAPTCHA is answered");
    }
    wizard.verify_captcha_with(&AutoVerifyCaptcha)?;
    wizard.submit()?;

    banner(&wizard);
    let record = wizard.record();
    println!(
        "  {} {} <{}> | {} / {} | {} ({})",
        record.first_name,
        record.last_name,
        record.email,
        record.program_category,
        record.course.iter().cloned().collect::<Vec<_>>().join(", "),
        record
            .preferred_location
            .map(Campus::label)
            .unwrap_or("-"),
        record
            .training_method
            .map(TrainingMethod::label)
            .unwrap_or("-"),
    );

    let picker: Box<dyn DatePicker> = match selected_date {
        Some(date) => Box::new(FixedDatePicker(date)),
        None => Box::new(TodayPicker),
    };
    wizard
        .confirm_with_picker(gateway, picker.as_ref())
        .await?;

    banner(&wizard);
    if let Some(date) = wizard.selected_date() {
        println!("  Appointment booked for {}", date.format("%A, %d %B %Y %H:%M UTC"));
    }
    if live.is_none() {
        println!(
            "  Dry run kept {} submission(s) in memory",
            dry_run.delivered().len()
        );
    }

    Ok(())
}

fn banner(wizard: &WizardController) {
    println!("\n{}", wizard.current_step().label());
}
