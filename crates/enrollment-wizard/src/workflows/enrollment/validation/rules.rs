use std::collections::BTreeSet;

use super::super::domain::FormField;

/// Reason a single field value was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldIssue {
    Missing,
    MalformedEmail,
    EmptySelection,
    Unverified,
}

impl FieldIssue {
    pub fn message(self, field: FormField) -> String {
        match self {
            FieldIssue::Missing => format!("{} is required", field.label()),
            FieldIssue::MalformedEmail => "Enter a valid email address".to_string(),
            FieldIssue::EmptySelection => format!("Select at least one {}", field.label().to_lowercase()),
            FieldIssue::Unverified => "Please verify the CAPTCHA before submitting".to_string(),
        }
    }
}

/// Whitespace-only input counts as empty.
pub fn required(value: &str) -> Result<(), FieldIssue> {
    if value.trim().is_empty() {
        Err(FieldIssue::Missing)
    } else {
        Ok(())
    }
}

pub fn required_choice<T>(value: Option<&T>) -> Result<(), FieldIssue> {
    value.map(|_| ()).ok_or(FieldIssue::Missing)
}

/// Accepts any value containing a `local@domain.tld` run of non-whitespace characters.
pub fn email_shape(value: &str) -> Result<(), FieldIssue> {
    required(value)?;
    if value.split_whitespace().any(has_email_shape) {
        Ok(())
    } else {
        Err(FieldIssue::MalformedEmail)
    }
}

pub fn non_empty_set<T>(values: &BTreeSet<T>) -> Result<(), FieldIssue> {
    if values.is_empty() {
        Err(FieldIssue::EmptySelection)
    } else {
        Ok(())
    }
}

// `token` contains no whitespace. Needs an '@' after at least one character and a '.'
// with at least one character on each side between it and the end.
fn has_email_shape(token: &str) -> bool {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() < 5 {
        return false;
    }

    let Some(at) = chars.iter().skip(1).position(|c| *c == '@').map(|i| i + 1) else {
        return false;
    };

    chars[..chars.len() - 1]
        .iter()
        .rposition(|c| *c == '.')
        .is_some_and(|dot| dot >= at + 2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_rejects_blank_values() {
        assert_eq!(required(""), Err(FieldIssue::Missing));
        assert_eq!(required("   "), Err(FieldIssue::Missing));
        assert_eq!(required("Ada"), Ok(()));
    }

    #[test]
    fn email_shape_accepts_common_addresses() {
        for value in [
            "ada@x.com",
            "first.last@mail.example.org",
            "a@b.c",
            "contact me at ada@x.com",
            "a@b@c.d",
        ] {
            assert_eq!(email_shape(value), Ok(()), "{value} should pass");
        }
    }

    #[test]
    fn email_shape_rejects_malformed_addresses() {
        for value in [
            "not-an-email",
            "@x.com",
            "ada@.com",
            "ada@x.",
            "ada@xcom",
            "ada @x.com",
            "ada@ x.com",
        ] {
            assert_eq!(
                email_shape(value),
                Err(FieldIssue::MalformedEmail),
                "{value} should fail"
            );
        }
        assert_eq!(email_shape(""), Err(FieldIssue::Missing));
    }

    #[test]
    fn non_empty_set_counts_members() {
        let mut courses = BTreeSet::new();
        assert_eq!(non_empty_set(&courses), Err(FieldIssue::EmptySelection));
        courses.insert("DevOps Engineering".to_string());
        assert_eq!(non_empty_set(&courses), Ok(()));
    }

    #[test]
    fn messages_name_the_field() {
        assert_eq!(
            FieldIssue::Missing.message(FormField::FirstName),
            "First name is required"
        );
        assert_eq!(
            FieldIssue::EmptySelection.message(FormField::Course),
            "Select at least one course"
        );
    }
}
