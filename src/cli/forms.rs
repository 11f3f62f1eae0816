//! Patient and visit form flags with client-side validation

use anyhow::{anyhow, Result};
use chrono::{DateTime, NaiveDate, Utc};
use clap::Args;
use regex::Regex;
use std::sync::OnceLock;

use crate::api::{PatientInput, VisitInput, VisitStatus};

fn phone_pattern() -> &'static Regex {
    static PHONE: OnceLock<Regex> = OnceLock::new();
    PHONE.get_or_init(|| Regex::new(r"^[+\d][\d\s()-]{5,}$").expect("valid phone pattern"))
}

fn email_pattern() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email pattern"))
}

/// Patient fields as given on the command line
#[derive(Args, Debug, Default, Clone)]
pub struct PatientForm {
    #[arg(long)]
    pub first_name: Option<String>,

    #[arg(long)]
    pub last_name: Option<String>,

    /// Date of birth, YYYY-MM-DD
    #[arg(long = "dob")]
    pub date_of_birth: Option<String>,

    #[arg(long = "phone")]
    pub phone_number: Option<String>,

    /// Email; an empty value clears it when editing
    #[arg(long)]
    pub email: Option<String>,
}

impl PatientForm {
    /// Validate the form. With `complete` every required field must be
    /// present, as for a new patient; otherwise only given fields are checked.
    pub fn into_input(self, complete: bool) -> Result<PatientInput> {
        if complete {
            for (value, flag) in [
                (&self.first_name, "--first-name"),
                (&self.last_name, "--last-name"),
                (&self.date_of_birth, "--dob"),
                (&self.phone_number, "--phone"),
            ] {
                if value.is_none() {
                    return Err(anyhow!("{} is required", flag));
                }
            }
        }

        let first_name = self
            .first_name
            .map(|name| required_text(name, "First name"))
            .transpose()?;
        let last_name = self
            .last_name
            .map(|name| required_text(name, "Last name"))
            .transpose()?;
        let date_of_birth = self
            .date_of_birth
            .as_deref()
            .map(parse_date_of_birth)
            .transpose()?;
        let phone_number = self.phone_number.map(validate_phone).transpose()?;
        // A blank email clears it on edit and is simply left out on create
        let email = match self.email {
            Some(email) if email.trim().is_empty() => (!complete).then_some(None),
            Some(email) => Some(Some(validate_email(email)?)),
            None => None,
        };

        let input = PatientInput {
            first_name,
            last_name,
            date_of_birth,
            phone_number,
            email,
        };

        if !complete && input == PatientInput::default() {
            return Err(anyhow!("Nothing to update"));
        }
        Ok(input)
    }
}

/// Visit fields as given on the command line
#[derive(Args, Debug, Default, Clone)]
pub struct VisitForm {
    /// Visit date, RFC 3339 or YYYY-MM-DD
    #[arg(long = "date")]
    pub visit_date: Option<String>,

    #[arg(long)]
    pub diagnosis: Option<String>,

    #[arg(long)]
    pub treatment: Option<String>,

    /// SCHEDULED, COMPLETED or CANCELLED
    #[arg(long)]
    pub status: Option<String>,

    #[arg(long)]
    pub notes: Option<String>,
}

impl VisitForm {
    pub fn into_input(self, complete: bool) -> Result<VisitInput> {
        if complete {
            for (value, flag) in [
                (&self.visit_date, "--date"),
                (&self.diagnosis, "--diagnosis"),
                (&self.treatment, "--treatment"),
            ] {
                if value.is_none() {
                    return Err(anyhow!("{} is required", flag));
                }
            }
        }

        let input = VisitInput {
            visit_date: self.visit_date.as_deref().map(parse_visit_date).transpose()?,
            diagnosis: self
                .diagnosis
                .map(|text| required_text(text, "Diagnosis"))
                .transpose()?,
            treatment: self
                .treatment
                .map(|text| required_text(text, "Treatment"))
                .transpose()?,
            status: self
                .status
                .as_deref()
                .map(|s| s.parse::<VisitStatus>().map_err(|e| anyhow!("{}", e)))
                .transpose()?,
            notes: self.notes,
        };

        if !complete && input == VisitInput::default() {
            return Err(anyhow!("Nothing to update"));
        }
        Ok(input)
    }
}

fn required_text(value: String, field: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(anyhow!("{} is required", field));
    }
    Ok(trimmed.to_string())
}

pub fn parse_date_of_birth(value: &str) -> Result<DateTime<Utc>> {
    let date = NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| anyhow!("Invalid date of birth {:?}, expected YYYY-MM-DD", value))?;
    if date > Utc::now().date_naive() {
        return Err(anyhow!("Date of birth cannot be in the future"));
    }
    midnight(date)
}

pub fn parse_visit_date(value: &str) -> Result<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(at) = DateTime::parse_from_rfc3339(value) {
        return Ok(at.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| anyhow!("Invalid visit date {:?}, expected RFC 3339 or YYYY-MM-DD", value))?;
    midnight(date)
}

fn midnight(date: NaiveDate) -> Result<DateTime<Utc>> {
    date.and_hms_opt(0, 0, 0)
        .map(|at| at.and_utc())
        .ok_or_else(|| anyhow!("Invalid date {}", date))
}

pub fn validate_phone(value: String) -> Result<String> {
    let value = value.trim().to_string();
    if !phone_pattern().is_match(&value) {
        return Err(anyhow!("Invalid phone number {:?}", value));
    }
    Ok(value)
}

pub fn validate_email(value: String) -> Result<String> {
    let value = value.trim().to_string();
    if !email_pattern().is_match(&value) {
        return Err(anyhow!("Invalid email {:?}", value));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_form() -> PatientForm {
        PatientForm {
            first_name: Some(" Anna ".to_string()),
            last_name: Some("Ivanova".to_string()),
            date_of_birth: Some("1990-01-15".to_string()),
            phone_number: Some("+7 (901) 555-12-34".to_string()),
            email: None,
        }
    }

    #[test]
    fn test_complete_patient_form() {
        let input = full_form().into_input(true).unwrap();
        assert_eq!(input.first_name.as_deref(), Some("Anna"));
        assert_eq!(
            input.date_of_birth.unwrap().to_rfc3339(),
            "1990-01-15T00:00:00+00:00"
        );
        assert!(input.email.is_none());
    }

    #[test]
    fn test_new_patient_requires_every_field() {
        let form = PatientForm {
            phone_number: None,
            ..full_form()
        };
        let err = form.into_input(true).unwrap_err();
        assert_eq!(err.to_string(), "--phone is required");
    }

    #[test]
    fn test_blank_name_is_rejected() {
        let form = PatientForm {
            last_name: Some("   ".to_string()),
            ..full_form()
        };
        assert!(form.into_input(true).is_err());
    }

    #[test]
    fn test_partial_edit() {
        let form = PatientForm {
            email: Some("anna@example.com".to_string()),
            ..Default::default()
        };
        let input = form.into_input(false).unwrap();
        assert_eq!(input.email, Some(Some("anna@example.com".to_string())));
        assert!(input.first_name.is_none());

        assert!(PatientForm::default().into_input(false).is_err());
    }

    #[test]
    fn test_blank_email_clears_on_edit_only() {
        let form = PatientForm {
            email: Some("  ".to_string()),
            ..Default::default()
        };
        let input = form.into_input(false).unwrap();
        assert_eq!(input.email, Some(None));

        let input = PatientForm {
            email: Some(String::new()),
            ..full_form()
        }
        .into_input(true)
        .unwrap();
        assert!(input.email.is_none());
    }

    #[test]
    fn test_phone_and_email_patterns() {
        assert!(validate_phone("+79015551234".to_string()).is_ok());
        assert!(validate_phone("8 (901) 555-12-34".to_string()).is_ok());
        assert!(validate_phone("12-34".to_string()).is_err());
        assert!(validate_phone("call me".to_string()).is_err());

        assert!(validate_email("a@b.co".to_string()).is_ok());
        assert!(validate_email("a@b".to_string()).is_err());
        assert!(validate_email("a b@c.de".to_string()).is_err());
    }

    #[test]
    fn test_dates() {
        assert!(parse_date_of_birth("1990-13-01").is_err());
        assert!(parse_date_of_birth("2999-01-01").is_err());

        let at = parse_visit_date("2024-03-05T10:30:00+03:00").unwrap();
        assert_eq!(at.to_rfc3339(), "2024-03-05T07:30:00+00:00");
        let day = parse_visit_date("2024-03-05").unwrap();
        assert_eq!(day.to_rfc3339(), "2024-03-05T00:00:00+00:00");
    }

    #[test]
    fn test_visit_form() {
        let form = VisitForm {
            visit_date: Some("2024-03-05".to_string()),
            diagnosis: Some("Flu".to_string()),
            treatment: Some("Rest".to_string()),
            status: Some("completed".to_string()),
            notes: None,
        };
        let input = form.into_input(true).unwrap();
        assert_eq!(input.status, Some(VisitStatus::Completed));

        let missing = VisitForm {
            diagnosis: Some("Flu".to_string()),
            ..Default::default()
        };
        assert!(missing.into_input(true).is_err());
    }
}
