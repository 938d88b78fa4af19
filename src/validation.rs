//! Name and date-window checks shared by the course, class and project write paths.
//!
//! Timestamps travel as text in the fixed `DD-MM-YYYY HH:MM` layout and are
//! interpreted as UTC.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};

/// `chrono` format string for the `DD-MM-YYYY HH:MM` layout.
pub const DATE_LAYOUT: &str = "%d-%m-%Y %H:%M";

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{field} cannot be empty")]
    NameEmpty { field: &'static str },
    #[error("invalid {field}: {reason}")]
    InvalidRange { field: &'static str, reason: String },
}

impl ValidationError {
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::NameEmpty { field } => field,
            ValidationError::InvalidRange { field, .. } => field,
        }
    }

    fn range(field: &'static str, reason: impl Into<String>) -> Self {
        ValidationError::InvalidRange {
            field,
            reason: reason.into(),
        }
    }
}

pub fn validate_name(field: &'static str, name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::NameEmpty { field });
    }
    Ok(())
}

pub fn parse_timestamp(field: &'static str, raw: &str) -> Result<DateTime<Utc>, ValidationError> {
    NaiveDateTime::parse_from_str(raw.trim(), DATE_LAYOUT)
        .map(|naive| Utc.from_utc_datetime(&naive))
        .map_err(|_| ValidationError::range(field, format!("expected format DD-MM-YYYY HH:MM, got {raw:?}")))
}

pub fn format_timestamp(value: &DateTime<Utc>) -> String {
    value.format(DATE_LAYOUT).to_string()
}

/// Strict ordering: a window whose start equals its end is rejected.
pub fn validate_window(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<(), ValidationError> {
    if start < end {
        Ok(())
    } else {
        Err(ValidationError::range("start_date", "start date must be earlier than end date"))
    }
}

/// Parses both ends of a window and checks their ordering.
pub fn validate_date_range(start: &str, end: &str) -> Result<(DateTime<Utc>, DateTime<Utc>), ValidationError> {
    let start = parse_timestamp("start_date", start)?;
    let end = parse_timestamp("end_date", end)?;
    validate_window(start, end)?;
    Ok((start, end))
}

/// A project deadline may fall on, but not after, the end of its course.
pub fn validate_deadline(deadline: DateTime<Utc>, course_end: DateTime<Utc>) -> Result<(), ValidationError> {
    if deadline <= course_end {
        Ok(())
    } else {
        Err(ValidationError::range(
            "deadline",
            format!("deadline must not be later than the course end ({})", format_timestamp(&course_end)),
        ))
    }
}
