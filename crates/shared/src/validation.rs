//! Field validators shared by request DTOs.
//!
//! Each function plugs into `#[validate(custom(function = ...))]`.

use lazy_static::lazy_static;
use regex::Regex;
use validator::ValidationError;

lazy_static! {
    static ref PHONE_REGEX: Regex =
        Regex::new(r"^\+?[0-9]{10,15}$").expect("phone regex is valid");
    static ref COLLEGE_ID_REGEX: Regex =
        Regex::new(r"^[A-Za-z0-9][A-Za-z0-9/_-]{2,31}$").expect("college id regex is valid");
}

/// Oldest and newest academic year a member can report.
pub const MIN_YEAR: i32 = 1;
pub const MAX_YEAR: i32 = 5;

fn error(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(message.into());
    err
}

/// Rejects empty or whitespace-only strings.
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(error("blank", "Value must not be blank"))
    } else {
        Ok(())
    }
}

/// Validates a phone number: optional `+` followed by 10 to 15 digits.
pub fn validate_phone(phone: &str) -> Result<(), ValidationError> {
    if PHONE_REGEX.is_match(phone) {
        Ok(())
    } else {
        Err(error(
            "phone_format",
            "Phone must contain 10 to 15 digits with an optional leading +",
        ))
    }
}

/// Validates a college identifier such as `21CS042`.
pub fn validate_college_id(id: &str) -> Result<(), ValidationError> {
    if COLLEGE_ID_REGEX.is_match(id) {
        Ok(())
    } else {
        Err(error(
            "college_id_format",
            "College ID must be 3 to 32 letters, digits, '/', '_' or '-'",
        ))
    }
}

/// Validates an academic year.
pub fn validate_year(year: i32) -> Result<(), ValidationError> {
    if (MIN_YEAR..=MAX_YEAR).contains(&year) {
        Ok(())
    } else {
        Err(error("year_range", "Year must be between 1 and 5"))
    }
}

/// Validates a batch label such as `2021` or `2021-2025`.
pub fn validate_batch(batch: &str) -> Result<(), ValidationError> {
    let valid = match batch.split_once('-') {
        Some((start, end)) => is_year(start) && is_year(end) && start <= end,
        None => is_year(batch),
    };
    if valid {
        Ok(())
    } else {
        Err(error(
            "batch_format",
            "Batch must be a year (2021) or a year range (2021-2025)",
        ))
    }
}

fn is_year(s: &str) -> bool {
    s.len() == 4 && s.chars().all(|c| c.is_ascii_digit())
}
