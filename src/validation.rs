use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

pub const COMMENT_MIN_LEN: usize = 10;
pub const COMMENT_MAX_LEN: usize = 500;
pub const BIO_MAX_LEN: usize = 500;
pub const PASSWORD_MIN_LEN: usize = 6;

/// Rejected input, tagged with the offending field.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("invalid {field}: {reason}")]
pub struct ValidationError {
    pub field: &'static str,
    pub reason: String,
}

impl ValidationError {
    pub fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

lazy_static! {
    static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    static ref PHONE_RE: Regex = Regex::new(r"^(\+212|0)[5-7]\d{8}$").unwrap();
}

/// Review ratings are whole stars from 1 to 5. Accepts the raw JSON number so
/// that `4.5` is reported as a validation failure rather than a parse error.
pub fn validate_rating(raw: f64) -> Result<i16, ValidationError> {
    if raw.fract() != 0.0 {
        return Err(ValidationError::new("rating", "must be a whole number"));
    }
    if !(1.0..=5.0).contains(&raw) {
        return Err(ValidationError::new("rating", "must be between 1 and 5"));
    }
    Ok(raw as i16)
}

/// Returns the trimmed comment.
pub fn validate_comment(comment: &str) -> Result<String, ValidationError> {
    let trimmed = comment.trim();
    let len = trimmed.chars().count();
    if !(COMMENT_MIN_LEN..=COMMENT_MAX_LEN).contains(&len) {
        return Err(ValidationError::new(
            "comment",
            format!("must be between {COMMENT_MIN_LEN} and {COMMENT_MAX_LEN} characters"),
        ));
    }
    Ok(trimmed.to_string())
}

/// Returns the normalized (trimmed, lowercased) email.
pub fn validate_email(email: &str) -> Result<String, ValidationError> {
    let email = email.trim().to_lowercase();
    if !EMAIL_RE.is_match(&email) {
        return Err(ValidationError::new("email", "must be a valid email address"));
    }
    Ok(email)
}

pub fn validate_phone(phone: &str) -> Result<String, ValidationError> {
    let phone = phone.trim();
    if !PHONE_RE.is_match(phone) {
        return Err(ValidationError::new(
            "phone",
            "must be a valid Moroccan phone number",
        ));
    }
    Ok(phone.to_string())
}

pub fn validate_name(name: &str) -> Result<String, ValidationError> {
    let name = name.trim();
    let len = name.chars().count();
    if !(2..=100).contains(&len) {
        return Err(ValidationError::new(
            "name",
            "must be between 2 and 100 characters",
        ));
    }
    Ok(name.to_string())
}

pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.chars().count() < PASSWORD_MIN_LEN {
        return Err(ValidationError::new(
            "password",
            format!("must be at least {PASSWORD_MIN_LEN} characters"),
        ));
    }
    Ok(())
}

pub fn validate_bio(bio: &str) -> Result<String, ValidationError> {
    if bio.chars().count() > BIO_MAX_LEN {
        return Err(ValidationError::new(
            "bio",
            format!("cannot exceed {BIO_MAX_LEN} characters"),
        ));
    }
    Ok(bio.to_string())
}

pub fn validate_experience(years: i32) -> Result<i32, ValidationError> {
    if years < 0 {
        return Err(ValidationError::new("experience", "cannot be negative"));
    }
    Ok(years)
}

pub fn validate_hourly_rate(rate: f64) -> Result<f64, ValidationError> {
    if !rate.is_finite() || rate < 0.0 {
        return Err(ValidationError::new("hourlyRate", "cannot be negative"));
    }
    Ok(rate)
}
