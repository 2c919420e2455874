//! Field and cross-field validators shared by the details form.
//!
//! Error codes double as the keys templates use to pick messages.

use std::borrow::Cow;

use chrono::NaiveDate;
use validator::{ValidationError, ValidationErrors};

pub const REQUIRED: &str = "required";
pub const EMAIL: &str = "email";
pub const EMAIL_DOT: &str = "emailDot";
pub const INVALID_DATE: &str = "invalidDate";
pub const INVALID_DATE_RANGE: &str = "invalidDateRange";
pub const INVALID_EXPERIENCE_DATES: &str = "invalidExperienceDates";
pub const RANGE: &str = "range";

fn error(code: &'static str, message: &'static str) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(Cow::Borrowed(message));
    error
}

/// Requires a dot after the `@` of an email address.
///
/// Only the segment following the first `@` is inspected, i.e. the domain.
/// Values without `@` pass; the email-shape check reports those.
pub fn email_dot(value: &str) -> Result<(), ValidationError> {
    let Some(domain) = value.split('@').nth(1) else {
        return Ok(());
    };

    if domain.contains('.') {
        Ok(())
    } else {
        Err(error(EMAIL_DOT, "Email is invalid."))
    }
}

/// Rejects dates after the reference date.
pub fn not_after(value: NaiveDate, reference: NaiveDate) -> Result<(), ValidationError> {
    if value > reference {
        Err(error(INVALID_DATE, "Date cannot be in the future."))
    } else {
        Ok(())
    }
}

/// Requires `second` to be on or after `first`; the error is reported on
/// `first_field`. Missing values are left to the required checks.
pub fn date_range(
    first_field: &'static str,
    first: Option<NaiveDate>,
    second: Option<NaiveDate>,
) -> Result<(), ValidationErrors> {
    match (first, second) {
        (Some(first), Some(second)) if second < first => {
            let mut errors = ValidationErrors::new();
            errors.add(
                first_field,
                error(
                    INVALID_DATE_RANGE,
                    "Experience cannot start before the date of birth.",
                ),
            );
            Err(errors)
        }
        _ => Ok(()),
    }
}

/// Requires the experience end to be on or after its start; the error is
/// reported on `end_field`.
pub fn experience_order(
    end_field: &'static str,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Result<(), ValidationErrors> {
    match (start, end) {
        (Some(start), Some(end)) if start > end => {
            let mut errors = ValidationErrors::new();
            errors.add(
                end_field,
                error(
                    INVALID_EXPERIENCE_DATES,
                    "Experience end must not precede its start.",
                ),
            );
            Err(errors)
        }
        _ => Ok(()),
    }
}

pub(crate) fn required() -> ValidationError {
    error(REQUIRED, "This field is required.")
}

pub(crate) fn invalid_email() -> ValidationError {
    error(EMAIL, "Email is invalid.")
}

pub(crate) fn out_of_range(message: &'static str) -> ValidationError {
    error(RANGE, message)
}
