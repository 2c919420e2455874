//! Form state, validation and parsing backing the client-details pages.

use thiserror::Error;
use validator::ValidationErrors;

pub mod attachments;
pub mod details;
#[cfg(feature = "server")]
pub mod upload;
pub mod validators;

#[derive(Debug, Error)]
/// Errors that can occur when processing form data.
pub enum FormError {
    #[error("validation errors: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("invalid record id")]
    InvalidId,

    #[error("invalid date `{0}`")]
    InvalidDate(String),

    #[error("invalid number `{0}`")]
    InvalidNumber(String),

    #[error("content of `{0}` was not loaded")]
    MissingContent(String),

    #[error("form state is incomplete")]
    Incomplete,
}
