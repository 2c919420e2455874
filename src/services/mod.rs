//! Controllers sitting between the HTTP routes and the backend gateway.

use thiserror::Error;
use validator::ValidationErrors;

use crate::domain::types::TypeConstraintError;
use crate::forms::FormError;
use crate::repository::errors::RepositoryError;

pub mod details;
pub mod dialogs;
pub mod list;
pub mod preview;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("not found")]
    NotFound,

    #[error("validation failed: {0}")]
    Validation(ValidationErrors),

    #[error("{0}")]
    Form(String),

    /// Message reported by the backend, shown to the user as is.
    #[error("{0}")]
    Backend(String),

    #[error(transparent)]
    TypeConstraint(#[from] TypeConstraintError),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl From<RepositoryError> for ServiceError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => ServiceError::NotFound,
            RepositoryError::Backend { message, .. } => ServiceError::Backend(message),
            RepositoryError::Transport(message) => ServiceError::Backend(message),
            RepositoryError::Decode(message) | RepositoryError::Validation(message) => {
                ServiceError::Internal(message)
            }
        }
    }
}

impl From<FormError> for ServiceError {
    fn from(err: FormError) -> Self {
        match err {
            FormError::Validation(errors) => ServiceError::Validation(errors),
            FormError::Incomplete => ServiceError::Internal(FormError::Incomplete.to_string()),
            other => ServiceError::Form(other.to_string()),
        }
    }
}

impl From<ValidationErrors> for ServiceError {
    fn from(errors: ValidationErrors) -> Self {
        ServiceError::Validation(errors)
    }
}
