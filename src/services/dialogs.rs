//! Confirm and success dialogs.

use serde::Serialize;

/// Literal a confirm dialog resolves with when the user agrees.
pub const CONFIRM_TOKEN: &str = "confirm";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfirmResult {
    Confirmed,
    Dismissed,
}

impl ConfirmResult {
    /// Anything other than the exact confirm token dismisses.
    pub fn from_token(token: Option<&str>) -> Self {
        match token {
            Some(CONFIRM_TOKEN) => ConfirmResult::Confirmed,
            _ => ConfirmResult::Dismissed,
        }
    }

    pub fn is_confirmed(self) -> bool {
        self == ConfirmResult::Confirmed
    }
}

#[derive(Debug, Serialize)]
pub struct ConfirmDialog {
    pub title: String,
    pub message: String,
    /// Where the confirm form posts to.
    pub action_url: String,
    /// Where cancelling leads back to.
    pub cancel_url: String,
    pub token: &'static str,
}

impl ConfirmDialog {
    pub fn delete_record(action_url: String, cancel_url: String) -> Self {
        Self {
            title: "Confirm Delete".to_string(),
            message: "Are you sure you want to delete this record?".to_string(),
            action_url,
            cancel_url,
            token: CONFIRM_TOKEN,
        }
    }
}

/// Shown after a successful save; acknowledging it closes every dialog and
/// reloads the list.
#[derive(Debug, Serialize)]
pub struct SuccessDialog {
    pub message: String,
    pub return_url: String,
}

impl SuccessDialog {
    pub fn new(message: impl Into<String>, return_url: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            return_url: return_url.into(),
        }
    }
}
