//! Template-facing projection of the details form.

use std::collections::BTreeMap;

use serde::Serialize;
use validator::ValidationErrors;

use crate::domain::reference::{Client, State};
use crate::forms::details::{DetailsFormState, Field, FormMode};

#[derive(Debug, Clone, Serialize)]
pub struct AttachmentView {
    pub key: String,
    pub id: Option<i32>,
    pub filename: String,
    pub size: u64,
    pub previewable: bool,
    pub pending: bool,
}

/// Flat, string-valued view of [`DetailsFormState`] for rendering.
#[derive(Debug, Clone, Serialize)]
pub struct DetailsFormView {
    pub is_edit: bool,
    pub id: Option<i32>,
    pub name: String,
    pub email: String,
    pub client_id: Option<i32>,
    pub state_ids: Vec<i32>,
    pub dob: String,
    pub exp_start: String,
    pub exp_end: String,
    pub is_present: bool,
    pub is_state_changed: bool,
    pub hourly_rate: String,
    pub percentage: String,
    pub hourly_rate_enabled: bool,
    pub percentage_enabled: bool,
    pub exp_end_enabled: bool,
    pub years_of_experience: String,
    pub gender: String,
    pub attachments: Vec<AttachmentView>,
    /// Latest date the date inputs accept.
    pub max_date: String,
    pub file_notice: Option<String>,
    /// Error messages keyed by field.
    pub errors: BTreeMap<String, Vec<String>>,
}

fn date(value: Option<chrono::NaiveDate>) -> String {
    value
        .map(|date| date.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

fn number(value: Option<f64>) -> String {
    value.map(|number| number.to_string()).unwrap_or_default()
}

impl From<&DetailsFormState> for DetailsFormView {
    fn from(state: &DetailsFormState) -> Self {
        Self {
            is_edit: state.mode == FormMode::Edit,
            id: state.edit_id.map(|id| id.get()),
            name: state.name.clone(),
            email: state.email.clone(),
            client_id: state.client.map(|id| id.get()),
            state_ids: state.states.iter().map(|id| id.get()).collect(),
            dob: date(state.dob),
            exp_start: date(state.exp_start),
            exp_end: date(state.exp_end),
            is_present: state.is_present,
            is_state_changed: !state.is_enabled(Field::HourlyRate),
            hourly_rate: number(state.hourly_rate),
            percentage: number(state.percentage),
            hourly_rate_enabled: state.is_enabled(Field::HourlyRate),
            percentage_enabled: state.is_enabled(Field::Percentage),
            exp_end_enabled: state.is_enabled(Field::ExpEnd),
            years_of_experience: state
                .years_of_experience()
                .map(|experience| experience.to_string())
                .unwrap_or_default(),
            gender: state.gender.clone(),
            attachments: state
                .attachments
                .items()
                .iter()
                .map(|item| AttachmentView {
                    key: item.key.to_string(),
                    id: item.id.map(|id| id.get()),
                    filename: item.filename.to_string(),
                    size: item.size,
                    previewable: item.blob.is_some(),
                    pending: state.attachments.is_session_new(item.key),
                })
                .collect(),
            max_date: date(Some(state.reference_date)),
            file_notice: state.file_notice.clone(),
            errors: BTreeMap::new(),
        }
    }
}

impl DetailsFormView {
    pub fn with_errors(mut self, errors: &ValidationErrors) -> Self {
        for (field, list) in errors.field_errors() {
            let messages = list
                .iter()
                .map(|error| {
                    error
                        .message
                        .as_ref()
                        .map(|message| message.to_string())
                        .unwrap_or_else(|| error.code.to_string())
                })
                .collect();
            self.errors.insert(field.to_string(), messages);
        }
        self
    }
}

/// Data required to render the details template.
#[derive(Debug, Serialize)]
pub struct DetailsPageData {
    pub form: DetailsFormView,
    pub clients: Vec<Client>,
    pub states: Vec<State>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forms::details::{DetailsEvent, apply_event};
    use chrono::NaiveDate;

    #[test]
    fn view_reflects_toggles_and_errors() {
        let reference = NaiveDate::from_ymd_opt(2024, 6, 30).expect("valid date");
        let state = apply_event(
            DetailsFormState::create(reference),
            DetailsEvent::PresentToggled(true),
        );
        let state = apply_event(state, DetailsEvent::StateChangedToggled(true));
        let errors = state.validate().expect_err("empty form");

        let view = DetailsFormView::from(&state).with_errors(&errors);

        assert!(!view.is_edit);
        assert_eq!(view.exp_end, "2024-06-30");
        assert_eq!(view.max_date, "2024-06-30");
        assert!(!view.exp_end_enabled);
        assert!(view.is_state_changed);
        assert!(view.percentage_enabled);
        assert_eq!(
            view.errors.get("name").map(Vec::as_slice),
            Some(&["This field is required.".to_string()][..])
        );
        assert!(!view.errors.contains_key("expEnd"));
    }
}
