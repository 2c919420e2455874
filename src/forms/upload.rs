//! Multipart body posted by the details page.

use std::path::PathBuf;

use actix_multipart::form::{MultipartForm, tempfile::TempFile, text::Text};

use crate::domain::types::{ClientDetailId, ClientId, StateId, parse_date};
use crate::forms::FormError;
use crate::forms::details::DetailsEvent;

#[derive(MultipartForm)]
pub struct DetailsMultipartForm {
    pub id: Option<Text<String>>,
    pub name: Option<Text<String>>,
    pub email: Option<Text<String>>,
    #[multipart(rename = "clientId")]
    pub client_id: Option<Text<String>>,
    #[multipart(rename = "stateId")]
    pub state_id: Vec<Text<String>>,
    pub dob: Option<Text<String>>,
    #[multipart(rename = "expStart")]
    pub exp_start: Option<Text<String>>,
    #[multipart(rename = "expEnd")]
    pub exp_end: Option<Text<String>>,
    #[multipart(rename = "isPresent")]
    pub is_present: Option<Text<String>>,
    #[multipart(rename = "isStateChanged")]
    pub is_state_changed: Option<Text<String>>,
    #[multipart(rename = "hourlyRate")]
    pub hourly_rate: Option<Text<String>>,
    pub percentage: Option<Text<String>>,
    pub gender: Option<Text<String>>,
    #[multipart(limit = "50MB")]
    pub file: Vec<TempFile>,
}

/// Text fields of the details form as posted.
#[derive(Debug, Default, Clone)]
pub struct DetailsFields {
    pub id: Option<String>,
    pub name: String,
    pub email: String,
    pub client_id: Option<String>,
    pub state_ids: Vec<String>,
    pub dob: Option<String>,
    pub exp_start: Option<String>,
    pub exp_end: Option<String>,
    pub is_present: bool,
    pub is_state_changed: bool,
    pub hourly_rate: Option<String>,
    pub percentage: Option<String>,
    pub gender: String,
}

/// A file received with the form, stored in a temporary file.
#[derive(Debug, Clone)]
pub struct PendingFile {
    pub filename: String,
    pub size: u64,
    pub path: PathBuf,
}

/// Parsed form ready for the details controller.
pub struct DetailsSubmission {
    pub id: Option<ClientDetailId>,
    pub events: Vec<DetailsEvent>,
    pub files: Vec<PendingFile>,
    // Keeps the temporary files on disk until the submission is dropped.
    _uploads: Vec<TempFile>,
}

fn blank_to_none(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

fn optional_date(value: Option<&str>) -> Result<Option<chrono::NaiveDate>, FormError> {
    blank_to_none(value)
        .map(|raw| parse_date(raw).map_err(|_| FormError::InvalidDate(raw.to_string())))
        .transpose()
}

fn optional_number(value: Option<&str>) -> Result<Option<f64>, FormError> {
    blank_to_none(value)
        .map(|raw| {
            raw.parse::<f64>()
                .ok()
                .filter(|number| number.is_finite())
                .ok_or_else(|| FormError::InvalidNumber(raw.to_string()))
        })
        .transpose()
}

impl DetailsFields {
    pub fn record_id(&self) -> Result<Option<ClientDetailId>, FormError> {
        blank_to_none(self.id.as_deref())
            .map(|raw| raw.parse::<ClientDetailId>().map_err(|_| FormError::InvalidId))
            .transpose()
    }

    /// Replays the posted values as form events.
    ///
    /// Toggles come before the values they gate so a disabled field keeps
    /// its derived value.
    pub fn events(&self) -> Result<Vec<DetailsEvent>, FormError> {
        let client = blank_to_none(self.client_id.as_deref())
            .map(|raw| raw.parse::<ClientId>().map_err(|_| FormError::InvalidId))
            .transpose()?;
        let states = self
            .state_ids
            .iter()
            .filter_map(|raw| blank_to_none(Some(raw)))
            .map(|raw| raw.parse::<StateId>().map_err(|_| FormError::InvalidId))
            .collect::<Result<Vec<_>, _>>()?;

        let mut events = vec![
            DetailsEvent::NameChanged(self.name.clone()),
            DetailsEvent::EmailChanged(self.email.clone()),
            DetailsEvent::ClientSelected(client),
            DetailsEvent::StatesSelected(states),
            DetailsEvent::DobChanged(optional_date(self.dob.as_deref())?),
            DetailsEvent::ExpStartChanged(optional_date(self.exp_start.as_deref())?),
        ];
        if self.is_present {
            events.push(DetailsEvent::PresentToggled(true));
        } else {
            events.push(DetailsEvent::ExpEndChanged(optional_date(
                self.exp_end.as_deref(),
            )?));
        }
        events.push(DetailsEvent::StateChangedToggled(self.is_state_changed));
        if self.is_state_changed {
            events.push(DetailsEvent::PercentageChanged(optional_number(
                self.percentage.as_deref(),
            )?));
        } else {
            events.push(DetailsEvent::HourlyRateChanged(optional_number(
                self.hourly_rate.as_deref(),
            )?));
        }
        events.push(DetailsEvent::GenderChanged(self.gender.clone()));

        Ok(events)
    }
}

impl DetailsMultipartForm {
    pub fn fields(&self) -> DetailsFields {
        let value = |field: &Option<Text<String>>| field.as_ref().map(|text| text.to_string());
        DetailsFields {
            id: value(&self.id),
            name: value(&self.name).unwrap_or_default(),
            email: value(&self.email).unwrap_or_default(),
            client_id: value(&self.client_id),
            state_ids: self.state_id.iter().map(|text| text.to_string()).collect(),
            dob: value(&self.dob),
            exp_start: value(&self.exp_start),
            exp_end: value(&self.exp_end),
            is_present: self.is_present.is_some(),
            is_state_changed: self.is_state_changed.is_some(),
            hourly_rate: value(&self.hourly_rate),
            percentage: value(&self.percentage),
            gender: value(&self.gender).unwrap_or_default(),
        }
    }

    pub fn into_submission(self) -> Result<DetailsSubmission, FormError> {
        let fields = self.fields();
        let id = fields.record_id()?;
        let events = fields.events()?;

        // An empty file input still posts one nameless, empty part.
        let uploads: Vec<TempFile> = self
            .file
            .into_iter()
            .filter(|upload| {
                upload
                    .file_name
                    .as_deref()
                    .is_some_and(|name| !name.trim().is_empty())
            })
            .collect();
        let files = uploads
            .iter()
            .map(|upload| PendingFile {
                filename: upload.file_name.clone().unwrap_or_default(),
                size: upload.size as u64,
                path: upload.file.path().to_path_buf(),
            })
            .collect();

        Ok(DetailsSubmission {
            id,
            events,
            files,
            _uploads: uploads,
        })
    }
}
