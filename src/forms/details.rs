//! State of the client-details form and the reducer driving it.
//!
//! The form never mutates itself from callbacks: every user action becomes a
//! [`DetailsEvent`] folded in by [`apply_event`]. Which of `hourlyRate` /
//! `percentage` / `expEnd` is enabled is derived from `pay_type` and
//! `is_present` instead of being toggled imperatively.

use chrono::NaiveDate;
use validator::ValidationErrors;

use crate::domain::attachment::{AttachmentBlob, AttachmentKey, StoredFile};
use crate::domain::client_detail::ClientDetail;
use crate::domain::experience::Experience;
use crate::domain::types::{
    ClientDetailId, ClientId, PayType, RecordEmail, StateId, StateSelection,
    TypeConstraintError, to_wire_timestamp,
};
use crate::dto::api::{FilePart, MultipartPayload};
use crate::forms::FormError;
use crate::forms::attachments::{AttachmentSet, SelectedFile, SelectionOutcome};
use crate::forms::validators;

/// "Today minus one day": the latest date any date field may hold.
pub fn reference_date(today: NaiveDate) -> NaiveDate {
    today.pred_opt().unwrap_or(today)
}

/// Controls of the details form. `as_str` is the key used for errors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Field {
    Name,
    Email,
    Client,
    State,
    Dob,
    ExpStart,
    ExpEnd,
    HourlyRate,
    Percentage,
    YearsOfExperience,
    Gender,
    File,
}

impl Field {
    pub const fn as_str(self) -> &'static str {
        match self {
            Field::Name => "name",
            Field::Email => "email",
            Field::Client => "client",
            Field::State => "state",
            Field::Dob => "dob",
            Field::ExpStart => "expStart",
            Field::ExpEnd => "expEnd",
            Field::HourlyRate => "hourlyRate",
            Field::Percentage => "percentage",
            Field::YearsOfExperience => "yearsOfExperience",
            Field::Gender => "gender",
            Field::File => "file",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit,
}

#[derive(Clone, Debug, PartialEq)]
pub enum DetailsEvent {
    NameChanged(String),
    EmailChanged(String),
    ClientSelected(Option<ClientId>),
    StatesSelected(Vec<StateId>),
    DobChanged(Option<NaiveDate>),
    ExpStartChanged(Option<NaiveDate>),
    ExpEndChanged(Option<NaiveDate>),
    /// The "present" switch: experience is ongoing.
    PresentToggled(bool),
    /// The pay switch: `true` selects percentage pay.
    StateChangedToggled(bool),
    HourlyRateChanged(Option<f64>),
    PercentageChanged(Option<f64>),
    GenderChanged(String),
    /// Client choices arrived from the backend.
    ClientsLoaded(Vec<ClientId>),
    FilesSelected(Vec<SelectedFile>),
    AttachmentContentLoaded {
        key: AttachmentKey,
        blob: AttachmentBlob,
    },
    AttachmentRemoved(AttachmentKey),
    /// Uploads that never reached the backend are dropped.
    PendingUploadsDiscarded,
    NoticeDismissed,
    /// The backend accepted the submission.
    Submitted,
}

#[derive(Clone, Debug, PartialEq)]
pub struct DetailsFormState {
    pub mode: FormMode,
    /// Record being edited; cleared once the update went through.
    pub edit_id: Option<ClientDetailId>,
    pub reference_date: NaiveDate,
    pub name: String,
    pub email: String,
    pub client: Option<ClientId>,
    pub states: Vec<StateId>,
    pub dob: Option<NaiveDate>,
    pub exp_start: Option<NaiveDate>,
    pub exp_end: Option<NaiveDate>,
    pub is_present: bool,
    pub pay_type: PayType,
    pub hourly_rate: Option<f64>,
    pub percentage: Option<f64>,
    pub gender: String,
    pub attachments: AttachmentSet,
    /// Outcome of the most recent file selection.
    pub last_selection: SelectionOutcome,
    /// Combined rejection message shown until dismissed.
    pub file_notice: Option<String>,
}

impl DetailsFormState {
    /// Empty form for a new record.
    pub fn create(reference_date: NaiveDate) -> Self {
        Self {
            mode: FormMode::Create,
            edit_id: None,
            reference_date,
            name: String::new(),
            email: String::new(),
            client: None,
            states: Vec::new(),
            dob: None,
            exp_start: None,
            exp_end: None,
            is_present: false,
            pay_type: PayType::Hourly,
            hourly_rate: None,
            percentage: None,
            gender: String::new(),
            attachments: AttachmentSet::default(),
            last_selection: SelectionOutcome::default(),
            file_notice: None,
        }
    }

    /// Form pre-filled from an existing record with hydrated attachments.
    pub fn edit(record: &ClientDetail, reference_date: NaiveDate) -> Result<Self, TypeConstraintError> {
        let mut state = Self::resume_edit(record.id, record.files.clone(), reference_date)?;
        state.name = record.name.to_string();
        state.email = record.email.to_string();
        state.client = Some(record.client_id);
        state.states = record.states.ids().to_vec();
        state.dob = Some(record.dob);
        state.exp_start = Some(record.exp_start);
        state.exp_end = Some(record.exp_end);
        state.pay_type = record.pay_type;
        match record.pay_type {
            PayType::Hourly => state.hourly_rate = Some(record.pay_value),
            PayType::Percentage => state.percentage = Some(record.pay_value),
        }
        state.gender = record.gender.to_string();
        Ok(state)
    }

    /// Edit form for `id` with blank fields, to be filled by events.
    pub fn resume_edit(
        id: ClientDetailId,
        files: Vec<StoredFile>,
        reference_date: NaiveDate,
    ) -> Result<Self, TypeConstraintError> {
        Ok(Self {
            mode: FormMode::Edit,
            edit_id: Some(id),
            attachments: AttachmentSet::hydrate(files)?,
            ..Self::create(reference_date)
        })
    }

    pub fn is_edit(&self) -> bool {
        self.mode == FormMode::Edit
    }

    pub fn is_enabled(&self, field: Field) -> bool {
        match field {
            Field::HourlyRate => self.pay_type == PayType::Hourly,
            Field::Percentage => self.pay_type == PayType::Percentage,
            Field::ExpEnd => !self.is_present,
            Field::YearsOfExperience => false,
            _ => true,
        }
    }

    pub fn is_required(&self, field: Field) -> bool {
        match field {
            Field::File | Field::YearsOfExperience => false,
            Field::HourlyRate | Field::Percentage => self.is_enabled(field),
            _ => true,
        }
    }

    /// Value submitted as `payValue`: whichever pay field is active.
    pub fn pay_value(&self) -> Option<f64> {
        match self.pay_type {
            PayType::Hourly => self.hourly_rate,
            PayType::Percentage => self.percentage,
        }
    }

    /// Derived read-only experience; `None` until both ends are set.
    pub fn years_of_experience(&self) -> Option<Experience> {
        match (self.exp_start, self.exp_end) {
            (Some(start), Some(end)) => Some(Experience::between(start, end)),
            _ => None,
        }
    }

    /// Runs every field and cross-field check against the current state.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if self.name.trim().is_empty() {
            errors.add(Field::Name.as_str(), validators::required());
        }

        let email = self.email.trim();
        if email.is_empty() {
            errors.add(Field::Email.as_str(), validators::required());
        } else {
            if RecordEmail::new(email).is_err() {
                errors.add(Field::Email.as_str(), validators::invalid_email());
            }
            if let Err(error) = validators::email_dot(email) {
                errors.add(Field::Email.as_str(), error);
            }
        }

        if self.client.is_none() {
            errors.add(Field::Client.as_str(), validators::required());
        }
        if self.states.is_empty() {
            errors.add(Field::State.as_str(), validators::required());
        }

        for (field, value) in [
            (Field::Dob, self.dob),
            (Field::ExpStart, self.exp_start),
            (Field::ExpEnd, self.exp_end),
        ] {
            if !self.is_enabled(field) {
                continue;
            }
            match value {
                None => errors.add(field.as_str(), validators::required()),
                Some(date) => {
                    if let Err(error) = validators::not_after(date, self.reference_date) {
                        errors.add(field.as_str(), error);
                    }
                }
            }
        }

        if self.is_enabled(Field::ExpEnd) {
            collect(
                &mut errors,
                validators::experience_order(Field::ExpEnd.as_str(), self.exp_start, self.exp_end),
            );
        }
        collect(
            &mut errors,
            validators::date_range(Field::Dob.as_str(), self.dob, self.exp_start),
        );

        if self.is_enabled(Field::HourlyRate) {
            match self.hourly_rate {
                None => errors.add(Field::HourlyRate.as_str(), validators::required()),
                Some(rate) if !rate.is_finite() || rate < 0.0 => errors.add(
                    Field::HourlyRate.as_str(),
                    validators::out_of_range("Hourly rate cannot be negative."),
                ),
                Some(_) => {}
            }
        }
        if self.is_enabled(Field::Percentage) {
            match self.percentage {
                None => errors.add(Field::Percentage.as_str(), validators::required()),
                Some(value) if !value.is_finite() || !(0.0..=100.0).contains(&value) => errors
                    .add(
                        Field::Percentage.as_str(),
                        validators::out_of_range("Percentage must be between 0 and 100."),
                    ),
                Some(_) => {}
            }
        }

        if self.gender.trim().is_empty() {
            errors.add(Field::Gender.as_str(), validators::required());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Builds the multipart body for create/update.
    ///
    /// Every pending upload must have its content loaded.
    pub fn multipart(&self) -> Result<MultipartPayload, FormError> {
        self.validate()?;

        // `validate` guarantees the values below are present.
        let (Some(client), Some(dob), Some(exp_start), Some(exp_end), Some(pay_value)) = (
            self.client,
            self.dob,
            self.exp_start,
            self.exp_end,
            self.pay_value(),
        ) else {
            return Err(FormError::Incomplete);
        };

        let mut payload = MultipartPayload::default()
            .text("name", self.name.trim())
            .text("email", self.email.trim())
            .text("clientId", client.to_string())
            .text("stateId", StateSelection::new(self.states.iter().copied()).joined())
            .text("dob", to_wire_timestamp(dob))
            .text("expStart", to_wire_timestamp(exp_start))
            .text("expEnd", to_wire_timestamp(exp_end))
            .text("payValue", pay_value.to_string())
            .text("payType", self.pay_type.as_str())
            .text("gender", self.gender.trim());

        for attachment in self.attachments.pending_uploads() {
            let Some(blob) = &attachment.blob else {
                return Err(FormError::MissingContent(attachment.filename.to_string()));
            };
            payload = payload.file(FilePart {
                filename: attachment.filename.to_string(),
                content_type: blob.content_type,
                bytes: blob.bytes.clone(),
            });
        }

        if let Some(id) = self.edit_id.filter(|_| self.is_edit()) {
            payload = payload.text("id", id.to_string());
        }

        Ok(payload)
    }
}

fn collect(errors: &mut ValidationErrors, result: Result<(), ValidationErrors>) {
    if let Err(found) = result {
        for (field, list) in found.field_errors() {
            for error in list.iter() {
                errors.add(field_key(&field), error.clone());
            }
        }
    }
}

/// Maps an error key back onto the static field name.
fn field_key(key: &str) -> &'static str {
    [
        Field::Name,
        Field::Email,
        Field::Client,
        Field::State,
        Field::Dob,
        Field::ExpStart,
        Field::ExpEnd,
        Field::HourlyRate,
        Field::Percentage,
        Field::Gender,
    ]
    .into_iter()
    .map(Field::as_str)
    .find(|name| *name == key)
    .unwrap_or("__all__")
}

/// Folds one event into the form state.
pub fn apply_event(mut state: DetailsFormState, event: DetailsEvent) -> DetailsFormState {
    match event {
        DetailsEvent::NameChanged(name) => state.name = name,
        DetailsEvent::EmailChanged(email) => state.email = email,
        DetailsEvent::ClientSelected(client) => state.client = client,
        DetailsEvent::StatesSelected(ids) => {
            state.states = StateSelection::new(ids).ids().to_vec();
        }
        DetailsEvent::DobChanged(date) => state.dob = date,
        DetailsEvent::ExpStartChanged(date) => state.exp_start = date,
        DetailsEvent::ExpEndChanged(date) => {
            if state.is_enabled(Field::ExpEnd) {
                state.exp_end = date;
            }
        }
        DetailsEvent::PresentToggled(on) => {
            state.is_present = on;
            state.exp_end = on.then_some(state.reference_date);
        }
        DetailsEvent::StateChangedToggled(on) => {
            state.pay_type = if on {
                PayType::Percentage
            } else {
                PayType::Hourly
            };
        }
        DetailsEvent::HourlyRateChanged(rate) => {
            if state.is_enabled(Field::HourlyRate) {
                state.hourly_rate = rate;
            }
        }
        DetailsEvent::PercentageChanged(value) => {
            if state.is_enabled(Field::Percentage) {
                state.percentage = value;
            }
        }
        DetailsEvent::GenderChanged(gender) => state.gender = gender,
        DetailsEvent::ClientsLoaded(ids) => {
            if state.mode == FormMode::Create && state.client.is_none() {
                state.client = ids.first().copied();
            }
        }
        DetailsEvent::FilesSelected(files) => {
            let outcome = state.attachments.select(files);
            state.file_notice = outcome.combined_message();
            state.last_selection = outcome;
        }
        DetailsEvent::AttachmentContentLoaded { key, blob } => {
            if !state.attachments.attach_content(key, blob) {
                log::debug!("Content arrived for removed attachment {key}");
            }
        }
        DetailsEvent::AttachmentRemoved(key) => {
            state.attachments.remove(key);
            state.file_notice = None;
        }
        DetailsEvent::PendingUploadsDiscarded => state.attachments.discard_pending(),
        DetailsEvent::NoticeDismissed => state.file_notice = None,
        DetailsEvent::Submitted => {
            state.attachments.end_session();
            state.edit_id = None;
        }
    }
    state
}
