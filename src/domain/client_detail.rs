use chrono::NaiveDate;
use serde::Serialize;

use crate::domain::attachment::StoredFile;
use crate::domain::experience::Experience;
use crate::domain::types::{
    ClientDetailId, ClientId, Gender, PayType, PersonName, RecordEmail, StateSelection,
};

/// A client-details record as kept by the backend.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ClientDetail {
    pub id: ClientDetailId,
    pub name: PersonName,
    pub email: RecordEmail,
    pub client_id: ClientId,
    /// Client display name, when the backend joins it in.
    pub client_name: Option<String>,
    pub states: StateSelection,
    pub dob: NaiveDate,
    pub exp_start: NaiveDate,
    pub exp_end: NaiveDate,
    pub pay_type: PayType,
    /// Hourly rate or percentage depending on `pay_type`.
    pub pay_value: f64,
    pub gender: Gender,
    pub files: Vec<StoredFile>,
}

impl ClientDetail {
    /// Display-only duration between `exp_start` and `exp_end`.
    pub fn years_of_experience(&self) -> Experience {
        Experience::between(self.exp_start, self.exp_end)
    }
}

/// One page of records plus the total number of matches.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ClientDetailsPage {
    pub records: Vec<ClientDetail>,
    pub total_count: usize,
}
