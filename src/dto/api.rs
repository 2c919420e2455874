//! Wire shapes exchanged with the client records REST backend.
//!
//! Every payload is deserialized into one of these DTOs first and converted
//! into domain types with `TryFrom`, so malformed backend data is rejected at
//! the boundary instead of leaking into templates.

use serde::{Deserialize, Serialize};

use crate::domain::attachment::StoredFile;
use crate::domain::client_detail::{ClientDetail, ClientDetailsPage};
use crate::domain::reference::{Client, State};
use crate::domain::types::{
    AttachmentId, AttachmentName, ClientDetailId, ClientId, Gender, PayType, PersonName,
    RecordEmail, ReferenceName, StateId, StateSelection, TypeConstraintError, parse_date,
};

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientDto {
    pub id: i32,
    #[serde(alias = "clientName")]
    pub name: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StateDto {
    pub id: i32,
    #[serde(alias = "stateName")]
    pub name: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileDto {
    pub id: i32,
    pub filename: String,
    #[serde(default)]
    pub filedata: Option<String>,
    #[serde(default)]
    pub client_details_id: Option<i32>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientDetailDto {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub client_id: i32,
    #[serde(default, alias = "client_name")]
    pub client_name: Option<String>,
    pub state_id: String,
    pub dob: String,
    pub exp_start: String,
    pub exp_end: String,
    pub pay_value: f64,
    pub pay_type: String,
    pub gender: String,
    #[serde(default)]
    pub files: Vec<FileDto>,
}

/// Response of the paged client-details listing.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientDetailsPageDto {
    pub data: Vec<ClientDetailDto>,
    pub total_count: usize,
}

impl TryFrom<ClientDto> for Client {
    type Error = TypeConstraintError;

    fn try_from(dto: ClientDto) -> Result<Self, Self::Error> {
        Ok(Self {
            id: ClientId::new(dto.id)?,
            name: ReferenceName::new(dto.name)?,
        })
    }
}

impl TryFrom<StateDto> for State {
    type Error = TypeConstraintError;

    fn try_from(dto: StateDto) -> Result<Self, Self::Error> {
        Ok(Self {
            id: StateId::new(dto.id)?,
            name: ReferenceName::new(dto.name)?,
        })
    }
}

impl TryFrom<FileDto> for StoredFile {
    type Error = TypeConstraintError;

    fn try_from(dto: FileDto) -> Result<Self, Self::Error> {
        Ok(Self {
            id: AttachmentId::new(dto.id)?,
            filename: AttachmentName::new(dto.filename)?,
            filedata: dto.filedata,
            client_details_id: dto.client_details_id.map(ClientDetailId::new).transpose()?,
        })
    }
}

impl TryFrom<ClientDetailDto> for ClientDetail {
    type Error = TypeConstraintError;

    fn try_from(dto: ClientDetailDto) -> Result<Self, Self::Error> {
        if !dto.pay_value.is_finite() {
            return Err(TypeConstraintError::InvalidValue(format!(
                "pay value {}",
                dto.pay_value
            )));
        }

        Ok(Self {
            id: ClientDetailId::new(dto.id)?,
            name: PersonName::new(dto.name)?,
            email: RecordEmail::new(dto.email)?,
            client_id: ClientId::new(dto.client_id)?,
            client_name: dto.client_name.filter(|name| !name.trim().is_empty()),
            states: StateSelection::parse(&dto.state_id)?,
            dob: parse_date(&dto.dob)?,
            exp_start: parse_date(&dto.exp_start)?,
            exp_end: parse_date(&dto.exp_end)?,
            pay_type: dto.pay_type.parse::<PayType>()?,
            pay_value: dto.pay_value,
            gender: Gender::new(dto.gender)?,
            files: dto
                .files
                .into_iter()
                .map(StoredFile::try_from)
                .collect::<Result<Vec<_>, _>>()?,
        })
    }
}

/// Rows that fail conversion are logged and left out of the page.
impl From<ClientDetailsPageDto> for ClientDetailsPage {
    fn from(dto: ClientDetailsPageDto) -> Self {
        let records = dto
            .data
            .into_iter()
            .filter_map(|row| {
                let id = row.id;
                ClientDetail::try_from(row)
                    .inspect_err(|err| log::warn!("Skipping client details row {id}: {err}"))
                    .ok()
            })
            .collect();
        Self {
            records,
            total_count: dto.total_count,
        }
    }
}

/// File part of an outgoing multipart request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePart {
    pub filename: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

/// One part of an outgoing multipart request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MultipartPart {
    Text { name: &'static str, value: String },
    File(FilePart),
}

/// Transport-neutral multipart body with parts in wire order.
///
/// `name` of every file part is `files`, matching the backend's binder.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MultipartPayload {
    pub parts: Vec<MultipartPart>,
}

impl MultipartPayload {
    pub const FILES_FIELD: &'static str = "files";

    pub fn text(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.parts.push(MultipartPart::Text {
            name,
            value: value.into(),
        });
        self
    }

    pub fn file(mut self, part: FilePart) -> Self {
        self.parts.push(MultipartPart::File(part));
        self
    }

    /// Text fields in order.
    pub fn fields(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.parts.iter().filter_map(|part| match part {
            MultipartPart::Text { name, value } => Some((*name, value.as_str())),
            MultipartPart::File(_) => None,
        })
    }

    pub fn files(&self) -> impl Iterator<Item = &FilePart> {
        self.parts.iter().filter_map(|part| match part {
            MultipartPart::File(file) => Some(file),
            MultipartPart::Text { .. } => None,
        })
    }

    /// Value of the first text field named `name`.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields()
            .find(|(field, _)| *field == name)
            .map(|(_, value)| value)
    }
}
