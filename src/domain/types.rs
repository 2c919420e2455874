//! Strongly-typed value objects used by domain entities.
//!
//! These wrappers enforce basic invariants (e.g., positive identifiers,
//! trimmed non-empty names, known pay types) so that once a value reaches the
//! domain layer it can be treated as trusted.
use std::fmt::{Display, Formatter};
use std::ops::Deref;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use validator::ValidateEmail;

/// Errors produced when attempting to construct a constrained value object.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeConstraintError {
    /// Provided identifier is zero or negative.
    #[error("id must be greater than zero")]
    NonPositiveId,
    /// Provided email failed format validation.
    #[error("invalid email address")]
    InvalidEmail,
    /// Provided string contained no non-whitespace characters.
    #[error("value cannot be empty")]
    EmptyString,
    /// Provided date could not be parsed.
    #[error("invalid date: {0}")]
    InvalidDate(String),
    /// Provided attachment payload was not valid base64.
    #[error("invalid attachment payload for {0}")]
    InvalidPayload(String),
    /// Provided value failed custom validation.
    #[error("invalid value: {0}")]
    InvalidValue(String),
}

/// Macro to generate lightweight newtypes for positive identifiers.
macro_rules! id_newtype {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(i32);

        impl $name {
            /// Creates a new identifier ensuring it is greater than zero.
            pub fn new(value: i32) -> Result<Self, TypeConstraintError> {
                if value > 0 {
                    Ok(Self(value))
                } else {
                    Err(TypeConstraintError::NonPositiveId)
                }
            }

            /// Returns the raw `i32` backing this identifier.
            pub const fn get(self) -> i32 {
                self.0
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = TypeConstraintError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let value = s
                    .trim()
                    .parse::<i32>()
                    .map_err(|_| TypeConstraintError::InvalidValue(s.to_string()))?;
                Self::new(value)
            }
        }

        impl TryFrom<i32> for $name {
            type Error = TypeConstraintError;

            fn try_from(value: i32) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for i32 {
            fn from(value: $name) -> Self {
                value.0
            }
        }
    };
}

id_newtype!(ClientDetailId, "Unique identifier for a client-details record.");
id_newtype!(ClientId, "Unique identifier for a client.");
id_newtype!(StateId, "Unique identifier for a state.");
id_newtype!(AttachmentId, "Unique identifier for a persisted attachment.");

macro_rules! non_empty_string_newtype {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(String);

        impl $name {
            /// Constructs a trimmed, non-empty value.
            pub fn new<S: Into<String>>(value: S) -> Result<Self, TypeConstraintError> {
                let trimmed = value.into().trim().to_string();
                if trimmed.is_empty() {
                    return Err(TypeConstraintError::EmptyString);
                }
                Ok(Self(trimmed))
            }

            /// Borrow the value as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the wrapper and return the owned string.
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl Deref for $name {
            type Target = str;

            fn deref(&self) -> &Self::Target {
                &self.0
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl TryFrom<String> for $name {
            type Error = TypeConstraintError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl TryFrom<&str> for $name {
            type Error = TypeConstraintError;

            fn try_from(value: &str) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }
    };
}

non_empty_string_newtype!(PersonName, "Record holder name enforcing non-empty values.");
non_empty_string_newtype!(Gender, "Gender label enforcing non-empty values.");
non_empty_string_newtype!(ReferenceName, "Display name of a client or a state.");
non_empty_string_newtype!(
    AttachmentName,
    "Attachment file name enforcing trimmed, non-empty values."
);

/// Trimmed email address that passed format validation.
///
/// The backend stores addresses verbatim, so no case normalisation happens.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct RecordEmail(String);

impl RecordEmail {
    /// Validates an email string.
    pub fn new<S: Into<String>>(email: S) -> Result<Self, TypeConstraintError> {
        let trimmed = email.into().trim().to_string();
        if trimmed.validate_email() {
            Ok(Self(trimmed))
        } else {
            Err(TypeConstraintError::InvalidEmail)
        }
    }

    /// Borrow the email as a `&str`.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for RecordEmail {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Compensation scheme of a record.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum PayType {
    #[default]
    Hourly,
    Percentage,
}

impl PayType {
    /// Wire representation used by the backend.
    pub const fn as_str(self) -> &'static str {
        match self {
            PayType::Hourly => "hourly",
            PayType::Percentage => "percentage",
        }
    }
}

impl Display for PayType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PayType {
    type Err = TypeConstraintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hourly" => Ok(PayType::Hourly),
            "percentage" => Ok(PayType::Percentage),
            other => Err(TypeConstraintError::InvalidValue(format!(
                "unknown pay type `{other}`"
            ))),
        }
    }
}

/// Ordered, duplicate-free selection of states.
///
/// The backend keeps the selection denormalised as `"1,2,3"`.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct StateSelection(Vec<StateId>);

impl StateSelection {
    /// Builds a selection keeping the first occurrence of every id.
    pub fn new(ids: impl IntoIterator<Item = StateId>) -> Self {
        let mut selected: Vec<StateId> = Vec::new();
        for id in ids {
            if !selected.contains(&id) {
                selected.push(id);
            }
        }
        Self(selected)
    }

    /// Parses the comma-joined wire representation, ignoring blank segments.
    pub fn parse(raw: &str) -> Result<Self, TypeConstraintError> {
        let ids = raw
            .split(',')
            .map(str::trim)
            .filter(|segment| !segment.is_empty())
            .map(StateId::from_str)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(ids))
    }

    /// Flattens the selection into the comma-joined wire representation.
    pub fn joined(&self) -> String {
        self.0
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(",")
    }

    pub fn ids(&self) -> &[StateId] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Column the listing can be ordered by.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum SortColumn {
    #[default]
    #[serde(rename = "name")]
    Name,
    #[serde(rename = "email")]
    Email,
    #[serde(rename = "client")]
    Client,
    #[serde(rename = "yearsOfExperience")]
    YearsOfExperience,
    #[serde(rename = "gender")]
    Gender,
    #[serde(rename = "rate")]
    Rate,
}

impl SortColumn {
    pub const fn as_str(self) -> &'static str {
        match self {
            SortColumn::Name => "name",
            SortColumn::Email => "email",
            SortColumn::Client => "client",
            SortColumn::YearsOfExperience => "yearsOfExperience",
            SortColumn::Gender => "gender",
            SortColumn::Rate => "rate",
        }
    }
}

impl FromStr for SortColumn {
    type Err = TypeConstraintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "name" => Ok(SortColumn::Name),
            "email" => Ok(SortColumn::Email),
            "client" => Ok(SortColumn::Client),
            "yearsOfExperience" => Ok(SortColumn::YearsOfExperience),
            "gender" => Ok(SortColumn::Gender),
            "rate" => Ok(SortColumn::Rate),
            other => Err(TypeConstraintError::InvalidValue(format!(
                "unknown sort column `{other}`"
            ))),
        }
    }
}

/// Direction of the listing order.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub const fn as_str(self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }

    /// Direction a header click switches to.
    pub const fn toggled(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }

    /// Anything other than `asc`/`desc` (including a cleared sort) means ascending.
    pub fn from_optional(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("desc") => SortDirection::Desc,
            _ => SortDirection::Asc,
        }
    }
}

/// Parses the date part of a backend or form date value.
///
/// Accepts RFC 3339 timestamps, naive timestamps and plain `YYYY-MM-DD` dates.
pub fn parse_date(value: &str) -> Result<NaiveDate, TypeConstraintError> {
    let trimmed = value.trim();
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(timestamp.date_naive());
    }
    if let Ok(timestamp) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(timestamp.date());
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .map_err(|_| TypeConstraintError::InvalidDate(trimmed.to_string()))
}

/// Canonical timestamp string sent to the backend for a date field.
pub fn to_wire_timestamp(date: NaiveDate) -> String {
    date.and_time(chrono::NaiveTime::MIN)
        .and_utc()
        .format("%Y-%m-%dT%H:%M:%S%.3fZ")
        .to_string()
}
