//! Lookup lists the details form offers as choices.

use serde::Serialize;

use crate::domain::types::{ClientId, ReferenceName, StateId};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Client {
    pub id: ClientId,
    pub name: ReferenceName,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct State {
    pub id: StateId,
    pub name: ReferenceName,
}
