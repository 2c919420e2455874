//! Domain aggregates exposed by the client records service layer.

pub mod attachment;
pub mod client_detail;
pub mod experience;
pub mod reference;
pub mod types;
