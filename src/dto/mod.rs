//! DTO modules that bridge services with templates and the backend.

pub mod api;
#[cfg(feature = "server")]
pub mod details;
#[cfg(feature = "server")]
pub mod main;
