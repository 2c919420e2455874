//! Runtime models shared by the server.

pub mod config;
