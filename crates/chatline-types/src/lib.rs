//! Shared data model and wire format for the chatline relay.

pub mod models;
pub mod username;
pub mod wire;
