//! Subcommand handlers.

pub mod chat;
pub mod send;
pub mod settings;
