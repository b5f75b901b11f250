//! Configuration module for the voice payment assistant.
//!
//! Provides CLI argument parsing and configuration management.

#[allow(clippy::module_inception)]
mod config;

pub use config::{AppConfig, Command, ContactsCommand};
