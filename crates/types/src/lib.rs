//! Shared type definitions for the Runny workspace.
//!
//! The catalogue, template, execution, and dispatch crates all speak in terms
//! of these types. They serialize to the JSON shapes consumed by the web UI
//! and persisted in the webhook registry file.

pub mod command;
pub mod webhook;

pub use command::{Command, CommandKey, NewCommand, UnknownVariableType, Variable, VariableType};
pub use webhook::WebhookEntry;
