use std::{io, path::PathBuf};

use thiserror::Error;

/// Errors raised while loading or mutating the command catalogue.
#[derive(Debug, Error)]
pub enum CatalogueError {
    #[error("failed to read catalogue '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write catalogue '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Unauthorized: Command manipulation is disabled")]
    ManipulationDisabled,

    #[error("Command '{0}' already exists")]
    DuplicateName(String),

    #[error("Command '{0}' does not exist")]
    NotFound(String),

    #[error("{0}")]
    InvalidInput(String),
}

impl CatalogueError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }
}

/// Errors raised by the webhook registry.
#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("failed to read webhooks file '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write webhooks file '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid webhooks file '{path}': {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("webhook for command '{0}' already exists")]
    Duplicate(String),

    #[error("webhook for command '{0}' not found")]
    NotFound(String),

    #[error("invalid webhook url: {0}")]
    Url(String),
}
