use std::fmt;

use runny_registry::{CatalogueError, WebhookError};
use runny_remote::ExecError;
use runny_template::ValidationError;
use thiserror::Error;

/// What a failed lookup was searching for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupTarget {
    Webhook,
    Command,
}

impl fmt::Display for LookupTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Webhook => f.write_str("webhook"),
            Self::Command => f.write_str("command"),
        }
    }
}

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{0} not found")]
    NotFound(LookupTarget),

    #[error(transparent)]
    Execution(#[from] ExecError),

    #[error(transparent)]
    Catalogue(#[from] CatalogueError),

    #[error(transparent)]
    Webhook(#[from] WebhookError),
}
