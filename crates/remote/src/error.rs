use std::{io, time::Duration};

use thiserror::Error;

use crate::runner::OutputStream;

/// Errors produced while running a remote command.
#[derive(Debug, Error)]
pub enum ExecError {
    #[error("ssh is not configured: {0}")]
    NotConfigured(String),

    #[error("ssh transport error: {0}")]
    Transport(String),

    #[error("ssh authentication failed for user '{0}'")]
    AuthenticationFailed(String),

    #[error("failed to read remote {stream}: {source}")]
    Read {
        stream: OutputStream,
        #[source]
        source: io::Error,
    },

    #[error("Process exited with status {code}")]
    ExitStatus { code: u32, output: Vec<u8> },

    #[error("Process exited on signal {signal}")]
    Signal { signal: String, output: Vec<u8> },

    #[error("Process exited without exit status or exit signal")]
    MissingExitStatus { output: Vec<u8> },

    #[error("command timed out after {}s", .0.as_secs())]
    TimedOut(Duration),

    #[error("command cancelled")]
    Cancelled,

    #[error("execution task failed: {0}")]
    Task(String),
}

impl ExecError {
    pub fn transport(message: impl ToString) -> Self {
        Self::Transport(message.to_string())
    }

    /// Output collected before the remote process failed, if any.
    pub fn output(&self) -> Option<&[u8]> {
        match self {
            Self::ExitStatus { output, .. } | Self::Signal { output, .. } | Self::MissingExitStatus { output } => {
                Some(output)
            }
            _ => None,
        }
    }
}

impl From<russh::Error> for ExecError {
    fn from(error: russh::Error) -> Self {
        Self::Transport(error.to_string())
    }
}

impl From<tokio::task::JoinError> for ExecError {
    fn from(error: tokio::task::JoinError) -> Self {
        Self::Task(error.to_string())
    }
}
