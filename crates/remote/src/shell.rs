use async_trait::async_trait;
use tokio::{io::AsyncRead, task::JoinHandle};

use crate::error::ExecError;

/// How a remote process ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExitOutcome {
    Code(u32),
    Signal(String),
    /// The channel closed without reporting a status or signal
    Missing,
}

/// A started remote command.
///
/// `stdout` and `stderr` reach end-of-file once the remote side finishes
/// writing. `completion` resolves after both pipes are closed and the
/// transport session has been released; aborting it tears the session down.
pub struct RemoteProcess {
    pub stdout: Box<dyn AsyncRead + Send + Unpin>,
    pub stderr: Box<dyn AsyncRead + Send + Unpin>,
    pub completion: JoinHandle<Result<ExitOutcome, ExecError>>,
}

impl std::fmt::Debug for RemoteProcess {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteProcess").finish_non_exhaustive()
    }
}

/// Transport able to start a command on the remote host.
#[async_trait]
pub trait RemoteShell: Send + Sync {
    async fn spawn(&self, command: &str) -> Result<RemoteProcess, ExecError>;
}
