use std::{
    fmt,
    future::Future,
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};

use serde::Serialize;
use tokio::{
    io::{AsyncRead, AsyncReadExt},
    task::{AbortHandle, JoinSet},
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{
    buffer::StreamBuffer,
    error::ExecError,
    shell::{ExitOutcome, RemoteProcess, RemoteShell},
};

/// Bytes requested per read on each output stream.
const READ_CHUNK_SIZE: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputStream {
    Stdout,
    Stderr,
}

impl fmt::Display for OutputStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stdout => f.write_str("stdout"),
            Self::Stderr => f.write_str("stderr"),
        }
    }
}

/// Full accumulated text of one stream. Each chunk replaces the previous
/// chunk of the same stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputChunk {
    pub stream: OutputStream,
    pub text: String,
}

/// Receiver of streaming output.
///
/// Called from either reader task; calls for the same stream are sequential.
pub trait OutputSink: Send + Sync {
    fn on_chunk(&self, chunk: OutputChunk);
}

impl<F> OutputSink for F
where
    F: Fn(OutputChunk) + Send + Sync,
{
    fn on_chunk(&self, chunk: OutputChunk) {
        self(chunk)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecOptions {
    /// Upper bound on a whole execution, connection included
    pub timeout: Option<Duration>,
}

impl Default for ExecOptions {
    fn default() -> Self {
        Self {
            timeout: Some(Duration::from_secs(600)),
        }
    }
}

/// Aborts a spawned task when dropped, including on early return.
struct AbortOnDrop(AbortHandle);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Runs filled commands through a [`RemoteShell`].
#[derive(Clone)]
pub struct RemoteRunner {
    shell: Arc<dyn RemoteShell>,
    options: ExecOptions,
}

impl fmt::Debug for RemoteRunner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteRunner").field("options", &self.options).finish_non_exhaustive()
    }
}

impl RemoteRunner {
    pub fn new(shell: Arc<dyn RemoteShell>, options: ExecOptions) -> Self {
        Self { shell, options }
    }

    /// Run `command` to completion and return stdout and stderr interleaved
    /// in arrival order.
    pub async fn run_once(&self, command: &str, cancel: &CancellationToken) -> Result<Vec<u8>, ExecError> {
        self.bounded(cancel, async {
            let RemoteProcess {
                stdout,
                stderr,
                completion,
            } = self.shell.spawn(command).await?;
            let _transport = AbortOnDrop(completion.abort_handle());

            let combined = Arc::new(Mutex::new(Vec::new()));
            let mut readers = JoinSet::new();
            readers.spawn(drain(OutputStream::Stdout, stdout, Arc::clone(&combined)));
            readers.spawn(drain(OutputStream::Stderr, stderr, Arc::clone(&combined)));
            while let Some(joined) = readers.join_next().await {
                joined??;
            }

            let outcome = completion.await??;
            let output = std::mem::take(&mut *combined.lock().unwrap_or_else(PoisonError::into_inner));
            finish(outcome, output)
        })
        .await
    }

    /// Run `command`, delivering each stream's accumulated text to `sink`
    /// after every read. Returns once both streams end and the remote process
    /// has exited.
    pub async fn run_streaming(
        &self,
        command: &str,
        sink: Arc<dyn OutputSink>,
        cancel: &CancellationToken,
    ) -> Result<(), ExecError> {
        self.bounded(cancel, async {
            let RemoteProcess {
                stdout,
                stderr,
                completion,
            } = self.shell.spawn(command).await?;
            let _transport = AbortOnDrop(completion.abort_handle());

            let mut readers = JoinSet::new();
            readers.spawn(stream_output(OutputStream::Stdout, stdout, Arc::clone(&sink)));
            readers.spawn(stream_output(OutputStream::Stderr, stderr, Arc::clone(&sink)));
            while let Some(joined) = readers.join_next().await {
                joined??;
            }

            let outcome = completion.await??;
            finish(outcome, Vec::new()).map(|_| ())
        })
        .await
    }

    /// Race `work` against the configured deadline and `cancel`. Dropping
    /// `work` drops its reader set and transport guard, which aborts them.
    async fn bounded<T>(
        &self,
        cancel: &CancellationToken,
        work: impl Future<Output = Result<T, ExecError>>,
    ) -> Result<T, ExecError> {
        let deadline = async {
            match self.options.timeout {
                Some(timeout) => tokio::time::sleep(timeout).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            result = work => result,
            _ = cancel.cancelled() => {
                info!("remote command cancelled");
                Err(ExecError::Cancelled)
            }
            _ = deadline => {
                let timeout = self.options.timeout.unwrap_or_default();
                warn!(timeout_secs = timeout.as_secs(), "remote command timed out");
                Err(ExecError::TimedOut(timeout))
            }
        }
    }
}

fn finish(outcome: ExitOutcome, output: Vec<u8>) -> Result<Vec<u8>, ExecError> {
    match outcome {
        ExitOutcome::Code(0) => Ok(output),
        ExitOutcome::Code(code) => {
            debug!(exit_code = code, "remote command failed");
            Err(ExecError::ExitStatus { code, output })
        }
        ExitOutcome::Signal(signal) => Err(ExecError::Signal { signal, output }),
        ExitOutcome::Missing => Err(ExecError::MissingExitStatus { output }),
    }
}

async fn drain(
    stream: OutputStream,
    mut reader: Box<dyn AsyncRead + Send + Unpin>,
    combined: Arc<Mutex<Vec<u8>>>,
) -> Result<(), ExecError> {
    let mut chunk = [0u8; READ_CHUNK_SIZE];
    loop {
        let read = reader
            .read(&mut chunk)
            .await
            .map_err(|source| ExecError::Read { stream, source })?;
        if read == 0 {
            return Ok(());
        }
        combined
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(&chunk[..read]);
    }
}

async fn stream_output(
    stream: OutputStream,
    mut reader: Box<dyn AsyncRead + Send + Unpin>,
    sink: Arc<dyn OutputSink>,
) -> Result<(), ExecError> {
    let mut buffer = StreamBuffer::new();
    let mut chunk = [0u8; READ_CHUNK_SIZE];
    loop {
        let read = reader
            .read(&mut chunk)
            .await
            .map_err(|source| ExecError::Read { stream, source })?;
        if read == 0 {
            break;
        }
        buffer.push(&chunk[..read]);
        sink.on_chunk(OutputChunk {
            stream,
            text: buffer.text().to_string(),
        });
    }
    if buffer.finish() {
        sink.on_chunk(OutputChunk {
            stream,
            text: buffer.text().to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunks_serialize_with_lowercase_stream_names() {
        let chunk = OutputChunk {
            stream: OutputStream::Stderr,
            text: "warning".into(),
        };
        let json = serde_json::to_value(&chunk).expect("serialize");
        assert_eq!(json, serde_json::json!({"stream": "stderr", "text": "warning"}));
    }

    #[test]
    fn finish_maps_exit_outcomes() {
        assert_eq!(finish(ExitOutcome::Code(0), b"ok".to_vec()).expect("success"), b"ok");
        assert!(matches!(
            finish(ExitOutcome::Code(127), Vec::new()),
            Err(ExecError::ExitStatus { code: 127, .. })
        ));
        assert!(matches!(
            finish(ExitOutcome::Signal("KILL".into()), Vec::new()),
            Err(ExecError::Signal { .. })
        ));
    }

    #[test]
    fn default_timeout_is_ten_minutes() {
        assert_eq!(ExecOptions::default().timeout, Some(Duration::from_secs(600)));
    }
}
