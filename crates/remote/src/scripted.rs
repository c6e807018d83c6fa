//! In-memory [`RemoteShell`] that replays a fixed script.
//!
//! Used by tests and local dry runs. Every spawned command is recorded so
//! callers can assert on the exact filled command line.

use std::{
    sync::{Mutex, PoisonError},
    time::Duration,
};

use async_trait::async_trait;
use tokio::io::{AsyncWriteExt, duplex};

use crate::{
    error::ExecError,
    shell::{ExitOutcome, RemoteProcess, RemoteShell},
};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Step {
    Stdout(Vec<u8>),
    Stderr(Vec<u8>),
    Pause(Duration),
}

/// Output steps and final outcome replayed for every spawned command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Script {
    steps: Vec<Step>,
    exit: ExitOutcome,
    spawn_error: Option<String>,
}

impl Default for Script {
    fn default() -> Self {
        Self {
            steps: Vec::new(),
            exit: ExitOutcome::Code(0),
            spawn_error: None,
        }
    }
}

impl Script {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stdout(mut self, bytes: impl AsRef<[u8]>) -> Self {
        self.steps.push(Step::Stdout(bytes.as_ref().to_vec()));
        self
    }

    pub fn stderr(mut self, bytes: impl AsRef<[u8]>) -> Self {
        self.steps.push(Step::Stderr(bytes.as_ref().to_vec()));
        self
    }

    pub fn pause(mut self, duration: Duration) -> Self {
        self.steps.push(Step::Pause(duration));
        self
    }

    pub fn exit(mut self, outcome: ExitOutcome) -> Self {
        self.exit = outcome;
        self
    }

    pub fn exit_code(self, code: u32) -> Self {
        self.exit(ExitOutcome::Code(code))
    }

    /// Fail at spawn time with a transport error.
    pub fn unreachable(mut self, message: impl Into<String>) -> Self {
        self.spawn_error = Some(message.into());
        self
    }
}

#[derive(Debug, Default)]
pub struct ScriptedShell {
    script: Script,
    executed: Mutex<Vec<String>>,
}

impl ScriptedShell {
    pub fn new(script: Script) -> Self {
        Self {
            script,
            executed: Mutex::new(Vec::new()),
        }
    }

    /// Commands spawned so far, in order.
    pub fn executed(&self) -> Vec<String> {
        self.executed.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

#[async_trait]
impl RemoteShell for ScriptedShell {
    async fn spawn(&self, command: &str) -> Result<RemoteProcess, ExecError> {
        self.executed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(command.to_string());
        if let Some(message) = &self.script.spawn_error {
            return Err(ExecError::transport(message));
        }

        let (mut stdout_writer, stdout_reader) = duplex(4096);
        let (mut stderr_writer, stderr_reader) = duplex(4096);
        let steps = self.script.steps.clone();
        let exit = self.script.exit.clone();

        let completion = tokio::spawn(async move {
            for step in steps {
                match step {
                    Step::Stdout(bytes) => {
                        let _ = stdout_writer.write_all(&bytes).await;
                    }
                    Step::Stderr(bytes) => {
                        let _ = stderr_writer.write_all(&bytes).await;
                    }
                    Step::Pause(duration) => tokio::time::sleep(duration).await,
                }
            }
            drop(stdout_writer);
            drop(stderr_writer);
            Ok(exit)
        });

        Ok(RemoteProcess {
            stdout: Box::new(stdout_reader),
            stderr: Box::new(stderr_reader),
            completion,
        })
    }
}
