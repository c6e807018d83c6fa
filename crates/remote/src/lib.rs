//! Remote execution of filled command lines.
//!
//! [`RemoteShell`] is the transport seam: it starts a command and hands back
//! its stdout/stderr as async readers plus a completion handle.
//! [`SshShell`] implements it with one fresh `russh` session per call.
//! [`RemoteRunner`] drives a shell either to completion ([`RemoteRunner::run_once`])
//! or as a live stream of accumulated output ([`RemoteRunner::run_streaming`]),
//! bounded by a timeout and a cancellation token.

pub mod buffer;
pub mod error;
pub mod runner;
pub mod scripted;
pub mod shell;
pub mod ssh;

pub use buffer::StreamBuffer;
pub use error::ExecError;
pub use runner::{ExecOptions, OutputChunk, OutputSink, OutputStream, RemoteRunner};
pub use scripted::{Script, ScriptedShell};
pub use shell::{ExitOutcome, RemoteProcess, RemoteShell};
pub use ssh::{SshConfig, SshShell};
