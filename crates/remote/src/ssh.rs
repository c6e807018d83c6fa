//! SSH transport.
//!
//! Each [`SshShell::spawn`] dials the host, authenticates with a password,
//! opens one session channel, and execs the command. A pump task forwards
//! channel data into two in-process pipes and reports the exit status once
//! the channel closes, then disconnects. Sessions are never reused.

use std::{fmt, sync::Arc};

use async_trait::async_trait;
use russh::{
    ChannelMsg, Disconnect,
    client::{self, Handle, Msg},
    keys::ssh_key::{HashAlg, PublicKey},
};
use tokio::io::{AsyncWriteExt, DuplexStream, duplex};
use tracing::{debug, info, warn};

use crate::{
    error::ExecError,
    shell::{ExitOutcome, RemoteProcess, RemoteShell},
};

/// Per-stream pipe capacity between the pump task and the readers.
const PIPE_CAPACITY: usize = 64 * 1024;
/// SSH extended data type code for stderr.
const EXTENDED_DATA_STDERR: u32 = 1;

/// Connection settings for the remote host.
#[derive(Clone, Default)]
pub struct SshConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    /// Expected `SHA256:` fingerprint of the host key; any key is accepted
    /// when unset
    pub host_key_fingerprint: Option<String>,
}

impl fmt::Debug for SshConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SshConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("host_key_fingerprint", &self.host_key_fingerprint)
            .finish()
    }
}

impl SshConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

struct HostKeyPolicy {
    expected_fingerprint: Option<String>,
}

impl client::Handler for HostKeyPolicy {
    type Error = russh::Error;

    async fn check_server_key(&mut self, server_public_key: &PublicKey) -> Result<bool, Self::Error> {
        let Some(expected) = self.expected_fingerprint.as_deref() else {
            return Ok(true);
        };
        let actual = server_public_key.fingerprint(HashAlg::Sha256).to_string();
        let accepted = normalize_fingerprint(expected) == normalize_fingerprint(&actual);
        if !accepted {
            warn!(expected = %expected, actual = %actual, "rejecting ssh host key");
        }
        Ok(accepted)
    }
}

fn normalize_fingerprint(fingerprint: &str) -> &str {
    let trimmed = fingerprint.trim();
    trimmed.strip_prefix("SHA256:").unwrap_or(trimmed).trim_end_matches('=')
}

/// [`RemoteShell`] backed by a fresh SSH session per command.
#[derive(Debug, Clone)]
pub struct SshShell {
    config: SshConfig,
    client_config: Arc<client::Config>,
}

impl SshShell {
    pub fn new(config: SshConfig) -> Self {
        Self {
            config,
            client_config: Arc::new(client::Config::default()),
        }
    }

    async fn connect(&self) -> Result<Handle<HostKeyPolicy>, ExecError> {
        if self.config.host.trim().is_empty() {
            return Err(ExecError::NotConfigured("SSH_HOST is empty".into()));
        }
        let policy = HostKeyPolicy {
            expected_fingerprint: self.config.host_key_fingerprint.clone(),
        };
        let address = (self.config.host.as_str(), self.config.port);
        let mut session = client::connect(Arc::clone(&self.client_config), address, policy).await?;

        let auth = match session
            .authenticate_password(self.config.username.as_str(), self.config.password.as_str())
            .await
        {
            Ok(auth) => auth,
            Err(error) => {
                release(&session).await;
                return Err(error.into());
            }
        };
        if !auth.success() {
            release(&session).await;
            return Err(ExecError::AuthenticationFailed(self.config.username.clone()));
        }
        debug!(address = %self.config.address(), "ssh session established");
        Ok(session)
    }
}

#[async_trait]
impl RemoteShell for SshShell {
    async fn spawn(&self, command: &str) -> Result<RemoteProcess, ExecError> {
        let session = self.connect().await?;
        let channel = match open_exec(&session, command).await {
            Ok(channel) => channel,
            Err(error) => {
                release(&session).await;
                return Err(error);
            }
        };
        info!(address = %self.config.address(), "started remote command");

        let (stdout_writer, stdout_reader) = duplex(PIPE_CAPACITY);
        let (stderr_writer, stderr_reader) = duplex(PIPE_CAPACITY);
        let completion = tokio::spawn(pump(session, channel, stdout_writer, stderr_writer));

        Ok(RemoteProcess {
            stdout: Box::new(stdout_reader),
            stderr: Box::new(stderr_reader),
            completion,
        })
    }
}

async fn open_exec(session: &Handle<HostKeyPolicy>, command: &str) -> Result<russh::Channel<Msg>, ExecError> {
    let channel = session.channel_open_session().await?;
    channel.exec(true, command).await?;
    Ok(channel)
}

async fn release(session: &Handle<HostKeyPolicy>) {
    if let Err(error) = session.disconnect(Disconnect::ByApplication, "", "English").await {
        debug!(error = %error, "ssh disconnect failed");
    }
}

async fn pump(
    session: Handle<HostKeyPolicy>,
    mut channel: russh::Channel<Msg>,
    stdout: DuplexStream,
    stderr: DuplexStream,
) -> Result<ExitOutcome, ExecError> {
    let mut stdout = Some(stdout);
    let mut stderr = Some(stderr);
    let mut outcome = ExitOutcome::Missing;

    while let Some(message) = channel.wait().await {
        match message {
            ChannelMsg::Data { ref data } => forward(&mut stdout, data).await,
            ChannelMsg::ExtendedData { ref data, ext } if ext == EXTENDED_DATA_STDERR => {
                forward(&mut stderr, data).await
            }
            ChannelMsg::ExitStatus { exit_status } => outcome = ExitOutcome::Code(exit_status),
            ChannelMsg::ExitSignal { signal_name, .. } => outcome = ExitOutcome::Signal(format!("{signal_name:?}")),
            ChannelMsg::Eof => {
                stdout = None;
                stderr = None;
            }
            _ => {}
        }
    }
    drop(stdout);
    drop(stderr);

    release(&session).await;
    debug!(outcome = ?outcome, "remote command finished");
    Ok(outcome)
}

/// Write to a pipe whose reader may already be gone; a closed reader only
/// stops forwarding for that stream.
async fn forward(pipe: &mut Option<DuplexStream>, data: &[u8]) {
    let Some(writer) = pipe.as_mut() else {
        return;
    };
    if let Err(error) = writer.write_all(data).await {
        debug!(error = %error, "remote output reader closed");
        *pipe = None;
    }
}
