//! Process configuration.
//!
//! Every setting can come from a flag or the matching environment variable.
//! Unset optional values resolve to the documented defaults through the
//! accessor methods rather than at parse time, so derived values such as the
//! public domain follow the ports that were actually chosen.

use std::{net::IpAddr, path::PathBuf, time::Duration};

use clap::{ArgAction, Parser};
use runny_remote::{ExecOptions, SshConfig};
use runny_template::QuotingMode;
use runny_util::expand_tilde;

#[derive(Clone, Parser)]
#[command(name = "runny", version, about = "Run catalogued shell commands on a remote host over SSH")]
pub struct Config {
    /// Address both listeners bind to
    #[arg(long, env = "RUNNY_BIND", default_value = "127.0.0.1")]
    pub bind: IpAddr,

    /// Port of the management API
    #[arg(long, env = "PORT", default_value_t = 8080)]
    pub port: u16,

    /// Port of the webhook listener; shares the API listener when equal to `--port`
    #[arg(long, env = "WEBHOOK_PORT")]
    pub webhook_port: Option<u16>,

    /// Public base URL used when building webhook URLs
    #[arg(long, env = "DOMAIN")]
    pub domain: Option<String>,

    /// Path prefix of webhook trigger URLs
    #[arg(long, env = "WEBHOOK_ROUTE", default_value = "/webhook")]
    pub webhook_route: String,

    #[arg(long, env = "COMMANDS_FILE", default_value = "config/commands.txt")]
    pub commands_file: String,

    #[arg(long, env = "WEBHOOKS_FILE", default_value = "config/webhooks.json")]
    pub webhooks_file: String,

    /// Whether the API may add and remove catalogue commands
    #[arg(long, env = "ALLOW_COMMAND_MANIPULATION", default_value_t = true, action = ArgAction::Set)]
    pub allow_command_manipulation: bool,

    #[arg(long, env = "SSH_HOST", default_value = "")]
    pub ssh_host: String,

    #[arg(long, env = "SSH_PORT", default_value_t = 22)]
    pub ssh_port: u16,

    #[arg(long, env = "SSH_USERNAME", default_value = "")]
    pub ssh_username: String,

    #[arg(long, env = "SSH_PASSWORD", default_value = "", hide_env_values = true, hide_default_value = true)]
    pub ssh_password: String,

    /// Expected `SHA256:` host key fingerprint
    #[arg(long, env = "SSH_HOST_KEY_FINGERPRINT")]
    pub ssh_host_key_fingerprint: Option<String>,

    /// Whole-execution timeout in seconds; 0 disables it
    #[arg(long, env = "EXEC_TIMEOUT_SECS", default_value_t = 600)]
    pub exec_timeout_secs: u64,

    /// `heuristic` or `strict`
    #[arg(long, env = "QUOTING_MODE", default_value = "heuristic")]
    pub quoting_mode: QuotingMode,
}

impl Config {
    pub fn webhook_port(&self) -> u16 {
        self.webhook_port.unwrap_or(self.port)
    }

    /// True when webhooks are served by their own listener.
    pub fn separate_webhook_listener(&self) -> bool {
        self.webhook_port() != self.port
    }

    pub fn domain(&self) -> String {
        match self.domain.as_deref().map(str::trim) {
            Some(domain) if !domain.is_empty() => domain.trim_end_matches('/').to_string(),
            _ => format!("http://127.0.0.1:{}", self.webhook_port()),
        }
    }

    /// Webhook route with exactly one leading slash and no trailing slash.
    pub fn webhook_route(&self) -> String {
        let trimmed = self.webhook_route.trim().trim_matches('/');
        if trimmed.is_empty() {
            "/webhook".to_string()
        } else {
            format!("/{trimmed}")
        }
    }

    pub fn commands_path(&self) -> PathBuf {
        expand_tilde(&self.commands_file)
    }

    pub fn webhooks_path(&self) -> PathBuf {
        expand_tilde(&self.webhooks_file)
    }

    pub fn exec_options(&self) -> ExecOptions {
        ExecOptions {
            timeout: (self.exec_timeout_secs > 0).then(|| Duration::from_secs(self.exec_timeout_secs)),
        }
    }

    pub fn ssh_config(&self) -> SshConfig {
        SshConfig {
            host: self.ssh_host.trim().to_string(),
            port: self.ssh_port,
            username: self.ssh_username.clone(),
            password: self.ssh_password.clone(),
            host_key_fingerprint: self
                .ssh_host_key_fingerprint
                .as_deref()
                .map(str::trim)
                .filter(|fingerprint| !fingerprint.is_empty())
                .map(str::to_string),
        }
    }
}
