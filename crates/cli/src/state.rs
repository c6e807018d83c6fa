use std::sync::Arc;

use anyhow::{Context, Result};
use runny_engine::Dispatcher;
use runny_registry::{CatalogueStore, WebhookRegistry};
use runny_remote::{RemoteRunner, RemoteShell, SshShell};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::Config;

/// Shared state behind every route.
#[derive(Debug)]
pub struct AppState {
    pub dispatcher: Dispatcher,
    /// Public base URL of webhook trigger URLs
    pub domain: String,
    /// Normalized webhook route, e.g. `/webhook`
    pub webhook_route: String,
    /// Cancelled on shutdown; in-flight executions derive child tokens
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(
        dispatcher: Dispatcher,
        domain: impl Into<String>,
        webhook_route: impl Into<String>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            dispatcher,
            domain: domain.into(),
            webhook_route: webhook_route.into(),
            shutdown,
        }
    }

    /// Open the catalogue and webhook registry and wire the SSH runner.
    pub fn from_config(config: &Config, shutdown: CancellationToken) -> Result<Arc<Self>> {
        let commands_path = config.commands_path();
        let catalogue = CatalogueStore::open(&commands_path, config.allow_command_manipulation)
            .with_context(|| format!("opening catalogue {}", commands_path.display()))?;
        info!(
            path = %commands_path.display(),
            commands = catalogue.snapshot().len(),
            manipulation_allowed = config.allow_command_manipulation,
            "catalogue loaded"
        );

        let webhooks_path = config.webhooks_path();
        let webhooks = WebhookRegistry::open(&webhooks_path)
            .with_context(|| format!("opening webhook registry {}", webhooks_path.display()))?;
        info!(path = %webhooks_path.display(), webhooks = webhooks.entries().len(), "webhook registry loaded");

        let ssh = config.ssh_config();
        if ssh.host.is_empty() {
            warn!("SSH_HOST is not set; every execution will fail until it is configured");
        }
        let shell: Arc<dyn RemoteShell> = Arc::new(SshShell::new(ssh));
        let runner = RemoteRunner::new(shell, config.exec_options());
        let dispatcher = Dispatcher::new(Arc::new(catalogue), Arc::new(webhooks), runner, config.quoting_mode);

        Ok(Arc::new(Self::new(dispatcher, config.domain(), config.webhook_route(), shutdown)))
    }
}
