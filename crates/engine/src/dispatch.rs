use std::{collections::HashMap, sync::Arc};

use runny_registry::{CatalogueError, CatalogueStore, WebhookRegistry};
use runny_remote::{OutputSink, RemoteRunner};
use runny_template::{QuotingMode, fill};
use runny_types::Command;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{
    error::{DispatchError, LookupTarget},
    trigger::{Trigger, query_arguments},
};

/// A resolved command and its filled command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedCommand {
    pub command: Command,
    pub filled: String,
}

/// Resolves triggers against the catalogue and runs them remotely.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    catalogue: Arc<CatalogueStore>,
    webhooks: Arc<WebhookRegistry>,
    runner: RemoteRunner,
    quoting: QuotingMode,
}

impl Dispatcher {
    pub fn new(
        catalogue: Arc<CatalogueStore>,
        webhooks: Arc<WebhookRegistry>,
        runner: RemoteRunner,
        quoting: QuotingMode,
    ) -> Self {
        Self {
            catalogue,
            webhooks,
            runner,
            quoting,
        }
    }

    pub fn catalogue(&self) -> &Arc<CatalogueStore> {
        &self.catalogue
    }

    pub fn webhooks(&self) -> &Arc<WebhookRegistry> {
        &self.webhooks
    }

    /// Find the catalogue command a trigger refers to and its arguments.
    pub fn resolve(&self, trigger: &Trigger) -> Result<(Command, HashMap<String, String>), DispatchError> {
        match trigger {
            Trigger::Api { name, command, args } => {
                let command = self
                    .catalogue
                    .find(name, command)
                    .ok_or(DispatchError::NotFound(LookupTarget::Command))?;
                Ok((command, args.clone()))
            }
            Trigger::Webhook { uuid, query } => {
                let entry = self
                    .webhooks
                    .find_by_uuid(uuid)
                    .ok_or(DispatchError::NotFound(LookupTarget::Webhook))?;
                let Some(command) = self.catalogue.find(&entry.command_name, &entry.command) else {
                    warn!(uuid = %uuid, command = %entry.command_name, "webhook points at a command that no longer exists");
                    return Err(DispatchError::NotFound(LookupTarget::Command));
                };
                Ok((command, query_arguments(query)))
            }
        }
    }

    /// Resolve and fill without executing.
    pub fn prepare(&self, trigger: &Trigger) -> Result<PreparedCommand, DispatchError> {
        let (command, args) = self.resolve(trigger)?;
        let filled = fill(&command.command, &command.variables, &args, self.quoting)?;
        info!(command = %command.name, "prepared command");
        debug!(filled = %filled, "filled command line");
        Ok(PreparedCommand { command, filled })
    }

    /// Run the triggered command to completion and return its combined output.
    pub async fn execute(&self, trigger: &Trigger, cancel: &CancellationToken) -> Result<Vec<u8>, DispatchError> {
        let prepared = self.prepare(trigger)?;
        let output = self.runner.run_once(&prepared.filled, cancel).await?;
        info!(command = %prepared.command.name, bytes = output.len(), "command finished");
        Ok(output)
    }

    /// Run the triggered command, streaming accumulated output to `sink`.
    pub async fn execute_streaming(
        &self,
        trigger: &Trigger,
        sink: Arc<dyn OutputSink>,
        cancel: &CancellationToken,
    ) -> Result<(), DispatchError> {
        let prepared = self.prepare(trigger)?;
        self.runner.run_streaming(&prepared.filled, sink, cancel).await?;
        info!(command = %prepared.command.name, "streamed command finished");
        Ok(())
    }

    /// Remove a command from the catalogue and, unless `keep_webhook`, its
    /// webhook. A missing webhook is not an error.
    /// The webhook is deleted before the catalogue is rewritten; a failed
    /// webhook delete leaves the catalogue untouched.
    pub fn remove_command(&self, name: &str, command: &str, keep_webhook: bool) -> Result<(), DispatchError> {
        if !self.catalogue.manipulation_allowed() {
            return Err(CatalogueError::ManipulationDisabled.into());
        }
        if self.catalogue.find(name, command).is_none() {
            return Err(CatalogueError::NotFound(name.to_string()).into());
        }
        if !keep_webhook && self.webhooks.delete(name, command)? {
            debug!(command = %name, "removed webhook ahead of its command");
        }
        self.catalogue.remove(name, command)?;
        Ok(())
    }
}
