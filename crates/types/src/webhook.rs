use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Durable mapping from an unguessable identifier to a catalogue lookup key.
///
/// The serialized field names match the registry file written by earlier
/// releases, so existing `webhooks.json` files keep loading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookEntry {
    #[serde(rename = "CommandName")]
    pub command_name: String,
    pub command: String,
    pub uuid: String,
}

impl WebhookEntry {
    /// Create an entry with a freshly generated random UUID.
    pub fn new(command_name: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            command_name: command_name.into(),
            command: command.into(),
            uuid: Uuid::new_v4().to_string(),
        }
    }

    /// Whether this entry points at the command identified by `(name, command)`.
    pub fn targets(&self, command_name: &str, command: &str) -> bool {
        self.command_name == command_name && self.command == command
    }
}
