use std::{
    fs, io,
    path::{Path, PathBuf},
    sync::{Arc, Mutex, PoisonError, RwLock},
};

use runny_types::WebhookEntry;
use runny_util::write_atomically;
use tracing::{debug, info};
use url::Url;

use crate::error::WebhookError;

/// JSON-file-backed mapping from webhook UUIDs to catalogue keys.
///
/// Every mutation is written to disk before the in-memory list is replaced,
/// so the file stays the source of truth.
#[derive(Debug)]
pub struct WebhookRegistry {
    path: PathBuf,
    entries: RwLock<Arc<Vec<WebhookEntry>>>,
    writer: Mutex<()>,
}

impl WebhookRegistry {
    /// Load the registry, creating an empty `[]` file if none exists.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, WebhookError> {
        let path = path.into();
        ensure_registry_file(&path)?;
        let entries = load(&path)?;
        info!(path = %path.display(), webhooks = entries.len(), "loaded webhook registry");
        Ok(Self {
            path,
            entries: RwLock::new(Arc::new(entries)),
            writer: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn entries(&self) -> Arc<Vec<WebhookEntry>> {
        Arc::clone(&self.entries.read().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn find_by_uuid(&self, uuid: &str) -> Option<WebhookEntry> {
        self.entries().iter().find(|entry| entry.uuid == uuid).cloned()
    }

    /// Webhook attached to the command `(command_name, command)`, if any.
    pub fn get(&self, command_name: &str, command: &str) -> Option<WebhookEntry> {
        self.entries().iter().find(|entry| entry.targets(command_name, command)).cloned()
    }

    /// Create a webhook for a command. One webhook per command.
    pub fn create(&self, command_name: &str, command: &str) -> Result<WebhookEntry, WebhookError> {
        let _guard = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let current = self.entries();
        if current.iter().any(|entry| entry.targets(command_name, command)) {
            return Err(WebhookError::Duplicate(command_name.to_string()));
        }

        let entry = WebhookEntry::new(command_name, command);
        let mut updated = current.as_ref().clone();
        updated.push(entry.clone());
        self.commit(updated)?;
        info!(command = %command_name, uuid = %entry.uuid, "created webhook");
        Ok(entry)
    }

    /// Retarget an existing webhook, keeping its UUID.
    pub fn update(
        &self,
        old_command_name: &str,
        old_command: &str,
        new_command_name: &str,
        new_command: &str,
    ) -> Result<WebhookEntry, WebhookError> {
        let _guard = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let mut updated = self.entries().as_ref().clone();
        let Some(entry) = updated.iter_mut().find(|entry| entry.targets(old_command_name, old_command)) else {
            return Err(WebhookError::NotFound(old_command_name.to_string()));
        };
        entry.command_name = new_command_name.to_string();
        entry.command = new_command.to_string();
        let entry = entry.clone();

        self.commit(updated)?;
        info!(command = %new_command_name, uuid = %entry.uuid, "updated webhook");
        Ok(entry)
    }

    /// Delete the webhook of a command. Returns false when there was none.
    pub fn delete(&self, command_name: &str, command: &str) -> Result<bool, WebhookError> {
        let _guard = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let mut updated = self.entries().as_ref().clone();
        let Some(index) = updated.iter().position(|entry| entry.targets(command_name, command)) else {
            return Ok(false);
        };
        let removed = updated.remove(index);

        self.commit(updated)?;
        info!(command = %command_name, uuid = %removed.uuid, "deleted webhook");
        Ok(true)
    }

    fn commit(&self, entries: Vec<WebhookEntry>) -> Result<(), WebhookError> {
        let json = serde_json::to_vec(&entries).map_err(|source| WebhookError::Json {
            path: self.path.clone(),
            source,
        })?;
        write_atomically(&self.path, &json).map_err(|source| WebhookError::Write {
            path: self.path.clone(),
            source,
        })?;
        debug!(webhooks = entries.len(), "persisted webhook registry");
        *self.entries.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(entries);
        Ok(())
    }
}

/// Public trigger URL: `domain` joined with the route segments and `uuid`.
///
/// ```rust
/// use runny_registry::webhook_url;
///
/// let url = webhook_url("https://runny.example.com", "/webhook", "1234").unwrap();
/// assert_eq!(url, "https://runny.example.com/webhook/1234");
/// ```
pub fn webhook_url(domain: &str, route: &str, uuid: &str) -> Result<String, WebhookError> {
    let mut url = Url::parse(domain).map_err(|error| WebhookError::Url(format!("{domain}: {error}")))?;
    {
        let mut segments = url
            .path_segments_mut()
            .map_err(|_| WebhookError::Url(format!("{domain}: cannot be a base")))?;
        segments.pop_if_empty();
        segments.extend(route.split('/').filter(|segment| !segment.is_empty()));
        segments.push(uuid);
    }
    Ok(url.to_string())
}

fn ensure_registry_file(path: &Path) -> Result<(), WebhookError> {
    match fs::metadata(path) {
        Ok(_) => Ok(()),
        Err(error) if error.kind() == io::ErrorKind::NotFound => {
            write_atomically(path, b"[]").map_err(|source| WebhookError::Write {
                path: path.to_path_buf(),
                source,
            })
        }
        Err(source) => Err(WebhookError::Read {
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn load(path: &Path) -> Result<Vec<WebhookEntry>, WebhookError> {
    let content = fs::read_to_string(path).map_err(|source| WebhookError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    if content.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(&content).map_err(|source| WebhookError::Json {
        path: path.to_path_buf(),
        source,
    })
}
