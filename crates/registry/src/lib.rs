//! Command catalogue and webhook registry.
//!
//! The catalogue is a line-oriented text file of `@directive` blocks followed
//! by command templates. [`CatalogueStore`] owns the parsed snapshot and
//! serializes every file mutation with a rebuild of that snapshot.
//! [`WebhookRegistry`] maps opaque UUIDs to catalogue lookup keys and keeps
//! its JSON file as the source of truth.

pub mod editor;
pub mod error;
pub mod parser;
pub mod store;
pub mod webhooks;

pub use editor::{DEFAULT_CATALOGUE, append_command, remove_command};
pub use error::{CatalogueError, WebhookError};
pub use parser::{ScannedCommand, parse_catalogue, scan_catalogue};
pub use store::CatalogueStore;
pub use webhooks::{WebhookRegistry, webhook_url};
