//! # Runny Engine
//!
//! Turns an external trigger into a remote execution.
//!
//! ## Flow
//!
//! 1. **Resolve**: an API trigger names its command directly; a webhook
//!    trigger is looked up by UUID in the [`WebhookRegistry`] and then matched
//!    against the catalogue on both name and template.
//! 2. **Fill**: arguments are validated and quoted into the template.
//! 3. **Execute**: the filled line runs once or streams through the
//!    [`RemoteRunner`].
//!
//! [`WebhookRegistry`]: runny_registry::WebhookRegistry
//! [`RemoteRunner`]: runny_remote::RemoteRunner

pub mod dispatch;
pub mod error;
pub mod trigger;

pub use dispatch::{Dispatcher, PreparedCommand};
pub use error::{DispatchError, LookupTarget};
pub use trigger::Trigger;
