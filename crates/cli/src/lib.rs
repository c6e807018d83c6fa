//! # Runny
//!
//! HTTP front end for the command catalogue. Serves the management API
//! (catalogue listing, execution, command and webhook administration) and the
//! webhook trigger route, executing filled commands on the configured SSH
//! host.

pub mod config;
pub mod routes;
pub mod server;
pub mod state;

pub use config::Config;
pub use routes::{ApiError, api_router, webhook_router};
pub use server::{RunningServer, RunnyServer};
pub use state::AppState;
