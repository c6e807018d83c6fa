//! Command template engine.
//!
//! Templates are shell command lines with `${...}` placeholders. This crate
//! extracts typed variables from a template, validates caller-supplied
//! arguments against them, and substitutes quoted values back into the
//! command line.

pub mod error;
pub mod fill;
pub mod grammar;
pub mod quote;
pub mod validate;

pub use error::ValidationError;
pub use fill::fill;
pub use grammar::{Placeholder, extract_placeholders, parse_variables};
pub use quote::{QuotingMode, quote};
pub use validate::{matches_type, validate};
