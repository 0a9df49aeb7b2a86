//! Shared foundations for the Folio document-chat client.
//!
//! Holds the application configuration and the top-level error type that
//! subsystem errors convert into.

pub mod config;
pub mod error;

pub use config::{BackendConfig, ChatSettings, FolioConfig, GeneralConfig};
pub use error::{FolioError, Result};
