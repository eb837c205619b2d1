//! Application-level utilities for the Mailvault CLI.
//!
//! This module provides:
//! - Path resolution for config, store and relay socket
//! - The per-process choice between a direct and a relayed store

mod context;
mod resolver;

// Re-export public API
pub use context::{open_local_store, AppContext};
pub use resolver::{missing_store_message, resolve_config_path};
