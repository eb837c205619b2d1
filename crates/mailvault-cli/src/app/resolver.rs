//! Path resolution for config, store and relay socket files.

use std::path::{Path, PathBuf};

use crate::cli::Cli;
use crate::config::{default_config_path, default_socket_path, MailvaultConfig};

/// Resolve the config file path. `--config` also picks up MAILVAULT_CONFIG.
pub fn resolve_config_path(cli: &Cli) -> anyhow::Result<PathBuf> {
    if let Some(value) = cli.config.as_deref() {
        if !value.trim().is_empty() {
            return Ok(PathBuf::from(value));
        }
    }
    default_config_path()
}

/// Resolve the store path from CLI args, then config.
pub fn resolve_store_path(cli: &Cli, config: Option<&MailvaultConfig>) -> Option<PathBuf> {
    if let Some(path) = cli.store.as_deref() {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }
    config.map(|c| PathBuf::from(&c.store.path))
}

/// Resolve the relay socket from config, falling back to the runtime dir.
pub fn resolve_socket_path(config: Option<&MailvaultConfig>) -> PathBuf {
    config
        .and_then(|c| c.relay.socket.as_deref())
        .filter(|s| !s.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(default_socket_path)
}

/// Error message when the store file is missing.
pub fn missing_store_message(path: &Path) -> String {
    format!(
        "No store found at {}\n\nRun:\n  mailvault init\n\nOr specify a store path:\n  MAILVAULT_STORE=/path/to/mailvault.db mailvault init",
        path.display()
    )
}

/// Error message when config file is missing.
pub fn missing_config_message(config_path: &Path) -> String {
    format!(
        "No config found at {}\n\nRun:\n  mailvault init\n\nOr specify a store path:\n  MAILVAULT_STORE=/path/to/mailvault.db mailvault init",
        config_path.display()
    )
}
