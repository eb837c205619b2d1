use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constants::{APP_NAME, DEFAULT_RELAY_TIMEOUT_MS};

#[derive(Debug, Serialize, Deserialize)]
pub struct MailvaultConfig {
    pub store: StoreSection,
    #[serde(default)]
    pub relay: RelaySection,
    #[serde(default)]
    pub keychain: KeychainSection,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StoreSection {
    pub path: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RelaySection {
    pub mode: RelayMode,
    pub socket: Option<String>,
    pub timeout_ms: u64,
}

impl Default for RelaySection {
    fn default() -> Self {
        Self {
            mode: RelayMode::Direct,
            socket: None,
            timeout_ms: DEFAULT_RELAY_TIMEOUT_MS,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Default)]
pub struct KeychainSection {
    pub enabled: bool,
}

/// How commands reach the store.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RelayMode {
    /// Open the SQLite file in this process
    Direct,
    /// Send every operation to a running `mailvault serve`
    Relay,
}

impl MailvaultConfig {
    pub fn new(store_path: PathBuf, keychain_enabled: bool) -> Self {
        Self {
            store: StoreSection {
                path: store_path.to_string_lossy().to_string(),
            },
            relay: RelaySection::default(),
            keychain: KeychainSection {
                enabled: keychain_enabled,
            },
        }
    }
}

pub fn default_config_path() -> anyhow::Result<PathBuf> {
    Ok(xdg_config_dir()?.join("config.toml"))
}

pub fn default_store_path() -> anyhow::Result<PathBuf> {
    Ok(xdg_data_dir()?.join("mailvault.db"))
}

/// Default relay socket: `$XDG_RUNTIME_DIR/mailvault/relay.sock`, else a
/// per-user directory under `/tmp`.
pub fn default_socket_path() -> PathBuf {
    if let Ok(value) = std::env::var("XDG_RUNTIME_DIR") {
        if !value.trim().is_empty() {
            return PathBuf::from(value).join(APP_NAME).join("relay.sock");
        }
    }
    #[cfg(unix)]
    let uid = unsafe { libc::geteuid() };
    #[cfg(not(unix))]
    let uid = 0;
    PathBuf::from("/tmp")
        .join(format!("{}-{}", APP_NAME, uid))
        .join("relay.sock")
}

pub fn read_config(path: &Path) -> anyhow::Result<MailvaultConfig> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read config {}: {}", path.display(), e))?;
    toml::from_str(&contents)
        .map_err(|e| anyhow::anyhow!("Failed to parse config {}: {}", path.display(), e))
}

pub fn write_config(path: &Path, config: &MailvaultConfig) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            anyhow::anyhow!(
                "Failed to create config directory {}: {}",
                parent.display(),
                e
            )
        })?;
    }
    let contents =
        toml::to_string_pretty(config).map_err(|e| anyhow::anyhow!("TOML error: {}", e))?;
    std::fs::write(path, contents)
        .map_err(|e| anyhow::anyhow!("Failed to write config {}: {}", path.display(), e))?;
    Ok(())
}

pub fn xdg_config_dir() -> anyhow::Result<PathBuf> {
    if let Ok(value) = std::env::var("XDG_CONFIG_HOME") {
        if !value.trim().is_empty() {
            return Ok(PathBuf::from(value).join(APP_NAME));
        }
    }
    Ok(home_dir()?.join(".config").join(APP_NAME))
}

pub fn xdg_data_dir() -> anyhow::Result<PathBuf> {
    if let Ok(value) = std::env::var("XDG_DATA_HOME") {
        if !value.trim().is_empty() {
            return Ok(PathBuf::from(value).join(APP_NAME));
        }
    }
    Ok(home_dir()?.join(".local").join("share").join(APP_NAME))
}

fn home_dir() -> anyhow::Result<PathBuf> {
    let home = std::env::var("HOME")
        .map_err(|_| anyhow::anyhow!("HOME is not set; cannot resolve default paths"))?;
    Ok(PathBuf::from(home))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_fills_defaults() {
        let config: MailvaultConfig =
            toml::from_str("[store]\npath = \"/tmp/mv.db\"\n").expect("config should parse");
        assert_eq!(config.store.path, "/tmp/mv.db");
        assert_eq!(config.relay.mode, RelayMode::Direct);
        assert_eq!(config.relay.timeout_ms, DEFAULT_RELAY_TIMEOUT_MS);
        assert!(!config.keychain.enabled);
    }

    #[test]
    fn test_config_round_trips_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut config = MailvaultConfig::new(dir.path().join("mv.db"), true);
        config.relay.mode = RelayMode::Relay;
        config.relay.socket = Some("/run/mv.sock".to_string());

        write_config(&path, &config).unwrap();
        let loaded = read_config(&path).unwrap();
        assert_eq!(loaded.relay.mode, RelayMode::Relay);
        assert_eq!(loaded.relay.socket.as_deref(), Some("/run/mv.sock"));
        assert!(loaded.keychain.enabled);
    }

    #[test]
    fn test_unknown_relay_mode_is_rejected() {
        let result: Result<MailvaultConfig, _> =
            toml::from_str("[store]\npath = \"x\"\n[relay]\nmode = \"carrier\"\ntimeout_ms = 1\n");
        assert!(result.is_err());
    }
}
