//! Application context for the Mailvault CLI.
//!
//! Bundles CLI arguments with the lazily loaded config and the store
//! backend. The backend is chosen once per process: a [`LocalStore`] opened
//! in place, or a [`RelayedStore`] talking to `mailvault serve`.

use std::path::{Path, PathBuf};
use std::sync::Arc;
#[cfg(unix)]
use std::time::Duration;

use once_cell::unsync::OnceCell;

use mailvault_core::passphrase::PassphraseStore;
#[cfg(unix)]
use mailvault_core::relay::{RelayedStore, SocketChannel};
use mailvault_core::storage::SettingsStore;
use mailvault_core::{ErrorLog, ErrorReporter, LocalStore, StoreBackend, TracingReporter};

use super::resolver::{
    missing_config_message, missing_store_message, resolve_config_path, resolve_socket_path,
    resolve_store_path,
};
use crate::cli::Cli;
use crate::config::{read_config, MailvaultConfig, RelayMode};
use crate::errors::CliError;
use crate::inspector::ArmorDigestInspector;
use crate::security::KeychainSecrets;

/// Store backend picked for this process.
enum Backend {
    Direct {
        store: LocalStore,
        reporter: Arc<dyn ErrorReporter>,
    },
    #[cfg(unix)]
    Relayed(RelayedStore<SocketChannel>),
}

/// Application context that bundles CLI args with config and storage.
pub struct AppContext<'a> {
    cli: &'a Cli,
    config: OnceCell<Option<MailvaultConfig>>,
    backend: OnceCell<Backend>,
}

impl<'a> AppContext<'a> {
    /// Create a new application context from CLI arguments.
    pub fn new(cli: &'a Cli) -> Self {
        Self {
            cli,
            config: OnceCell::new(),
            backend: OnceCell::new(),
        }
    }

    /// Check if quiet mode is enabled.
    pub fn quiet(&self) -> bool {
        self.cli.quiet
    }

    /// The config file contents, or `None` when no config file exists.
    pub fn config(&self) -> anyhow::Result<Option<&MailvaultConfig>> {
        let config = self.config.get_or_try_init(|| {
            let path = resolve_config_path(self.cli)?;
            if !path.exists() {
                return Ok::<_, anyhow::Error>(None);
            }
            read_config(&path).map(Some)
        })?;
        Ok(config.as_ref())
    }

    /// Resolved store path.
    pub fn store_path(&self) -> anyhow::Result<PathBuf> {
        match resolve_store_path(self.cli, self.config()?) {
            Some(path) => Ok(path),
            None => {
                let config_path = resolve_config_path(self.cli)?;
                Err(CliError::not_found(
                    missing_config_message(&config_path),
                    "Hint: Run `mailvault init` to create a config.",
                )
                .into())
            }
        }
    }

    /// Resolved relay socket path.
    pub fn socket_path(&self) -> anyhow::Result<PathBuf> {
        Ok(resolve_socket_path(self.config()?))
    }

    /// Whether operations go through the relay.
    pub fn relayed(&self) -> anyhow::Result<bool> {
        Ok(self.cli.relay
            || self
                .config()?
                .map(|c| c.relay.mode == RelayMode::Relay)
                .unwrap_or(false))
    }

    /// The store backend, opened on first use.
    pub fn store(&self) -> anyhow::Result<&dyn StoreBackend> {
        let backend = self.backend.get_or_try_init(|| self.open_backend())?;
        let store: &dyn StoreBackend = match backend {
            Backend::Direct { store, .. } => store,
            #[cfg(unix)]
            Backend::Relayed(store) => store,
        };
        Ok(store)
    }

    /// Error sink for failures raised on this side of the relay.
    pub fn reporter(&self) -> anyhow::Result<&dyn ErrorReporter> {
        let backend = self.backend.get_or_try_init(|| self.open_backend())?;
        let reporter: &dyn ErrorReporter = match backend {
            Backend::Direct { reporter, .. } => reporter.as_ref(),
            #[cfg(unix)]
            Backend::Relayed(_) => &TracingReporter,
        };
        Ok(reporter)
    }

    /// Pass-phrase store over the backend, using the keychain as the durable
    /// tier when the config enables it.
    pub fn passphrases(&self) -> anyhow::Result<PassphraseStore<'_>> {
        let store = PassphraseStore::new(self.store()?);
        let keychain = self.config()?.map(|c| c.keychain.enabled).unwrap_or(false);
        Ok(if keychain {
            store.with_durable(&KeychainSecrets)
        } else {
            store
        })
    }

    fn open_backend(&self) -> anyhow::Result<Backend> {
        if self.relayed()? {
            return self.open_relayed();
        }

        let path = self.store_path()?;
        if !path.exists() {
            return Err(CliError::not_found(
                missing_store_message(&path),
                "Hint: Run `mailvault init` to create the store.",
            )
            .into());
        }
        let (store, reporter) = open_local_store(&path)?;
        Ok(Backend::Direct { store, reporter })
    }

    #[cfg(unix)]
    fn open_relayed(&self) -> anyhow::Result<Backend> {
        let timeout_ms = self
            .config()?
            .map(|c| c.relay.timeout_ms)
            .unwrap_or(crate::constants::DEFAULT_RELAY_TIMEOUT_MS);
        let channel = SocketChannel::new(self.socket_path()?, Duration::from_millis(timeout_ms));
        tracing::debug!(socket = %channel.path().display(), "using relayed store");
        Ok(Backend::Relayed(RelayedStore::new(channel)))
    }

    #[cfg(not(unix))]
    fn open_relayed(&self) -> anyhow::Result<Backend> {
        Err(CliError::invalid_input("Relay mode needs Unix domain sockets").into())
    }
}

/// Open the store in this process, with the persistent error log as the
/// error sink.
pub fn open_local_store(path: &Path) -> anyhow::Result<(LocalStore, Arc<dyn ErrorReporter>)> {
    let reporter: Arc<dyn ErrorReporter> = Arc::new(ErrorLog::new(SettingsStore::open(path)?));
    let store = LocalStore::open(path, Arc::new(ArmorDigestInspector), reporter.clone())?;
    tracing::debug!(store = %path.display(), "opened local store");
    Ok((store, reporter))
}
