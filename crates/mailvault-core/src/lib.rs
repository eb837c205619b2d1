//! # Mailvault Core
//!
//! Local contact and key directory for end-to-end encrypted webmail.
//!
//! This crate holds the directory engine and its siblings, independent of any
//! front end. OpenPGP primitives are consumed through [`keys::KeyInspector`].
//!
//! ## Architecture
//!
//! - **normalize**: diacritic stripping and case folding for search
//! - **namespace**: account-scoped storage keys and their inverse
//! - **storage**: contact directory, query engine, settings and session tiers,
//!   and the [`StoreBackend`] trait
//! - **keys**: per-account key vault and encrypted key backups
//! - **passphrase**: durable and session pass-phrase tiers
//! - **accounts**: registry of known accounts
//! - **relay**: generic operation relay for contexts without store access
//! - **report**: the process-wide error funnel

pub mod accounts;
pub mod error;
pub mod fs;
pub mod keys;
pub mod namespace;
pub mod normalize;
pub mod passphrase;
pub mod relay;
pub mod report;
pub mod storage;

pub use error::{Result, VaultError};
pub use keys::{KeyInfo, KeyInspector, KeyVault};
pub use passphrase::{PassphraseStore, StorageTier};
pub use report::{ErrorLog, ErrorReporter, TracingReporter};
pub use storage::{Contact, ContactQuery, ContactUpdate, LocalStore, NewContact, StoreBackend};

/// Core version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
