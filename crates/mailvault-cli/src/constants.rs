//! Constants used throughout the CLI.

/// Exit codes for the CLI.
///
/// These follow common Unix conventions:
/// - 0: Success
/// - 1: General error (used by anyhow for unhandled errors)
/// - 2: Misuse of shell command (reserved by shells)
/// - 3+: Application-specific errors
pub mod exit_codes {
    /// Resource not found (config, store, contact, key, pass-phrase).
    pub const NOT_FOUND: i32 = 3;

    /// Invalid user input, query or key material.
    pub const INVALID_INPUT: i32 = 4;

    /// Authentication failed (wrong backup passphrase).
    pub const AUTH_FAILED: i32 = 5;

    /// The store or the relay could not be reached; retrying may succeed.
    pub const UNAVAILABLE: i32 = 6;
}

/// Name used for config/data directories and the keychain service.
pub const APP_NAME: &str = "mailvault";

/// Default relay timeout when the config does not set one.
pub const DEFAULT_RELAY_TIMEOUT_MS: u64 = 5000;

/// Environment variable holding a pass-phrase for non-interactive use.
pub const PASSPHRASE_ENV: &str = "MAILVAULT_PASSPHRASE";

/// Environment variable holding a backup passphrase for non-interactive use.
pub const BACKUP_PASSPHRASE_ENV: &str = "MAILVAULT_BACKUP_PASSPHRASE";

/// Environment variable read for the log filter.
pub const LOG_ENV: &str = "MAILVAULT_LOG";
