//! CLI error types for structured error handling.
//!
//! Typed errors map to specific exit codes. Core errors are classified
//! through [`CliError::from_vault`] so every command exits the same way for
//! the same failure.

use std::fmt;

use mailvault_core::VaultError;

/// CLI-specific errors with associated exit codes.
#[derive(Debug)]
pub enum CliError {
    /// Resource not found (config, store, contact, key)
    NotFound { message: String, hint: String },

    /// Authentication failed (wrong backup passphrase)
    AuthFailed {
        message: String,
        hint: Option<String>,
    },

    /// Invalid user input
    InvalidInput(String),

    /// Store or relay unavailable
    Unavailable { message: String, hint: String },
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::NotFound { message, hint } | CliError::Unavailable { message, hint } => {
                write!(f, "{}\n{}", message, hint)
            }
            CliError::AuthFailed { message, hint } => {
                if let Some(h) = hint {
                    write!(f, "{}\n{}", message, h)
                } else {
                    write!(f, "{}", message)
                }
            }
            CliError::InvalidInput(message) => write!(f, "{}", message),
        }
    }
}

impl std::error::Error for CliError {}

impl CliError {
    /// Create a NotFound error with message and hint.
    pub fn not_found(message: impl Into<String>, hint: impl Into<String>) -> Self {
        CliError::NotFound {
            message: message.into(),
            hint: hint.into(),
        }
    }

    /// Create an AuthFailed error with message and hint.
    pub fn auth_failed_with_hint(message: impl Into<String>, hint: impl Into<String>) -> Self {
        CliError::AuthFailed {
            message: message.into(),
            hint: Some(hint.into()),
        }
    }

    /// Create an InvalidInput error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        CliError::InvalidInput(message.into())
    }

    /// Create an Unavailable error with message and hint.
    pub fn unavailable(message: impl Into<String>, hint: impl Into<String>) -> Self {
        CliError::Unavailable {
            message: message.into(),
            hint: hint.into(),
        }
    }

    /// Classify a core error, or `None` when it is a plain failure.
    pub fn from_vault(err: &VaultError) -> Option<Self> {
        match err {
            VaultError::NotFound(message) => Some(CliError::not_found(
                message.clone(),
                "Hint: Run `mailvault keys list --account <EMAIL>` to see stored keys.",
            )),
            VaultError::InvalidInput(_)
            | VaultError::InvalidQuery(_)
            | VaultError::InvalidKey(_) => Some(CliError::invalid_input(err.to_string())),
            VaultError::Crypto(message) => Some(CliError::auth_failed_with_hint(
                message.clone(),
                "Hint: Check the backup passphrase or set MAILVAULT_BACKUP_PASSPHRASE.",
            )),
            VaultError::Blocked | VaultError::Unavailable(_) => Some(CliError::unavailable(
                err.to_string(),
                "Hint: Another process may hold the store. Try again shortly.",
            )),
            VaultError::RelayUnavailable(_) => Some(CliError::unavailable(
                err.to_string(),
                "Hint: Start the relay with `mailvault serve`, or drop --relay.",
            )),
            _ => None,
        }
    }

    /// Get the exit code for this error.
    pub fn exit_code(&self) -> i32 {
        use super::constants::exit_codes;
        match self {
            CliError::NotFound { .. } => exit_codes::NOT_FOUND,
            CliError::AuthFailed { .. } => exit_codes::AUTH_FAILED,
            CliError::InvalidInput(_) => exit_codes::INVALID_INPUT,
            CliError::Unavailable { .. } => exit_codes::UNAVAILABLE,
        }
    }

    /// Print error message to stderr and exit with appropriate code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);
        std::process::exit(self.exit_code())
    }
}

/// Exit code for an error surfaced from a command handler.
pub fn exit_code_for(err: &anyhow::Error) -> i32 {
    if let Some(cli) = err.downcast_ref::<CliError>() {
        return cli.exit_code();
    }
    if let Some(classified) = err.downcast_ref::<VaultError>().and_then(CliError::from_vault) {
        return classified.exit_code();
    }
    1
}

/// Print an error surfaced from a command handler and exit with its code.
pub fn exit_with(err: &anyhow::Error) -> ! {
    match err.downcast_ref::<VaultError>().and_then(CliError::from_vault) {
        Some(classified) => classified.exit(),
        None => {
            eprintln!("Error: {:#}", err);
            std::process::exit(exit_code_for(err))
        }
    }
}
