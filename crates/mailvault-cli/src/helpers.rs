//! Input helpers for the CLI.

use std::io::{self, IsTerminal, Read};
use std::path::Path;

use dialoguer::Password;
use zeroize::Zeroizing;

/// Read an armored key from a file, or from stdin when the path is "-".
pub fn read_armored(path: &Path) -> anyhow::Result<String> {
    let contents = if path.as_os_str() == "-" {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .map_err(|e| anyhow::anyhow!("Failed to read key from stdin: {}", e))?;
        buffer
    } else {
        std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read key file {}: {}", path.display(), e))?
    };
    if contents.trim().is_empty() {
        return Err(anyhow::anyhow!("Key input is empty"));
    }
    Ok(contents)
}

/// Whether prompts may be shown.
pub fn interactive(no_input: bool) -> bool {
    !no_input && io::stdin().is_terminal()
}

/// Prompt for a secret, or read it from `env_var`.
pub fn prompt_secret(
    env_var: &str,
    prompt: &str,
    interactive: bool,
) -> anyhow::Result<Zeroizing<String>> {
    if let Some(value) = secret_from_env(env_var) {
        return Ok(value);
    }
    if !interactive {
        return Err(anyhow::anyhow!(
            "No passphrase provided and no TTY available. Set {}.",
            env_var
        ));
    }
    Password::new()
        .with_prompt(prompt)
        .interact()
        .map(Zeroizing::new)
        .map_err(|e| anyhow::anyhow!("Failed to read passphrase: {}", e))
}

/// Prompt for a new secret with confirmation, or read it from `env_var`.
pub fn prompt_new_secret(
    env_var: &str,
    prompt: &str,
    interactive: bool,
) -> anyhow::Result<Zeroizing<String>> {
    if let Some(value) = secret_from_env(env_var) {
        return Ok(value);
    }
    if !interactive {
        return Err(anyhow::anyhow!(
            "No passphrase provided and no TTY available. Set {}.",
            env_var
        ));
    }
    Password::new()
        .with_prompt(prompt)
        .with_confirmation("Confirm passphrase", "Passphrases do not match")
        .interact()
        .map(Zeroizing::new)
        .map_err(|e| anyhow::anyhow!("Failed to read passphrase: {}", e))
}

fn secret_from_env(env_var: &str) -> Option<Zeroizing<String>> {
    std::env::var(env_var)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .map(Zeroizing::new)
}
