use std::path::PathBuf;

use crate::app::{open_local_store, resolve_config_path, AppContext};
use crate::cli::{Cli, InitArgs};
use crate::config::{default_store_path, read_config, write_config, MailvaultConfig};
use crate::errors::CliError;

/// Store path named on the command line: positional arg, then `--store`.
fn requested_store_path(cli: &Cli, args: &InitArgs) -> Option<PathBuf> {
    args.path
        .as_deref()
        .or(cli.store.as_deref())
        .filter(|path| !path.trim().is_empty())
        .map(PathBuf::from)
}

pub fn handle_init(ctx: &AppContext, cli: &Cli, args: &InitArgs) -> anyhow::Result<()> {
    let config_path = resolve_config_path(cli)?;
    let requested = requested_store_path(cli, args);

    let store_path = if config_path.exists() && !args.force {
        if args.path.is_some() {
            return Err(CliError::invalid_input(format!(
                "Config already exists at {}. Pass --force to replace it.",
                config_path.display()
            ))
            .into());
        }
        match requested {
            Some(path) => path,
            None => PathBuf::from(read_config(&config_path)?.store.path),
        }
    } else {
        let store_path = match requested {
            Some(path) => path,
            None => default_store_path()?,
        };
        write_config(
            &config_path,
            &MailvaultConfig::new(store_path.clone(), args.keychain),
        )?;
        store_path
    };

    if let Some(parent) = store_path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            anyhow::anyhow!(
                "Failed to create store directory {}: {}",
                parent.display(),
                e
            )
        })?;
    }
    let (store, _reporter) = open_local_store(&store_path)?;
    let version = store.directory().schema_version()?;
    tracing::info!(store = %store_path.display(), version, "store ready");

    if !ctx.quiet() {
        println!("Initialized store at {}", store_path.display());
        println!("Config: {}", config_path.display());
    }
    Ok(())
}
