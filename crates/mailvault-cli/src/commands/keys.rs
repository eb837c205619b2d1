use serde_json::{Map, Value};

use mailvault_core::accounts::Accounts;
use mailvault_core::keys::backup::{read_backup, write_backup, BACKUP_METHOD_KEY};
use mailvault_core::KeyVault;

use crate::app::AppContext;
use crate::cli::{
    KeyAddArgs, KeyBackupArgs, KeyGetArgs, KeyListArgs, KeyPrimaryArgs, KeyRemoveArgs,
    KeyRestoreArgs,
};
use crate::constants::BACKUP_PASSPHRASE_ENV;
use crate::errors::CliError;
use crate::helpers::{interactive, prompt_new_secret, prompt_secret, read_armored};
use crate::inspector::ArmorDigestInspector;
use crate::output::{key_json, key_table, print_json};

fn vault<'a>(ctx: &'a AppContext) -> anyhow::Result<KeyVault<'a>> {
    Ok(KeyVault::new(ctx.store()?, &ArmorDigestInspector))
}

fn no_keys(account: &str) -> CliError {
    CliError::not_found(
        format!("No keys stored for {}", account),
        "Hint: Run `mailvault keys add --account <EMAIL> <FILE>` to add one.",
    )
}

pub fn handle_add(ctx: &AppContext, args: &KeyAddArgs) -> anyhow::Result<()> {
    let armored = read_armored(&args.key_file)?;
    let added = vault(ctx)?.add(&args.account, &armored)?;
    let Some(key) = added else {
        return Err(CliError::invalid_input(format!(
            "Could not read a key from {}",
            args.key_file.display()
        ))
        .into());
    };
    Accounts::new(ctx.store()?, ctx.reporter()?).add(&args.account)?;

    if !ctx.quiet() {
        let marker = if key.primary { " (primary)" } else { "" };
        println!("Added key {}{}", key.longid, marker);
    }
    Ok(())
}

pub fn handle_list(ctx: &AppContext, args: &KeyListArgs) -> anyhow::Result<()> {
    let keys = vault(ctx)?.list(&args.account)?;
    if args.json {
        let values: Vec<_> = keys.iter().map(key_json).collect();
        return print_json(&values);
    }
    if keys.is_empty() {
        if !ctx.quiet() {
            println!("count=0");
        }
        return Ok(());
    }
    println!("{}", key_table(&keys));
    Ok(())
}

pub fn handle_get(ctx: &AppContext, args: &KeyGetArgs) -> anyhow::Result<()> {
    let keys = vault(ctx)?.get_many(&args.account, &args.selectors)?;
    if keys.is_empty() {
        return Err(CliError::not_found(
            format!("No key matches {}", args.selectors.join(", ")),
            "Hint: Run `mailvault keys list --account <EMAIL>` to see stored keys.",
        )
        .into());
    }

    if args.armor {
        for key in &keys {
            println!("{}", key.public.trim_end());
        }
    } else if args.json {
        let values: Vec<_> = keys.iter().map(key_json).collect();
        print_json(&values)?;
    } else {
        println!("{}", key_table(&keys));
    }
    Ok(())
}

pub fn handle_remove(ctx: &AppContext, args: &KeyRemoveArgs) -> anyhow::Result<()> {
    if !vault(ctx)?.remove(&args.account, &args.longid)? {
        return Err(CliError::not_found(
            format!("Key {} not found for {}", args.longid, args.account),
            "Hint: Run `mailvault keys list --account <EMAIL>` to see stored keys.",
        )
        .into());
    }
    if !ctx.quiet() {
        println!("Removed key {}", args.longid);
    }
    Ok(())
}

pub fn handle_primary(ctx: &AppContext, args: &KeyPrimaryArgs) -> anyhow::Result<()> {
    vault(ctx)?.set_primary(&args.account, &args.longid)?;
    if !ctx.quiet() {
        println!("Primary key is now {}", args.longid);
    }
    Ok(())
}

pub fn handle_backup(ctx: &AppContext, args: &KeyBackupArgs) -> anyhow::Result<()> {
    let keys = vault(ctx)?.list(&args.account)?;
    if keys.is_empty() {
        return Err(no_keys(&args.account).into());
    }

    let passphrase = prompt_new_secret(
        BACKUP_PASSPHRASE_ENV,
        "Backup passphrase",
        interactive(args.no_input),
    )?;
    write_backup(&args.destination, &keys, &passphrase)?;

    let mut values = Map::new();
    values.insert(BACKUP_METHOD_KEY.to_string(), Value::String("file".to_string()));
    ctx.store()?.settings_set(Some(&args.account), &values)?;

    if !ctx.quiet() {
        println!(
            "Backed up {} key(s) to {}",
            keys.len(),
            args.destination.display()
        );
    }
    Ok(())
}

pub fn handle_restore(ctx: &AppContext, args: &KeyRestoreArgs) -> anyhow::Result<()> {
    if !args.source.exists() {
        return Err(CliError::not_found(
            format!("Backup not found: {}", args.source.display()),
            "Hint: Pass the path written by `mailvault keys backup`.",
        )
        .into());
    }

    let passphrase = prompt_secret(
        BACKUP_PASSPHRASE_ENV,
        "Backup passphrase",
        interactive(args.no_input),
    )?;
    let keys = read_backup(&args.source, &passphrase)?;

    let vault = vault(ctx)?;
    let mut restored = 0;
    for key in &keys {
        if vault.add(&args.account, &key.private)?.is_some() {
            restored += 1;
        }
    }
    Accounts::new(ctx.store()?, ctx.reporter()?).add(&args.account)?;

    if !ctx.quiet() {
        println!("Restored {} key(s) for {}", restored, args.account);
    }
    Ok(())
}
