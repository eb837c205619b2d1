use mailvault_core::StorageTier;

use crate::app::AppContext;
use crate::cli::{PassphraseClearArgs, PassphraseGetArgs, PassphraseSetArgs};
use crate::constants::PASSPHRASE_ENV;
use crate::errors::CliError;
use crate::helpers::{interactive, prompt_secret};

fn tier(session: bool) -> StorageTier {
    if session {
        StorageTier::Session
    } else {
        StorageTier::Durable
    }
}

pub fn handle_set(ctx: &AppContext, args: &PassphraseSetArgs) -> anyhow::Result<()> {
    let value = prompt_secret(PASSPHRASE_ENV, "Key passphrase", interactive(args.no_input))?;
    if args.session && !ctx.relayed()? && !ctx.quiet() {
        eprintln!(
            "Warning: session pass-phrases only live as long as the process holding the store.\nRun `mailvault serve` and pass --relay to keep them between commands."
        );
    }

    ctx.passphrases()?.save(
        tier(args.session),
        &args.target.account,
        &args.target.longid,
        Some(value.as_str()),
    )?;
    if !ctx.quiet() {
        println!("Stored pass-phrase for {}", args.target.longid);
    }
    Ok(())
}

pub fn handle_get(ctx: &AppContext, args: &PassphraseGetArgs) -> anyhow::Result<()> {
    let stored = ctx.passphrases()?.get(
        &args.target.account,
        &args.target.longid,
        args.ignore_session,
    )?;
    match stored {
        Some(value) => {
            println!("{}", value);
            Ok(())
        }
        None => Err(CliError::not_found(
            format!("No pass-phrase stored for {}", args.target.longid),
            "Hint: Run `mailvault passphrase set --account <EMAIL> --longid <LONGID>`.",
        )
        .into()),
    }
}

pub fn handle_clear(ctx: &AppContext, args: &PassphraseClearArgs) -> anyhow::Result<()> {
    ctx.passphrases()?.save(
        tier(args.session),
        &args.target.account,
        &args.target.longid,
        None,
    )?;
    if !ctx.quiet() {
        println!("Cleared pass-phrase for {}", args.target.longid);
    }
    Ok(())
}
