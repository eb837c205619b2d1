//! Mailvault CLI - local contact and key directory for encrypted webmail
//!
//! This is the command-line interface for Mailvault. It picks the store
//! strategy once per process, runs the relay server, and exposes the core
//! directory, key vault and pass-phrase operations.

mod app;
mod cli;
mod commands;
mod config;
mod constants;
mod errors;
mod helpers;
mod inspector;
mod output;
mod security;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::app::AppContext;
use crate::cli::{
    AccountsSubcommand, Cli, Commands, ContactsSubcommand, ErrorsSubcommand, KeysSubcommand,
    PassphraseSubcommand,
};
use crate::commands::{accounts, contacts, error_log, init, keys, misc, passphrase};
use crate::constants::LOG_ENV;
use crate::errors::exit_with;

fn main() {
    let cli = Cli::parse();
    init_tracing();
    let ctx = AppContext::new(&cli);

    if let Err(e) = run(&ctx, &cli) {
        exit_with(&e);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(ctx: &AppContext, cli: &Cli) -> anyhow::Result<()> {
    match &cli.command {
        Some(Commands::Init(args)) => {
            init::handle_init(ctx, cli, args)?;
        }
        Some(Commands::Contacts(args)) => match &args.command {
            ContactsSubcommand::Save(save_args) => contacts::handle_save(ctx, save_args)?,
            ContactsSubcommand::Update(update_args) => contacts::handle_update(ctx, update_args)?,
            ContactsSubcommand::Get(get_args) => contacts::handle_get(ctx, get_args)?,
            ContactsSubcommand::Search(search_args) => contacts::handle_search(ctx, search_args)?,
            ContactsSubcommand::Pending(pending_args) => {
                contacts::handle_pending(ctx, pending_args)?
            }
            ContactsSubcommand::RemoveLongid(remove_args) => {
                contacts::handle_remove_longid(ctx, remove_args)?
            }
        },
        Some(Commands::Keys(args)) => match &args.command {
            KeysSubcommand::Add(add_args) => keys::handle_add(ctx, add_args)?,
            KeysSubcommand::List(list_args) => keys::handle_list(ctx, list_args)?,
            KeysSubcommand::Get(get_args) => keys::handle_get(ctx, get_args)?,
            KeysSubcommand::Remove(remove_args) => keys::handle_remove(ctx, remove_args)?,
            KeysSubcommand::Primary(primary_args) => keys::handle_primary(ctx, primary_args)?,
            KeysSubcommand::Backup(backup_args) => keys::handle_backup(ctx, backup_args)?,
            KeysSubcommand::Restore(restore_args) => keys::handle_restore(ctx, restore_args)?,
        },
        Some(Commands::Passphrase(args)) => match &args.command {
            PassphraseSubcommand::Set(set_args) => passphrase::handle_set(ctx, set_args)?,
            PassphraseSubcommand::Get(get_args) => passphrase::handle_get(ctx, get_args)?,
            PassphraseSubcommand::Clear(clear_args) => passphrase::handle_clear(ctx, clear_args)?,
        },
        Some(Commands::Accounts(args)) => match &args.command {
            AccountsSubcommand::List(list_args) => accounts::handle_list(ctx, list_args)?,
            AccountsSubcommand::Add(add_args) => accounts::handle_add(ctx, add_args)?,
        },
        Some(Commands::Errors(args)) => match &args.command {
            ErrorsSubcommand::List(list_args) => error_log::handle_list(ctx, list_args)?,
            ErrorsSubcommand::Clear => error_log::handle_clear(ctx)?,
        },
        Some(Commands::Serve(args)) => {
            #[cfg(unix)]
            commands::serve::handle_serve(ctx, args)?;
            #[cfg(not(unix))]
            {
                let _ = args;
                return Err(errors::CliError::invalid_input(
                    "The relay server needs Unix domain sockets",
                )
                .into());
            }
        }
        Some(Commands::Completions(args)) => {
            misc::handle_completions(args.shell)?;
        }
        None => {
            if !cli.quiet {
                println!("Mailvault {}", mailvault_core::VERSION);
                println!("Run `mailvault --help` for usage.");
            }
        }
    }

    Ok(())
}
