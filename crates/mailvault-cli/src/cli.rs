use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

use mailvault_core::VERSION;

/// Mailvault - local contact and key directory for encrypted webmail
#[derive(Parser)]
#[command(name = "mailvault")]
#[command(author, version = VERSION, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the config file
    #[arg(long, global = true, env = "MAILVAULT_CONFIG")]
    pub config: Option<String>,

    /// Path to the store file
    #[arg(short, long, global = true, env = "MAILVAULT_STORE")]
    pub store: Option<String>,

    /// Send operations to a running relay instead of opening the store
    #[arg(long, global = true)]
    pub relay: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Quiet mode (minimal output)
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

/// Arguments for the `init` command
#[derive(Args)]
pub struct InitArgs {
    /// Path where the store will be created
    #[arg(value_name = "PATH")]
    pub path: Option<String>,

    /// Keep durable pass-phrases in the platform keychain
    #[arg(long)]
    pub keychain: bool,

    /// Overwrite an existing config file
    #[arg(long)]
    pub force: bool,
}

#[derive(Args)]
pub struct ContactsArgs {
    #[command(subcommand)]
    pub command: ContactsSubcommand,
}

#[derive(Subcommand)]
pub enum ContactsSubcommand {
    /// Create or replace a contact
    Save(ContactSaveArgs),

    /// Patch fields of one or more contacts
    Update(ContactUpdateArgs),

    /// Get contacts by email or longid
    Get(ContactGetArgs),

    /// Search contacts by name or email prefix
    Search(ContactSearchArgs),

    /// List contacts waiting for a remote key lookup
    Pending(ContactPendingArgs),

    /// Delete every contact holding a key
    #[command(name = "remove-longid")]
    RemoveLongid(ContactRemoveLongidArgs),
}

/// Arguments for `contacts save`
#[derive(Args)]
pub struct ContactSaveArgs {
    /// Contact email address
    #[arg(value_name = "EMAIL")]
    pub email: String,

    /// Display name
    #[arg(long)]
    pub name: Option<String>,

    /// File holding the armored public key ("-" for stdin)
    #[arg(long, value_name = "FILE")]
    pub pubkey_file: Option<PathBuf>,

    /// Client that produced the key
    #[arg(long)]
    pub client: Option<String>,

    /// Mark the key as attested
    #[arg(long)]
    pub attested: bool,

    /// Mark the contact as waiting for a remote key lookup
    #[arg(long)]
    pub pending_lookup: bool,

    /// Last use (milliseconds since the epoch)
    #[arg(long, value_name = "MILLIS")]
    pub last_use: Option<i64>,
}

/// Arguments for `contacts update`
#[derive(Args)]
pub struct ContactUpdateArgs {
    /// Emails of the contacts to patch
    #[arg(value_name = "EMAIL", required = true)]
    pub emails: Vec<String>,

    /// Set the display name
    #[arg(long, conflicts_with = "clear_name")]
    pub name: Option<String>,

    /// Remove the display name
    #[arg(long)]
    pub clear_name: bool,

    /// Set the public key from an armored file ("-" for stdin)
    #[arg(long, value_name = "FILE", conflicts_with = "clear_pubkey")]
    pub pubkey_file: Option<PathBuf>,

    /// Remove the public key
    #[arg(long)]
    pub clear_pubkey: bool,

    /// Set the client
    #[arg(long)]
    pub client: Option<String>,

    /// Set the attested flag
    #[arg(long, value_name = "BOOL")]
    pub attested: Option<bool>,

    /// Set the pending-lookup flag
    #[arg(long, value_name = "BOOL")]
    pub pending_lookup: Option<bool>,

    /// Set the last use (milliseconds since the epoch)
    #[arg(long, value_name = "MILLIS")]
    pub last_use: Option<i64>,
}

/// Arguments for `contacts get`
#[derive(Args)]
pub struct ContactGetArgs {
    /// Emails or 16-digit uppercase longids
    #[arg(value_name = "ID", required = true)]
    pub ids: Vec<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for `contacts search`
#[derive(Args)]
pub struct ContactSearchArgs {
    /// Name or email prefix
    #[arg(value_name = "QUERY")]
    pub substring: Option<String>,

    /// Only contacts with (true) or without (false) a key
    #[arg(long, value_name = "BOOL")]
    pub has_pgp: Option<bool>,

    /// Limit number of results (0 means unlimited)
    #[arg(long)]
    pub limit: Option<usize>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for `contacts pending`
#[derive(Args)]
pub struct ContactPendingArgs {
    /// Limit number of results (0 means unlimited)
    #[arg(long)]
    pub limit: Option<usize>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for `contacts remove-longid`
#[derive(Args)]
pub struct ContactRemoveLongidArgs {
    /// 16-digit uppercase longid
    #[arg(value_name = "LONGID")]
    pub longid: String,
}

#[derive(Args)]
pub struct KeysArgs {
    #[command(subcommand)]
    pub command: KeysSubcommand,
}

#[derive(Subcommand)]
pub enum KeysSubcommand {
    /// Add or replace a private key
    Add(KeyAddArgs),

    /// List stored keys
    List(KeyListArgs),

    /// Get keys by longid or "primary"
    Get(KeyGetArgs),

    /// Remove a key
    Remove(KeyRemoveArgs),

    /// Make a stored key the primary key
    Primary(KeyPrimaryArgs),

    /// Write an encrypted backup of the account's keys
    Backup(KeyBackupArgs),

    /// Restore keys from an encrypted backup
    Restore(KeyRestoreArgs),
}

/// Arguments for `keys add`
#[derive(Args)]
pub struct KeyAddArgs {
    /// Account email
    #[arg(long)]
    pub account: String,

    /// File holding the armored private key ("-" for stdin)
    #[arg(value_name = "FILE")]
    pub key_file: PathBuf,
}

/// Arguments for `keys list`
#[derive(Args)]
pub struct KeyListArgs {
    /// Account email
    #[arg(long)]
    pub account: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for `keys get`
#[derive(Args)]
pub struct KeyGetArgs {
    /// Account email
    #[arg(long)]
    pub account: String,

    /// Longids, or "primary"
    #[arg(value_name = "SELECTOR", default_value = "primary")]
    pub selectors: Vec<String>,

    /// Print the armored public key only
    #[arg(long, conflicts_with = "json")]
    pub armor: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for `keys remove`
#[derive(Args)]
pub struct KeyRemoveArgs {
    /// Account email
    #[arg(long)]
    pub account: String,

    /// Longid of the key to remove
    #[arg(value_name = "LONGID")]
    pub longid: String,
}

/// Arguments for `keys primary`
#[derive(Args)]
pub struct KeyPrimaryArgs {
    /// Account email
    #[arg(long)]
    pub account: String,

    /// Longid of the key to promote
    #[arg(value_name = "LONGID")]
    pub longid: String,
}

/// Arguments for `keys backup`
#[derive(Args)]
pub struct KeyBackupArgs {
    /// Account email
    #[arg(long)]
    pub account: String,

    /// Destination path
    #[arg(value_name = "DEST")]
    pub destination: PathBuf,

    /// Disable interactive prompts
    #[arg(long)]
    pub no_input: bool,
}

/// Arguments for `keys restore`
#[derive(Args)]
pub struct KeyRestoreArgs {
    /// Account email
    #[arg(long)]
    pub account: String,

    /// Backup file
    #[arg(value_name = "SOURCE")]
    pub source: PathBuf,

    /// Disable interactive prompts
    #[arg(long)]
    pub no_input: bool,
}

#[derive(Args)]
pub struct PassphraseArgs {
    #[command(subcommand)]
    pub command: PassphraseSubcommand,
}

#[derive(Subcommand)]
pub enum PassphraseSubcommand {
    /// Store a key's pass-phrase
    Set(PassphraseSetArgs),

    /// Print a key's pass-phrase
    Get(PassphraseGetArgs),

    /// Forget a key's pass-phrase
    Clear(PassphraseClearArgs),
}

/// Key selection shared by the pass-phrase commands
#[derive(Args)]
pub struct PassphraseTarget {
    /// Account email
    #[arg(long)]
    pub account: String,

    /// Longid of the key
    #[arg(long)]
    pub longid: String,
}

/// Arguments for `passphrase set`
#[derive(Args)]
pub struct PassphraseSetArgs {
    #[command(flatten)]
    pub target: PassphraseTarget,

    /// Keep it in the session tier only
    #[arg(long)]
    pub session: bool,

    /// Disable interactive prompts
    #[arg(long)]
    pub no_input: bool,
}

/// Arguments for `passphrase get`
#[derive(Args)]
pub struct PassphraseGetArgs {
    #[command(flatten)]
    pub target: PassphraseTarget,

    /// Only read the durable tier
    #[arg(long)]
    pub ignore_session: bool,
}

/// Arguments for `passphrase clear`
#[derive(Args)]
pub struct PassphraseClearArgs {
    #[command(flatten)]
    pub target: PassphraseTarget,

    /// Clear the session tier instead of the durable tier
    #[arg(long)]
    pub session: bool,
}

#[derive(Args)]
pub struct AccountsArgs {
    #[command(subcommand)]
    pub command: AccountsSubcommand,
}

#[derive(Subcommand)]
pub enum AccountsSubcommand {
    /// List known accounts
    List(JsonArgs),

    /// Register an account
    Add(AccountAddArgs),
}

/// Arguments for `accounts add`
#[derive(Args)]
pub struct AccountAddArgs {
    /// Account email
    #[arg(value_name = "EMAIL")]
    pub email: String,
}

#[derive(Args)]
pub struct ErrorsArgs {
    #[command(subcommand)]
    pub command: ErrorsSubcommand,
}

#[derive(Subcommand)]
pub enum ErrorsSubcommand {
    /// Show logged storage errors, oldest first
    List(JsonArgs),

    /// Empty the error log
    Clear,
}

/// Output selection for list commands
#[derive(Args)]
pub struct JsonArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `serve` command
#[derive(Args)]
pub struct ServeArgs {
    /// Socket path (defaults to the configured relay socket)
    #[arg(long, value_name = "PATH")]
    pub socket: Option<PathBuf>,

    /// Exit after this many seconds without a client
    #[arg(long, value_name = "SECONDS")]
    pub idle_exit: Option<u64>,
}

/// Arguments for the `completions` command
#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_name = "SHELL")]
    pub shell: Shell,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a default config and create the store
    Init(InitArgs),

    /// Manage the contact directory
    Contacts(ContactsArgs),

    /// Manage the account's own keys
    Keys(KeysArgs),

    /// Manage key pass-phrases
    Passphrase(PassphraseArgs),

    /// Manage known accounts
    Accounts(AccountsArgs),

    /// Inspect the storage error log
    Errors(ErrorsArgs),

    /// Run the relay server that owns the store
    Serve(ServeArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_key_get_defaults_to_primary() {
        let cli = Cli::parse_from(["mailvault", "keys", "get", "--account", "me@x.com"]);
        match cli.command {
            Some(Commands::Keys(KeysArgs {
                command: KeysSubcommand::Get(args),
            })) => assert_eq!(args.selectors, vec!["primary".to_string()]),
            _ => panic!("expected keys get"),
        }
    }

    #[test]
    fn test_update_rejects_set_and_clear_together() {
        let result = Cli::try_parse_from([
            "mailvault", "contacts", "update", "a@x.com", "--name", "Ann", "--clear-name",
        ]);
        assert!(result.is_err());
    }
}
