use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use mailvault_core::relay::RelayServer;

use crate::app::{missing_store_message, open_local_store, AppContext};
use crate::cli::ServeArgs;
use crate::errors::CliError;

static SHUTDOWN: AtomicBool = AtomicBool::new(false);

/// Stop the accept loop on SIGINT, SIGTERM or SIGHUP.
fn install_shutdown_handler() -> anyhow::Result<()> {
    ctrlc::set_handler(|| SHUTDOWN.store(true, Ordering::Relaxed))?;
    Ok(())
}

pub fn handle_serve(ctx: &AppContext, args: &ServeArgs) -> anyhow::Result<()> {
    let store_path = ctx.store_path()?;
    if !store_path.exists() {
        return Err(CliError::not_found(
            missing_store_message(&store_path),
            "Hint: Run `mailvault init` before starting the relay.",
        )
        .into());
    }
    let socket = match &args.socket {
        Some(path) => path.clone(),
        None => ctx.socket_path()?,
    };

    let (store, _reporter) = open_local_store(&store_path)?;
    let mut server = RelayServer::bind(store, &socket)?;
    if let Some(seconds) = args.idle_exit {
        server = server.with_idle_exit(Duration::from_secs(seconds));
    }

    install_shutdown_handler()?;
    if !ctx.quiet() {
        eprintln!("Relay listening on {}", server.socket_path().display());
    }
    server.serve(&SHUTDOWN)?;
    Ok(())
}
