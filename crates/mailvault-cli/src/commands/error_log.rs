//! Reads the error log through the store backend, so it works the same in
//! direct and relayed mode.

use mailvault_core::report::ERROR_LOG_KEY;

use crate::app::AppContext;
use crate::cli::JsonArgs;
use crate::output::{print_json, print_lines};

pub fn handle_list(ctx: &AppContext, args: &JsonArgs) -> anyhow::Result<()> {
    let stored = ctx
        .store()?
        .settings_get(None, &[ERROR_LOG_KEY.to_string()])?;
    let lines: Vec<String> = match stored.get(ERROR_LOG_KEY) {
        Some(value) => serde_json::from_value(value.clone())?,
        None => Vec::new(),
    };

    if args.json {
        return print_json(&lines);
    }
    print_lines(&lines, ctx.quiet());
    Ok(())
}

pub fn handle_clear(ctx: &AppContext) -> anyhow::Result<()> {
    ctx.store()?
        .settings_remove(None, &[ERROR_LOG_KEY.to_string()])?;
    if !ctx.quiet() {
        println!("Cleared error log");
    }
    Ok(())
}
