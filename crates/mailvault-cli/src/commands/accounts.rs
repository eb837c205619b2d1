use mailvault_core::accounts::Accounts;

use crate::app::AppContext;
use crate::cli::{AccountAddArgs, JsonArgs};
use crate::output::{print_json, print_lines};

pub fn handle_list(ctx: &AppContext, args: &JsonArgs) -> anyhow::Result<()> {
    let accounts = Accounts::new(ctx.store()?, ctx.reporter()?).list()?;
    if args.json {
        return print_json(&accounts);
    }
    print_lines(&accounts, ctx.quiet());
    Ok(())
}

pub fn handle_add(ctx: &AppContext, args: &AccountAddArgs) -> anyhow::Result<()> {
    let added = Accounts::new(ctx.store()?, ctx.reporter()?).add(&args.email)?;
    if !ctx.quiet() {
        let email = args.email.trim().to_lowercase();
        if added {
            println!("Added account {}", email);
        } else {
            println!("Account {} is already known", email);
        }
    }
    Ok(())
}
