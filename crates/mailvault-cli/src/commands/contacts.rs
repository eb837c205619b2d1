use mailvault_core::{Contact, ContactQuery, ContactUpdate, NewContact};

use crate::app::AppContext;
use crate::cli::{
    ContactGetArgs, ContactPendingArgs, ContactRemoveLongidArgs, ContactSaveArgs,
    ContactSearchArgs, ContactUpdateArgs,
};
use crate::errors::CliError;
use crate::helpers::read_armored;
use crate::output::{contact_json, contact_table, print_json};

pub fn handle_save(ctx: &AppContext, args: &ContactSaveArgs) -> anyhow::Result<()> {
    let mut contact = NewContact::new(&args.email)
        .attested(args.attested)
        .pending_lookup(args.pending_lookup);
    if let Some(name) = &args.name {
        contact = contact.with_name(name);
    }
    if let Some(path) = &args.pubkey_file {
        contact = contact.with_pubkey(read_armored(path)?);
    }
    if let Some(client) = &args.client {
        contact = contact.with_client(client);
    }
    if let Some(millis) = args.last_use {
        contact = contact.last_use(millis);
    }

    ctx.store()?.contact_save(&[contact])?;
    if !ctx.quiet() {
        println!("Saved contact {}", args.email.trim().to_lowercase());
    }
    Ok(())
}

pub fn handle_update(ctx: &AppContext, args: &ContactUpdateArgs) -> anyhow::Result<()> {
    let mut update = ContactUpdate::new();
    if args.clear_name {
        update = update.name(None);
    } else if let Some(name) = &args.name {
        update = update.name(Some(name.clone()));
    }
    if args.clear_pubkey {
        update = update.pubkey(None);
    } else if let Some(path) = &args.pubkey_file {
        update = update.pubkey(Some(read_armored(path)?));
    }
    if let Some(client) = &args.client {
        update = update.client(Some(client.clone()));
    }
    if let Some(attested) = args.attested {
        update = update.attested(attested);
    }
    if let Some(pending) = args.pending_lookup {
        update = update.pending_lookup(pending);
    }
    if let Some(millis) = args.last_use {
        update = update.last_use(Some(millis));
    }
    if update == ContactUpdate::default() {
        return Err(
            CliError::invalid_input("Nothing to update. Pass at least one field flag.").into(),
        );
    }

    ctx.store()?.contact_update(&args.emails, &update)?;
    if !ctx.quiet() {
        println!("Updated {} contact(s)", args.emails.len());
    }
    Ok(())
}

pub fn handle_get(ctx: &AppContext, args: &ContactGetArgs) -> anyhow::Result<()> {
    let results = ctx.store()?.contact_get(&args.ids)?;

    if args.json {
        let values: Vec<_> = results
            .iter()
            .map(|found| found.as_ref().map(contact_json).unwrap_or(serde_json::Value::Null))
            .collect();
        return print_json(&values);
    }

    let found: Vec<Contact> = results.iter().flatten().cloned().collect();
    if found.is_empty() {
        return Err(CliError::not_found(
            format!("No contact found for {}", args.ids.join(", ")),
            "Hint: Run `mailvault contacts search` to list contacts.",
        )
        .into());
    }
    if !ctx.quiet() {
        for (id, result) in args.ids.iter().zip(&results) {
            if result.is_none() {
                eprintln!("Not found: {}", id);
            }
        }
    }
    println!("{}", contact_table(&found));
    Ok(())
}

pub fn handle_search(ctx: &AppContext, args: &ContactSearchArgs) -> anyhow::Result<()> {
    let mut query = ContactQuery::new();
    if let Some(substring) = &args.substring {
        query = query.substring(substring);
    }
    if let Some(has_pgp) = args.has_pgp {
        query = query.has_pgp(has_pgp);
    }
    if let Some(limit) = args.limit {
        query = query.limit(limit);
    }

    let contacts = ctx.store()?.contact_search(&query)?;
    print_contacts(ctx, &contacts, args.json)
}

pub fn handle_pending(ctx: &AppContext, args: &ContactPendingArgs) -> anyhow::Result<()> {
    let contacts = ctx.store()?.contact_pending_lookups(args.limit)?;
    print_contacts(ctx, &contacts, args.json)
}

pub fn handle_remove_longid(ctx: &AppContext, args: &ContactRemoveLongidArgs) -> anyhow::Result<()> {
    let removed = ctx.store()?.contact_remove_by_longid(&args.longid)?;
    if !ctx.quiet() {
        println!("Removed {} contact(s) with key {}", removed, args.longid);
    }
    Ok(())
}

fn print_contacts(ctx: &AppContext, contacts: &[Contact], json: bool) -> anyhow::Result<()> {
    if json {
        let values: Vec<_> = contacts.iter().map(contact_json).collect();
        return print_json(&values);
    }
    if contacts.is_empty() {
        if !ctx.quiet() {
            println!("count=0");
        }
        return Ok(());
    }
    println!("{}", contact_table(contacts));
    Ok(())
}
