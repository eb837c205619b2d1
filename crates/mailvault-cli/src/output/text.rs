//! Table output formatting.

use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{ContentArrangement, Table};

use mailvault_core::{Contact, KeyInfo};

fn new_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(headers.to_vec());
    table
}

/// Render contacts as a table.
pub fn contact_table(contacts: &[Contact]) -> Table {
    let mut table = new_table(&["Email", "Name", "Key", "Longid", "Pending"]);
    for contact in contacts {
        table.add_row(vec![
            contact.email.clone(),
            contact.name.clone().unwrap_or_default(),
            if contact.has_pgp { "yes" } else { "no" }.to_string(),
            contact.longid.clone().unwrap_or_default(),
            if contact.pending_lookup { "yes" } else { "" }.to_string(),
        ]);
    }
    table
}

/// Render keys as a table.
pub fn key_table(keys: &[KeyInfo]) -> Table {
    let mut table = new_table(&["Longid", "Primary", "Keywords", "Fingerprint"]);
    for key in keys {
        table.add_row(vec![
            key.longid.clone(),
            if key.primary { "*" } else { "" }.to_string(),
            key.keywords.clone(),
            key.fingerprint.clone(),
        ]);
    }
    table
}

/// Print one value per line, or `count=0` when there is nothing to show.
pub fn print_lines(lines: &[String], quiet: bool) {
    if lines.is_empty() {
        if !quiet {
            println!("count=0");
        }
        return;
    }
    for line in lines {
        println!("{}", line);
    }
}
