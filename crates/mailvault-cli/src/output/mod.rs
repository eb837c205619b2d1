//! Output formatting helpers for the CLI.
//!
//! This module provides formatting utilities for displaying contacts and
//! keys as JSON or tables.

mod json;
mod text;

// Re-export public API
pub use json::{contact_json, key_json, print_json};
pub use text::{contact_table, key_table, print_lines};
