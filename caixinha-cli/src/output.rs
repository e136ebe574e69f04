//! Terminal rendering shared by the commands

use colored::Colorize;
use comfy_table::{presets::UTF8_FULL_CONDENSED, ContentArrangement, Table};
use rust_decimal::Decimal;

use caixinha_core::services::format_money;

pub fn success(msg: &str) {
    println!("{} {}", "✓".green().bold(), msg);
}

/// Goes to stderr so piped `--json` output stays clean
pub fn error(msg: &str) {
    eprintln!("{} {}", "✗".red().bold(), msg.red());
}

pub fn warning(msg: &str) {
    println!("{} {}", "!".yellow().bold(), msg.yellow());
}

pub fn info(msg: &str) {
    println!("{}", msg.cyan());
}

/// A bot message as it would appear in the chat, one barred line per line
pub fn bubble(body: &str) {
    for line in body.lines() {
        println!("{} {}", "│".green(), line);
    }
}

/// Condensed table with the given column headers
pub fn table<S: AsRef<str>>(headers: &[S]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(headers.iter().map(|h| h.as_ref().to_string()).collect::<Vec<_>>());
    table
}

/// Money in report format, green when positive and red when negative
pub fn signed_money(amount: Decimal) -> String {
    let text = format_money(amount);
    if amount.is_sign_negative() {
        text.red().to_string()
    } else {
        text.green().to_string()
    }
}

/// A stored amount column in report format. Hand-edited sheets may hold
/// text that is not a number; that is shown unchanged.
pub fn sheet_amount(raw: &str) -> String {
    raw.trim()
        .parse::<Decimal>()
        .map(format_money)
        .unwrap_or_else(|_| raw.to_string())
}
