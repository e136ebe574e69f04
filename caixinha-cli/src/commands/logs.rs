//! Logs command - inspect the wizard event log
//!
//! Entries never carry user data, so listing them is safe to share when
//! reporting a problem with a conversation.

use anyhow::Result;
use chrono::{Duration, TimeZone, Utc};
use clap::{Args, Subcommand};
use colored::Colorize;
use dialoguer::Confirm;

use super::get_caixinha_dir;
use crate::output;
use caixinha_core::services::{EntryPoint, LogEntry, LogFilter, LoggingService};

/// Number of failures shown under a plain listing
const RECENT_FAILURES: usize = 3;

/// Longest retention window `clear` accepts
const MAX_RETENTION_DAYS: i64 = 3650;

#[derive(Subcommand)]
pub enum LogsCommands {
    /// Show recent wizard events
    List {
        /// Number of entries to show
        #[arg(short, long, default_value = "50")]
        limit: usize,
        #[command(flatten)]
        filter: FilterArgs,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete old events
    Clear {
        /// Delete events older than N days
        #[arg(long, default_value = "30")]
        older_than_days: i64,
        #[command(flatten)]
        filter: FilterArgs,
        /// Skip confirmation prompt
        #[arg(long, short = 'f')]
        force: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Event counts, failing states and database location
    Stats {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args, Debug, Default)]
pub struct FilterArgs {
    /// Only this event (session_started, record_persisted, delivery_failed, ...)
    #[arg(long)]
    event: Option<String>,
    /// Only events raised in this wizard state (awaiting-amount, ...)
    #[arg(long)]
    state: Option<String>,
    /// Only delivery and persistence failures
    #[arg(long)]
    errors: bool,
}

impl FilterArgs {
    fn to_filter(&self) -> LogFilter {
        LogFilter {
            event: self.event.clone(),
            state: self.state.clone(),
            errors_only: self.errors,
        }
    }

    /// Human summary of what the filter selects
    fn describe(&self) -> String {
        let mut parts = Vec::new();
        if self.errors {
            parts.push("failed".to_string());
        }
        parts.push(match &self.event {
            Some(event) => format!("'{event}' events"),
            None => "events".to_string(),
        });
        if let Some(state) = &self.state {
            parts.push(format!("in state '{state}'"));
        }
        parts.join(" ")
    }
}

fn open_log() -> Result<LoggingService> {
    let dir = get_caixinha_dir()?;
    std::fs::create_dir_all(&dir)?;
    LoggingService::new(&dir, EntryPoint::Cli, env!("CARGO_PKG_VERSION"))
}

fn format_time(timestamp_ms: i64) -> String {
    Utc.timestamp_millis_opt(timestamp_ms)
        .single()
        .map(|dt| dt.format("%d/%m/%Y %H:%M:%S").to_string())
        .unwrap_or_else(|| timestamp_ms.to_string())
}

fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 3] = ["KB", "MB", "GB"];
    if bytes < 1024 {
        return format!("{bytes} bytes");
    }
    let mut size = bytes as f64 / 1024.0;
    let mut unit = 0;
    while size >= 1024.0 && unit + 1 < UNITS.len() {
        size /= 1024.0;
        unit += 1;
    }
    format!("{size:.1} {}", UNITS[unit])
}

fn print_entries(entries: &[LogEntry]) {
    let mut table = output::table(&["Time", "Source", "Event", "State", "Kind", "Error"]);
    for entry in entries {
        let error = entry
            .error_message
            .as_deref()
            .map(|e| e.red().to_string())
            .unwrap_or_default();
        table.add_row(vec![
            format_time(entry.timestamp),
            entry.entry_point.clone(),
            entry.event.clone(),
            entry.state.clone().unwrap_or_default(),
            entry.record_kind.clone().unwrap_or_default(),
            error,
        ]);
    }
    println!("{}", table);
}

pub fn run(command: LogsCommands) -> Result<()> {
    match command {
        LogsCommands::List { limit, filter, json } => {
            let log = open_log()?;
            let entries = log.find(&filter.to_filter(), limit)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&entries)?);
                return Ok(());
            }
            if entries.is_empty() {
                println!("No {} logged.", filter.describe());
                return Ok(());
            }
            print_entries(&entries);

            // An unfiltered listing can bury failures under routine events
            if !filter.errors && filter.event.is_none() {
                let failures = log.get_errors(RECENT_FAILURES)?;
                if !failures.is_empty() {
                    println!();
                    println!("{}", "Recent failures:".red().bold());
                    for failure in failures {
                        println!(
                            "  {} {} at {}",
                            format_time(failure.timestamp).dimmed(),
                            failure.event,
                            failure.state.as_deref().unwrap_or("-")
                        );
                    }
                }
            }
        }
        LogsCommands::Clear {
            older_than_days,
            filter,
            force,
            json,
        } => {
            let log = open_log()?;
            let cutoff = Utc::now() - Duration::days(older_than_days.clamp(0, MAX_RETENTION_DAYS));
            let what = format!("{} older than {} days", filter.describe(), older_than_days);

            if !force && !json {
                let confirmed = Confirm::new()
                    .with_prompt(format!("Delete {what}?"))
                    .default(false)
                    .interact()?;
                if !confirmed {
                    println!("Nothing deleted.");
                    return Ok(());
                }
            }

            let deleted = log.delete_matching(&filter.to_filter(), cutoff.timestamp_millis())?;
            if json {
                println!("{}", serde_json::json!({ "deleted": deleted }));
            } else {
                output::success(&format!("Deleted {deleted} {what}"));
            }
        }
        LogsCommands::Stats { json } => {
            let log = open_log()?;
            let total = log.count()?;
            let by_event = log.event_counts()?;
            let failing_states = log.error_counts_by_state()?;
            let db_path = log.db_path().to_path_buf();
            let size_bytes = std::fs::metadata(&db_path).map(|m| m.len()).unwrap_or(0);

            if json {
                let counts = |pairs: &[(String, u64)], key: &str| {
                    pairs
                        .iter()
                        .map(|(name, n)| serde_json::json!({ key: name, "count": n }))
                        .collect::<Vec<_>>()
                };
                println!(
                    "{}",
                    serde_json::json!({
                        "total_entries": total,
                        "events": counts(&by_event, "event"),
                        "failures_by_state": counts(&failing_states, "state"),
                        "database_path": db_path.to_string_lossy(),
                        "database_size_bytes": size_bytes,
                    })
                );
                return Ok(());
            }

            println!("{}", "Event log".bold());
            println!("  Entries:  {}", total);
            println!("  Database: {} ({})", db_path.display(), format_size(size_bytes));

            for (title, header, pairs) in [
                ("Events", "Event", &by_event),
                ("Failures by state", "State", &failing_states),
            ] {
                if pairs.is_empty() {
                    continue;
                }
                println!();
                println!("{}", title.bold());
                let mut table = output::table(&[header, "Count"]);
                for (name, n) in pairs {
                    table.add_row(vec![name.clone(), n.to_string()]);
                }
                println!("{}", table);
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 bytes");
        assert_eq!(format_size(1536), "1.5 KB");
        assert_eq!(format_size(3 * 1024 * 1024), "3.0 MB");
        assert_eq!(format_size(5 * 1024 * 1024 * 1024 * 1024), "5120.0 GB");
    }

    #[test]
    fn test_filter_args() {
        let args = FilterArgs {
            event: Some("delivery_failed".to_string()),
            state: Some("awaiting-amount".to_string()),
            errors: true,
        };
        assert_eq!(
            args.to_filter(),
            LogFilter::errors()
                .with_event("delivery_failed")
                .with_state("awaiting-amount")
        );
        assert_eq!(
            args.describe(),
            "failed 'delivery_failed' events in state 'awaiting-amount'"
        );
        assert_eq!(FilterArgs::default().describe(), "events");
    }
}
