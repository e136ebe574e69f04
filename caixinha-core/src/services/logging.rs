//! Event log - what the wizard did, kept in logs.duckdb
//!
//! Only the event name, the wizard state, the record kind and error text are
//! stored. Phone numbers, amounts, descriptions and categories never reach
//! this database.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use anyhow::{anyhow, Result};
use chrono::Utc;
use duckdb::types::Value;
use duckdb::{params, params_from_iter, Connection};
use serde::{Deserialize, Serialize};

use crate::log_migrations::LOG_MIGRATIONS;
use crate::ports::EventSink;

const LOG_DB_FILE: &str = "logs.duckdb";

/// Low 16 bits of every id, so ids written in the same millisecond differ
static SEQUENCE: AtomicU64 = AtomicU64::new(0);

fn entry_id(timestamp_ms: i64) -> u64 {
    let sequence = SEQUENCE.fetch_add(1, Ordering::Relaxed) & 0xFFFF;
    (timestamp_ms.max(0) as u64) << 16 | sequence
}

/// Where the conversation came in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryPoint {
    Cli,
    Webhook,
}

impl EntryPoint {
    fn as_str(&self) -> &'static str {
        match self {
            EntryPoint::Cli => "cli",
            EntryPoint::Webhook => "webhook",
        }
    }
}

/// One wizard event, before it is stamped and stored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEvent {
    pub event: String,
    /// Wizard state the event happened in
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    /// `income` or `expense`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_details: Option<String>,
}

impl LogEvent {
    pub fn new(event: impl Into<String>) -> Self {
        Self {
            event: event.into(),
            state: None,
            record_kind: None,
            error_message: None,
            error_details: None,
        }
    }

    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.state = Some(state.into());
        self
    }

    pub fn with_record_kind(mut self, kind: impl Into<String>) -> Self {
        self.record_kind = Some(kind.into());
        self
    }

    pub fn with_error(mut self, message: impl Into<String>) -> Self {
        self.error_message = Some(message.into());
        self
    }

    pub fn with_error_details(mut self, details: impl Into<String>) -> Self {
        self.error_details = Some(details.into());
        self
    }
}

/// Which entries a listing or cleanup applies to
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogFilter {
    /// Only this event name (`delivery_failed`, ...)
    pub event: Option<String>,
    /// Only events raised in this wizard state
    pub state: Option<String>,
    pub errors_only: bool,
}

impl LogFilter {
    pub fn errors() -> Self {
        Self {
            errors_only: true,
            ..Self::default()
        }
    }

    pub fn with_event(mut self, event: impl Into<String>) -> Self {
        self.event = Some(event.into());
        self
    }

    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.state = Some(state.into());
        self
    }

    /// SQL condition and its bound values. `before_ms` adds an age cutoff.
    fn condition(&self, before_ms: Option<i64>) -> (String, Vec<Value>) {
        let mut clauses = vec!["TRUE".to_string()];
        let mut values = Vec::new();
        if let Some(event) = &self.event {
            clauses.push("event = ?".to_string());
            values.push(Value::Text(event.clone()));
        }
        if let Some(state) = &self.state {
            clauses.push("state = ?".to_string());
            values.push(Value::Text(state.clone()));
        }
        if self.errors_only {
            clauses.push("error_message IS NOT NULL".to_string());
        }
        if let Some(cutoff) = before_ms {
            clauses.push("timestamp < ?".to_string());
            values.push(Value::BigInt(cutoff));
        }
        (clauses.join(" AND "), values)
    }
}

/// A stored event with its stamp
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: u64,
    /// Unix milliseconds
    pub timestamp: i64,
    pub entry_point: String,
    pub app_version: String,
    pub platform: String,
    pub event: String,
    pub state: Option<String>,
    pub record_kind: Option<String>,
    pub error_message: Option<String>,
    pub error_details: Option<String>,
}

const ENTRY_COLUMNS: &str = "id, timestamp, entry_point, app_version, platform, \
                             event, state, record_kind, error_message, error_details";

impl LogEntry {
    fn from_row(row: &duckdb::Row<'_>) -> duckdb::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            timestamp: row.get(1)?,
            entry_point: row.get(2)?,
            app_version: row.get(3)?,
            platform: row.get(4)?,
            event: row.get(5)?,
            state: row.get(6)?,
            record_kind: row.get(7)?,
            error_message: row.get(8)?,
            error_details: row.get(9)?,
        })
    }
}

/// Writes wizard events to logs.duckdb and answers `cx logs` queries
pub struct LoggingService {
    conn: Mutex<Connection>,
    db_path: PathBuf,
    entry_point: EntryPoint,
    app_version: String,
}

impl LoggingService {
    /// Open or create the event log in `dir`, bringing its schema up to date
    pub fn new(dir: &Path, entry_point: EntryPoint, app_version: impl Into<String>) -> Result<Self> {
        let db_path = dir.join(LOG_DB_FILE);
        let conn = Connection::open(&db_path)?;
        migrate(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
            db_path,
            entry_point,
            app_version: app_version.into(),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| anyhow!("event log connection poisoned: {e}"))
    }

    /// Stamp and store one event
    pub fn log(&self, event: LogEvent) -> Result<()> {
        let now = Utc::now().timestamp_millis();
        self.conn()?.execute(
            &format!("INSERT INTO sys_logs ({ENTRY_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"),
            params![
                entry_id(now),
                now,
                self.entry_point.as_str(),
                &self.app_version,
                std::env::consts::OS,
                &event.event,
                &event.state,
                &event.record_kind,
                &event.error_message,
                &event.error_details,
            ],
        )?;
        Ok(())
    }

    /// Newest entries first
    pub fn get_recent(&self, limit: usize) -> Result<Vec<LogEntry>> {
        self.find(&LogFilter::default(), limit)
    }

    /// Newest failures first
    pub fn get_errors(&self, limit: usize) -> Result<Vec<LogEntry>> {
        self.find(&LogFilter::errors(), limit)
    }

    /// Newest entries matching `filter` first
    pub fn find(&self, filter: &LogFilter, limit: usize) -> Result<Vec<LogEntry>> {
        let (condition, mut values) = filter.condition(None);
        values.push(Value::BigInt(limit as i64));

        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {ENTRY_COLUMNS} FROM sys_logs WHERE {condition} \
             ORDER BY timestamp DESC, id DESC LIMIT ?"
        ))?;
        let entries = stmt
            .query_map(params_from_iter(values), LogEntry::from_row)?
            .collect::<duckdb::Result<Vec<_>>>()?;
        Ok(entries)
    }

    /// Entries per event name, most frequent first
    pub fn event_counts(&self) -> Result<Vec<(String, u64)>> {
        self.counts(
            "SELECT event, COUNT(*) AS n FROM sys_logs GROUP BY event ORDER BY n DESC, event",
        )
    }

    /// Failures per wizard state, most failing state first. Failures raised
    /// outside any state are grouped under `-`.
    pub fn error_counts_by_state(&self) -> Result<Vec<(String, u64)>> {
        self.counts(
            "SELECT COALESCE(state, '-') AS s, COUNT(*) AS n FROM sys_logs \
             WHERE error_message IS NOT NULL GROUP BY s ORDER BY n DESC, s",
        )
    }

    fn counts(&self, sql: &str) -> Result<Vec<(String, u64)>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(sql)?;
        let counts = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<duckdb::Result<Vec<_>>>()?;
        Ok(counts)
    }

    pub fn count(&self) -> Result<u64> {
        let count = self
            .conn()?
            .query_row("SELECT COUNT(*) FROM sys_logs", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Delete every entry older than `timestamp_ms`
    pub fn delete_before(&self, timestamp_ms: i64) -> Result<u64> {
        self.delete_matching(&LogFilter::default(), timestamp_ms)
    }

    /// Delete entries matching `filter` that are older than `timestamp_ms`
    pub fn delete_matching(&self, filter: &LogFilter, timestamp_ms: i64) -> Result<u64> {
        let (condition, values) = filter.condition(Some(timestamp_ms));
        let deleted = self.conn()?.execute(
            &format!("DELETE FROM sys_logs WHERE {condition}"),
            params_from_iter(values),
        )?;
        Ok(deleted as u64)
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }
}

/// Apply every embedded migration not yet recorded in `sys_migrations`.
///
/// The first migration creates the bookkeeping table itself with
/// `IF NOT EXISTS`, so it runs on every open.
fn migrate(conn: &Connection) -> Result<()> {
    let Some(((bootstrap_name, bootstrap_sql), rest)) = LOG_MIGRATIONS.split_first() else {
        return Ok(());
    };
    conn.execute_batch(bootstrap_sql)?;

    let applied: HashSet<String> = {
        let mut stmt = conn.prepare("SELECT migration_name FROM sys_migrations")?;
        let names = stmt
            .query_map([], |row| row.get(0))?
            .collect::<duckdb::Result<_>>()?;
        names
    };
    if !applied.contains(*bootstrap_name) {
        conn.execute(
            "INSERT INTO sys_migrations (migration_name) VALUES (?)",
            [bootstrap_name],
        )?;
    }

    for (name, sql) in rest.iter().filter(|(name, _)| !applied.contains(*name)) {
        conn.execute_batch(&format!(
            "BEGIN TRANSACTION;\n{sql}\nINSERT INTO sys_migrations (migration_name) VALUES ('{name}');\nCOMMIT;"
        ))
        .map_err(|e| anyhow!("event log migration {name} failed: {e}"))?;
    }
    Ok(())
}

impl EventSink for LoggingService {
    fn record(&self, event: LogEvent) {
        let name = event.event.clone();
        if let Err(e) = self.log(event) {
            tracing::warn!(event = %name, "could not write event log: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn open(dir: &Path, entry_point: EntryPoint) -> LoggingService {
        LoggingService::new(dir, entry_point, "0.1.0").unwrap()
    }

    fn failure(event: &str, state: Option<&str>) -> LogEvent {
        let event = LogEvent::new(event).with_error("timeout");
        match state {
            Some(state) => event.with_state(state),
            None => event,
        }
    }

    #[test]
    fn test_migrations_apply_once() {
        let dir = tempdir().unwrap();
        let log = open(dir.path(), EntryPoint::Cli);
        assert!(log.db_path().ends_with(LOG_DB_FILE));
        log.record(LogEvent::new("session_started"));
        drop(log);

        // Reopening must not rerun the schema or lose entries
        let log = open(dir.path(), EntryPoint::Cli);
        assert_eq!(log.count().unwrap(), 1);
        let applied: u64 = log
            .conn()
            .unwrap()
            .query_row("SELECT COUNT(*) FROM sys_migrations", [], |row| row.get(0))
            .unwrap();
        assert_eq!(applied, LOG_MIGRATIONS.len() as u64);
    }

    #[test]
    fn test_entries_are_stamped() {
        let dir = tempdir().unwrap();
        let log = open(dir.path(), EntryPoint::Webhook);

        log.record(
            LogEvent::new("record_persisted")
                .with_state("awaiting-confirmation")
                .with_record_kind("income"),
        );

        let entry = &log.get_recent(10).unwrap()[0];
        assert_eq!(entry.event, "record_persisted");
        assert_eq!(entry.entry_point, "webhook");
        assert_eq!(entry.app_version, "0.1.0");
        assert_eq!(entry.platform, std::env::consts::OS);
        assert_eq!(entry.state.as_deref(), Some("awaiting-confirmation"));
        assert_eq!(entry.record_kind.as_deref(), Some("income"));
        assert!(entry.error_message.is_none());
    }

    #[test]
    fn test_ids_unique_within_a_millisecond() {
        let ids: HashSet<u64> = (0..100).map(|_| entry_id(1_700_000_000_000)).collect();
        assert_eq!(ids.len(), 100);
    }

    #[test]
    fn test_errors_only_listing() {
        let dir = tempdir().unwrap();
        let log = open(dir.path(), EntryPoint::Cli);

        log.record(LogEvent::new("session_started"));
        log.record(
            LogEvent::new("persistence_failed")
                .with_state("awaiting-confirmation")
                .with_error("sheet locked")
                .with_error_details("lancamentos.csv"),
        );

        let errors = log.get_errors(10).unwrap();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].error_message.as_deref(), Some("sheet locked"));
        assert_eq!(errors[0].error_details.as_deref(), Some("lancamentos.csv"));
        assert_eq!(log.get_recent(10).unwrap().len(), 2);
    }

    #[test]
    fn test_find_by_event_and_state() {
        let dir = tempdir().unwrap();
        let log = open(dir.path(), EntryPoint::Webhook);

        log.record(failure("delivery_failed", Some("awaiting-amount")));
        log.record(failure("delivery_failed", Some("awaiting-date")));
        log.record(LogEvent::new("session_started").with_state("awaiting-amount"));

        let by_event = LogFilter::default().with_event("delivery_failed");
        assert_eq!(log.find(&by_event, 10).unwrap().len(), 2);

        let by_state = LogFilter::default().with_state("awaiting-amount");
        assert_eq!(log.find(&by_state, 10).unwrap().len(), 2);

        let failed_at_amount = log
            .find(&LogFilter::errors().with_state("awaiting-amount"), 10)
            .unwrap();
        assert_eq!(failed_at_amount.len(), 1);
        assert_eq!(failed_at_amount[0].event, "delivery_failed");

        assert_eq!(log.find(&LogFilter::default(), 1).unwrap().len(), 1);
    }

    #[test]
    fn test_counts() {
        let dir = tempdir().unwrap();
        let log = open(dir.path(), EntryPoint::Cli);

        log.record(LogEvent::new("session_started"));
        log.record(LogEvent::new("session_started"));
        log.record(failure("persistence_failed", Some("awaiting-confirmation")));
        log.record(failure("delivery_failed", Some("awaiting-confirmation")));
        log.record(failure("delivery_failed", None));

        assert_eq!(log.count().unwrap(), 5);
        assert_eq!(
            log.event_counts().unwrap(),
            vec![
                ("delivery_failed".to_string(), 2),
                ("session_started".to_string(), 2),
                ("persistence_failed".to_string(), 1),
            ]
        );
        assert_eq!(
            log.error_counts_by_state().unwrap(),
            vec![("awaiting-confirmation".to_string(), 2), ("-".to_string(), 1)]
        );
    }

    #[test]
    fn test_delete_matching_keeps_other_events() {
        let dir = tempdir().unwrap();
        let log = open(dir.path(), EntryPoint::Cli);

        log.record(LogEvent::new("session_started"));
        log.record(LogEvent::new("session_started"));
        log.record(failure("delivery_failed", None));

        // Nothing is older than the epoch
        assert_eq!(log.delete_matching(&LogFilter::errors(), 0).unwrap(), 0);

        let later = Utc::now().timestamp_millis() + 1000;
        let started = LogFilter::default().with_event("session_started");
        assert_eq!(log.delete_matching(&started, later).unwrap(), 2);
        assert_eq!(log.get_recent(10).unwrap()[0].event, "delivery_failed");

        assert_eq!(log.delete_before(later).unwrap(), 1);
        assert_eq!(log.count().unwrap(), 0);
    }
}
