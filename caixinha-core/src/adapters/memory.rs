//! In-memory session and record stores
//!
//! The session store is the production default: sessions are not meant to
//! outlive the process. The record store backs tests and the demo chat.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};

use crate::domain::result::{Error, Result};
use crate::domain::{RecordRow, Session, TransactionRecord};
use crate::ports::{RecordStore, SessionStore};

/// Sessions keyed by user id
#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<String, Session>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of users with an open session
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    /// Drop every session matching `stale`, returning how many went away.
    /// Sessions never expire on their own; hosts that want a timeout call
    /// this from their own scheduler.
    pub async fn purge<F>(&self, stale: F) -> usize
    where
        F: Fn(&Session) -> bool,
    {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, session| !stale(session));
        before - sessions.len()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get(&self, user_id: &str) -> Result<Option<Session>> {
        Ok(self.sessions.read().await.get(user_id).cloned())
    }

    async fn put(&self, user_id: &str, session: Session) -> Result<()> {
        self.sessions
            .write()
            .await
            .insert(user_id.to_string(), session);
        Ok(())
    }

    async fn delete(&self, user_id: &str) -> Result<()> {
        self.sessions.write().await.remove(user_id);
        Ok(())
    }
}

/// Records kept in a vector, with a switch to simulate a failing sheet
#[derive(Default)]
pub struct InMemoryRecordStore {
    rows: Mutex<Vec<RecordRow>>,
    fail_writes: AtomicBool,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with historical rows already stored
    pub fn with_rows(rows: Vec<RecordRow>) -> Self {
        Self {
            rows: Mutex::new(rows),
            fail_writes: AtomicBool::new(false),
        }
    }

    /// Make subsequent appends fail (or succeed again)
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub async fn rows(&self) -> Vec<RecordRow> {
        self.rows.lock().await.clone()
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn append_record(&self, record: &TransactionRecord) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::persistence("sheet unavailable"));
        }
        self.rows.lock().await.push(record.to_row());
        Ok(())
    }

    async fn list_records(&self) -> Result<Vec<RecordRow>> {
        Ok(self.rows.lock().await.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::WizardState;

    #[tokio::test]
    async fn test_session_roundtrip() {
        let store = InMemorySessionStore::new();
        assert!(store.get("u1").await.unwrap().is_none());

        store.put("u1", Session::menu()).await.unwrap();
        assert_eq!(
            store.get("u1").await.unwrap().map(|s| s.state),
            Some(WizardState::StartMenu)
        );

        store.delete("u1").await.unwrap();
        store.delete("u1").await.unwrap();
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_purge() {
        let store = InMemorySessionStore::new();
        store.put("a", Session::menu()).await.unwrap();
        store.put("b", Session::reporting()).await.unwrap();

        let removed = store
            .purge(|s| s.state == WizardState::AwaitingReportPeriod)
            .await;
        assert_eq!(removed, 1);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_failing_record_store() {
        let store = InMemoryRecordStore::new();
        let record = TransactionRecord::new(chrono::Utc::now(), "BRL");

        store.set_fail_writes(true);
        assert!(store.append_record(&record).await.is_err());
        store.set_fail_writes(false);
        store.append_record(&record).await.unwrap();
        assert_eq!(store.list_records().await.unwrap().len(), 1);
    }
}
