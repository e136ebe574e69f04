//! Session store port

use async_trait::async_trait;

use crate::domain::result::Result;
use crate::domain::Session;

/// Keyed storage for in-flight wizard sessions, one per user
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self, user_id: &str) -> Result<Option<Session>>;

    /// Insert or replace
    async fn put(&self, user_id: &str, session: Session) -> Result<()>;

    /// Remove; deleting a missing session is not an error
    async fn delete(&self, user_id: &str) -> Result<()>;
}
