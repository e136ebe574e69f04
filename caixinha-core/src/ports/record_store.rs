//! Record store port - the spreadsheet behind finalized records

use async_trait::async_trait;

use crate::domain::result::Result;
use crate::domain::{RecordRow, TransactionRecord};

#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Append a finalized record. Either the whole row is written or an
    /// error is returned.
    async fn append_record(&self, record: &TransactionRecord) -> Result<()>;

    /// Every stored row, with columns mapped to the canonical names
    /// whatever the backing sheet calls them
    async fn list_records(&self) -> Result<Vec<RecordRow>>;
}
