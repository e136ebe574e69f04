//! Clock port

use chrono::{DateTime, NaiveDate, Utc};

/// Source of "now", so dates like "hoje" and report windows are testable
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    /// Calendar date in the user's timezone
    fn today(&self) -> NaiveDate;
}
