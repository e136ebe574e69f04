//! Caixinha Core - chat wizard for income and expense records
//!
//! This crate implements the core domain logic following hexagonal architecture:
//!
//! - **domain**: Core entities (TransactionRecord, Session, WizardState, option tables)
//! - **parsers**: Free-text field parsers and keyword classifiers
//! - **ports**: Trait definitions for collaborators (Delivery, RecordStore, SessionStore, Clock)
//! - **services**: Business logic orchestration (wizard, summary, event log)
//! - **adapters**: Concrete implementations (CSV sheet, in-memory stores, clocks)

pub mod adapters;
pub mod config;
pub mod domain;
pub mod log_migrations;
pub mod parsers;
pub mod ports;
pub mod services;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;

use adapters::{CsvRecordStore, InMemorySessionStore, SystemClock};
use config::Config;
use ports::{Delivery, EventSink};
use services::{SummaryService, WizardService};

// Re-export commonly used types at crate root
pub use domain::result::Error;
pub use domain::{InboundEvent, Kind, RecordRow, Session, TransactionRecord, WizardState};
pub use services::{Outcome, Period, Summary};

/// Main context for Caixinha operations
///
/// Wires the configured record sheet, the session store and the clock
/// together. Delivery is supplied by the caller, since it depends on the
/// transport.
pub struct CaixinhaContext {
    pub config: Config,
    pub dir: PathBuf,
    pub records: Arc<CsvRecordStore>,
    pub sessions: Arc<InMemorySessionStore>,
    pub clock: Arc<SystemClock>,
    pub summary_service: SummaryService,
}

impl CaixinhaContext {
    pub fn new(dir: &Path) -> Result<Self> {
        let config = Config::load(dir)?;

        let records = Arc::new(CsvRecordStore::new(config.records_path(dir)));
        let sessions = Arc::new(InMemorySessionStore::new());
        let clock = Arc::new(SystemClock::new(config.offset()?));
        let summary_service = SummaryService::new(records.clone(), clock.clone());

        Ok(Self {
            config,
            dir: dir.to_path_buf(),
            records,
            sessions,
            clock,
            summary_service,
        })
    }

    /// A wizard talking through `delivery`, reporting to `events` when given
    pub fn wizard(
        &self,
        delivery: Arc<dyn Delivery>,
        events: Option<Arc<dyn EventSink>>,
    ) -> WizardService {
        let wizard = WizardService::new(
            self.sessions.clone(),
            delivery,
            self.records.clone(),
            self.clock.clone(),
        )
        .with_currency(self.config.currency.clone());

        match events {
            Some(events) => wizard.with_events(events),
            None => wizard,
        }
    }
}
