//! Adapter implementations
//!
//! Adapters implement the port traits with concrete technologies:
//! - CSV file for the RecordStore port (the spreadsheet)
//! - In-memory maps for the SessionStore port, and a RecordStore for tests
//! - Recording delivery for tests and hosts that relay messages themselves
//! - System and fixed clocks

pub mod clock;
pub mod csv_store;
pub mod delivery;
pub mod memory;

pub use clock::{FixedClock, SystemClock};
pub use csv_store::CsvRecordStore;
pub use delivery::{OutboundMessage, RecordingDelivery};
pub use memory::{InMemoryRecordStore, InMemorySessionStore};
