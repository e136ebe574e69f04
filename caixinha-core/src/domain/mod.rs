//! Core domain entities
//!
//! Pure data structures with validation logic: the transaction record being
//! collected, the wizard session around it, inbound events and the option
//! tables the wizard offers. No I/O here.

mod event;
mod record;
mod session;
pub mod result;
pub mod vocab;

pub use event::{EventKind, InboundEvent};
pub use record::{Field, Kind, RecordRow, TransactionRecord, DEFAULT_CURRENCY};
pub use session::{Session, Stage, WizardState};
