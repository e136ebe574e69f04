//! Port definitions (hexagonal architecture)
//!
//! Ports define the interfaces for external collaborators. The wizard depends
//! only on these traits: message delivery, the record store, the session
//! store, the clock and the event log.

mod clock;
mod delivery;
mod events;
mod record_store;
mod session_store;

pub use clock::Clock;
pub use delivery::{ChoiceOption, Delivery, PicklistRow, MAX_CHOICE_OPTIONS, MAX_PICKLIST_ROWS};
pub use events::EventSink;
pub use record_store::RecordStore;
pub use session_store::SessionStore;
