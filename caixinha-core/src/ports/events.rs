//! Event sink port - privacy-safe usage events

use crate::services::LogEvent;

/// Receives wizard events for the event log.
///
/// Recording must never fail the conversation, so implementations swallow
/// their own errors.
pub trait EventSink: Send + Sync {
    fn record(&self, event: LogEvent);
}
