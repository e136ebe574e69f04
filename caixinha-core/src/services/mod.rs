//! Service layer - business logic orchestration
//!
//! Services coordinate domain logic and port interactions: the chat wizard,
//! period summaries, prompt rendering and the event log.

pub mod logging;
mod prompts;
mod summary;
mod wizard;

pub use logging::{EntryPoint, LogEntry, LogEvent, LogFilter, LoggingService};
pub use prompts::{confirmation_summary, prompt_for, Notice, Prompt, CANCELLED_MESSAGE};
pub use summary::{
    aggregate, format_money, format_percent, CategoryTotal, KindTotals, Period, Summary,
    SummaryService,
};
pub use wizard::{Outcome, WizardService};
