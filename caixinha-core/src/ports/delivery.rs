//! Delivery port - outbound chat messages

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::result::Result;

/// Most buttons a choice message can carry
pub const MAX_CHOICE_OPTIONS: usize = 3;

/// Most rows a picklist message can carry
pub const MAX_PICKLIST_ROWS: usize = 10;

/// A reply button
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceOption {
    pub id: String,
    pub label: String,
}

/// A row of a picklist
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PicklistRow {
    pub id: String,
    pub label: String,
    pub description: String,
}

/// Outbound message channel
///
/// Implementations render and transmit the message. Truncating labels that
/// are too long for the channel is their job, not the caller's.
#[async_trait]
pub trait Delivery: Send + Sync {
    /// Plain text message
    async fn send_text(&self, to: &str, text: &str) -> Result<()>;

    /// Prompt with up to [`MAX_CHOICE_OPTIONS`] buttons
    async fn send_choice(&self, to: &str, prompt: &str, options: &[ChoiceOption]) -> Result<()>;

    /// Prompt with a button that opens up to [`MAX_PICKLIST_ROWS`] rows
    async fn send_picklist(
        &self,
        to: &str,
        prompt: &str,
        button_label: &str,
        rows: &[PicklistRow],
    ) -> Result<()>;
}
