//! Recording delivery adapter
//!
//! Keeps every outbound message in memory instead of sending it. Used by the
//! tests and by hosts that forward messages themselves.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde::Serialize;

use crate::domain::result::{Error, Result};
use crate::ports::{ChoiceOption, Delivery, PicklistRow};

/// A message as it would have been sent
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum OutboundMessage {
    Text {
        to: String,
        text: String,
    },
    Choice {
        to: String,
        prompt: String,
        options: Vec<ChoiceOption>,
    },
    Picklist {
        to: String,
        prompt: String,
        button_label: String,
        rows: Vec<PicklistRow>,
    },
}

impl OutboundMessage {
    pub fn to(&self) -> &str {
        match self {
            OutboundMessage::Text { to, .. }
            | OutboundMessage::Choice { to, .. }
            | OutboundMessage::Picklist { to, .. } => to,
        }
    }

    /// Body text regardless of message type
    pub fn body(&self) -> &str {
        match self {
            OutboundMessage::Text { text, .. } => text,
            OutboundMessage::Choice { prompt, .. } | OutboundMessage::Picklist { prompt, .. } => {
                prompt
            }
        }
    }

    /// Ids the user can tap in reply; empty for plain text
    pub fn option_ids(&self) -> Vec<String> {
        match self {
            OutboundMessage::Text { .. } => Vec::new(),
            OutboundMessage::Choice { options, .. } => {
                options.iter().map(|o| o.id.clone()).collect()
            }
            OutboundMessage::Picklist { rows, .. } => rows.iter().map(|r| r.id.clone()).collect(),
        }
    }
}

#[derive(Default)]
pub struct RecordingDelivery {
    sent: Mutex<Vec<OutboundMessage>>,
    fail_sends: AtomicBool,
}

impl RecordingDelivery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent sends fail (or succeed again)
    pub fn set_fail_sends(&self, fail: bool) {
        self.fail_sends.store(fail, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<OutboundMessage> {
        self.sent.lock().map(|m| m.clone()).unwrap_or_default()
    }

    pub fn last(&self) -> Option<OutboundMessage> {
        self.sent.lock().ok().and_then(|m| m.last().cloned())
    }

    pub fn clear(&self) {
        if let Ok(mut sent) = self.sent.lock() {
            sent.clear();
        }
    }

    fn push(&self, message: OutboundMessage) -> Result<()> {
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(Error::delivery(format!("could not reach {}", message.to())));
        }
        self.sent
            .lock()
            .map_err(|e| Error::delivery(format!("Lock poisoned: {}", e)))?
            .push(message);
        Ok(())
    }
}

#[async_trait]
impl Delivery for RecordingDelivery {
    async fn send_text(&self, to: &str, text: &str) -> Result<()> {
        self.push(OutboundMessage::Text {
            to: to.to_string(),
            text: text.to_string(),
        })
    }

    async fn send_choice(&self, to: &str, prompt: &str, options: &[ChoiceOption]) -> Result<()> {
        self.push(OutboundMessage::Choice {
            to: to.to_string(),
            prompt: prompt.to_string(),
            options: options.to_vec(),
        })
    }

    async fn send_picklist(
        &self,
        to: &str,
        prompt: &str,
        button_label: &str,
        rows: &[PicklistRow],
    ) -> Result<()> {
        self.push(OutboundMessage::Picklist {
            to: to.to_string(),
            prompt: prompt.to_string(),
            button_label: button_label.to_string(),
            rows: rows.to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_records_messages_in_order() {
        let delivery = RecordingDelivery::new();
        delivery.send_text("u", "oi").await.unwrap();
        delivery
            .send_choice(
                "u",
                "Escolha",
                &[ChoiceOption {
                    id: "kind:income".to_string(),
                    label: "Receita".to_string(),
                }],
            )
            .await
            .unwrap();

        let sent = delivery.sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].body(), "oi");
        assert_eq!(delivery.last().unwrap().option_ids(), vec!["kind:income"]);
    }

    #[tokio::test]
    async fn test_failing_sends_are_not_recorded() {
        let delivery = RecordingDelivery::new();
        delivery.set_fail_sends(true);
        assert!(delivery.send_text("u", "oi").await.is_err());
        assert!(delivery.sent().is_empty());
    }
}
