//! Inbound chat events, as produced by the transport

use serde::{Deserialize, Serialize};

/// How the user answered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    /// Typed message
    Text,
    /// Tap on a button or picklist row; the payload is the option id
    Choice,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InboundEvent {
    pub sender_id: String,
    pub kind: EventKind,
    pub payload: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub choice_title: Option<String>,
}

impl InboundEvent {
    pub fn text(sender_id: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            sender_id: sender_id.into(),
            kind: EventKind::Text,
            payload: payload.into(),
            choice_title: None,
        }
    }

    pub fn choice(sender_id: impl Into<String>, option_id: impl Into<String>) -> Self {
        Self {
            sender_id: sender_id.into(),
            kind: EventKind::Choice,
            payload: option_id.into(),
            choice_title: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.choice_title = Some(title.into());
        self
    }

    pub fn is_text(&self) -> bool {
        self.kind == EventKind::Text
    }
}
