// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::Page;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageSender {
    User,
    Bot,
}

impl MessageSender {
    pub const fn label(self) -> &'static str {
        match self {
            Self::User => "you",
            Self::Bot => "bot",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub content: String,
    pub sender: MessageSender,
    #[serde(with = "time::serde::rfc3339")]
    pub sent_at: OffsetDateTime,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self::at(MessageSender::User, content, OffsetDateTime::now_utc())
    }

    pub fn bot(content: impl Into<String>) -> Self {
        Self::at(MessageSender::Bot, content, OffsetDateTime::now_utc())
    }

    pub fn at(sender: MessageSender, content: impl Into<String>, sent_at: OffsetDateTime) -> Self {
        Self {
            content: content.into(),
            sender,
            sent_at,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupTarget {
    TaskDetail,
    Conversation,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InFlightLookup {
    pub request_id: u64,
    pub question: String,
    pub target: LookupTarget,
    pub origin: Page,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LookupPhase {
    #[default]
    Idle,
    Loading(InFlightLookup),
    Resolved {
        request_id: u64,
    },
    Failed {
        request_id: u64,
        error: String,
    },
}

impl LookupPhase {
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading(_))
    }

    pub fn in_flight(&self) -> Option<&InFlightLookup> {
        match self {
            Self::Loading(lookup) => Some(lookup),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ChatMessage, LookupPhase, MessageSender};
    use anyhow::Result;
    use time::OffsetDateTime;

    #[test]
    fn chat_message_serializes_sender_in_lowercase() -> Result<()> {
        let message = ChatMessage::at(MessageSender::Bot, "8 tarefas", OffsetDateTime::UNIX_EPOCH);
        let encoded = serde_json::to_string(&message)?;
        assert!(encoded.contains("\"sender\":\"bot\""));
        assert!(encoded.contains("1970-01-01T00:00:00Z"));
        Ok(())
    }

    #[test]
    fn idle_phase_is_not_loading() {
        assert!(!LookupPhase::default().is_loading());
        assert!(LookupPhase::default().in_flight().is_none());
    }
}
