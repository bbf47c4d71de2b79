//! Append-only battle message history
//!
//! The log keeps every message for the whole battle. Trimming to a visible
//! window is the reader's job, via [`MessageLog::last`].

use serde::{Deserialize, Serialize};

use crate::core::types::{MessageId, Millis};

/// One human-readable line of battle narration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleMessage {
    pub id: MessageId,
    pub text: String,
    /// Virtual clock reading when the message was written
    pub timestamp: Millis,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageLog {
    messages: Vec<BattleMessage>,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, text: impl Into<String>, timestamp: Millis) -> MessageId {
        let id = MessageId::new();
        let text = text.into();
        tracing::debug!(at = timestamp, "{}", text);
        self.messages.push(BattleMessage {
            id,
            text,
            timestamp,
        });
        id
    }

    /// The most recent `n` messages, oldest first
    pub fn last(&self, n: usize) -> &[BattleMessage] {
        let start = self.messages.len().saturating_sub(n);
        &self.messages[start..]
    }

    pub fn all(&self) -> &[BattleMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.messages.iter().map(|m| m.text.as_str())
    }

    /// Whether any message so far reads exactly `text`
    pub fn contains(&self, text: &str) -> bool {
        self.texts().any(|t| t == text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_keeps_full_history() {
        let mut log = MessageLog::new();
        for i in 0..12 {
            log.push(format!("line {}", i), i);
        }
        assert_eq!(log.len(), 12);
        assert_eq!(log.all()[0].text, "line 0");
    }

    #[test]
    fn test_last_returns_tail_in_order() {
        let mut log = MessageLog::new();
        log.push("a", 0);
        log.push("b", 10);
        log.push("c", 20);

        let tail: Vec<&str> = log.last(2).iter().map(|m| m.text.as_str()).collect();
        assert_eq!(tail, vec!["b", "c"]);
        assert_eq!(log.last(2)[1].timestamp, 20);
    }

    #[test]
    fn test_last_larger_than_log() {
        let mut log = MessageLog::new();
        log.push("only", 0);
        assert_eq!(log.last(5).len(), 1);
        assert!(MessageLog::new().last(3).is_empty());
    }

    #[test]
    fn test_message_ids_unique() {
        let mut log = MessageLog::new();
        let a = log.push("x", 0);
        let b = log.push("x", 0);
        assert_ne!(a, b);
    }
}
