use crate::reaction::Reaction;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Delivery status. Ordered: a message only ever moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    Sent,
    Delivered,
    Read,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    #[default]
    Text,
    Image,
    File,
    Voice,
}

/// Snapshot of the message being replied to, taken when the reply is composed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplyRef {
    pub id: String,
    pub text: String,
    pub sender_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: String,
    pub sender_id: String,
    pub text: String,
    pub timestamp: DateTime<Utc>,
    pub status: MessageStatus,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reactions: Vec<Reaction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<ReplyRef>,
    #[serde(default, rename = "type")]
    pub kind: MessageKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
}

impl ChatMessage {
    /// A freshly sent text message.
    pub fn text(id: impl Into<String>, sender_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            sender_id: sender_id.into(),
            text: text.into(),
            timestamp: Utc::now(),
            status: MessageStatus::Sent,
            reactions: Vec::new(),
            reply_to: None,
            kind: MessageKind::Text,
            file_url: None,
            file_name: None,
        }
    }

    pub fn with_reply(mut self, reply_to: Option<ReplyRef>) -> Self {
        self.reply_to = reply_to;
        self
    }

    pub fn is_from(&self, user_id: &str) -> bool {
        self.sender_id == user_id
    }

    /// Snapshot this message for a reply, labelling the sender with `sender_name`.
    pub fn reply_ref(&self, sender_name: impl Into<String>) -> ReplyRef {
        ReplyRef {
            id: self.id.clone(),
            text: self.text.clone(),
            sender_name: sender_name.into(),
        }
    }

    /// Move the status forward. Returns false if `status` is not ahead of the current one.
    pub fn advance_status(&mut self, status: MessageStatus) -> bool {
        if status > self.status {
            self.status = status;
            true
        } else {
            false
        }
    }
}
