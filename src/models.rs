// src/models.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sender {
    User,
    Bot,
}

/// Opaque reference to an element of a message list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MessageHandle(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Text,
    /// The "typing" indicator shown while an answer is pending.
    Placeholder,
}

/// One entry in the message list.
///
/// `timestamp` is `None` while a streamed bot message is still growing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub handle: MessageHandle,
    pub sender: Sender,
    pub kind: MessageKind,
    pub text: String,
    pub timestamp: Option<String>,
}

impl Message {
    pub fn is_placeholder(&self) -> bool {
        self.kind == MessageKind::Placeholder
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Online,
    Offline,
}

impl ConnectionStatus {
    pub fn label(self) -> &'static str {
        match self {
            ConnectionStatus::Online => "Online",
            ConnectionStatus::Offline => "Offline",
        }
    }
}

/// Input-side state of a chat session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    pub draft_input: String,
    pub is_streaming_mode: bool,
    pub is_processing: bool,
}

impl SessionState {
    pub fn new(is_streaming_mode: bool) -> Self {
        Self {
            is_streaming_mode,
            ..Self::default()
        }
    }

    /// Whether a submit would go through right now.
    pub fn can_send(&self) -> bool {
        !self.is_processing && !self.draft_input.trim().is_empty()
    }
}

/// Logs details of each call to the answer service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiCallLog {
    pub timestamp: DateTime<Utc>,
    pub endpoint: String,
    pub request_summary: String,
    /// 0 when no response was received.
    pub response_status: u16,
    pub response_time_ms: u128,
}
