//! Conversation log for chat-driven edits.

use crate::image::ImageRef;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Represents the role of a message in the edit conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    /// Instruction typed by the user.
    User,
    /// Reply from the image model.
    Assistant,
}

/// A single message in the edit conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: Uuid,
    pub role: ChatRole,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<ImageRef>,
    pub created_at: DateTime<Utc>,
}

impl ChatMessage {
    pub fn new(role: ChatRole, text: impl Into<String>, image: Option<ImageRef>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            text: text.into(),
            image,
            created_at: Utc::now(),
        }
    }
}

/// Append-only message log. Messages are never edited or reordered.
#[derive(Debug, Clone, Default)]
pub struct ChatLog {
    messages: Vec<ChatMessage>,
}

impl ChatLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_user(&mut self, text: impl Into<String>) -> &ChatMessage {
        self.push(ChatMessage::new(ChatRole::User, text, None))
    }

    pub fn push_assistant(
        &mut self,
        text: impl Into<String>,
        image: Option<ImageRef>,
    ) -> &ChatMessage {
        self.push(ChatMessage::new(ChatRole::Assistant, text, image))
    }

    fn push(&mut self, message: ChatMessage) -> &ChatMessage {
        self.messages.push(message);
        &self.messages[self.messages.len() - 1]
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
