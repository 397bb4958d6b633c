use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use validator::Validate;

use super::ids::{ChatId, DatasetId, MessageId, UserId};
use crate::error::CoreError;

/// A per-dataset, per-user conversation thread.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct Chat {
    pub id: ChatId,
    pub dataset_id: DatasetId,
    pub user_id: UserId,
    #[validate(length(max = 255))]
    pub title: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Chat {
    pub fn new(dataset_id: DatasetId, user_id: UserId, title: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: ChatId::new(),
            dataset_id,
            user_id,
            title,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_owned_by(&self, user_id: &UserId) -> bool {
        &self.user_id == user_id
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MessageRole {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(MessageRole::User),
            "assistant" => Ok(MessageRole::Assistant),
            other => Err(CoreError::Serialization(format!("unknown message role '{}'", other))),
        }
    }
}

/// A message inside a chat. Never mutated once appended.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub chat_id: ChatId,
    pub user_id: UserId,
    pub role: MessageRole,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn new(chat_id: ChatId, user_id: UserId, role: MessageRole, content: String) -> Self {
        Self {
            id: MessageId::new(),
            chat_id,
            user_id,
            role,
            content,
            created_at: Utc::now(),
        }
    }

    /// Keeps the chat's creation-time order when the clock is behind the
    /// newest stored message.
    pub fn not_before(mut self, previous: Option<DateTime<Utc>>) -> Self {
        if let Some(previous) = previous {
            if self.created_at < previous {
                self.created_at = previous;
            }
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn message_role_round_trips_as_lowercase() {
        assert_eq!("user".parse::<MessageRole>().unwrap(), MessageRole::User);
        assert_eq!(MessageRole::Assistant.to_string(), "assistant");
        assert!("system".parse::<MessageRole>().is_err());
    }

    #[test]
    fn not_before_clamps_to_previous_timestamp() {
        let chat = ChatId::new();
        let user = UserId::new();
        let future = Utc::now() + Duration::seconds(30);

        let message = Message::new(chat, user, MessageRole::User, "hi".into()).not_before(Some(future));
        assert_eq!(message.created_at, future);

        let past = Utc::now() - Duration::seconds(30);
        let message = Message::new(chat, user, MessageRole::User, "hi".into()).not_before(Some(past));
        assert!(message.created_at > past);
    }
}
