use dexa_core::domain::Message;
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Default, Serialize, Deserialize, Validate)]
pub struct CreateChatRequest {
    #[validate(length(max = 255))]
    pub title: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct RenameChatRequest {
    #[validate(length(max = 255))]
    pub title: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct SendMessageRequest {
    #[validate(length(min = 1, max = 8000))]
    pub content: String,
}

/// Both halves of one chat turn.
#[derive(Debug, Serialize, Deserialize)]
pub struct SendMessageResponse {
    pub user_message: Message,
    pub assistant_message: Message,
}
