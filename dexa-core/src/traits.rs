use async_trait::async_trait;

use crate::completion::{Completion, CompletionRequest};
use crate::domain::{Chat, ChatId, Dataset, DatasetId, Message, QueryRecord, UserId};
use crate::error::Result;

/// Persistence for uploaded dataset metadata.
#[async_trait]
pub trait DatasetStore: Send + Sync {
    async fn insert_dataset(&self, dataset: &Dataset) -> Result<Dataset>;
    async fn get_dataset(&self, id: &DatasetId) -> Result<Option<Dataset>>;
    /// Datasets owned by `user_id`, newest first.
    async fn list_datasets(&self, user_id: &UserId, limit: i64, offset: i64) -> Result<Vec<Dataset>>;
    /// Removes the dataset together with its chats, messages and query records.
    async fn delete_dataset(&self, id: &DatasetId) -> Result<bool>;
    async fn ping(&self) -> Result<()>;
}

/// Persistence for chat threads and their messages.
#[async_trait]
pub trait ChatStore: Send + Sync {
    async fn create_chat(&self, chat: &Chat) -> Result<Chat>;
    async fn get_chat(&self, id: &ChatId) -> Result<Option<Chat>>;
    /// Chats of one user on one dataset, newest first.
    async fn list_chats(&self, dataset_id: &DatasetId, user_id: &UserId) -> Result<Vec<Chat>>;
    async fn rename_chat(&self, id: &ChatId, title: Option<String>) -> Result<Chat>;
    async fn delete_chat(&self, id: &ChatId) -> Result<bool>;
    /// Appends a message; its timestamp never precedes the chat's newest message.
    async fn append_message(&self, message: Message) -> Result<Message>;
    /// Messages in creation order.
    async fn list_messages(&self, chat_id: &ChatId) -> Result<Vec<Message>>;
}

/// Append-only history of analyze requests.
#[async_trait]
pub trait QueryLog: Send + Sync {
    async fn record_query(&self, record: &QueryRecord) -> Result<QueryRecord>;
    /// Records for a dataset, newest first.
    async fn list_queries(
        &self,
        dataset_id: &DatasetId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<QueryRecord>>;
}

/// Raw file storage keyed by path-like strings.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn put(&self, key: &str, data: Vec<u8>, content_type: Option<&str>) -> Result<()>;
    async fn get(&self, key: &str) -> Result<Vec<u8>>;
    async fn delete(&self, key: &str) -> Result<()>;
}

/// A chat-completion backend.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> Result<Completion>;
}
