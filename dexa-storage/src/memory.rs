//! In-process backend used when no database is configured, and by tests.
//!
//! One [`MemoryStore`] owns every table so that deleting a dataset or chat
//! can cascade the same way the Postgres foreign keys do.

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use dexa_core::domain::{Chat, ChatId, Dataset, DatasetId, Message, QueryRecord, UserId};
use dexa_core::{BlobStore, ChatStore, CoreError, DatasetStore, QueryLog, Result};

/// Insertion counter; breaks ties between equal timestamps.
type Seq = u64;

#[derive(Default)]
pub struct MemoryStore {
    seq: AtomicU64,
    datasets: DashMap<DatasetId, (Seq, Dataset)>,
    chats: DashMap<ChatId, (Seq, Chat)>,
    messages: DashMap<ChatId, Vec<Message>>,
    queries: DashMap<DatasetId, Vec<(Seq, QueryRecord)>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_seq(&self) -> Seq {
        self.seq.fetch_add(1, Ordering::Relaxed)
    }

    fn remove_chat_cascade(&self, id: &ChatId) -> bool {
        self.messages.remove(id);
        self.chats.remove(id).is_some()
    }
}

fn page<T>(items: Vec<T>, limit: i64, offset: i64) -> Vec<T> {
    items
        .into_iter()
        .skip(offset.max(0) as usize)
        .take(limit.max(0) as usize)
        .collect()
}

#[async_trait]
impl DatasetStore for MemoryStore {
    async fn insert_dataset(&self, dataset: &Dataset) -> Result<Dataset> {
        if self.datasets.contains_key(&dataset.id) {
            return Err(CoreError::Database(format!("duplicate dataset id {}", dataset.id)));
        }
        self.datasets
            .insert(dataset.id, (self.next_seq(), dataset.clone()));
        Ok(dataset.clone())
    }

    async fn get_dataset(&self, id: &DatasetId) -> Result<Option<Dataset>> {
        Ok(self.datasets.get(id).map(|entry| entry.value().1.clone()))
    }

    async fn list_datasets(&self, user_id: &UserId, limit: i64, offset: i64) -> Result<Vec<Dataset>> {
        let mut owned: Vec<(Seq, Dataset)> = self
            .datasets
            .iter()
            .filter(|entry| entry.value().1.is_owned_by(user_id))
            .map(|entry| entry.value().clone())
            .collect();

        owned.sort_by(|(a_seq, a), (b_seq, b)| {
            b.created_at.cmp(&a.created_at).then(b_seq.cmp(a_seq))
        });

        let datasets = owned
            .into_iter()
            .map(|(_, mut dataset)| {
                dataset.full_content = None;
                dataset
            })
            .collect();

        Ok(page(datasets, limit, offset))
    }

    async fn delete_dataset(&self, id: &DatasetId) -> Result<bool> {
        if self.datasets.remove(id).is_none() {
            return Ok(false);
        }

        let chat_ids: Vec<ChatId> = self
            .chats
            .iter()
            .filter(|entry| &entry.value().1.dataset_id == id)
            .map(|entry| *entry.key())
            .collect();
        for chat_id in &chat_ids {
            self.remove_chat_cascade(chat_id);
        }
        self.queries.remove(id);

        tracing::debug!(dataset_id = %id, chats = chat_ids.len(), "Dataset removed with dependents");
        Ok(true)
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

#[async_trait]
impl ChatStore for MemoryStore {
    async fn create_chat(&self, chat: &Chat) -> Result<Chat> {
        if !self.datasets.contains_key(&chat.dataset_id) {
            return Err(CoreError::NotFound(format!("Dataset {} not found", chat.dataset_id)));
        }
        self.chats.insert(chat.id, (self.next_seq(), chat.clone()));
        Ok(chat.clone())
    }

    async fn get_chat(&self, id: &ChatId) -> Result<Option<Chat>> {
        Ok(self.chats.get(id).map(|entry| entry.value().1.clone()))
    }

    async fn list_chats(&self, dataset_id: &DatasetId, user_id: &UserId) -> Result<Vec<Chat>> {
        let mut chats: Vec<(Seq, Chat)> = self
            .chats
            .iter()
            .filter(|entry| {
                let chat = &entry.value().1;
                &chat.dataset_id == dataset_id && chat.is_owned_by(user_id)
            })
            .map(|entry| entry.value().clone())
            .collect();

        chats.sort_by(|(a_seq, a), (b_seq, b)| {
            b.created_at.cmp(&a.created_at).then(b_seq.cmp(a_seq))
        });

        Ok(chats.into_iter().map(|(_, chat)| chat).collect())
    }

    async fn rename_chat(&self, id: &ChatId, title: Option<String>) -> Result<Chat> {
        let mut entry = self
            .chats
            .get_mut(id)
            .ok_or_else(|| CoreError::NotFound(format!("Chat {} not found", id)))?;

        let chat = &mut entry.value_mut().1;
        chat.title = title;
        chat.updated_at = Utc::now();
        Ok(chat.clone())
    }

    async fn delete_chat(&self, id: &ChatId) -> Result<bool> {
        Ok(self.remove_chat_cascade(id))
    }

    async fn append_message(&self, message: Message) -> Result<Message> {
        {
            let mut chat = self
                .chats
                .get_mut(&message.chat_id)
                .ok_or_else(|| CoreError::NotFound(format!("Chat {} not found", message.chat_id)))?;
            chat.value_mut().1.updated_at = Utc::now();
        }

        let mut thread = self.messages.entry(message.chat_id).or_default();
        let previous = thread.last().map(|m| m.created_at);
        let message = message.not_before(previous);
        thread.push(message.clone());
        Ok(message)
    }

    async fn list_messages(&self, chat_id: &ChatId) -> Result<Vec<Message>> {
        // Appends keep each thread sorted.
        Ok(self
            .messages
            .get(chat_id)
            .map(|thread| thread.value().clone())
            .unwrap_or_default())
    }
}

#[async_trait]
impl QueryLog for MemoryStore {
    async fn record_query(&self, record: &QueryRecord) -> Result<QueryRecord> {
        if !self.datasets.contains_key(&record.dataset_id) {
            return Err(CoreError::NotFound(format!("Dataset {} not found", record.dataset_id)));
        }
        let seq = self.next_seq();
        self.queries
            .entry(record.dataset_id)
            .or_default()
            .push((seq, record.clone()));
        Ok(record.clone())
    }

    async fn list_queries(
        &self,
        dataset_id: &DatasetId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<QueryRecord>> {
        let mut records = self
            .queries
            .get(dataset_id)
            .map(|entry| entry.value().clone())
            .unwrap_or_default();

        records.sort_by(|(a_seq, a), (b_seq, b)| {
            b.created_at.cmp(&a.created_at).then(b_seq.cmp(a_seq))
        });

        Ok(page(records.into_iter().map(|(_, r)| r).collect(), limit, offset))
    }
}

/// Blob storage backed by a map, keyed like the S3 bucket.
#[derive(Default)]
pub struct MemoryBlobStore {
    objects: DashMap<String, Vec<u8>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.objects.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(&self, key: &str, data: Vec<u8>, _content_type: Option<&str>) -> Result<()> {
        self.objects.insert(key.to_string(), data);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>> {
        self.objects
            .get(key)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| CoreError::NotFound(format!("Object '{}' not found", key)))
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.objects.remove(key);
        Ok(())
    }
}
