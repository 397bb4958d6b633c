use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dexa_core::domain::{Chat, ChatId, DatasetId, Message, MessageId, MessageRole, UserId};
use dexa_core::{ChatStore, CoreError, Result};
use sqlx::{postgres::PgRow, PgPool, Row};
use uuid::Uuid;

/// Chats and their messages. Both tables cascade from `datasets`.
pub struct ChatRepository {
    pool: PgPool,
}

impl ChatRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_chat(row: PgRow) -> Result<Chat> {
        let id: Uuid = row.try_get("id")?;
        let dataset_id: Uuid = row.try_get("dataset_id")?;
        let user_id: Uuid = row.try_get("user_id")?;
        let created_at: DateTime<Utc> = row.try_get("created_at")?;
        let updated_at: DateTime<Utc> = row.try_get("updated_at")?;

        Ok(Chat {
            id: ChatId(id),
            dataset_id: DatasetId(dataset_id),
            user_id: UserId(user_id),
            title: row.try_get("title")?,
            created_at,
            updated_at,
        })
    }

    fn row_to_message(row: PgRow) -> Result<Message> {
        let id: Uuid = row.try_get("id")?;
        let chat_id: Uuid = row.try_get("chat_id")?;
        let user_id: Uuid = row.try_get("user_id")?;
        let role: String = row.try_get("role")?;

        Ok(Message {
            id: MessageId(id),
            chat_id: ChatId(chat_id),
            user_id: UserId(user_id),
            role: role.parse::<MessageRole>()?,
            content: row.try_get("content")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

#[async_trait]
impl ChatStore for ChatRepository {
    async fn create_chat(&self, chat: &Chat) -> Result<Chat> {
        let row = sqlx::query(
            r#"
            INSERT INTO dataset_chats (id, dataset_id, user_id, title, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, dataset_id, user_id, title, created_at, updated_at
            "#,
        )
        .bind(chat.id.0)
        .bind(chat.dataset_id.0)
        .bind(chat.user_id.0)
        .bind(&chat.title)
        .bind(chat.created_at)
        .bind(chat.updated_at)
        .fetch_one(&self.pool)
        .await?;

        Self::row_to_chat(row)
    }

    async fn get_chat(&self, id: &ChatId) -> Result<Option<Chat>> {
        let row = sqlx::query(
            r#"
            SELECT id, dataset_id, user_id, title, created_at, updated_at
            FROM dataset_chats
            WHERE id = $1
            "#,
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_chat).transpose()
    }

    async fn list_chats(&self, dataset_id: &DatasetId, user_id: &UserId) -> Result<Vec<Chat>> {
        let rows = sqlx::query(
            r#"
            SELECT id, dataset_id, user_id, title, created_at, updated_at
            FROM dataset_chats
            WHERE dataset_id = $1 AND user_id = $2
            ORDER BY created_at DESC
            "#,
        )
        .bind(dataset_id.0)
        .bind(user_id.0)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_chat).collect()
    }

    async fn rename_chat(&self, id: &ChatId, title: Option<String>) -> Result<Chat> {
        let row = sqlx::query(
            r#"
            UPDATE dataset_chats
            SET title = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, dataset_id, user_id, title, created_at, updated_at
            "#,
        )
        .bind(id.0)
        .bind(title)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| CoreError::NotFound(format!("Chat {} not found", id)))?;

        Self::row_to_chat(row)
    }

    async fn delete_chat(&self, id: &ChatId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM dataset_chats WHERE id = $1")
            .bind(id.0)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn append_message(&self, message: Message) -> Result<Message> {
        // created_at is clamped so it never precedes the newest message.
        let row = sqlx::query(
            r#"
            INSERT INTO chat_messages (id, chat_id, user_id, role, content, created_at)
            SELECT $1, $2, $3, $4, $5,
                   GREATEST($6, COALESCE(
                       (SELECT MAX(created_at) FROM chat_messages WHERE chat_id = $2), $6
                   ))
            RETURNING id, chat_id, user_id, role, content, created_at
            "#,
        )
        .bind(message.id.0)
        .bind(message.chat_id.0)
        .bind(message.user_id.0)
        .bind(message.role.as_str())
        .bind(&message.content)
        .bind(message.created_at)
        .fetch_one(&self.pool)
        .await?;

        sqlx::query("UPDATE dataset_chats SET updated_at = NOW() WHERE id = $1")
            .bind(message.chat_id.0)
            .execute(&self.pool)
            .await?;

        Self::row_to_message(row)
    }

    async fn list_messages(&self, chat_id: &ChatId) -> Result<Vec<Message>> {
        let rows = sqlx::query(
            r#"
            SELECT id, chat_id, user_id, role, content, created_at
            FROM chat_messages
            WHERE chat_id = $1
            ORDER BY created_at ASC, seq ASC
            "#,
        )
        .bind(chat_id.0)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_message).collect()
    }
}
