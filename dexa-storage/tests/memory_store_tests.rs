use chrono::{Duration, Utc};
use dexa_core::domain::*;
use dexa_core::{BlobStore, ChatStore, CoreError, DatasetStore, QueryLog};
use dexa_storage::{MemoryBlobStore, MemoryStore};
use pretty_assertions::assert_eq;

fn dataset(user_id: UserId, name: &str) -> Dataset {
    Dataset::new(NewDataset {
        user_id,
        name: name.to_string(),
        description: None,
        file_type: FileType::Csv,
        file_name: format!("{}.csv", name),
        size_bytes: 6,
        checksum: ContentHash::from_bytes(b"a,b\n1,2"),
        columns: vec!["a".to_string(), "b".to_string()],
        row_count: 1,
        sample: Vec::new(),
        full_content: Some("a,b\n1,2".to_string()),
    })
}

async fn store_with_chat() -> (MemoryStore, Dataset, Chat) {
    let store = MemoryStore::new();
    let user = UserId::new();
    let ds = store.insert_dataset(&dataset(user, "d")).await.unwrap();
    let chat = store
        .create_chat(&Chat::new(ds.id, user, Some("first".to_string())))
        .await
        .unwrap();
    (store, ds, chat)
}

// ===== Dataset Tests =====

#[tokio::test]
async fn test_same_content_inserts_twice() {
    let store = MemoryStore::new();
    let user = UserId::new();

    let first = store.insert_dataset(&dataset(user, "same")).await.unwrap();
    let second = store.insert_dataset(&dataset(user, "same")).await.unwrap();

    assert_ne!(first.id, second.id);
    assert_eq!(first.checksum, second.checksum);
    assert_eq!(store.list_datasets(&user, 20, 0).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_list_is_scoped_newest_first_and_paged() {
    let store = MemoryStore::new();
    let user = UserId::new();
    let other = UserId::new();

    let mut old = dataset(user, "old");
    old.created_at = Utc::now() - Duration::minutes(5);
    store.insert_dataset(&old).await.unwrap();
    store.insert_dataset(&dataset(user, "new")).await.unwrap();
    store.insert_dataset(&dataset(other, "theirs")).await.unwrap();

    let listed = store.list_datasets(&user, 20, 0).await.unwrap();
    let names: Vec<&str> = listed.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(names, vec!["new", "old"]);
    assert!(listed.iter().all(|d| d.full_content.is_none()));

    let second_page = store.list_datasets(&user, 1, 1).await.unwrap();
    assert_eq!(second_page[0].name, "old");
}

#[tokio::test]
async fn test_get_keeps_full_content() {
    let store = MemoryStore::new();
    let ds = store.insert_dataset(&dataset(UserId::new(), "d")).await.unwrap();
    let fetched = store.get_dataset(&ds.id).await.unwrap().unwrap();
    assert_eq!(fetched.full_content.as_deref(), Some("a,b\n1,2"));
}

#[tokio::test]
async fn test_delete_dataset_cascades() {
    let (store, ds, chat) = store_with_chat().await;
    store
        .append_message(Message::new(chat.id, chat.user_id, MessageRole::User, "hi".into()))
        .await
        .unwrap();
    store
        .record_query(&QueryRecord::new(ds.id, ds.user_id, "q".into(), "x".into(), "e".into(), 0.1))
        .await
        .unwrap();

    assert!(store.delete_dataset(&ds.id).await.unwrap());

    assert!(store.get_dataset(&ds.id).await.unwrap().is_none());
    assert!(store.get_chat(&chat.id).await.unwrap().is_none());
    assert!(store.list_messages(&chat.id).await.unwrap().is_empty());
    assert!(store.list_queries(&ds.id, 10, 0).await.unwrap().is_empty());
    assert!(!store.delete_dataset(&ds.id).await.unwrap());
}

// ===== Chat Tests =====

#[tokio::test]
async fn test_chat_requires_dataset() {
    let store = MemoryStore::new();
    let err = store
        .create_chat(&Chat::new(DatasetId::new(), UserId::new(), None))
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::NotFound(_)));
}

#[tokio::test]
async fn test_chats_are_scoped_to_user() {
    let (store, ds, chat) = store_with_chat().await;
    let stranger = UserId::new();

    assert_eq!(store.list_chats(&ds.id, &chat.user_id).await.unwrap().len(), 1);
    assert!(store.list_chats(&ds.id, &stranger).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_rename_chat() {
    let (store, _, chat) = store_with_chat().await;
    let renamed = store.rename_chat(&chat.id, Some("renamed".into())).await.unwrap();
    assert_eq!(renamed.title.as_deref(), Some("renamed"));
    assert!(renamed.updated_at >= chat.updated_at);

    let missing = store.rename_chat(&ChatId::new(), None).await.unwrap_err();
    assert!(matches!(missing, CoreError::NotFound(_)));
}

#[tokio::test]
async fn test_messages_are_ordered_even_with_skewed_clocks() {
    let (store, _, chat) = store_with_chat().await;

    let first = Message::new(chat.id, chat.user_id, MessageRole::User, "one".into());
    let mut second = Message::new(chat.id, chat.user_id, MessageRole::Assistant, "two".into());
    second.created_at = first.created_at - Duration::seconds(30);

    store.append_message(first).await.unwrap();
    store.append_message(second).await.unwrap();
    store
        .append_message(Message::new(chat.id, chat.user_id, MessageRole::User, "three".into()))
        .await
        .unwrap();

    let messages = store.list_messages(&chat.id).await.unwrap();
    let contents: Vec<&str> = messages.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(contents, vec!["one", "two", "three"]);
    assert!(messages.windows(2).all(|w| w[0].created_at <= w[1].created_at));
}

#[tokio::test]
async fn test_delete_chat_removes_messages() {
    let (store, ds, chat) = store_with_chat().await;
    store
        .append_message(Message::new(chat.id, chat.user_id, MessageRole::User, "hi".into()))
        .await
        .unwrap();

    assert!(store.delete_chat(&chat.id).await.unwrap());
    assert!(store.list_messages(&chat.id).await.unwrap().is_empty());
    assert!(store.get_dataset(&ds.id).await.unwrap().is_some());
}

#[tokio::test]
async fn test_append_to_missing_chat_fails() {
    let store = MemoryStore::new();
    let err = store
        .append_message(Message::new(ChatId::new(), UserId::new(), MessageRole::User, "x".into()))
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::NotFound(_)));
}

// ===== Query Log Tests =====

#[tokio::test]
async fn test_queries_newest_first_with_limit() {
    let (store, ds, _) = store_with_chat().await;
    for text in ["a", "b", "c"] {
        store
            .record_query(&QueryRecord::new(ds.id, ds.user_id, text.into(), "code".into(), String::new(), 0.5))
            .await
            .unwrap();
    }

    let records = store.list_queries(&ds.id, 2, 0).await.unwrap();
    let texts: Vec<&str> = records.iter().map(|r| r.query_text.as_str()).collect();
    assert_eq!(texts, vec!["c", "b"]);
}

#[tokio::test]
async fn test_queries_offset_skips_newest() {
    let (store, ds, _) = store_with_chat().await;
    for text in ["a", "b", "c"] {
        store
            .record_query(&QueryRecord::new(ds.id, ds.user_id, text.into(), "code".into(), String::new(), 0.5))
            .await
            .unwrap();
    }

    let records = store.list_queries(&ds.id, 2, 1).await.unwrap();
    let texts: Vec<&str> = records.iter().map(|r| r.query_text.as_str()).collect();
    assert_eq!(texts, vec!["b", "a"]);

    assert!(store.list_queries(&ds.id, 2, 3).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_query_safety_issues_are_kept() {
    let (store, ds, _) = store_with_chat().await;
    let record = QueryRecord::new(ds.id, ds.user_id, "q".into(), "import os".into(), String::new(), 0.1)
        .with_safety_issues(vec!["Importing disallowed module: os".to_string()]);

    store.record_query(&record).await.unwrap();

    let stored = store.list_queries(&ds.id, 10, 0).await.unwrap();
    assert!(!stored[0].success);
    assert_eq!(stored[0].safety_issues, vec!["Importing disallowed module: os".to_string()]);
}

// ===== Blob Tests =====

#[tokio::test]
async fn test_blob_put_get_delete() {
    let blobs = MemoryBlobStore::new();
    blobs.put("u/1-a.csv", b"a,b".to_vec(), Some("text/csv")).await.unwrap();

    assert!(blobs.contains("u/1-a.csv"));
    assert_eq!(blobs.get("u/1-a.csv").await.unwrap(), b"a,b".to_vec());

    blobs.delete("u/1-a.csv").await.unwrap();
    assert!(blobs.is_empty());
    assert!(matches!(blobs.get("u/1-a.csv").await, Err(CoreError::NotFound(_))));
}
