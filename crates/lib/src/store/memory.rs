//! In-memory store: backs tests and the CLI when no hosted backend is
//! configured. Rows live only for the process lifetime.

use super::{ChatRecord, ChatStore, MessageRecord, StoreError, NEW_CHAT_TITLE};
use crate::conversation::Role;
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Default)]
pub struct MemoryStore {
    chats: Arc<RwLock<Vec<ChatRecord>>>,
    messages: Arc<RwLock<Vec<MessageRecord>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total stored messages across all chats.
    pub async fn message_count(&self) -> usize {
        self.messages.read().await.len()
    }
}

#[async_trait]
impl ChatStore for MemoryStore {
    async fn create_chat(&self, user_id: &str) -> Result<ChatRecord, StoreError> {
        let chat = ChatRecord {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            title: NEW_CHAT_TITLE.to_string(),
            created_at: Utc::now(),
        };
        self.chats.write().await.push(chat.clone());
        Ok(chat)
    }

    async fn list_chats(&self, user_id: &str) -> Result<Vec<ChatRecord>, StoreError> {
        let mut chats: Vec<ChatRecord> = self
            .chats
            .read()
            .await
            .iter()
            .filter(|c| c.user_id == user_id)
            .cloned()
            .collect();
        chats.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(chats)
    }

    async fn rename_chat(&self, chat_id: &str, title: &str) -> Result<(), StoreError> {
        let mut chats = self.chats.write().await;
        if let Some(chat) = chats.iter_mut().find(|c| c.id == chat_id) {
            chat.title = title.to_string();
        }
        Ok(())
    }

    async fn delete_chat(&self, chat_id: &str) -> Result<(), StoreError> {
        self.chats.write().await.retain(|c| c.id != chat_id);
        // Drop the chat's rows too, like the hosted store's cascade.
        self.messages.write().await.retain(|m| m.chat_id != chat_id);
        Ok(())
    }

    async fn insert_message(
        &self,
        chat_id: &str,
        user_id: &str,
        content: &str,
        role: Role,
    ) -> Result<(), StoreError> {
        self.messages.write().await.push(MessageRecord {
            id: uuid::Uuid::new_v4().to_string(),
            chat_id: chat_id.to_string(),
            user_id: user_id.to_string(),
            content: content.to_string(),
            role: role.as_str().to_string(),
            created_at: Utc::now(),
        });
        Ok(())
    }

    async fn list_messages(&self, chat_id: &str) -> Result<Vec<MessageRecord>, StoreError> {
        let mut messages: Vec<MessageRecord> = self
            .messages
            .read()
            .await
            .iter()
            .filter(|m| m.chat_id == chat_id)
            .cloned()
            .collect();
        messages.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(messages)
    }

    async fn clear_messages(&self, chat_id: &str) -> Result<(), StoreError> {
        self.messages.write().await.retain(|m| m.chat_id != chat_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn chats_list_newest_first_per_user() {
        let store = MemoryStore::new();
        let a = store.create_chat("user-1").await.expect("create");
        let b = store.create_chat("user-1").await.expect("create");
        store.create_chat("user-2").await.expect("create");

        let chats = store.list_chats("user-1").await.expect("list");
        assert_eq!(chats.len(), 2);
        // Same-instant timestamps keep insertion order under a stable sort.
        assert!(chats.iter().any(|c| c.id == a.id));
        assert!(chats.iter().any(|c| c.id == b.id));
        assert!(chats[0].created_at >= chats[1].created_at);
    }

    #[tokio::test]
    async fn messages_round_trip_in_order() {
        let store = MemoryStore::new();
        let chat = store.create_chat("user-1").await.expect("create");
        store
            .insert_message(&chat.id, "user-1", "pertama", Role::User)
            .await
            .expect("insert");
        store
            .insert_message(&chat.id, "user-1", "kedua", Role::Assistant)
            .await
            .expect("insert");

        let messages = store.list_messages(&chat.id).await.expect("list");
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].content, "pertama");
        assert_eq!(messages[1].role, "assistant");
    }

    #[tokio::test]
    async fn delete_chat_drops_its_messages() {
        let store = MemoryStore::new();
        let chat = store.create_chat("user-1").await.expect("create");
        store
            .insert_message(&chat.id, "user-1", "halo", Role::User)
            .await
            .expect("insert");
        store.delete_chat(&chat.id).await.expect("delete");

        assert!(store.list_chats("user-1").await.expect("list").is_empty());
        assert_eq!(store.message_count().await, 0);
    }

    #[tokio::test]
    async fn rename_and_clear() {
        let store = MemoryStore::new();
        let chat = store.create_chat("user-1").await.expect("create");
        store
            .rename_chat(&chat.id, "judul baru")
            .await
            .expect("rename");
        store
            .insert_message(&chat.id, "user-1", "halo", Role::User)
            .await
            .expect("insert");
        store.clear_messages(&chat.id).await.expect("clear");

        let chats = store.list_chats("user-1").await.expect("list");
        assert_eq!(chats[0].title, "judul baru");
        assert!(store.list_messages(&chat.id).await.expect("list").is_empty());
    }
}
