//! Hosted chat/message tables and the best-effort persistence sink.
//!
//! The pipeline is optimistic: displayed state stays authoritative even
//! when a write fails; failures only surface as a notice.

mod memory;
mod rest;

pub use memory::MemoryStore;
pub use rest::RestStore;

use crate::conversation::Role;
use crate::notify::{NoticeKind, Notifier};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Placeholder title for a chat with no messages yet.
pub const NEW_CHAT_TITLE: &str = "New Chat";

const SAVE_PROMPT_FAILED_NOTICE: &str = "Gagal menyimpan pesan";
const SAVE_REPLY_FAILED_NOTICE: &str = "Gagal menyimpan respon";

/// Row in the `chats` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRecord {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
}

/// Row in the `messages` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageRecord {
    pub id: String,
    pub chat_id: String,
    pub user_id: String,
    pub content: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("store api error: {0}")]
    Api(String),
}

/// Hosted table boundary: chats and their messages.
#[async_trait]
pub trait ChatStore: Send + Sync {
    /// Insert a new chat with the placeholder title.
    async fn create_chat(&self, user_id: &str) -> Result<ChatRecord, StoreError>;

    /// Chats for a user, newest first.
    async fn list_chats(&self, user_id: &str) -> Result<Vec<ChatRecord>, StoreError>;

    async fn rename_chat(&self, chat_id: &str, title: &str) -> Result<(), StoreError>;

    async fn delete_chat(&self, chat_id: &str) -> Result<(), StoreError>;

    async fn insert_message(
        &self,
        chat_id: &str,
        user_id: &str,
        content: &str,
        role: Role,
    ) -> Result<(), StoreError>;

    /// Messages of a chat, oldest first.
    async fn list_messages(&self, chat_id: &str) -> Result<Vec<MessageRecord>, StoreError>;

    /// Delete every message of a chat.
    async fn clear_messages(&self, chat_id: &str) -> Result<(), StoreError>;
}

/// Best-effort sink for finalized messages. Empty trimmed content or a
/// missing chat/session is a silent no-op. A failed write is logged and
/// raises one notice; it never re-enters the turn flow.
pub async fn save_message(
    store: &dyn ChatStore,
    content: &str,
    chat_id: Option<&str>,
    user_id: Option<&str>,
    role: Role,
    notifier: &dyn Notifier,
) {
    let content = content.trim();
    if content.is_empty() {
        return;
    }
    let (Some(chat_id), Some(user_id)) = (chat_id, user_id) else {
        return;
    };
    if let Err(e) = store.insert_message(chat_id, user_id, content, role).await {
        log::warn!("saving {} message failed: {}", role.as_str(), e);
        let notice = match role {
            Role::User => SAVE_PROMPT_FAILED_NOTICE,
            Role::Assistant => SAVE_REPLY_FAILED_NOTICE,
        };
        notifier.notify(NoticeKind::Error, notice);
    }
}

/// Derive the display title for a chat from its first message: the
/// placeholder stays, long text is truncated to 20 chars plus an ellipsis.
pub fn format_chat_title(title: &str) -> String {
    let title = title.trim();
    if title.is_empty() || title == NEW_CHAT_TITLE {
        return NEW_CHAT_TITLE.to_string();
    }
    if title.chars().count() > 20 {
        let head: String = title.chars().take(20).collect();
        format!("{}...", head)
    } else {
        title.to_string()
    }
}
