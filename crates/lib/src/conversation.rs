//! In-memory state of the selected chat: ordered messages, the single
//! transient typing slot, and the turn loading flag.
//!
//! Mutated only by the turn pipeline and the typing reveal; rendering code
//! reads. While a reveal is active the list contains at most one message
//! with `is_typing` set, and its id equals the active typing id.

use serde::{Deserialize, Serialize};

/// Speaker role for a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }

    /// Parse a stored role string ("user" / "assistant").
    pub fn parse(s: &str) -> Option<Role> {
        match s {
            "user" => Some(Role::User),
            "assistant" => Some(Role::Assistant),
            _ => None,
        }
    }
}

/// One chat message. `is_typing` marks the transient in-progress reply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub content: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_typing: bool,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            id: new_message_id(),
            content: content.into(),
            role: Role::User,
            is_typing: false,
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            id: new_message_id(),
            content: content.into(),
            role: Role::Assistant,
            is_typing: false,
        }
    }

    /// In-progress assistant message for the typing slot.
    pub fn typing(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            role: Role::Assistant,
            is_typing: true,
        }
    }
}

/// Generate a message id, unique within a conversation.
pub fn new_message_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// The selected chat's in-memory state.
#[derive(Debug, Default)]
pub struct Conversation {
    chat_id: Option<String>,
    messages: Vec<Message>,
    typing: Option<Message>,
    loading: bool,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Conversation bound to a stored chat.
    pub fn with_chat(chat_id: impl Into<String>) -> Self {
        Self {
            chat_id: Some(chat_id.into()),
            ..Self::default()
        }
    }

    pub fn chat_id(&self) -> Option<&str> {
        self.chat_id.as_deref()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// The transient in-progress reply, if a reveal is active.
    pub fn typing_message(&self) -> Option<&Message> {
        self.typing.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Claim the loading flag for a new turn. Returns false when a turn is
    /// already in flight.
    pub(crate) fn begin_loading(&mut self) -> bool {
        if self.loading {
            return false;
        }
        self.loading = true;
        true
    }

    pub(crate) fn end_loading(&mut self) {
        self.loading = false;
    }

    /// Replace the stored history, e.g. after fetching a chat's messages.
    pub fn reset(&mut self, messages: Vec<Message>) {
        self.messages = messages;
        self.typing = None;
        self.loading = false;
    }

    pub fn clear(&mut self) {
        self.reset(Vec::new());
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Replace the message with the same id, or append. Replacements move
    /// to the end, matching the reveal's newest-last ordering.
    pub fn upsert(&mut self, message: Message) {
        self.messages.retain(|m| m.id != message.id);
        self.messages.push(message);
    }

    /// Open the typing slot for a reveal. An active prior session is forced
    /// to a terminal state first: non-empty partial content is committed as
    /// a final message, an empty one is dropped.
    pub(crate) fn begin_typing(&mut self, id: impl Into<String>) {
        if let Some(prev) = self.typing.take() {
            let partial = prev.content.trim().to_string();
            if partial.is_empty() {
                self.messages.retain(|m| m.id != prev.id);
            } else {
                self.upsert(Message {
                    id: prev.id,
                    content: partial,
                    role: Role::Assistant,
                    is_typing: false,
                });
            }
        }
        self.typing = Some(Message::typing(id, ""));
    }

    /// Mirror one reveal step into the slot and the list.
    pub(crate) fn update_typing(&mut self, id: &str, content: &str) {
        let message = Message::typing(id, content);
        self.typing = Some(message.clone());
        self.upsert(message);
    }

    /// Finish the active reveal: the in-progress message becomes a final
    /// assistant message and the slot is cleared.
    pub(crate) fn commit_typing(&mut self, id: &str, content: &str) {
        self.upsert(Message {
            id: id.to_string(),
            content: content.to_string(),
            role: Role::Assistant,
            is_typing: false,
        });
        self.typing = None;
    }

    /// Drop the active reveal without committing anything.
    pub(crate) fn abandon_typing(&mut self) {
        if let Some(prev) = self.typing.take() {
            self.messages.retain(|m| m.id != prev.id);
        }
    }

    /// Number of in-progress messages in the list. At most 1 by invariant.
    pub fn typing_count(&self) -> usize {
        self.messages.iter().filter(|m| m.is_typing).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upsert_replaces_by_id() {
        let mut conv = Conversation::new();
        conv.push(Message::user("halo"));
        let m = Message::assistant("a");
        let id = m.id.clone();
        conv.push(m);
        conv.upsert(Message {
            id: id.clone(),
            content: "b".to_string(),
            role: Role::Assistant,
            is_typing: false,
        });
        assert_eq!(conv.messages().len(), 2);
        assert_eq!(conv.last_message().map(|m| m.content.as_str()), Some("b"));
    }

    #[test]
    fn typing_lifecycle_keeps_at_most_one_typing_message() {
        let mut conv = Conversation::new();
        conv.begin_typing("t1");
        conv.update_typing("t1", "satu");
        conv.update_typing("t1", "satu dua");
        assert_eq!(conv.typing_count(), 1);
        assert_eq!(
            conv.typing_message().map(|m| m.content.as_str()),
            Some("satu dua")
        );

        conv.commit_typing("t1", "satu dua tiga");
        assert_eq!(conv.typing_count(), 0);
        assert!(conv.typing_message().is_none());
        let last = conv.last_message().expect("committed message");
        assert!(!last.is_typing);
        assert_eq!(last.content, "satu dua tiga");
    }

    #[test]
    fn begin_typing_flushes_prior_partial() {
        let mut conv = Conversation::new();
        conv.begin_typing("t1");
        conv.update_typing("t1", "sebagian jawaban");
        conv.begin_typing("t2");
        conv.update_typing("t2", "baru");

        assert_eq!(conv.typing_count(), 1);
        assert_eq!(conv.typing_message().map(|m| m.id.as_str()), Some("t2"));
        let flushed = conv
            .messages()
            .iter()
            .find(|m| m.id == "t1")
            .expect("prior partial committed");
        assert!(!flushed.is_typing);
        assert_eq!(flushed.content, "sebagian jawaban");
    }

    #[test]
    fn begin_typing_drops_prior_empty_partial() {
        let mut conv = Conversation::new();
        conv.begin_typing("t1");
        conv.begin_typing("t2");
        assert!(conv.messages().iter().all(|m| m.id != "t1"));
    }

    #[test]
    fn abandon_typing_removes_in_progress_message() {
        let mut conv = Conversation::new();
        conv.begin_typing("t1");
        conv.update_typing("t1", "setengah");
        conv.abandon_typing();
        assert!(conv.messages().is_empty());
        assert!(conv.typing_message().is_none());
    }

    #[test]
    fn loading_flag_is_single_flight() {
        let mut conv = Conversation::new();
        assert!(conv.begin_loading());
        assert!(!conv.begin_loading());
        conv.end_loading();
        assert!(conv.begin_loading());
    }

    #[test]
    fn role_parse_round_trips() {
        assert_eq!(Role::parse("user"), Some(Role::User));
        assert_eq!(Role::parse("assistant"), Some(Role::Assistant));
        assert_eq!(Role::parse("system"), None);
        assert_eq!(Role::parse(Role::Assistant.as_str()), Some(Role::Assistant));
    }
}
