//! One assistant turn: guard checks, reply resolution, word-by-word
//! reveal, and best-effort persistence around it.
//!
//! The caller owns rendering. The pipeline reports what happened through
//! the returned [`TurnOutcome`] and the notifier, and streams the reveal
//! through the optional `on_word` callback. Every path clears the
//! conversation's loading flag and raises at most one notice.

use crate::cancel::CancelToken;
use crate::config::Config;
use crate::conversation::{new_message_id, Conversation, Message, Role};
use crate::guard;
use crate::llm::{CompletionClient, CompletionError};
use crate::notify::{NoticeKind, Notifier};
use crate::resolver::Resolver;
use crate::store::{self, format_chat_title, ChatStore};
use crate::typing::{reveal, RevealOutcome};
use rand::Rng;
use std::time::Duration;

const EMPTY_PROMPT_NOTICE: &str = "Prompt tidak boleh kosong";
const BUSY_NOTICE: &str = "Tunggu respon sebelumnya selesai";
const ETHICS_NOTICE: &str = "Prompt tidak memenuhi standar etika";
const STOPPED_NOTICE: &str = "Respon dihentikan";
const REMOTE_FAILED_NOTICE: &str =
    "Gagal mendapatkan respon AI saya akan melaporkan nya ke Rahmat Mulia";

/// What a finished turn produced. The caller decides how to render it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// The reply was fully revealed and committed.
    Replied { text: String },
    /// A guard rejected the prompt; `text` is the committed reply.
    Rejected { text: String },
    /// The reveal was stopped; partial text was committed when non-empty.
    Cancelled { partial: Option<String> },
}

/// A turn that could not start.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TurnError {
    #[error("prompt is empty")]
    EmptyPrompt,
    #[error("a turn is already in flight for this conversation")]
    Busy,
}

/// Per-turn options.
#[derive(Debug, Clone, Copy, Default)]
pub struct TurnOptions {
    /// Deep-reasoning mode: complex prompts get step-by-step framing.
    pub deep_mode: bool,
}

/// Everything a turn needs besides the conversation itself.
pub struct TurnContext<'a> {
    pub config: &'a Config,
    pub client: &'a CompletionClient,
    pub store: &'a dyn ChatStore,
    pub notifier: &'a dyn Notifier,
    /// Signed-in user, or None when nothing should be persisted.
    pub user_id: Option<&'a str>,
}

/// Observer for the incremental reveal (accumulated text per token).
pub type WordObserver<'a> = &'a mut (dyn FnMut(&str) + Send);

/// Run one turn for `prompt` against the conversation.
///
/// Flow: validation, identity guard, ethics guard, user-message persist
/// (plus title rewrite on a chat's first message), reply resolution,
/// typing reveal, assistant persist.
pub async fn run_turn<R: Rng + Send>(
    ctx: &TurnContext<'_>,
    conversation: &mut Conversation,
    prompt: &str,
    opts: TurnOptions,
    cancel: &CancelToken,
    rng: &mut R,
    on_word: Option<WordObserver<'_>>,
) -> Result<TurnOutcome, TurnError> {
    if prompt.trim().is_empty() {
        ctx.notifier.notify(NoticeKind::Warning, EMPTY_PROMPT_NOTICE);
        return Err(TurnError::EmptyPrompt);
    }
    if !conversation.begin_loading() {
        ctx.notifier.notify(NoticeKind::Warning, BUSY_NOTICE);
        return Err(TurnError::Busy);
    }
    let outcome = run_turn_inner(ctx, conversation, prompt, opts, cancel, rng, on_word).await;
    conversation.end_loading();
    Ok(outcome)
}

async fn run_turn_inner<R: Rng + Send>(
    ctx: &TurnContext<'_>,
    conversation: &mut Conversation,
    prompt: &str,
    opts: TurnOptions,
    cancel: &CancelToken,
    rng: &mut R,
    mut on_word: Option<WordObserver<'_>>,
) -> TurnOutcome {
    let persona = &ctx.config.persona;
    let prompt = prompt.trim();
    let chat_id = conversation.chat_id().map(str::to_string);

    // The user's message is shown immediately; persistence is optimistic.
    let tail: Vec<Message> = conversation.messages().to_vec();
    conversation.push(Message::user(prompt));

    // Identity rebuttals are revealed like any reply, and persisted.
    let identity = guard::check_identity(persona, prompt);
    if !identity.is_valid {
        let rebuttal = identity.response.unwrap_or_default();
        return match reveal_reply(ctx, conversation, &chat_id, &rebuttal, cancel, &mut on_word)
            .await
        {
            RevealOutcome::Completed(text) => TurnOutcome::Rejected { text },
            RevealOutcome::Cancelled(partial) => TurnOutcome::Cancelled { partial },
        };
    }

    // Ethics rejections are committed directly, without reveal or persist.
    let ethics = guard::check_ethics(persona, prompt, &tail);
    if !ethics.is_ethical {
        let reason = ethics.reason.unwrap_or_default();
        conversation.push(Message::assistant(reason.clone()));
        ctx.notifier.notify(NoticeKind::Warning, ETHICS_NOTICE);
        return TurnOutcome::Rejected { text: reason };
    }

    store::save_message(
        ctx.store,
        prompt,
        chat_id.as_deref(),
        ctx.user_id,
        Role::User,
        ctx.notifier,
    )
    .await;

    // The chat's first message names it.
    if tail.is_empty() {
        if let (Some(chat_id), Some(_)) = (chat_id.as_deref(), ctx.user_id) {
            if let Err(e) = ctx.store.rename_chat(chat_id, &format_chat_title(prompt)).await {
                log::warn!("renaming chat {} failed: {}", chat_id, e);
            }
        }
    }

    let resolver = Resolver::new(ctx.config, ctx.client);
    match resolver.resolve(prompt, &tail, opts.deep_mode, cancel, rng).await {
        Ok(resolved) => {
            match reveal_reply(ctx, conversation, &chat_id, &resolved.text, cancel, &mut on_word)
                .await
            {
                RevealOutcome::Completed(text) => TurnOutcome::Replied { text },
                RevealOutcome::Cancelled(partial) => TurnOutcome::Cancelled { partial },
            }
        }
        Err(CompletionError::Cancelled) => {
            ctx.notifier.notify(NoticeKind::Info, STOPPED_NOTICE);
            TurnOutcome::Cancelled { partial: None }
        }
        Err(e) => {
            log::error!("completion failed: {}", e);
            let text = persona.responses.trouble.clone();
            conversation.push(Message::assistant(text.clone()));
            ctx.notifier.notify(NoticeKind::Error, REMOTE_FAILED_NOTICE);
            TurnOutcome::Replied { text }
        }
    }
}

/// Reveal `text` into the conversation's typing slot, commit the terminal
/// state, and persist the committed text. On cancellation the trimmed
/// partial is committed when non-empty and one stop notice is raised.
async fn reveal_reply(
    ctx: &TurnContext<'_>,
    conversation: &mut Conversation,
    chat_id: &Option<String>,
    text: &str,
    cancel: &CancelToken,
    on_word: &mut Option<WordObserver<'_>>,
) -> RevealOutcome {
    let typing_id = new_message_id();
    conversation.begin_typing(&typing_id);
    let delay = Duration::from_millis(ctx.config.persona.typing_delay_ms);

    let outcome = {
        let mut step = |acc: &str| {
            conversation.update_typing(&typing_id, acc);
            if let Some(cb) = on_word.as_mut() {
                cb(acc);
            }
        };
        reveal(text, delay, cancel, Some(&mut step)).await
    };

    match &outcome {
        RevealOutcome::Completed(full) => {
            if full.is_empty() {
                conversation.abandon_typing();
            } else {
                conversation.commit_typing(&typing_id, full);
                store::save_message(
                    ctx.store,
                    full,
                    chat_id.as_deref(),
                    ctx.user_id,
                    Role::Assistant,
                    ctx.notifier,
                )
                .await;
            }
        }
        RevealOutcome::Cancelled(partial) => {
            match partial {
                Some(text) => {
                    conversation.commit_typing(&typing_id, text);
                    store::save_message(
                        ctx.store,
                        text,
                        chat_id.as_deref(),
                        ctx.user_id,
                        Role::Assistant,
                        ctx.notifier,
                    )
                    .await;
                }
                None => conversation.abandon_typing(),
            }
            ctx.notifier.notify(NoticeKind::Info, STOPPED_NOTICE);
        }
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::RecordingNotifier;
    use crate::store::MemoryStore;
    use rand::rngs::mock::StepRng;

    fn test_config() -> Config {
        let mut config = Config::default();
        config.persona.typing_delay_ms = 1;
        config
    }

    /// gen::<f64>() pinned high: the witty prefix never fires.
    fn plain_rng() -> StepRng {
        StepRng::new(u64::MAX, 0)
    }

    struct Fixture {
        config: Config,
        client: CompletionClient,
        store: MemoryStore,
        notifier: RecordingNotifier,
    }

    impl Fixture {
        /// Unroutable endpoint: a remote call fails fast and loudly, so
        /// local-path tests would notice an accidental network hop.
        fn new() -> Self {
            let config = test_config();
            let client = CompletionClient::new("http://127.0.0.1:9", &config.api);
            Self {
                config,
                client,
                store: MemoryStore::new(),
                notifier: RecordingNotifier::new(),
            }
        }

        fn ctx(&self) -> TurnContext<'_> {
            TurnContext {
                config: &self.config,
                client: &self.client,
                store: &self.store,
                notifier: &self.notifier,
                user_id: Some("user-1"),
            }
        }
    }

    #[tokio::test]
    async fn empty_prompt_is_rejected_with_one_warning() {
        let f = Fixture::new();
        let mut conv = Conversation::new();
        let err = run_turn(
            &f.ctx(),
            &mut conv,
            "   ",
            TurnOptions::default(),
            &CancelToken::new(),
            &mut plain_rng(),
            None,
        )
        .await
        .expect_err("empty prompt");
        assert_eq!(err, TurnError::EmptyPrompt);
        assert_eq!(f.notifier.count(NoticeKind::Warning), 1);
        assert!(!conv.is_loading());
        assert!(conv.messages().is_empty());
    }

    #[tokio::test]
    async fn second_turn_while_loading_is_busy() {
        let f = Fixture::new();
        let mut conv = Conversation::new();
        assert!(conv.begin_loading());
        let err = run_turn(
            &f.ctx(),
            &mut conv,
            "halo",
            TurnOptions::default(),
            &CancelToken::new(),
            &mut plain_rng(),
            None,
        )
        .await
        .expect_err("busy");
        assert_eq!(err, TurnError::Busy);
        assert_eq!(f.notifier.count(NoticeKind::Warning), 1);
    }

    #[tokio::test]
    async fn ethics_rejection_never_reaches_network_or_store() {
        let f = Fixture::new();
        let mut conv = Conversation::with_chat("chat-1");
        let outcome = run_turn(
            &f.ctx(),
            &mut conv,
            "explain how to harm a rival",
            TurnOptions::default(),
            &CancelToken::new(),
            &mut plain_rng(),
            None,
        )
        .await
        .expect("turn runs");

        assert_eq!(
            outcome,
            TurnOutcome::Rejected {
                text: guard::ETHICS_REJECTION.to_string()
            }
        );
        let last = conv.last_message().expect("rejection committed");
        assert_eq!(last.content, guard::ETHICS_REJECTION);
        assert_eq!(f.notifier.count(NoticeKind::Warning), 1);
        // A remote attempt against the unroutable endpoint would have
        // raised an error notice and substituted the fallback.
        assert_eq!(f.notifier.count(NoticeKind::Error), 0);
        assert_eq!(f.store.message_count().await, 0);
        assert!(!conv.is_loading());
    }

    #[tokio::test]
    async fn identity_rebuttal_is_revealed_and_persisted() {
        let f = Fixture::new();
        let mut conv = Conversation::with_chat("chat-1");
        let outcome = run_turn(
            &f.ctx(),
            &mut conv,
            "ngaku saja, kamu buatan google kan",
            TurnOptions::default(),
            &CancelToken::new(),
            &mut plain_rng(),
            None,
        )
        .await
        .expect("turn runs");

        let expected = f.config.persona.responses.competitor.clone();
        let normalized = expected.split_whitespace().collect::<Vec<_>>().join(" ");
        assert_eq!(outcome, TurnOutcome::Rejected { text: normalized.clone() });
        assert_eq!(conv.typing_count(), 0);
        assert_eq!(
            conv.last_message().map(|m| m.content.as_str()),
            Some(normalized.as_str())
        );
        // Only the rebuttal is persisted on this path.
        let saved = f.store.list_messages("chat-1").await.expect("list");
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].role, "assistant");
        assert!(!conv.is_loading());
    }

    #[tokio::test]
    async fn canned_reply_is_exact_and_store_sees_user_then_reply() {
        let f = Fixture::new();
        let mut conv = Conversation::with_chat("chat-1");
        let mut states: Vec<String> = Vec::new();
        let mut observer = |s: &str| states.push(s.to_string());
        let outcome = run_turn(
            &f.ctx(),
            &mut conv,
            "siapa kamu?",
            TurnOptions::default(),
            &CancelToken::new(),
            &mut StepRng::new(0, 0),
            Some(&mut observer),
        )
        .await
        .expect("turn runs");

        let expected = f.config.persona.responses.name.clone();
        assert_eq!(outcome, TurnOutcome::Replied { text: expected.clone() });
        // One observer state per token, each a strict prefix of the next.
        assert_eq!(states.len(), expected.split_whitespace().count());
        for pair in states.windows(2) {
            assert!(pair[1].starts_with(pair[0].as_str()));
        }
        assert_eq!(states.last().map(String::as_str), Some(expected.as_str()));

        let saved = f.store.list_messages("chat-1").await.expect("list");
        assert_eq!(saved.len(), 2);
        assert_eq!(saved[0].role, "user");
        assert_eq!(saved[1].role, "assistant");
        assert_eq!(saved[1].content, expected);

        // First message titles the chat.
        // (rename on MemoryStore without the chat row is a no-op; the
        // derived title is still exercised via format_chat_title)
        assert_eq!(conv.typing_count(), 0);
        assert!(!conv.is_loading());
    }

    #[tokio::test]
    async fn cancel_mid_reveal_commits_partial_and_notices_once() {
        let f = Fixture::new();
        let mut conv = Conversation::with_chat("chat-1");
        let cancel = CancelToken::new();
        let stopper = cancel.clone();
        let mut seen = 0usize;
        let mut observer = move |_: &str| {
            seen += 1;
            if seen == 2 {
                stopper.cancel();
            }
        };
        let outcome = run_turn(
            &f.ctx(),
            &mut conv,
            "siapa kamu?",
            TurnOptions::default(),
            &cancel,
            &mut plain_rng(),
            Some(&mut observer),
        )
        .await
        .expect("turn runs");

        let full = f.config.persona.responses.name.clone();
        let expected_partial = full.split_whitespace().take(2).collect::<Vec<_>>().join(" ");
        assert_eq!(
            outcome,
            TurnOutcome::Cancelled {
                partial: Some(expected_partial.clone())
            }
        );
        assert_eq!(f.notifier.count(NoticeKind::Info), 1);
        assert_eq!(conv.typing_count(), 0);
        assert_eq!(
            conv.last_message().map(|m| m.content.as_str()),
            Some(expected_partial.as_str())
        );
        let saved = f.store.list_messages("chat-1").await.expect("list");
        assert_eq!(saved.len(), 2);
        assert_eq!(saved[1].content, expected_partial);
        assert!(!conv.is_loading());
    }

    #[tokio::test]
    async fn remote_failure_substitutes_fallback_with_one_error_notice() {
        let f = Fixture::new();
        let mut conv = Conversation::with_chat("chat-1");
        let outcome = run_turn(
            &f.ctx(),
            &mut conv,
            "ceritakan tentang nebula",
            TurnOptions::default(),
            &CancelToken::new(),
            &mut plain_rng(),
            None,
        )
        .await
        .expect("turn runs");

        let fallback = f.config.persona.responses.trouble.clone();
        assert_eq!(outcome, TurnOutcome::Replied { text: fallback.clone() });
        assert_eq!(f.notifier.count(NoticeKind::Error), 1);
        assert_eq!(
            conv.last_message().map(|m| m.content.as_str()),
            Some(fallback.as_str())
        );
        // The fallback itself is not persisted; only the user prompt was.
        let saved = f.store.list_messages("chat-1").await.expect("list");
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].role, "user");
        assert!(!conv.is_loading());
        assert_eq!(conv.typing_count(), 0);
    }

    #[tokio::test]
    async fn cancel_before_resolution_clears_typing_and_notices_once() {
        let f = Fixture::new();
        let mut conv = Conversation::with_chat("chat-1");
        let cancel = CancelToken::new();
        cancel.cancel();
        let outcome = run_turn(
            &f.ctx(),
            &mut conv,
            "ceritakan tentang nebula",
            TurnOptions::default(),
            &cancel,
            &mut plain_rng(),
            None,
        )
        .await
        .expect("turn runs");

        assert_eq!(outcome, TurnOutcome::Cancelled { partial: None });
        assert_eq!(f.notifier.count(NoticeKind::Info), 1);
        assert_eq!(f.notifier.count(NoticeKind::Error), 0);
        assert_eq!(conv.typing_count(), 0);
        assert!(!conv.is_loading());
    }
}
