//! Reply resolution: canned persona responses, introspection, or remote
//! delegation, with optional deep-reasoning framing.
//!
//! The witty-remark prefix applies only to remote replies and draws from
//! an injected rng so tests stay deterministic.

use crate::cancel::CancelToken;
use crate::config::Config;
use crate::conversation::Message;
use crate::llm::{ChatMessage, CompletionClient, CompletionError};
use crate::persona::Persona;
use rand::Rng;

/// Probability that a remote reply gets a witty-remark prefix.
const WITTY_CHANCE: f64 = 0.5;

/// Word count past which a prompt counts as complex in deep mode.
const COMPLEX_WORD_COUNT: usize = 10;

/// Where a resolved reply came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplySource {
    Canned,
    Introspection,
    Remote,
}

/// A resolved reply and its provenance.
#[derive(Debug, Clone)]
pub struct ResolvedReply {
    pub text: String,
    pub source: ReplySource,
}

/// Resolves one prompt into reply text, delegating to the completion
/// endpoint when no local reply applies.
pub struct Resolver<'a> {
    config: &'a Config,
    client: &'a CompletionClient,
}

impl<'a> Resolver<'a> {
    pub fn new(config: &'a Config, client: &'a CompletionClient) -> Self {
        Self { config, client }
    }

    /// Resolve a reply for `prompt` given the prior turns in `tail`.
    pub async fn resolve<R: Rng>(
        &self,
        prompt: &str,
        tail: &[Message],
        deep_mode: bool,
        cancel: &CancelToken,
        rng: &mut R,
    ) -> Result<ResolvedReply, CompletionError> {
        let persona = Persona::new(&self.config.persona);

        if let Some(canned) = persona.predefined_response(prompt) {
            return Ok(ResolvedReply {
                text: canned.to_string(),
                source: ReplySource::Canned,
            });
        }
        if persona.wants_reflection(prompt) {
            return Ok(ResolvedReply {
                text: persona.introspect(),
                source: ReplySource::Introspection,
            });
        }

        let context = self.context_window(prompt, tail, &persona);
        let responses = &self.config.persona.responses;
        let text = if deep_mode && self.is_complex(prompt) {
            let answer = self
                .complete_deep(prompt, context, cancel)
                .await?
                .unwrap_or_else(|| responses.need_more.clone());
            format!(
                "{}\n\n**Jawaban Final:**\n{}",
                reasoning_preamble(prompt),
                answer
            )
        } else {
            self.client
                .complete(context, cancel)
                .await?
                .unwrap_or_else(|| responses.lost.clone())
        };

        Ok(ResolvedReply {
            text: self.decorate(text, rng),
            source: ReplySource::Remote,
        })
    }

    /// Last N prior turns, the synthesized identity system turn, then the
    /// new user turn.
    fn context_window(&self, prompt: &str, tail: &[Message], persona: &Persona) -> Vec<ChatMessage> {
        let n = self.config.api.context_window;
        let start = tail.len().saturating_sub(n);
        let mut context: Vec<ChatMessage> = tail[start..]
            .iter()
            .map(|m| ChatMessage {
                role: m.role.as_str().to_string(),
                content: m.content.clone(),
            })
            .collect();
        context.push(ChatMessage::system(persona.identity_summary()));
        context.push(ChatMessage::user(prompt.trim()));
        context
    }

    /// Deep-reasoning variant: an extra step-by-step system directive.
    async fn complete_deep(
        &self,
        prompt: &str,
        mut context: Vec<ChatMessage>,
        cancel: &CancelToken,
    ) -> Result<Option<String>, CompletionError> {
        context.push(ChatMessage::system(format!(
            "Berikan jawaban terperinci dengan langkah-langkah pemikiran untuk: {}",
            prompt
        )));
        self.client.complete(context, cancel).await
    }

    /// Complexity heuristic: long prompts or explicit interrogatives.
    fn is_complex(&self, prompt: &str) -> bool {
        if prompt.split_whitespace().count() > COMPLEX_WORD_COUNT {
            return true;
        }
        let lower = prompt.to_lowercase();
        self.config
            .persona
            .complex_markers
            .iter()
            .any(|m| lower.contains(m.as_str()))
    }

    /// With probability [`WITTY_CHANCE`], prefix one witty remark and a
    /// blank line.
    fn decorate<R: Rng>(&self, reply: String, rng: &mut R) -> String {
        let remarks = &self.config.persona.witty_remarks;
        if remarks.is_empty() || rng.gen::<f64>() >= WITTY_CHANCE {
            return reply;
        }
        let remark = &remarks[rng.gen_range(0..remarks.len())];
        format!("{}\n\n{}", remark, reply)
    }
}

/// Fixed break-it-down framing shown before a deep-reasoning answer.
fn reasoning_preamble(prompt: &str) -> String {
    [
        "Mari uraikan pertanyaan ini:".to_string(),
        format!("Kamu bertanya: \"{}\"", prompt),
        "Saya akan berpikir langkah demi langkah...".to_string(),
        "1. Menganalisis konteks...".to_string(),
        "2. Merumuskan jawaban...".to_string(),
    ]
    .join("\n")
}
