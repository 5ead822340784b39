//! Word-by-word reveal of a resolved reply.
//!
//! A reveal walks `Idle -> Revealing -> {Completed, Cancelled}`. One
//! whitespace-delimited token is appended per tick; the observer sees each
//! accumulated prefix; the cancellation flag is checked before every tick
//! so a pending delay never outlives a stop request.

use crate::cancel::CancelToken;
use std::time::Duration;

/// Terminal result of one reveal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevealOutcome {
    /// All tokens were shown; holds the full (whitespace-normalized) text.
    Completed(String),
    /// Stopped early; holds the trimmed partial text when non-empty.
    Cancelled(Option<String>),
}

/// Observer invoked with the accumulated text after each revealed token.
pub type RevealObserver<'a> = &'a mut (dyn FnMut(&str) + Send);

/// Incremental token generator over a reply. Each `step()` yields the next
/// accumulated prefix; the async [`reveal`] driver adds timing and
/// cancellation on top.
#[derive(Debug)]
pub struct TypingSession {
    words: Vec<String>,
    next: usize,
    accumulated: String,
}

impl TypingSession {
    pub fn new(reply: &str) -> Self {
        Self {
            words: reply.split_whitespace().map(str::to_string).collect(),
            next: 0,
            accumulated: String::new(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.words.len() - self.next
    }

    pub fn is_done(&self) -> bool {
        self.next >= self.words.len()
    }

    pub fn accumulated(&self) -> &str {
        &self.accumulated
    }

    /// Append the next token. Returns the new prefix, or None when done.
    pub fn step(&mut self) -> Option<&str> {
        let word = self.words.get(self.next)?;
        if !self.accumulated.is_empty() {
            self.accumulated.push(' ');
        }
        self.accumulated.push_str(word);
        self.next += 1;
        Some(&self.accumulated)
    }

    /// Trimmed partial for a cancelled session; None when nothing was shown.
    pub fn partial(&self) -> Option<String> {
        let t = self.accumulated.trim();
        if t.is_empty() {
            None
        } else {
            Some(t.to_string())
        }
    }
}

/// Reveal `reply` one token at a time, sleeping `delay` between tokens.
/// Returns after the last token, or as soon as cancellation is observed.
pub async fn reveal(
    reply: &str,
    delay: Duration,
    cancel: &CancelToken,
    mut on_step: Option<RevealObserver<'_>>,
) -> RevealOutcome {
    let mut session = TypingSession::new(reply);
    let mut first = true;
    loop {
        if cancel.is_cancelled() {
            return RevealOutcome::Cancelled(session.partial());
        }
        if !first {
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = cancel.cancelled() => return RevealOutcome::Cancelled(session.partial()),
            }
        }
        first = false;
        match session.step() {
            Some(prefix) => {
                if let Some(cb) = on_step.as_mut() {
                    cb(prefix);
                }
            }
            None => return RevealOutcome::Completed(session.accumulated.clone()),
        }
    }
}
