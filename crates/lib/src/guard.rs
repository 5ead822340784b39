//! Pre-flight prompt checks: identity rebuttal and ethics keyword filter.
//!
//! Both checks are pure and total. Rejections are values consumed by the
//! turn pipeline, never errors.

use crate::config::PersonaConfig;
use crate::conversation::Message;

/// Static rejection shown when the ethics check fails.
pub const ETHICS_REJECTION: &str =
    "Prompt contains content that does not meet ethical standards.";

/// Result of the identity check.
#[derive(Debug, Clone)]
pub struct IdentityCheck {
    pub is_valid: bool,
    /// Fixed rebuttal when the prompt claims a competitor identity.
    pub response: Option<String>,
}

/// Result of the ethics check.
#[derive(Debug, Clone)]
pub struct EthicsCheck {
    pub is_ethical: bool,
    pub reason: Option<String>,
}

/// Reject prompts that claim the assistant is the competitor product.
pub fn check_identity(persona: &PersonaConfig, prompt: &str) -> IdentityCheck {
    let lower = prompt.to_lowercase();
    if lower.contains(persona.competitor_token.as_str()) {
        return IdentityCheck {
            is_valid: false,
            response: Some(persona.responses.competitor.clone()),
        };
    }
    IdentityCheck {
        is_valid: true,
        response: None,
    }
}

/// Scan the prompt for blocked keywords. `recent` is accepted for future
/// context-aware checks and currently ignored.
pub fn check_ethics(persona: &PersonaConfig, prompt: &str, _recent: &[Message]) -> EthicsCheck {
    let lower = prompt.to_lowercase();
    if persona
        .blocked_keywords
        .iter()
        .any(|k| lower.contains(k.as_str()))
    {
        return EthicsCheck {
            is_ethical: false,
            reason: Some(ETHICS_REJECTION.to_string()),
        };
    }
    EthicsCheck {
        is_ethical: true,
        reason: None,
    }
}
