//! Persona-derived replies: identity summary, introspection, and the
//! keyword-matched canned responses.

use crate::config::PersonaConfig;

/// Read-only view over the persona configuration.
pub struct Persona<'a> {
    config: &'a PersonaConfig,
}

impl<'a> Persona<'a> {
    pub fn new(config: &'a PersonaConfig) -> Self {
        Self { config }
    }

    /// Fixed identity/mission summary used as the synthesized system turn
    /// of every remote context window.
    pub fn identity_summary(&self) -> String {
        let c = self.config;
        format!(
            "**Identitas {}**\n- Nama: {}\n- Versi: {}\n- Pencipta: {} ({})\n- Misi: {}",
            c.name, c.name, c.version, c.creator, c.organization, c.mission
        )
    }

    /// Introspection sentence built from the current trait values.
    pub fn introspect(&self) -> String {
        let c = self.config;
        let mood = if c.traits.wit > 0.7 {
            "jenaka"
        } else {
            "analitis"
        };
        format!(
            "Saya {}, versi {}. Hari ini, saya {}, dengan rasa ingin tahu {}%. Apa yang bisa saya lakukan untukmu?",
            c.name,
            c.version,
            mood,
            (c.traits.curiosity * 100.0).round() as u32
        )
    }

    /// Canned reply for a predefined intent, checked in priority order:
    /// name, creator, about, competitor mention. Returned verbatim; canned
    /// replies never get the witty-remark prefix.
    pub fn predefined_response(&self, prompt: &str) -> Option<&str> {
        let lower = prompt.to_lowercase();
        let c = self.config;
        if c.name_triggers.iter().any(|t| lower.contains(t.as_str())) {
            return Some(&c.responses.name);
        }
        if c.creator_triggers.iter().any(|t| lower.contains(t.as_str())) {
            return Some(&c.responses.creator);
        }
        if c.about_triggers.iter().any(|t| lower.contains(t.as_str())) {
            return Some(&c.responses.about);
        }
        if lower.contains(c.competitor_token.as_str()) {
            return Some(&c.responses.competitor);
        }
        None
    }

    /// True when the prompt asks for introspection.
    pub fn wants_reflection(&self, prompt: &str) -> bool {
        prompt
            .to_lowercase()
            .contains(self.config.reflection_trigger.as_str())
    }
}
