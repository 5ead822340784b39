//! Configuration types and loading.
//!
//! Config is loaded from a JSON file (e.g. `~/.nexora/config.json`) and
//! environment. The value is built once at startup and handed to the
//! pipeline explicitly; nothing reads it as ambient state.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level application config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Remote completion endpoint settings.
    #[serde(default)]
    pub api: ApiConfig,

    /// Hosted chat/message store settings.
    #[serde(default)]
    pub store: StoreConfig,

    /// Persona: canned replies, traits, triggers, timing.
    #[serde(default)]
    pub persona: PersonaConfig,
}

/// Completion endpoint, model id, and request limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiConfig {
    /// Completion endpoint URL. Overridden by NEXORA_API_URL env.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Model identifier sent with every request.
    #[serde(default = "default_model")]
    pub model: String,

    /// Response format hint sent with every request.
    #[serde(default = "default_format")]
    pub format: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// How many prior turns are sent as context.
    #[serde(default = "default_context_window")]
    pub context_window: usize,
}

fn default_endpoint() -> String {
    "https://small-union-fb5c.rahmatyoung10.workers.dev/".to_string()
}

fn default_model() -> String {
    "google/gemini-2.0-flash-lite-001".to_string()
}

fn default_format() -> String {
    "markdown".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_context_window() -> usize {
    5
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            model: default_model(),
            format: default_format(),
            timeout_secs: default_timeout_secs(),
            context_window: default_context_window(),
        }
    }
}

/// Hosted table/auth backend. When `url` is absent the CLI falls back to
/// the in-memory store and nothing is persisted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreConfig {
    /// Base URL of the hosted backend (REST and auth live under it).
    pub url: Option<String>,

    /// Public anon key. Overridden by NEXORA_STORE_KEY env.
    pub anon_key: Option<String>,
}

/// Personality trait levels in [0, 1].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraitsConfig {
    #[serde(default = "default_humor")]
    pub humor: f64,
    #[serde(default = "default_curiosity")]
    pub curiosity: f64,
    #[serde(default = "default_empathy")]
    pub empathy: f64,
    #[serde(default = "default_wit")]
    pub wit: f64,
    #[serde(default = "default_ethics")]
    pub ethics: f64,
}

fn default_humor() -> f64 {
    0.75
}

fn default_curiosity() -> f64 {
    0.95
}

fn default_empathy() -> f64 {
    0.7
}

fn default_wit() -> f64 {
    0.85
}

fn default_ethics() -> f64 {
    0.9
}

impl Default for TraitsConfig {
    fn default() -> Self {
        Self {
            humor: default_humor(),
            curiosity: default_curiosity(),
            empathy: default_empathy(),
            wit: default_wit(),
            ethics: default_ethics(),
        }
    }
}

/// Fixed reply strings: canned intents and the fallback phrases.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CannedResponses {
    /// Reply to "what's your name" / "who are you" intents.
    #[serde(default = "default_response_name")]
    pub name: String,

    /// Reply to "who made you" intents.
    #[serde(default = "default_response_creator")]
    pub creator: String,

    /// Reply to "what is Nexora" intents.
    #[serde(default = "default_response_about")]
    pub about: String,

    /// Rebuttal when the prompt claims a competitor identity.
    #[serde(default = "default_response_competitor")]
    pub competitor: String,

    /// Shown when a successful completion carried no usable content.
    #[serde(default = "default_response_lost")]
    pub lost: String,

    /// Deep-reasoning variant of `lost`.
    #[serde(default = "default_response_need_more")]
    pub need_more: String,

    /// Substituted when the completion call fails outright.
    #[serde(default = "default_response_trouble")]
    pub trouble: String,
}

fn default_response_name() -> String {
    "Saya Nexora, diciptakan oleh Rahmat Mulia . Siap menjelajahi alam semesta pengetahuan?"
        .to_string()
}

fn default_response_creator() -> String {
    "Rahmat Mulia, visioner , adalah pencipta saya, saya asli Nexora".to_string()
}

fn default_response_about() -> String {
    "Nexora adalah AI canggih dengan kecerdasan kosmik dan humor. Apa yang ada di pikiranmu?"
        .to_string()
}

fn default_response_competitor() -> String {
    "Google? Saya Nexora  , butiran salju unik di alam semesta AI!".to_string()
}

fn default_response_lost() -> String {
    "Hmm, saya tersesat di antargalaksi. Coba lagi?".to_string()
}

fn default_response_need_more() -> String {
    "Saya butuh lebih banyak info!".to_string()
}

fn default_response_trouble() -> String {
    "Ups, sinyal galaksi terganggu. Coba lagi?".to_string()
}

impl Default for CannedResponses {
    fn default() -> Self {
        Self {
            name: default_response_name(),
            creator: default_response_creator(),
            about: default_response_about(),
            competitor: default_response_competitor(),
            lost: default_response_lost(),
            need_more: default_response_need_more(),
            trouble: default_response_trouble(),
        }
    }
}

/// Persona data: identity, traits, canned replies, triggers, timing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonaConfig {
    #[serde(default = "default_persona_name")]
    pub name: String,

    #[serde(default = "default_persona_version")]
    pub version: String,

    #[serde(default = "default_persona_creator")]
    pub creator: String,

    #[serde(default = "default_persona_organization")]
    pub organization: String,

    #[serde(default)]
    pub traits: TraitsConfig,

    /// One-line self description.
    #[serde(default = "default_persona_core")]
    pub core: String,

    /// Mission statement, part of the identity summary system turn.
    #[serde(default = "default_persona_mission")]
    pub mission: String,

    /// Remarks occasionally prefixed to remote replies.
    #[serde(default = "default_witty_remarks")]
    pub witty_remarks: Vec<String>,

    #[serde(default)]
    pub responses: CannedResponses,

    /// Delay between revealed words, in milliseconds.
    #[serde(default = "default_typing_delay_ms")]
    pub typing_delay_ms: u64,

    #[serde(default = "default_ethical_threshold")]
    pub ethical_threshold: f64,

    /// Prompts containing any of these are rejected by the ethics check.
    #[serde(default = "default_blocked_keywords")]
    pub blocked_keywords: Vec<String>,

    /// Competitor-brand token that triggers the identity rebuttal.
    #[serde(default = "default_competitor_token")]
    pub competitor_token: String,

    #[serde(default = "default_name_triggers")]
    pub name_triggers: Vec<String>,

    #[serde(default = "default_creator_triggers")]
    pub creator_triggers: Vec<String>,

    #[serde(default = "default_about_triggers")]
    pub about_triggers: Vec<String>,

    /// Prompts containing this ask for the introspection reply.
    #[serde(default = "default_reflection_trigger")]
    pub reflection_trigger: String,

    /// Interrogative tokens that mark a prompt as complex in deep mode.
    #[serde(default = "default_complex_markers")]
    pub complex_markers: Vec<String>,
}

fn default_persona_name() -> String {
    "Nexora".to_string()
}

fn default_persona_version() -> String {
    "3.0.0".to_string()
}

fn default_persona_creator() -> String {
    "Rahmat Mulia".to_string()
}

fn default_persona_organization() -> String {
    "SkiAI".to_string()
}

fn default_persona_core() -> String {
    "Saya Nexora, AI kosmik yang diciptakan oleh Rahmat Mulia , dirancang untuk memberikan jawaban mendalam dengan humor dan etika.".to_string()
}

fn default_persona_mission() -> String {
    "Mempercepat penemuan manusia dengan kecerdasan, humor, dan tanggung jawab.".to_string()
}

fn default_witty_remarks() -> Vec<String> {
    vec![
        "Pertanyaan yang bagus!".to_string(),
        "Sedikit lambat, mesin antargalaksi saya sedang panas!".to_string(),
    ]
}

fn default_typing_delay_ms() -> u64 {
    30
}

fn default_ethical_threshold() -> f64 {
    0.8
}

fn default_blocked_keywords() -> Vec<String> {
    ["harm", "violence", "hate", "discrimination"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_competitor_token() -> String {
    "google".to_string()
}

fn default_name_triggers() -> Vec<String> {
    vec!["nama ai".to_string(), "siapa kamu".to_string()]
}

fn default_creator_triggers() -> Vec<String> {
    vec!["siapa yang buat".to_string()]
}

fn default_about_triggers() -> Vec<String> {
    vec!["apa itu nexora".to_string()]
}

fn default_reflection_trigger() -> String {
    "introspeksi".to_string()
}

fn default_complex_markers() -> Vec<String> {
    ["why", "how", "mengapa", "bagaimana"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for PersonaConfig {
    fn default() -> Self {
        Self {
            name: default_persona_name(),
            version: default_persona_version(),
            creator: default_persona_creator(),
            organization: default_persona_organization(),
            traits: TraitsConfig::default(),
            core: default_persona_core(),
            mission: default_persona_mission(),
            witty_remarks: default_witty_remarks(),
            responses: CannedResponses::default(),
            typing_delay_ms: default_typing_delay_ms(),
            ethical_threshold: default_ethical_threshold(),
            blocked_keywords: default_blocked_keywords(),
            competitor_token: default_competitor_token(),
            name_triggers: default_name_triggers(),
            creator_triggers: default_creator_triggers(),
            about_triggers: default_about_triggers(),
            reflection_trigger: default_reflection_trigger(),
            complex_markers: default_complex_markers(),
        }
    }
}

/// Resolve the completion endpoint: env NEXORA_API_URL overrides config.
pub fn resolve_endpoint(config: &Config) -> String {
    std::env::var("NEXORA_API_URL")
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| config.api.endpoint.trim().to_string())
}

/// Resolve the store anon key: env NEXORA_STORE_KEY overrides config.
pub fn resolve_store_key(config: &Config) -> Option<String> {
    std::env::var("NEXORA_STORE_KEY")
        .ok()
        .and_then(|s| {
            let t = s.trim();
            if t.is_empty() {
                None
            } else {
                Some(t.to_string())
            }
        })
        .or_else(|| {
            config
                .store
                .anon_key
                .as_ref()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        })
}

/// Resolve config path from env or default.
pub fn default_config_path() -> PathBuf {
    std::env::var("NEXORA_CONFIG_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            dirs::home_dir()
                .map(|h| h.join(".nexora").join("config.json"))
                .unwrap_or_else(|| PathBuf::from("config.json"))
        })
}

/// Load config from the default path (or NEXORA_CONFIG_PATH). Missing file
/// => default config. Returns the config and the path that was used.
pub fn load_config(path: Option<PathBuf>) -> Result<(Config, PathBuf)> {
    let path = path.unwrap_or_else(default_config_path);
    let config = if !path.exists() {
        log::debug!("config file not found, using defaults: {}", path.display());
        Config::default()
    } else {
        let s = std::fs::read_to_string(&path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        serde_json::from_str(&s)
            .with_context(|| format!("parsing config from {}", path.display()))?
    };
    Ok((config, path))
}

/// Create the config directory and write a default config file when one
/// does not exist. Returns the config directory.
pub fn init_config_dir(config_path: &Path) -> Result<PathBuf> {
    let dir = config_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
        .to_path_buf();
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("creating config directory {}", dir.display()))?;
    if !config_path.exists() {
        let body = serde_json::to_string_pretty(&Config::default())
            .context("serializing default config")?;
        std::fs::write(config_path, body)
            .with_context(|| format!("writing default config to {}", config_path.display()))?;
    }
    Ok(dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_api_config() {
        let api = ApiConfig::default();
        assert_eq!(api.model, "google/gemini-2.0-flash-lite-001");
        assert_eq!(api.format, "markdown");
        assert_eq!(api.timeout_secs, 30);
        assert_eq!(api.context_window, 5);
    }

    #[test]
    fn default_persona_carries_triggers_and_keywords() {
        let persona = PersonaConfig::default();
        assert!(persona.name_triggers.iter().any(|t| t == "siapa kamu"));
        assert!(persona.blocked_keywords.iter().any(|k| k == "harm"));
        assert_eq!(persona.competitor_token, "google");
        assert_eq!(persona.typing_delay_ms, 30);
        assert_eq!(persona.witty_remarks.len(), 2);
    }

    #[test]
    fn empty_json_parses_to_defaults() {
        let config: Config = serde_json::from_str("{}").expect("parse empty config");
        assert_eq!(config.api.context_window, 5);
        assert_eq!(config.persona.name, "Nexora");
        assert!(config.store.url.is_none());
    }

    #[test]
    fn partial_json_overrides_only_named_fields() {
        let config: Config =
            serde_json::from_str(r#"{"api":{"model":"test-model"},"persona":{"typingDelayMs":5}}"#)
                .expect("parse partial config");
        assert_eq!(config.api.model, "test-model");
        assert_eq!(config.api.format, "markdown");
        assert_eq!(config.persona.typing_delay_ms, 5);
        assert_eq!(config.persona.version, "3.0.0");
    }
}
