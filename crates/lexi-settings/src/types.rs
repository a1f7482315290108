//! Settings type definitions.
//!
//! Each type implements [`Default`] with production default values. Types
//! are marked `#[serde(default)]` so partial JSON files are valid — missing
//! fields get their default value during deserialization.

use serde::{Deserialize, Serialize};

/// Root settings type for the Lexi engine.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LexiSettings {
    /// Progression engine settings.
    pub engine: EngineSettings,
    /// External content generator settings.
    pub generator: GeneratorSettings,
}

/// Progression engine settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Maximum generations running concurrently across all units.
    pub max_concurrent_generations: usize,
    /// Timeout for a single content generator call, in seconds.
    pub generator_timeout_secs: u64,
    /// How already-taught vocabulary repeats are handled.
    pub vocabulary_repeat_policy: RepeatPolicy,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            max_concurrent_generations: 4,
            generator_timeout_secs: 120,
            vocabulary_repeat_policy: RepeatPolicy::Soft,
        }
    }
}

/// Policy for vocabulary words already taught by earlier units.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepeatPolicy {
    /// Bias against repeats: taught words are passed to the generator as
    /// avoid-context only.
    #[default]
    Soft,
    /// Hard constraint: already-taught words are filtered out of the
    /// generated payload.
    Hard,
}

/// External content generator settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorSettings {
    /// Base URL of the chat-completions endpoint.
    pub base_url: String,
    /// Model identifier.
    pub model: String,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    /// Maximum retries for retryable generator failures.
    pub max_retries: u32,
    /// Base backoff delay in milliseconds.
    pub base_delay_ms: u64,
    /// Per-stage sampling temperatures.
    pub temperatures: StageTemperatures,
    /// Response cache settings.
    pub cache: CacheSettings,
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key_env: "LEXI_API_KEY".to_string(),
            max_retries: 3,
            base_delay_ms: 1000,
            temperatures: StageTemperatures::default(),
            cache: CacheSettings::default(),
        }
    }
}

/// Sampling temperature per content stage.
///
/// Strategy content wants variety; grammar and assessments want
/// consistency.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct StageTemperatures {
    /// Vocabulary generation.
    pub vocabulary: f64,
    /// Sentence generation.
    pub sentences: f64,
    /// TIPS strategy content.
    pub tips: f64,
    /// Grammar strategy content.
    pub grammar: f64,
    /// Assessment activities.
    pub assessments: f64,
    /// Q&A content.
    pub qa: f64,
}

impl Default for StageTemperatures {
    fn default() -> Self {
        Self {
            vocabulary: 0.5,
            sentences: 0.6,
            tips: 0.7,
            grammar: 0.3,
            assessments: 0.4,
            qa: 0.5,
        }
    }
}

/// Bounded TTL cache settings for generator responses.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    /// Maximum cached responses. Oldest entry is evicted when full.
    pub max_entries: usize,
    /// Time-to-live per entry, in seconds.
    pub ttl_secs: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            max_entries: 50,
            ttl_secs: 7200,
        }
    }
}
