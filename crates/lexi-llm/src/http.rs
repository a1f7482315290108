//! HTTP [`ContentGenerator`] over a JSON chat-completions endpoint.
//!
//! One request per stage: a system message fixing the author persona and
//! level constraints, a user message carrying the stage instructions and
//! the aggregated context, and a JSON response parsed into the stage's
//! payload type. Models often wrap JSON in a fenced code block, so the
//! parser strips fences before deserializing.

use std::fmt::Write as _;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, instrument};

use lexi_core::content::{
    AssessmentSection, GrammarContent, QaSection, SentencesSection, StagePayload, TipsContent,
    VocabularySection,
};
use lexi_core::unit::{Stage, UnitType};
use lexi_settings::GeneratorSettings;

use crate::errors::{GeneratorError, Result};
use crate::generator::{ContentGenerator, SelectedStrategy, StageRequest};
use crate::retry::{RetryConfig, with_retry};

/// Minimal chat-completions response shape.
#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: String,
}

/// Generator backed by an OpenAI-compatible chat-completions API.
pub struct HttpGenerator {
    client: reqwest::Client,
    settings: GeneratorSettings,
    api_key: String,
    retry: RetryConfig,
}

impl HttpGenerator {
    /// Build from settings, reading the API key from the configured
    /// environment variable.
    pub fn new(settings: GeneratorSettings) -> Result<Self> {
        let api_key = std::env::var(&settings.api_key_env)
            .map_err(|_| GeneratorError::MissingApiKey(settings.api_key_env.clone()))?;
        Ok(Self::with_api_key(settings, api_key))
    }

    /// Build with an explicit API key (used by tests).
    #[must_use]
    pub fn with_api_key(settings: GeneratorSettings, api_key: String) -> Self {
        let retry = RetryConfig {
            max_retries: settings.max_retries,
            base_delay_ms: settings.base_delay_ms,
            ..RetryConfig::default()
        };
        Self {
            client: reqwest::Client::new(),
            settings,
            api_key,
            retry,
        }
    }

    /// Sampling temperature for a request's stage.
    fn temperature(&self, request: &StageRequest) -> f64 {
        let t = &self.settings.temperatures;
        match request.stage {
            Stage::Vocabulary => t.vocabulary,
            Stage::Sentences => t.sentences,
            Stage::Strategy => match request.unit.unit_type {
                UnitType::Lexical => t.tips,
                UnitType::Grammar => t.grammar,
            },
            Stage::Assessments => t.assessments,
            Stage::Qa => t.qa,
        }
    }

    async fn call_once(&self, request: &StageRequest) -> Result<StagePayload> {
        let body = json!({
            "model": self.settings.model,
            "temperature": self.temperature(request),
            "messages": [
                { "role": "system", "content": system_prompt(request) },
                { "role": "user", "content": user_prompt(request) },
            ],
        });

        let response = self
            .client
            .post(format!("{}/chat/completions", self.settings.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after_ms = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .map_or(self.settings.base_delay_ms, |secs| secs * 1000);
            return Err(GeneratorError::RateLimited { retry_after_ms });
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(GeneratorError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let chat: ChatResponse = response.json().await?;
        let content = chat
            .choices
            .first()
            .map(|c| c.message.content.as_str())
            .ok_or_else(|| GeneratorError::InvalidPayload {
                message: "response has no choices".to_string(),
            })?;
        parse_payload(request, content)
    }
}

#[async_trait]
impl ContentGenerator for HttpGenerator {
    #[instrument(skip_all, fields(stage = %request.stage, unit_id = %request.unit.id))]
    async fn generate(&self, request: &StageRequest) -> Result<StagePayload> {
        with_retry(&self.retry, || self.call_once(request)).await
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Prompts
// ─────────────────────────────────────────────────────────────────────────────

fn system_prompt(request: &StageRequest) -> String {
    format!(
        "You are an expert author of {} language-learning materials. \
         Write for CEFR level {} in the '{}' course, book '{}'. \
         Respond with a single JSON object and nothing else.",
        request.unit.language_variant,
        request.unit.cefr_level,
        request.hierarchy.course_name,
        request.hierarchy.book_name,
    )
}

fn user_prompt(request: &StageRequest) -> String {
    let unit = &request.unit;
    let mut prompt = format!(
        "Unit: {} (unit {} of its book, {} progression)\n",
        unit.title, unit.sequence_order, request.rag.progression_level,
    );
    if let Some(context) = &unit.context {
        let _ = writeln!(prompt, "Context: {context}");
    }
    if !request.rag.taught_vocabulary.is_empty() {
        let _ = writeln!(
            prompt,
            "Already taught in earlier units (avoid reteaching): {}",
            request.rag.taught_vocabulary.join(", ")
        );
    }
    if !unit.vocabulary_words.is_empty() {
        let _ = writeln!(
            prompt,
            "This unit's vocabulary: {}",
            unit.vocabulary_words.join(", ")
        );
    }
    for image in &request.image_analysis {
        let _ = writeln!(
            prompt,
            "Image '{}': {} (objects: {})",
            image.filename,
            image.description,
            image.objects_detected.join(", ")
        );
    }
    prompt.push('\n');
    prompt.push_str(&stage_instructions(request));
    prompt
}

fn stage_instructions(request: &StageRequest) -> String {
    match request.stage {
        Stage::Vocabulary => "Generate the unit's vocabulary as JSON: \
            {\"items\": [{\"word\", \"phoneme\" (IPA), \"definition\", \"example\", \
            \"word_class\", \"frequency_level\"}], \"total_count\", \
            \"context_relevance\", \"generated_at\" (RFC 3339)}. \
            20-30 items connected to the unit context."
            .to_string(),
        Stage::Sentences => "Generate example sentences as JSON: \
            {\"sentences\": [{\"text\", \"vocabulary_used\", \"context_situation\", \
            \"complexity_level\"}], \"vocabulary_coverage\", \"generated_at\" (RFC 3339)}. \
            Every sentence must use at least one unit vocabulary word."
            .to_string(),
        Stage::Strategy => strategy_instructions(request),
        Stage::Assessments => {
            let plan = request
                .assessment_plan
                .as_ref()
                .map(|p| {
                    format!(
                        "Produce exactly these two activities: {} and {}. Rationale: {}",
                        p.activities[0],
                        p.activities[1],
                        p.rationale.join("; ")
                    )
                })
                .unwrap_or_default();
            format!(
                "Generate the unit's assessments as JSON: {{\"activities\": [{{\"type\", \
                 \"title\", \"instructions\", \"content\", \"answer_key\", \
                 \"estimated_minutes\"}}], \"selection_rationale\", \"skills_assessed\", \
                 \"total_estimated_minutes\"}}. {plan}"
            )
        }
        Stage::Qa => "Generate teacher Q&A as JSON: {\"questions\", \"answers\", \
            \"pedagogical_notes\", \"difficulty_progression\"}. Eight to twelve questions \
            moving from recognition to production."
            .to_string(),
    }
}

fn strategy_instructions(request: &StageRequest) -> String {
    match &request.selection {
        Some(SelectedStrategy::Tips(selection)) => format!(
            "Apply the '{}' vocabulary strategy. Why it was chosen: {}. \
             Generate JSON: {{\"strategy\": \"{}\", \"title\", \"explanation\", \
             \"examples\", \"practice_suggestions\", \"memory_techniques\", \
             \"vocabulary_coverage\", \"complementary_strategies\", \
             \"selection_rationale\"}}.",
            selection.strategy,
            selection.rationale_text(),
            selection.strategy,
        ),
        Some(SelectedStrategy::Grammar(selection)) => format!(
            "Teach the grammar point '{}' with the '{}' strategy{}. \
             Generate JSON: {{\"strategy\": \"{}\", \"grammar_point\", \
             \"systematic_explanation\", \"usage_rules\", \"examples\", \
             \"l1_interference_notes\", \"common_mistakes\": [{{\"mistake\", \
             \"correction\"}}], \"selection_rationale\"}}.",
            request.unit.grammar_point.as_deref().unwrap_or("General Grammar Structures"),
            selection.strategy,
            if selection.matched_patterns.is_empty() {
                String::new()
            } else {
                format!(
                    " (interference focus: {})",
                    selection.matched_patterns.join(", ")
                )
            },
            selection.strategy,
        ),
        None => "Generate strategy content as a JSON object.".to_string(),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Response parsing
// ─────────────────────────────────────────────────────────────────────────────

/// Strip a Markdown code fence, if present, and return the JSON body.
fn extract_json(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the language tag line, then everything after the closing fence.
    let body = rest.split_once('\n').map_or(rest, |(_, body)| body);
    body.rsplit_once("```").map_or(body, |(body, _)| body).trim()
}

fn parse_payload(request: &StageRequest, content: &str) -> Result<StagePayload> {
    let body = extract_json(content);
    debug!(stage = %request.stage, bytes = body.len(), "parsing generator response");
    let invalid = |e: serde_json::Error| GeneratorError::InvalidPayload {
        message: format!("{} stage: {e}", request.stage),
    };
    let payload = match request.stage {
        Stage::Vocabulary => {
            StagePayload::Vocabulary(serde_json::from_str::<VocabularySection>(body).map_err(invalid)?)
        }
        Stage::Sentences => {
            StagePayload::Sentences(serde_json::from_str::<SentencesSection>(body).map_err(invalid)?)
        }
        Stage::Strategy => match request.unit.unit_type {
            UnitType::Lexical => {
                StagePayload::Tips(serde_json::from_str::<TipsContent>(body).map_err(invalid)?)
            }
            UnitType::Grammar => {
                StagePayload::Grammar(serde_json::from_str::<GrammarContent>(body).map_err(invalid)?)
            }
        },
        Stage::Assessments => StagePayload::Assessments(
            serde_json::from_str::<AssessmentSection>(body).map_err(invalid)?,
        ),
        Stage::Qa => StagePayload::Qa(serde_json::from_str::<QaSection>(body).map_err(invalid)?),
    };
    Ok(payload)
}
