//! AI assist adapter: optional drafting and polishing of project objectives.
//!
//! The adapter is built with an explicit, optional generator. Without one it
//! never touches the network and every call reports `NotConfigured`.
//! Results are returned, never applied: the caller merges them into the
//! wizard state, so a failed call leaves the state untouched.

use std::sync::{Arc, LazyLock};

use regex::{Captures, Regex};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::Config;
use crate::llm_client::prompts::JSON_ONLY_SYSTEM;
use crate::llm_client::{parse_json, GenerationConfig, LlmClient, LlmError, TextGenerator};
use crate::models::{AiSuggestion, ProjectInfo};
use crate::validation::{validate_required, validate_suggest_topic};

pub mod prompts;

use prompts::{
    improve_schema, suggest_schema, IMPROVE_PROMPT_TEMPLATE, IMPROVE_TEMPERATURE,
    SUGGEST_PROMPT_TEMPLATE, SUGGEST_TEMPERATURE,
};

#[derive(Debug, Error)]
pub enum AssistError {
    #[error("AI assist is not configured")]
    NotConfigured,

    #[error("{0}")]
    Precondition(String),

    #[error("AI service call failed: {0}")]
    Service(#[from] LlmError),
}

// ────────────────────────────────────────────────────────────────────────────
// Service payloads
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SuggestPayload {
    general_objective: String,
    #[serde(default)]
    specific_objectives: Vec<String>,
}

/// Every field is optional on purpose: whatever the service omits is kept
/// from the student's draft.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImprovePayload {
    #[serde(default)]
    topic: Option<String>,
    #[serde(default)]
    general_objective: Option<String>,
    #[serde(default)]
    specific_objectives: Vec<Option<String>>,
}

// ────────────────────────────────────────────────────────────────────────────
// Adapter
// ────────────────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct AiAssist {
    generator: Option<Arc<dyn TextGenerator>>,
}

impl AiAssist {
    pub fn new(generator: Option<Arc<dyn TextGenerator>>) -> Self {
        Self { generator }
    }

    /// Manual-entry-only mode.
    pub fn disabled() -> Self {
        Self { generator: None }
    }

    /// Wires the Gemini client when an API key is configured.
    pub fn from_config(config: &Config) -> Result<Self, LlmError> {
        match &config.gemini_api_key {
            Some(key) => {
                let key = SecretString::from(key.expose_secret().to_owned());
                let client = LlmClient::new(key, config.gemini_api_url.clone())?;
                Ok(Self::new(Some(Arc::new(client))))
            }
            None => {
                warn!("GEMINI_API_KEY not set; AI assist disabled, manual entry only");
                Ok(Self::disabled())
            }
        }
    }

    pub fn is_configured(&self) -> bool {
        self.generator.is_some()
    }

    fn generator(&self) -> Result<&Arc<dyn TextGenerator>, AssistError> {
        self.generator.as_ref().ok_or(AssistError::NotConfigured)
    }

    /// Drafts a general objective and specific objectives from the topic.
    ///
    /// The topic must be at least five characters; shorter topics never reach the service.
    pub async fn suggest(&self, topic: &str, major: &str) -> Result<AiSuggestion, AssistError> {
        let generator = self.generator()?;
        check_suggest(topic)?;

        let config = GenerationConfig {
            temperature: SUGGEST_TEMPERATURE,
            response_schema: suggest_schema(),
        };
        let text = generator
            .generate(&render_suggest_prompt(topic, major), JSON_ONLY_SYSTEM, &config)
            .await?;
        let payload: SuggestPayload = parse_json(&text)?;

        info!(
            objectives = payload.specific_objectives.len(),
            "AI suggestion received"
        );
        Ok(AiSuggestion {
            general_objective: payload.general_objective,
            specific_objectives: payload.specific_objectives,
        })
    }

    /// Rewrites the whole project record in a more academic register.
    ///
    /// Requires a topic and a general objective. Any field the service leaves
    /// out or blank keeps its original value, one field at a time.
    pub async fn improve(
        &self,
        project: &ProjectInfo,
        major: &str,
    ) -> Result<ProjectInfo, AssistError> {
        let generator = self.generator()?;
        check_improve(project)?;

        let config = GenerationConfig {
            temperature: IMPROVE_TEMPERATURE,
            response_schema: improve_schema(),
        };
        let text = generator
            .generate(
                &render_improve_prompt(project, major),
                JSON_ONLY_SYSTEM,
                &config,
            )
            .await?;
        let payload: ImprovePayload = parse_json(&text)?;

        info!("AI improvement received");
        Ok(merge_improvement(project, payload))
    }
}

/// Suggest precondition: a topic of at least five characters.
pub fn check_suggest(topic: &str) -> Result<(), AssistError> {
    validate_suggest_topic(topic).map_err(AssistError::Precondition)
}

/// Improve precondition: a topic and a general objective.
pub fn check_improve(project: &ProjectInfo) -> Result<(), AssistError> {
    validate_required(&project.topic, "Le sujet est requis pour l'amélioration.")
        .map_err(AssistError::Precondition)?;
    validate_required(
        &project.general_objective,
        "L'objectif général est requis pour l'amélioration.",
    )
    .map_err(AssistError::Precondition)
}

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([a-z_]+)\}").expect("valid placeholder regex"));

/// Fills `{name}` slots in a single pass. Inserted text is never rescanned,
/// so braces typed by the student come through verbatim.
fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &Captures| {
            values
                .iter()
                .find(|(name, _)| *name == &caps[1])
                .map(|(_, value)| (*value).to_string())
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

pub fn render_suggest_prompt(topic: &str, major: &str) -> String {
    fill_template(
        SUGGEST_PROMPT_TEMPLATE,
        &[("major", major.trim()), ("topic", topic.trim())],
    )
}

pub fn render_improve_prompt(project: &ProjectInfo, major: &str) -> String {
    let objectives =
        serde_json::to_string(&project.specific_objectives).unwrap_or_else(|_| "[]".to_string());
    fill_template(
        IMPROVE_PROMPT_TEMPLATE,
        &[
            ("major", major.trim()),
            ("topic", project.topic.trim()),
            ("general_objective", project.general_objective.trim()),
            ("specific_objectives", &objectives),
        ],
    )
}

/// Field-wise fallback: keep the original wherever the service returned nothing usable.
fn merge_improvement(original: &ProjectInfo, payload: ImprovePayload) -> ProjectInfo {
    fn pick(candidate: Option<String>, original: &str) -> String {
        match candidate {
            Some(text) if !text.trim().is_empty() => text,
            _ => original.to_string(),
        }
    }

    let mut incoming = payload.specific_objectives.into_iter();
    let mut merged = original.clone();
    merged.topic = pick(payload.topic, &original.topic);
    merged.general_objective = pick(payload.general_objective, &original.general_objective);
    for (slot, before) in merged
        .specific_objectives
        .iter_mut()
        .zip(original.specific_objectives.iter())
    {
        *slot = pick(incoming.next().flatten(), before);
    }
    merged
}
