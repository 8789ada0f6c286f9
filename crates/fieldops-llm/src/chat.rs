//! Chat-completions enhancer for OpenAI-compatible endpoints

use async_trait::async_trait;
use fieldops_core::clock::{Clock, SystemClock};
use fieldops_core::models::{InsightDraft, InsightSource};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

use crate::health::{HealthState, ProviderHealth};
use crate::ports::{EnhancerError, InsightEnhancer};

pub const MAX_TITLE_CHARS: usize = 120;
pub const MAX_MESSAGE_CHARS: usize = 600;

const SYSTEM_PROMPT: &str = "You refine operational schedule warnings for a field-service \
dispatcher. For each numbered insight you may rewrite the title and message to be clearer \
and adjust confidence between 0 and 1. Never change what the insight is about, its kind, or \
its severity. Titles must be at most 120 characters and messages at most 600 characters. \
Respond with JSON only: {\"insights\":[{\"index\":0,\"title\":\"...\",\"message\":\"...\",\
\"confidence\":0.8}]}";

/// Settings for the chat enhancer
#[derive(Debug, Clone)]
pub struct ChatEnhancerConfig {
    /// Base URL including the API version (e.g., "https://api.openai.com/v1")
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub timeout: Duration,
}

impl ChatEnhancerConfig {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: model.into(),
            timeout: Duration::from_secs(20),
        }
    }
}

/// Enhancer backed by a chat-completions HTTP endpoint
pub struct ChatEnhancer {
    config: ChatEnhancerConfig,
    health: Arc<ProviderHealth>,
    clock: Arc<dyn Clock>,
    client: reqwest::Client,
}

impl ChatEnhancer {
    pub fn new(config: ChatEnhancerConfig, health: Arc<ProviderHealth>) -> Result<Self, EnhancerError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| EnhancerError::Transport(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { config, health, clock: Arc::new(SystemClock), client })
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    async fn try_enhance(&self, drafts: &[InsightDraft]) -> Result<Vec<InsightDraft>, EnhancerError> {
        let now = self.clock.now();
        match self.health.state(now) {
            HealthState::Healthy => {}
            HealthState::CoolingDown { .. } => return Err(EnhancerError::CoolingDown),
            HealthState::Disabled { reason } => return Err(EnhancerError::Disabled(reason)),
        }

        let items: Vec<PromptItem<'_>> = drafts
            .iter()
            .enumerate()
            .map(|(index, d)| PromptItem {
                index,
                kind: d.kind.as_str(),
                severity: d.severity.as_str(),
                title: &d.title,
                message: &d.message,
            })
            .collect();

        let request = ChatRequest {
            model: &self.config.model,
            temperature: 0.2,
            response_format: json!({ "type": "json_object" }),
            messages: vec![
                ChatMessage { role: "system", content: SYSTEM_PROMPT.to_string() },
                ChatMessage {
                    role: "user",
                    content: serde_json::to_string(&json!({ "insights": items }))
                        .map_err(|e| EnhancerError::Malformed(e.to_string()))?,
                },
            ],
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.config.base_url.trim_end_matches('/')))
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let code = provider_error_code(&body);
            self.health.record_failure(status.as_u16(), code.as_deref(), self.clock.now());
            return Err(EnhancerError::Status { status: status.as_u16(), body });
        }

        let completion: ChatResponse = response.json().await?;
        let content = completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| EnhancerError::Malformed("response has no content".to_string()))?;

        apply_refinements(drafts, &content)
    }
}

#[async_trait]
impl InsightEnhancer for ChatEnhancer {
    async fn enhance(&self, drafts: Vec<InsightDraft>) -> Vec<InsightDraft> {
        if drafts.is_empty() {
            return drafts;
        }

        match self.try_enhance(&drafts).await {
            Ok(refined) => refined,
            Err(e) => {
                tracing::warn!(error = %e, count = drafts.len(), "Insight enhancement skipped");
                drafts
            }
        }
    }

    fn name(&self) -> &str {
        &self.config.model
    }
}

/// Merge the model's JSON answer into the drafts
///
/// Entries that fail validation are ignored; a body that is not the expected
/// JSON shape is an error.
pub fn apply_refinements(drafts: &[InsightDraft], content: &str) -> Result<Vec<InsightDraft>, EnhancerError> {
    let parsed: RefinementBatch =
        serde_json::from_str(content).map_err(|e| EnhancerError::Malformed(e.to_string()))?;

    let mut refined = drafts.to_vec();
    for item in parsed.insights {
        let Some(draft) = refined.get_mut(item.index) else {
            tracing::debug!(index = item.index, "Ignoring refinement with out-of-range index");
            continue;
        };
        if !item.is_valid_for(draft) {
            tracing::debug!(index = item.index, "Ignoring refinement that failed validation");
            continue;
        }

        draft.title = item.title.trim().to_string();
        draft.message = item.message.trim().to_string();
        if let Some(confidence) = item.confidence {
            draft.confidence = confidence;
        }
        draft.source = InsightSource::Hybrid;
    }
    Ok(refined)
}

fn provider_error_code(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value.pointer("/error/code").and_then(|c| c.as_str()).map(str::to_string)
}

#[derive(Debug, Serialize)]
struct PromptItem<'a> {
    index: usize,
    kind: &'a str,
    severity: &'a str,
    title: &'a str,
    message: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    response_format: serde_json::Value,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RefinementBatch {
    insights: Vec<Refinement>,
}

#[derive(Debug, Deserialize)]
struct Refinement {
    index: usize,
    title: String,
    message: String,
    #[serde(default)]
    confidence: Option<f64>,
    #[serde(default)]
    kind: Option<String>,
    #[serde(default)]
    severity: Option<String>,
}

impl Refinement {
    fn is_valid_for(&self, draft: &InsightDraft) -> bool {
        let title = self.title.trim();
        let message = self.message.trim();
        if title.is_empty() || title.chars().count() > MAX_TITLE_CHARS {
            return false;
        }
        if message.is_empty() || message.chars().count() > MAX_MESSAGE_CHARS {
            return false;
        }
        if self.confidence.is_some_and(|c| !(0.0..=1.0).contains(&c)) {
            return false;
        }
        if self.kind.as_deref().is_some_and(|k| k != draft.kind.as_str()) {
            return false;
        }
        if self.severity.as_deref().is_some_and(|s| s != draft.severity.as_str()) {
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use fieldops_core::models::{InsightKind, Severity, TechnicianId};

    fn drafts() -> Vec<InsightDraft> {
        vec![
            InsightDraft {
                kind: InsightKind::TravelOverload,
                severity: Severity::Warning,
                title: "Heavy driving day".to_string(),
                message: "180 minutes of travel".to_string(),
                date_key: NaiveDate::from_ymd_opt(2026, 3, 3),
                technician_id: Some(TechnicianId::from("t1")),
                booking_ids: vec![],
                fingerprint: "fp-a".to_string(),
                source: InsightSource::Rule,
                confidence: 0.8,
            },
            InsightDraft {
                kind: InsightKind::RestGap,
                severity: Severity::Critical,
                title: "Short rest".to_string(),
                message: "5 hours between jobs".to_string(),
                date_key: NaiveDate::from_ymd_opt(2026, 3, 4),
                technician_id: Some(TechnicianId::from("t1")),
                booking_ids: vec![],
                fingerprint: "fp-b".to_string(),
                source: InsightSource::Rule,
                confidence: 0.9,
            },
        ]
    }

    #[test]
    fn test_valid_refinement_is_applied_as_hybrid() {
        let content = r#"{"insights":[{"index":1,"title":"Only 5h rest before next shift",
            "message":"The technician finishes late and starts early.","confidence":0.95}]}"#;
        let refined = apply_refinements(&drafts(), content).unwrap();

        assert_eq!(refined[0], drafts()[0]);
        assert_eq!(refined[1].title, "Only 5h rest before next shift");
        assert_eq!(refined[1].confidence, 0.95);
        assert_eq!(refined[1].source, InsightSource::Hybrid);
        assert_eq!(refined[1].fingerprint, "fp-b");
        assert_eq!(refined[1].severity, Severity::Critical);
    }

    #[test]
    fn test_invalid_entries_are_ignored() {
        let long_title = "x".repeat(MAX_TITLE_CHARS + 1);
        let content = format!(
            r#"{{"insights":[
                {{"index":5,"title":"t","message":"m"}},
                {{"index":0,"title":"{}","message":"m"}},
                {{"index":0,"title":"t","message":"m","confidence":1.5}},
                {{"index":1,"title":"t","message":"m","severity":"info"}},
                {{"index":1,"title":"t","message":"m","kind":"travel_overload"}}
            ]}}"#,
            long_title
        );
        let refined = apply_refinements(&drafts(), &content).unwrap();
        assert_eq!(refined, drafts());
    }

    #[test]
    fn test_non_json_content_is_an_error() {
        assert!(matches!(
            apply_refinements(&drafts(), "Sure! Here are your insights"),
            Err(EnhancerError::Malformed(_))
        ));
    }

    #[test]
    fn test_provider_error_code_extraction() {
        let body = r#"{"error":{"message":"quota","code":"insufficient_quota"}}"#;
        assert_eq!(provider_error_code(body).as_deref(), Some("insufficient_quota"));
        assert_eq!(provider_error_code("not json"), None);
    }

    #[tokio::test]
    async fn test_disabled_provider_returns_drafts_unchanged() {
        let health = Arc::new(ProviderHealth::default());
        health.disable("test");
        let enhancer = ChatEnhancer::new(
            ChatEnhancerConfig::new("http://127.0.0.1:9", "key", "model"),
            health,
        )
        .unwrap();

        assert_eq!(enhancer.enhance(drafts()).await, drafts());
    }

    #[tokio::test]
    async fn test_unreachable_provider_returns_drafts_unchanged() {
        let mut config = ChatEnhancerConfig::new("http://127.0.0.1:9", "key", "model");
        config.timeout = Duration::from_millis(500);
        let enhancer = ChatEnhancer::new(config, Arc::new(ProviderHealth::default())).unwrap();

        assert_eq!(enhancer.enhance(drafts()).await, drafts());
    }
}
