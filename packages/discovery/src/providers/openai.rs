//! OpenAI-compatible provider client.
//!
//! One client implements all three provider traits: web-search completions
//! for the search strategy, schema-constrained extraction for the crawl
//! strategy, and schema-constrained verdicts for the validation stage.
//! Structured calls use the `json_schema` response format with schemas
//! generated from Rust types via `schemars`.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{AcquisitionError, ValidationProviderError};
use crate::parse::RawCandidate;
use crate::providers::logger::{truncate_for_log, CallMeta};
use crate::providers::search::{EventExtractor, ExtractReply, SearchProvider, SearchReply};
use crate::providers::validator::{ValidationContext, ValidationProvider, VerdictReply};
use crate::types::candidate::CandidateEvent;
use crate::types::validation::ValidationVerdict;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_SEARCH_MODEL: &str = "gpt-4o-search-preview";
const DEFAULT_VALIDATION_MODEL: &str = "gpt-4o-mini";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Client for any OpenAI-compatible chat completions API.
#[derive(Clone)]
pub struct OpenAiClient {
    http_client: reqwest::Client,
    api_key: String,
    base_url: String,
    search_model: String,
    validation_model: String,
}

impl OpenAiClient {
    pub fn new(api_key: impl Into<String>) -> Result<Self, AcquisitionError> {
        let http_client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| AcquisitionError::Transport {
                url: DEFAULT_BASE_URL.to_string(),
                message: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            http_client,
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            search_model: DEFAULT_SEARCH_MODEL.to_string(),
            validation_model: DEFAULT_VALIDATION_MODEL.to_string(),
        })
    }

    /// Custom base URL (Azure, proxies, compatible gateways).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_search_model(mut self, model: impl Into<String>) -> Self {
        self.search_model = model.into();
        self
    }

    pub fn with_validation_model(mut self, model: impl Into<String>) -> Self {
        self.validation_model = model.into();
        self
    }

    async fn chat(&self, request: &ChatRequest) -> Result<(String, CallMeta), AcquisitionError> {
        let start = Instant::now();
        let url = format!("{}/chat/completions", self.base_url);

        let response = self
            .http_client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| AcquisitionError::Transport {
                url: url.clone(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = %status, body = %truncate_for_log(&body), "provider API error");
            return Err(AcquisitionError::Provider {
                status: status.as_u16(),
                message: truncate_for_log(&body),
            });
        }

        let raw: ChatResponseRaw =
            response
                .json()
                .await
                .map_err(|e| AcquisitionError::Provider {
                    status: status.as_u16(),
                    message: format!("unparseable response body: {e}"),
                })?;

        let content = raw
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| AcquisitionError::Provider {
                status: status.as_u16(),
                message: "empty completion".to_string(),
            })?;

        let meta = CallMeta {
            duration_ms: start.elapsed().as_millis() as i64,
            total_tokens: raw.usage.map(|u| u.total_tokens),
        };
        Ok((content, meta))
    }
}

#[async_trait]
impl SearchProvider for OpenAiClient {
    async fn search(
        &self,
        query: &str,
        recency_days: Option<i64>,
    ) -> Result<SearchReply, AcquisitionError> {
        let mut content = query.to_string();
        if let Some(days) = recency_days {
            content.push_str(&format!(
                "\n\nPrefer sources published or updated within the last {days} days."
            ));
        }

        let request = ChatRequest {
            model: self.search_model.clone(),
            messages: vec![Message::user(content)],
            web_search_options: Some(json!({})),
            response_format: None,
        };

        let (text, meta) = self.chat(&request).await?;
        Ok(SearchReply { text, meta })
    }
}

/// Structured envelope the extraction call is constrained to.
#[derive(Debug, Deserialize, JsonSchema)]
struct EventsEnvelope {
    events: Vec<RawCandidate>,
}

#[async_trait]
impl EventExtractor for OpenAiClient {
    async fn extract_events(&self, prompt: &str) -> Result<ExtractReply, AcquisitionError> {
        let request = ChatRequest {
            model: self.validation_model.clone(),
            messages: vec![
                Message::system(
                    "You extract local event listings from web page text. \
                     Only report events actually present in the text.",
                ),
                Message::user(prompt.to_string()),
            ],
            web_search_options: None,
            response_format: Some(json_schema_format::<EventsEnvelope>("events_envelope")),
        };

        let (raw, meta) = self.chat(&request).await?;

        // Schema-constrained, but stay defensive: an unparseable envelope
        // degrades to "nothing extracted" rather than failing the job.
        let events = match serde_json::from_str::<EventsEnvelope>(&raw) {
            Ok(envelope) => envelope.events,
            Err(e) => {
                tracing::warn!(error = %e, "extraction envelope unparseable");
                vec![]
            }
        };

        Ok(ExtractReply { events, raw, meta })
    }
}

#[async_trait]
impl ValidationProvider for OpenAiClient {
    async fn validate(
        &self,
        candidate: &CandidateEvent,
        context: &ValidationContext,
    ) -> Result<VerdictReply, ValidationProviderError> {
        let candidate_json = serde_json::to_string_pretty(candidate)
            .map_err(|e| ValidationProviderError(e.to_string()))?;

        let mut user = format!(
            "Judge whether this is a real, correctly described local event for \
             the {} market ({}).\n\nCandidate:\n{}",
            context.market_name, context.region, candidate_json
        );
        if let Some(category) = &context.category {
            user.push_str(&format!("\n\nExpected category: {category}"));
        }
        if let Some(pillar) = &context.pillar {
            user.push_str(&format!("\nPillar: {pillar}"));
        }

        let request = ChatRequest {
            model: self.validation_model.clone(),
            messages: vec![
                Message::system(
                    "You validate candidate event records. Report problems as \
                     issues, supply corrections for fields you can fix, and \
                     recommend accept, reject, or needs_review.",
                ),
                Message::user(user),
            ],
            web_search_options: None,
            response_format: Some(json_schema_format::<ValidationVerdict>("validation_verdict")),
        };

        let (raw, meta) = self
            .chat(&request)
            .await
            .map_err(|e| ValidationProviderError(e.to_string()))?;

        let mut verdict: ValidationVerdict =
            serde_json::from_str(&raw).map_err(|e| ValidationProviderError(e.to_string()))?;
        verdict.confidence = verdict.confidence.clamp(0.0, 1.0);

        Ok(VerdictReply { verdict, meta })
    }
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    web_search_options: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<Value>,
}

#[derive(Debug, Serialize)]
struct Message {
    role: &'static str,
    content: String,
}

impl Message {
    fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system",
            content: content.into(),
        }
    }

    fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user",
            content: content.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponseRaw {
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<TokenUsage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
struct TokenUsage {
    #[serde(default)]
    #[allow(dead_code)]
    prompt_tokens: i64,
    #[serde(default)]
    #[allow(dead_code)]
    completion_tokens: i64,
    #[serde(default)]
    total_tokens: i64,
}

// ============================================================================
// Schema generation
// ============================================================================

/// Build a `response_format` value constraining output to the schema of `T`.
fn json_schema_format<T: JsonSchema>(name: &str) -> Value {
    json!({
        "type": "json_schema",
        "json_schema": {
            "name": name,
            "strict": true,
            "schema": strict_schema::<T>(),
        }
    })
}

/// Generate a strict-mode-compatible JSON schema for `T`.
///
/// Strict mode requires `additionalProperties: false`, every property listed
/// in `required`, and fully inlined definitions.
fn strict_schema<T: JsonSchema>() -> Value {
    let schema = schemars::schema_for!(T);
    let mut value = serde_json::to_value(schema).unwrap_or_default();

    let definitions = match value.get("definitions") {
        Some(Value::Object(defs)) => defs.clone(),
        _ => serde_json::Map::new(),
    };

    inline_refs(&mut value, &definitions);
    fix_object_schemas(&mut value);

    if let Value::Object(map) = &mut value {
        map.remove("definitions");
        map.remove("$schema");
    }
    value
}

/// Replace `$ref` nodes with their definition bodies.
fn inline_refs(value: &mut Value, definitions: &serde_json::Map<String, Value>) {
    match value {
        Value::Object(map) => {
            if let Some(Value::String(reference)) = map.get("$ref") {
                if let Some(name) = reference.strip_prefix("#/definitions/") {
                    if let Some(definition) = definitions.get(name) {
                        *value = definition.clone();
                        inline_refs(value, definitions);
                        return;
                    }
                }
            }
            for (_, child) in map.iter_mut() {
                inline_refs(child, definitions);
            }
        }
        Value::Array(items) => {
            for child in items {
                inline_refs(child, definitions);
            }
        }
        _ => {}
    }
}

/// Add `additionalProperties: false` and a full `required` list to every
/// object schema in the tree.
fn fix_object_schemas(value: &mut Value) {
    match value {
        Value::Object(map) => {
            let is_object_schema =
                map.get("type") == Some(&Value::String("object".to_string()));
            let property_names: Option<Vec<Value>> = match map.get("properties") {
                Some(Value::Object(props)) => {
                    Some(props.keys().cloned().map(Value::String).collect())
                }
                _ => None,
            };

            if is_object_schema {
                map.insert("additionalProperties".to_string(), Value::Bool(false));
                if let Some(names) = property_names {
                    map.insert("required".to_string(), Value::Array(names));
                }
            }

            for (_, child) in map.iter_mut() {
                fix_object_schemas(child);
            }
        }
        Value::Array(items) => {
            for child in items {
                fix_object_schemas(child);
            }
        }
        _ => {}
    }
}
