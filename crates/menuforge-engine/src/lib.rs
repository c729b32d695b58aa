use std::env;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use menuforge_contracts::{
    build_prompt, response_schema, ExtractionInput, GenerationError, MenuItemMetadata,
};
use reqwest::blocking::Client as HttpClient;
use serde_json::{json, Value};

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(90);

/// Seam between the state controller and the hosted generation
/// service. One call per user-initiated submission, no retries.
pub trait MetadataGenerator: Send + Sync {
    fn generate(&self, input: &ExtractionInput) -> Result<MenuItemMetadata, GenerationError>;
}

/// Client for the Gemini `generateContent` endpoint.
pub struct GeminiClient {
    api_base: String,
    model: String,
    api_key: String,
    http: HttpClient,
}

impl GeminiClient {
    /// Read the credential once at startup. A missing credential is
    /// fatal: the caller refuses to initialize.
    pub fn from_env(model: Option<String>) -> Result<Self> {
        let Some(api_key) = non_empty_env("GEMINI_API_KEY").or_else(|| non_empty_env("GOOGLE_API_KEY"))
        else {
            bail!("GEMINI_API_KEY or GOOGLE_API_KEY not set");
        };
        let api_base = non_empty_env("GEMINI_API_BASE")
            .map(|value| value.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());
        let http = HttpClient::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            api_base,
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            api_key,
            http,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.api_base, self.model)
    }
}

impl MetadataGenerator for GeminiClient {
    fn generate(&self, input: &ExtractionInput) -> Result<MenuItemMetadata, GenerationError> {
        input.validate_for_submission()?;
        let payload = request_payload(input);

        let response = self
            .http
            .post(self.endpoint())
            .query(&[("key", self.api_key.as_str())])
            .json(&payload)
            .send()
            .map_err(|err| GenerationError::Service(err.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .map_err(|err| GenerationError::Service(err.to_string()))?;
        if !status.is_success() {
            return Err(GenerationError::Service(format!(
                "request failed ({}): {}",
                status.as_u16(),
                truncate_text(&body, 512)
            )));
        }

        let envelope: Value = serde_json::from_str(&body).map_err(|err| {
            GenerationError::MalformedResponse(format!("response envelope is not JSON: {err}"))
        })?;
        let text = candidate_text(&envelope).ok_or_else(|| {
            GenerationError::MalformedResponse("response carries no text candidate".to_string())
        })?;
        metadata_from_text(input, &text)
    }
}

/// Request body for one submission. The inline image part, when
/// present, always precedes the text part.
pub fn request_payload(input: &ExtractionInput) -> Value {
    let mut parts = Vec::new();
    if let Some(image) = &input.image {
        parts.push(json!({
            "inlineData": {
                "mimeType": image.mime_type,
                "data": BASE64.encode(&image.bytes),
            }
        }));
    }
    parts.push(json!({ "text": build_prompt(input) }));

    json!({
        "contents": [{
            "role": "user",
            "parts": parts,
        }],
        "generationConfig": {
            "responseMimeType": "application/json",
            "responseSchema": response_schema(input.provided_fields()),
        },
    })
}

/// First non-empty text part of the first candidate.
fn candidate_text(envelope: &Value) -> Option<String> {
    let candidates = envelope.get("candidates").and_then(Value::as_array)?;
    for candidate in candidates {
        let Some(parts) = candidate
            .get("content")
            .and_then(|content| content.get("parts"))
            .and_then(Value::as_array)
        else {
            continue;
        };
        for part in parts {
            if let Some(text) = part.get("text").and_then(Value::as_str) {
                let trimmed = text.trim();
                if !trimmed.is_empty() {
                    return Some(trimmed.to_string());
                }
            }
        }
    }
    None
}

/// Parse the candidate text, reconcile caller-supplied fields back
/// in, and enforce minimal completeness.
///
/// Reconciliation runs before validation: caller text wins verbatim
/// (trimmed) over whatever the service produced, so user input is
/// never silently replaced by model output.
pub fn metadata_from_text(
    input: &ExtractionInput,
    text: &str,
) -> Result<MenuItemMetadata, GenerationError> {
    let parsed: Value = serde_json::from_str(text).map_err(|err| {
        GenerationError::MalformedResponse(format!("candidate text is not JSON: {err}"))
    })?;
    let Value::Object(mut fields) = parsed else {
        return Err(GenerationError::MalformedResponse(
            "candidate text is not a JSON object".to_string(),
        ));
    };

    if let Some(name) = input.manual_item_name() {
        fields.insert("itemName".to_string(), Value::String(name.to_string()));
    }
    if let Some(description) = input.manual_description() {
        fields.insert(
            "description".to_string(),
            Value::String(description.to_string()),
        );
    }

    for field in ["itemName", "description"] {
        let present = fields
            .get(field)
            .and_then(Value::as_str)
            .map(str::trim)
            .is_some_and(|value| !value.is_empty());
        if !present {
            return Err(GenerationError::IncompleteResult(format!(
                "service omitted {field} and the caller did not supply it"
            )));
        }
    }

    serde_json::from_value(Value::Object(fields)).map_err(|err| {
        GenerationError::MalformedResponse(format!("result does not match the schema: {err}"))
    })
}

fn non_empty_env(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn truncate_text(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let truncated: String = text.chars().take(max_chars).collect();
    format!("{truncated}…")
}

/// Canned generator for tests and dry runs: pops queued outcomes in
/// order, applying the same reconciliation path as the real client.
pub struct ScriptedGenerator {
    responses: std::sync::Mutex<std::collections::VecDeque<String>>,
}

impl ScriptedGenerator {
    pub fn new(responses: impl IntoIterator<Item = String>) -> Self {
        Self {
            responses: std::sync::Mutex::new(responses.into_iter().collect()),
        }
    }
}

impl MetadataGenerator for ScriptedGenerator {
    fn generate(&self, input: &ExtractionInput) -> Result<MenuItemMetadata, GenerationError> {
        input.validate_for_submission()?;
        let text = self
            .responses
            .lock()
            .map_err(|_| GenerationError::Service("scripted generator lock poisoned".to_string()))?
            .pop_front()
            .ok_or_else(|| {
                GenerationError::Service("scripted generator has no response queued".to_string())
            })?;
        metadata_from_text(input, &text)
    }
}
