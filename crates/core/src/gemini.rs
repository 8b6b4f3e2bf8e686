//! Gemini client that turns sampled frames into an SEO strategy.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::{
    config::AnalysisConfig,
    error::{Result, VidseoError},
    schema::analysis_schema,
    types::{AnalysisResult, SampledFrame},
};

const MODEL_NOT_FOUND: &str = "Requested entity was not found";
const MAX_RETRY_DELAY: Duration = Duration::from_secs(60);

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
enum Part<'a> {
    Text(String),
    InlineData(InlineData<'a>),
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData<'a> {
    mime_type: &'static str,
    data: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
    response_schema: Value,
    temperature: f32,
    thinking_config: ThinkingConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ThinkingConfig {
    thinking_budget: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<ResponseContent>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
    #[serde(default)]
    thought: bool,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    status: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenated answer text of the first candidate, skipping thought parts.
    fn text(&self) -> Option<String> {
        let parts = &self.candidates.first()?.content.as_ref()?.parts;
        let text: String = parts
            .iter()
            .filter(|p| !p.thought)
            .filter_map(|p| p.text.as_deref())
            .collect();
        (!text.trim().is_empty()).then_some(text)
    }
}

/// Build the task description sent ahead of the frames.
pub fn build_instruction(config: &AnalysisConfig) -> String {
    format!(
        r#"Analyze this video file frame-by-frame. The frames are in chronological order; the first frame is the opening of the video. Identify the visual 'Hook' in the first 3 seconds. Provide a viral SEO strategy including:
  YouTube: High-CTR Title, Keyword-rich Description up to {description} chars, and {tags} chars of Tags.
  TikTok: 3 catchy captions with trending hashtags.
  Facebook: A shareable post caption to drive comments.
  Policy Check: Highlight if any content violates platform community guidelines. Status must be exactly one of Safe, Warning, or Violation."#,
        description = config.max_description_length,
        tags = config.max_tags_length,
    )
}

/// Map a failed call to the error taxonomy.
///
/// `status` and `api_status` come from the HTTP layer and are trusted first.
/// Matching on `message` is a last resort: it depends on wording the service
/// may change, so codes embedded in arbitrary text can be misread.
pub fn classify_failure(
    status: Option<StatusCode>,
    api_status: Option<&str>,
    message: &str,
    model: &str,
) -> VidseoError {
    let model_unavailable = || VidseoError::ModelUnavailable {
        model: model.to_string(),
    };

    match (status.map(|s| s.as_u16()), api_status) {
        (Some(429), _) | (_, Some("RESOURCE_EXHAUSTED")) => return VidseoError::RateLimited,
        (Some(401 | 403), _) | (_, Some("UNAUTHENTICATED" | "PERMISSION_DENIED")) => {
            return VidseoError::AuthFailed;
        }
        (Some(404), _) | (_, Some("NOT_FOUND")) => return model_unavailable(),
        _ => {}
    }

    if message.contains("429") {
        VidseoError::RateLimited
    } else if message.contains("401") || message.contains("403") {
        VidseoError::AuthFailed
    } else if message.contains(MODEL_NOT_FOUND) {
        model_unavailable()
    } else if message.trim().is_empty() {
        VidseoError::Unclassified {
            message: "An unexpected error occurred during video analysis.".to_string(),
        }
    } else {
        VidseoError::Unclassified {
            message: message.to_string(),
        }
    }
}

/// Map a reqwest failure. Errors without an HTTP status (connect, DNS, TLS)
/// are never matched by text, and the URL is dropped so host or path digits
/// cannot look like a status code.
fn transport_failure(e: reqwest::Error, model: &str) -> VidseoError {
    let status = e.status();
    let message = e.without_url().to_string();
    match status {
        Some(_) => classify_failure(status, None, &message, model),
        None => VidseoError::Unclassified { message },
    }
}

/// Backoff before retry number `attempt + 1`, doubling from `base` up to one minute.
pub fn retry_delay(base: Duration, attempt: u32) -> Duration {
    base.saturating_mul(2u32.saturating_pow(attempt))
        .min(MAX_RETRY_DELAY)
}

/// Parse the model's answer text into a validated [`AnalysisResult`].
pub fn parse_analysis(text: &str) -> Result<AnalysisResult> {
    let text = text.trim();
    let text = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix("```"))
        .unwrap_or(text);
    let text = text.strip_suffix("```").unwrap_or(text).trim();

    if text.is_empty() {
        return Err(VidseoError::EmptyResponse);
    }

    let value: Value = serde_json::from_str(text).map_err(|e| VidseoError::MalformedResponse {
        reason: e.to_string(),
    })?;
    analysis_schema()
        .validate(&value)
        .map_err(|reason| VidseoError::MalformedResponse { reason })?;

    serde_json::from_value(value).map_err(|e| VidseoError::MalformedResponse {
        reason: e.to_string(),
    })
}

/// Gemini API client for video SEO analysis.
pub struct GeminiClient<'a> {
    config: &'a AnalysisConfig,
    api_key: &'a str,
    client: Client,
}

impl<'a> GeminiClient<'a> {
    /// Create a client. Fails before any network activity when no API key is configured.
    pub fn new(config: &'a AnalysisConfig) -> Result<Self> {
        Self::with_client(config, Client::new())
    }

    pub fn with_client(config: &'a AnalysisConfig, client: Client) -> Result<Self> {
        let api_key = config.validate_api_key()?;
        Ok(Self {
            config,
            api_key,
            client,
        })
    }

    /// Send the frames in one request and return the parsed strategy.
    ///
    /// Only rate-limited calls are retried, and only when `max_retries` allows it.
    pub async fn analyze(&self, frames: &[SampledFrame]) -> Result<AnalysisResult> {
        if frames.is_empty() {
            return Err(VidseoError::NoFrames);
        }

        let mut attempt = 0;
        loop {
            match self.generate(frames).await {
                Err(e) if e.is_transient() && attempt < self.config.max_retries => {
                    let delay = retry_delay(self.config.retry_backoff, attempt);
                    attempt += 1;
                    warn!(
                        attempt,
                        max_retries = self.config.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        "Gemini rate limited, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                result => return result,
            }
        }
    }

    async fn generate(&self, frames: &[SampledFrame]) -> Result<AnalysisResult> {
        let model = &self.config.model;
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url, model
        );

        let mut parts = Vec::with_capacity(frames.len() + 1);
        parts.push(Part::Text(build_instruction(self.config)));
        parts.extend(frames.iter().map(|f| Part::InlineData(InlineData {
            mime_type: SampledFrame::MIME_TYPE,
            data: &f.data,
        })));

        let request = GenerateContentRequest {
            contents: vec![Content { parts }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
                response_schema: analysis_schema().to_response_schema(),
                temperature: self.config.temperature,
                thinking_config: ThinkingConfig {
                    thinking_budget: self.config.thinking_budget,
                },
            },
        };

        info!(model = %model, frames = frames.len(), "Sending frames to Gemini");

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "Gemini request failed");
                transport_failure(e, model)
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let envelope = serde_json::from_str::<ErrorEnvelope>(&body).ok();
            let (api_status, message) = match &envelope {
                Some(env) => (env.error.status.as_deref(), env.error.message.clone()),
                None => (None, format!("Gemini API returned {status}: {body}")),
            };
            let err = classify_failure(Some(status), api_status, &message, model);
            if matches!(err, VidseoError::Unclassified { .. }) {
                warn!(%status, body = %body, "Gemini API error");
            }
            return Err(err);
        }

        let body = response
            .text()
            .await
            .map_err(|e| transport_failure(e, model))?;
        if body.trim().is_empty() {
            return Err(VidseoError::EmptyResponse);
        }

        let reply: GenerateContentResponse =
            serde_json::from_str(&body).map_err(|e| VidseoError::MalformedResponse {
                reason: format!("unexpected response envelope: {e}"),
            })?;

        let Some(text) = reply.text() else {
            if let Some(reason) = reply.prompt_feedback.and_then(|f| f.block_reason) {
                warn!(block_reason = %reason, "Gemini blocked the prompt");
            }
            return Err(VidseoError::EmptyResponse);
        };

        let result = parse_analysis(&text)?;
        info!(policy = %result.policy_check.status, "Gemini analysis complete");
        Ok(result)
    }
}

/// One-shot helper: validate config, send frames, parse the reply.
pub async fn analyze_frames(
    config: &AnalysisConfig,
    frames: &[SampledFrame],
) -> Result<AnalysisResult> {
    GeminiClient::new(config)?.analyze(frames).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PolicyStatus;

    const MODEL: &str = "gemini-3-pro-preview";

    #[test]
    fn test_classify_by_http_status() {
        let c = |code: u16| classify_failure(StatusCode::from_u16(code).ok(), None, "", MODEL);
        assert!(matches!(c(429), VidseoError::RateLimited));
        assert!(matches!(c(401), VidseoError::AuthFailed));
        assert!(matches!(c(403), VidseoError::AuthFailed));
        assert!(
            matches!(c(404), VidseoError::ModelUnavailable { model } if model == MODEL)
        );
    }

    #[test]
    fn test_classify_by_api_status() {
        let err = classify_failure(None, Some("RESOURCE_EXHAUSTED"), "quota", MODEL);
        assert!(matches!(err, VidseoError::RateLimited));
        let err = classify_failure(None, Some("PERMISSION_DENIED"), "nope", MODEL);
        assert!(matches!(err, VidseoError::AuthFailed));
    }

    #[test]
    fn test_classify_by_message_fallback() {
        let c = |msg: &str| classify_failure(None, None, msg, MODEL);
        assert!(matches!(c("got status 429 from upstream"), VidseoError::RateLimited));
        assert!(matches!(c("HTTP 401 Unauthorized"), VidseoError::AuthFailed));
        assert!(matches!(c("error 403"), VidseoError::AuthFailed));
        assert!(matches!(
            c("Requested entity was not found."),
            VidseoError::ModelUnavailable { .. }
        ));
        match c("connection reset by peer") {
            VidseoError::Unclassified { message } => {
                assert_eq!(message, "connection reset by peer")
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_model_unavailable_message_names_model() {
        let err = classify_failure(None, None, MODEL_NOT_FOUND, MODEL);
        assert_eq!(
            err.to_string(),
            "The model 'gemini-3-pro-preview' is not available for your API key."
        );
    }

    #[test]
    fn test_retry_delay_doubles_and_is_capped() {
        let base = Duration::from_secs(2);
        assert_eq!(retry_delay(base, 0), Duration::from_secs(2));
        assert_eq!(retry_delay(base, 1), Duration::from_secs(4));
        assert_eq!(retry_delay(base, 4), Duration::from_secs(32));
        assert_eq!(retry_delay(base, 5), Duration::from_secs(60));
        assert_eq!(retry_delay(base, 40), Duration::from_secs(60));
    }

    #[test]
    fn test_instruction_uses_configured_limits() {
        let config = AnalysisConfig {
            max_description_length: 900,
            max_tags_length: 300,
            ..Default::default()
        };
        let instruction = build_instruction(&config);
        assert!(instruction.contains("up to 900 chars"));
        assert!(instruction.contains("300 chars of Tags"));
    }

    #[test]
    fn test_parse_analysis_strips_code_fence() {
        let text = r##"```json
{"visualHook":"h","youtube":{"title":"t","description":"d","tags":"x"},
 "tiktok":{"captions":["a"],"hashtags":["#b"]},"facebook":{"caption":"c"},
 "policyCheck":{"status":"Warning","notes":"n"}}
```"##;
        let result = parse_analysis(text).unwrap();
        assert_eq!(result.policy_check.status, PolicyStatus::Warning);
        assert_eq!(result.tiktok.hashtags, vec!["#b"]);
    }

    #[test]
    fn test_parse_analysis_rejects_truncated_json() {
        let err = parse_analysis(r#"{"visualHook":"h","youtube":{"#).unwrap_err();
        assert!(matches!(err, VidseoError::MalformedResponse { .. }));
    }

    #[test]
    fn test_response_text_skips_thoughts() {
        let reply: GenerateContentResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[
                {"text":"thinking...","thought":true},
                {"text":"{\"a\":"},
                {"text":"1}"}
            ]}}]}"#,
        )
        .unwrap();
        assert_eq!(reply.text().as_deref(), Some("{\"a\":1}"));
    }

    #[test]
    fn test_request_serializes_inline_frames_in_order() {
        let frames = [
            SampledFrame {
                index: 0,
                timestamp: 0.0,
                data: "AAA".into(),
            },
            SampledFrame {
                index: 1,
                timestamp: 1.0,
                data: "BBB".into(),
            },
        ];
        let mut parts = vec![Part::Text("go".into())];
        parts.extend(frames.iter().map(|f| Part::InlineData(InlineData {
            mime_type: SampledFrame::MIME_TYPE,
            data: &f.data,
        })));
        let value = serde_json::to_value(Content { parts }).unwrap();
        assert_eq!(value["parts"][0]["text"], "go");
        assert_eq!(value["parts"][1]["inlineData"]["mimeType"], "image/jpeg");
        assert_eq!(value["parts"][1]["inlineData"]["data"], "AAA");
        assert_eq!(value["parts"][2]["inlineData"]["data"], "BBB");
    }
}
