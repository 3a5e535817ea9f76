//! Gemini (Google) image model.

use crate::config::{StudioConfig, DEFAULT_BASE_URL, DEFAULT_MODEL};
use crate::error::{
    parse_retry_after, sanitize_error_message, truncate_chars, Result, ThumbnailError,
};
use crate::media::{EncodedImage, ImageFormat};
use crate::model::provider::ThumbnailModel;
use crate::model::types::{GeneratedThumbnail, GenerationMetadata, RequestPart, ThumbnailRequest};
use async_trait::async_trait;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// How much of a text-only answer is quoted back to the user.
const TEXT_EXCERPT_LEN: usize = 200;

/// Finish reasons that mean the output was withheld by a safety filter.
const SAFETY_FINISH_REASONS: &[&str] = &[
    "SAFETY",
    "IMAGE_SAFETY",
    "IMAGE_PROHIBITED_CONTENT",
    "PROHIBITED_CONTENT",
    "BLOCKLIST",
    "SPII",
];

/// Gemini image model variants.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GeminiModel {
    /// Nano Banana - Gemini 2.5 Flash Image (fast, economical).
    #[default]
    NanoBanana,
    /// Nano Banana Pro - Gemini 3 Pro Image (highest quality).
    NanoBananaPro,
}

impl GeminiModel {
    /// Returns the API model identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NanoBanana => DEFAULT_MODEL,
            Self::NanoBananaPro => "nano-banana-pro-preview",
        }
    }
}

/// Builder for GeminiProvider.
#[derive(Debug, Clone)]
pub struct GeminiProviderBuilder {
    api_key: Option<String>,
    model: String,
    base_url: String,
    timeout: Duration,
}

impl Default for GeminiProviderBuilder {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: StudioConfig::default().timeout(),
        }
    }
}

impl GeminiProviderBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from a loaded [`StudioConfig`].
    pub fn from_config(config: &StudioConfig) -> Self {
        Self {
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            base_url: config.base_url.clone(),
            timeout: config.timeout(),
        }
    }

    /// Sets the API key. Falls back to `GOOGLE_API_KEY`, then `API_KEY`.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the Gemini model variant.
    pub fn model(mut self, model: GeminiModel) -> Self {
        self.model = model.as_str().to_string();
        self
    }

    /// Sets an arbitrary model identifier.
    pub fn model_name(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Overrides the API root (useful for proxies).
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Sets the per-request HTTP timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Builds the provider, resolving the API key.
    pub fn build(self) -> Result<GeminiProvider> {
        let api_key = self
            .api_key
            .or_else(|| std::env::var("GOOGLE_API_KEY").ok())
            .or_else(|| std::env::var("API_KEY").ok())
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                ThumbnailError::Auth("GOOGLE_API_KEY not set and no API key provided".into())
            })?;

        let client = reqwest::Client::builder().timeout(self.timeout).build()?;

        Ok(GeminiProvider {
            client,
            api_key,
            model: self.model,
            base_url: self.base_url.trim_end_matches('/').to_string(),
        })
    }
}

/// Gemini image generation provider.
pub struct GeminiProvider {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiProvider {
    /// Creates a new `GeminiProviderBuilder`.
    pub fn builder() -> GeminiProviderBuilder {
        GeminiProviderBuilder::new()
    }

    /// Model identifier requests are sent to.
    pub fn model(&self) -> &str {
        &self.model
    }

    fn model_url(&self) -> String {
        format!("{}/v1beta/models/{}", self.base_url, self.model)
    }

    async fn generate_impl(&self, request: &ThumbnailRequest) -> Result<GeneratedThumbnail> {
        let start = Instant::now();
        let url = format!("{}:generateContent", self.model_url());
        let body = GeminiRequest::from_thumbnail_request(request);

        tracing::debug!(
            model = %self.model,
            kind = %request.kind(),
            parts = request.parts().len(),
            "sending Gemini request"
        );

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let headers = response.headers().clone();
            let text = response.text().await.unwrap_or_default();
            return Err(parse_error(status.as_u16(), &text, &headers));
        }

        let gemini_response: GeminiResponse = response.json().await?;
        let image = extract_image(gemini_response).inspect_err(|e| {
            if e.is_refusal() {
                tracing::warn!(model = %self.model, "Gemini refused the request: {e}");
            }
        })?;

        let duration_ms = start.elapsed().as_millis() as u64;
        tracing::debug!(model = %self.model, duration_ms, size = image.size(), "Gemini image received");

        Ok(GeneratedThumbnail {
            image,
            metadata: GenerationMetadata {
                model: Some(self.model.clone()),
                duration_ms: Some(duration_ms),
            },
        })
    }
}

fn parse_error(status: u16, text: &str, headers: &reqwest::header::HeaderMap) -> ThumbnailError {
    let text = sanitize_error_message(text);
    if status == 402 {
        return ThumbnailError::Billing(
            "Gemini billing issue: enable billing at https://aistudio.google.com".into(),
        );
    }
    if status == 404 {
        return ThumbnailError::Api {
            status,
            message: "Model not found. Verify the model name is correct.".into(),
        };
    }
    if status == 429 {
        let retry_after = parse_retry_after(headers).map(Duration::from_secs);
        return ThumbnailError::RateLimited { retry_after };
    }
    if status == 401 || status == 403 {
        return ThumbnailError::Auth(text);
    }
    let lower = text.to_lowercase();
    if lower.contains("safety") || lower.contains("blocked") || lower.contains("prohibited") {
        return ThumbnailError::ContentBlocked(format!(
            "Request was blocked for safety reasons: {text}"
        ));
    }
    ThumbnailError::Api {
        status,
        message: text,
    }
}

/// Turns a successful HTTP response into exactly one image, or an error.
fn extract_image(response: GeminiResponse) -> Result<EncodedImage> {
    if let Some(reason) = response
        .prompt_feedback
        .as_ref()
        .and_then(|f| f.block_reason.as_deref())
    {
        let detail = response
            .prompt_feedback
            .as_ref()
            .and_then(|f| f.block_reason_message.as_deref())
            .map(|m| format!(": {m}"))
            .unwrap_or_default();
        return Err(ThumbnailError::ContentBlocked(format!(
            "The request was blocked for safety reasons ({reason}){detail}. Please try a different image or prompt."
        )));
    }

    let candidate = response.candidates.into_iter().next().ok_or_else(|| {
        ThumbnailError::UnexpectedResponse(
            "No candidates were returned from the model. The response may have been empty.".into(),
        )
    })?;

    if let Some(reason) = candidate.finish_reason.as_deref() {
        if SAFETY_FINISH_REASONS.contains(&reason) {
            let category = candidate
                .safety_ratings
                .iter()
                .find(|r| r.blocked.unwrap_or(false))
                .and_then(|r| r.category.as_deref())
                .unwrap_or("Unknown");
            return Err(ThumbnailError::ContentBlocked(format!(
                "Generation was blocked for safety reasons (Category: {category}). Please try a different image or prompt."
            )));
        }
    }

    let parts = candidate
        .content
        .map(|c| c.parts)
        .filter(|parts| !parts.is_empty())
        .ok_or_else(|| {
            ThumbnailError::UnexpectedResponse(
                "Invalid response from model: content or parts are missing.".into(),
            )
        })?;

    if let Some(inline) = parts.iter().find_map(|p| p.inline_data.as_ref()) {
        return decode_inline(inline);
    }

    if let Some(text) = parts
        .iter()
        .filter_map(|p| p.text.as_deref())
        .find(|t| !t.trim().is_empty())
    {
        return Err(ThumbnailError::TextResponse(truncate_chars(
            text.trim(),
            TEXT_EXCERPT_LEN,
        )));
    }

    Err(ThumbnailError::UnexpectedResponse(
        "Could not extract image data from the model response. The format was unexpected.".into(),
    ))
}

fn decode_inline(inline: &InlineData) -> Result<EncodedImage> {
    let data = base64::engine::general_purpose::STANDARD
        .decode(&inline.data)
        .map_err(|e| ThumbnailError::Decode(e.to_string()))?;
    if data.is_empty() {
        return Err(ThumbnailError::UnexpectedResponse(
            "The model returned an empty image.".into(),
        ));
    }

    let format = ImageFormat::from_magic_bytes(&data)
        .or_else(|| ImageFormat::from_mime_type(&inline.mime_type))
        .ok_or_else(|| {
            ThumbnailError::UnexpectedResponse(format!(
                "The model returned an unsupported image type: {}",
                inline.mime_type
            ))
        })?;
    Ok(EncodedImage::new(data, format))
}

#[async_trait]
impl ThumbnailModel for GeminiProvider {
    async fn generate(&self, request: &ThumbnailRequest) -> Result<GeneratedThumbnail> {
        self.generate_impl(request).await
    }

    fn name(&self) -> &str {
        "Gemini (Google)"
    }

    async fn health_check(&self) -> Result<()> {
        let response = self
            .client
            .get(self.model_url())
            .header("x-goog-api-key", &self.api_key)
            .send()
            .await?;

        match response.status().as_u16() {
            401 | 403 => Err(ThumbnailError::Auth("Invalid API key".into())),
            404 => Err(ThumbnailError::Api {
                status: 404,
                message: "Model not found. Verify the model name is correct.".into(),
            }),
            s if !(200..300).contains(&s) => Err(ThumbnailError::Api {
                status: s,
                message: "Health check failed".into(),
            }),
            _ => Ok(()),
        }
    }
}

// Request/Response types
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    generation_config: GeminiConfig,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    parts: Vec<GeminiRequestPart>,
}

/// A part in a Gemini request - can be text or inline image data.
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum GeminiRequestPart {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiConfig {
    response_modalities: Vec<String>,
}

impl GeminiRequest {
    fn from_thumbnail_request(req: &ThumbnailRequest) -> Self {
        let parts = req
            .parts()
            .iter()
            .map(|part| match part {
                RequestPart::Text(text) => GeminiRequestPart::Text { text: text.clone() },
                RequestPart::Image(image) => GeminiRequestPart::InlineData {
                    inline_data: InlineData {
                        mime_type: image.mime_type().to_string(),
                        data: image.to_base64(),
                    },
                },
            })
            .collect();

        Self {
            contents: vec![GeminiContent { parts }],
            generation_config: GeminiConfig {
                response_modalities: vec!["IMAGE".to_string()],
            },
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    #[serde(default)]
    content: Option<GeminiContentResponse>,
    #[serde(default)]
    finish_reason: Option<String>,
    #[serde(default)]
    safety_ratings: Vec<SafetyRating>,
}

/// Every field is optional: the rating shape differs across API versions.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SafetyRating {
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    blocked: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
    #[serde(default)]
    block_reason_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiContentResponse {
    #[serde(default)]
    parts: Vec<GeminiPartResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPartResponse {
    #[serde(default)]
    inline_data: Option<InlineData>,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::ThumbnailParams;

    const JPEG_B64: &str = "/9j/4AAQ";

    fn parse(json: &str) -> Result<EncodedImage> {
        let resp: GeminiResponse = serde_json::from_str(json).unwrap();
        extract_image(resp)
    }

    fn subject() -> EncodedImage {
        EncodedImage::new(
            vec![0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0],
            ImageFormat::Png,
        )
    }

    #[test]
    fn test_gemini_model_as_str() {
        assert_eq!(GeminiModel::NanoBanana.as_str(), "gemini-2.5-flash-image");
        assert_eq!(
            GeminiModel::NanoBananaPro.as_str(),
            "nano-banana-pro-preview"
        );
        assert_eq!(GeminiModel::default(), GeminiModel::NanoBanana);
    }

    #[test]
    fn test_builder_with_explicit_key() {
        let provider = GeminiProviderBuilder::new()
            .api_key("test-key")
            .model(GeminiModel::NanoBananaPro)
            .base_url("http://localhost:8080/")
            .build()
            .unwrap();
        assert_eq!(provider.model(), "nano-banana-pro-preview");
        assert_eq!(
            provider.model_url(),
            "http://localhost:8080/v1beta/models/nano-banana-pro-preview"
        );
    }

    #[test]
    fn test_builder_from_config() {
        let config = StudioConfig {
            api_key: Some("from-config".into()),
            model: "custom-image-model".into(),
            ..Default::default()
        };
        let provider = GeminiProviderBuilder::from_config(&config).build().unwrap();
        assert_eq!(provider.model(), "custom-image-model");
    }

    #[test]
    fn test_generation_request_serialization() {
        let params = ThumbnailParams {
            thumbnail_text: "big win".into(),
            ..Default::default()
        };
        let req = ThumbnailRequest::generation(&subject(), &params);
        let json = serde_json::to_value(GeminiRequest::from_thumbnail_request(&req)).unwrap();

        let parts = json["contents"][0]["parts"].as_array().unwrap();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0]["inlineData"]["mimeType"], "image/png");
        assert_eq!(parts[0]["inlineData"]["data"], subject().to_base64());
        assert!(parts[1]["text"].as_str().unwrap().contains("BIG WIN"));
        assert_eq!(
            json["generationConfig"]["responseModalities"],
            serde_json::json!(["IMAGE"])
        );
        assert!(json.get("generation_config").is_none());
    }

    #[test]
    fn test_modification_request_serialization() {
        let current = EncodedImage::new(vec![0xFF, 0xD8, 0xFF, 0xE0], ImageFormat::Jpeg);
        let req = ThumbnailRequest::modification(&subject(), &current, "lava background");
        let json = serde_json::to_value(GeminiRequest::from_thumbnail_request(&req)).unwrap();

        let parts = json["contents"][0]["parts"].as_array().unwrap();
        assert_eq!(parts.len(), 3);
        assert!(parts[0]["text"].as_str().unwrap().contains("lava background"));
        assert_eq!(parts[1]["inlineData"]["mimeType"], "image/png");
        assert_eq!(parts[2]["inlineData"]["mimeType"], "image/jpeg");
    }

    #[test]
    fn test_extracts_inline_image() {
        let image = parse(&format!(
            r#"{{
                "candidates": [{{
                    "content": {{
                        "parts": [{{
                            "inlineData": {{ "mimeType": "image/jpeg", "data": "{JPEG_B64}" }}
                        }}]
                    }},
                    "finishReason": "STOP"
                }}]
            }}"#
        ))
        .unwrap();
        assert_eq!(image.format(), ImageFormat::Jpeg);
        assert_eq!(&image.data()[..3], &[0xFF, 0xD8, 0xFF]);
    }

    #[test]
    fn test_image_wins_over_accompanying_text() {
        let image = parse(&format!(
            r#"{{
                "candidates": [{{
                    "content": {{
                        "parts": [
                            {{ "text": "Here is your thumbnail" }},
                            {{ "inlineData": {{ "mimeType": "image/jpeg", "data": "{JPEG_B64}" }} }}
                        ]
                    }}
                }}]
            }}"#
        ));
        assert!(image.is_ok());
    }

    #[test]
    fn test_safety_finish_reason_names_blocked_category() {
        let err = parse(
            r#"{
                "candidates": [{
                    "finishReason": "SAFETY",
                    "safetyRatings": [
                        { "category": "HARM_CATEGORY_HARASSMENT", "probability": "LOW" },
                        { "category": "HARM_CATEGORY_DANGEROUS_CONTENT", "probability": "HIGH", "blocked": true }
                    ]
                }]
            }"#,
        )
        .unwrap_err();
        assert!(matches!(err, ThumbnailError::ContentBlocked(_)));
        let msg = err.user_message();
        assert!(msg.contains("safety"));
        assert!(msg.contains("HARM_CATEGORY_DANGEROUS_CONTENT"));
    }

    #[test]
    fn test_safety_without_ratings_reports_unknown() {
        let err = parse(r#"{ "candidates": [{ "finishReason": "IMAGE_SAFETY" }] }"#).unwrap_err();
        assert!(err.user_message().contains("Category: Unknown"));
    }

    #[test]
    fn test_prompt_feedback_block() {
        let err = parse(
            r#"{
                "candidates": [],
                "promptFeedback": {
                    "blockReason": "SAFETY",
                    "blockReasonMessage": "Prompt was blocked"
                }
            }"#,
        )
        .unwrap_err();
        assert!(matches!(err, ThumbnailError::ContentBlocked(_)));
        assert!(err.user_message().contains("Prompt was blocked"));
    }

    #[test]
    fn test_no_candidates() {
        let err = parse(r#"{ "candidates": [] }"#).unwrap_err();
        assert!(matches!(err, ThumbnailError::UnexpectedResponse(_)));
        assert!(err.to_string().contains("No candidates"));
    }

    #[test]
    fn test_missing_parts() {
        let err = parse(r#"{ "candidates": [{ "content": { "parts": [] } }] }"#).unwrap_err();
        assert!(err.to_string().contains("content or parts are missing"));

        let err = parse(r#"{ "candidates": [{ "finishReason": "STOP" }] }"#).unwrap_err();
        assert!(matches!(err, ThumbnailError::UnexpectedResponse(_)));
    }

    #[test]
    fn test_text_only_answer_is_an_error() {
        let long = "I can't edit photos of real people. ".repeat(20);
        let err = parse(&format!(
            r#"{{ "candidates": [{{ "content": {{ "parts": [{{ "text": "{long}" }}] }} }}] }}"#
        ))
        .unwrap_err();
        match err {
            ThumbnailError::TextResponse(excerpt) => {
                assert!(excerpt.starts_with("I can't edit photos"));
                assert_eq!(excerpt.chars().count(), TEXT_EXCERPT_LEN + 3);
            }
            other => panic!("expected TextResponse, got {other:?}"),
        }
    }

    #[test]
    fn test_unexpected_part_shape() {
        let err = parse(r#"{ "candidates": [{ "content": { "parts": [{}] } }] }"#).unwrap_err();
        assert!(err.to_string().contains("format was unexpected"));
    }

    #[test]
    fn test_bad_base64() {
        let err = parse(
            r#"{ "candidates": [{ "content": { "parts": [{ "inlineData": { "mimeType": "image/png", "data": "@@@" } }] } }] }"#,
        )
        .unwrap_err();
        assert!(matches!(err, ThumbnailError::Decode(_)));
    }

    #[test]
    fn test_parse_error_statuses() {
        let headers = reqwest::header::HeaderMap::new();
        assert!(matches!(
            parse_error(401, "{}", &headers),
            ThumbnailError::Auth(_)
        ));
        assert!(matches!(
            parse_error(402, "", &headers),
            ThumbnailError::Billing(_)
        ));
        assert!(matches!(
            parse_error(429, "", &headers),
            ThumbnailError::RateLimited { retry_after: None }
        ));
        assert!(matches!(
            parse_error(400, r#"{"error":{"message":"Request blocked by policy"}}"#, &headers),
            ThumbnailError::ContentBlocked(_)
        ));
        match parse_error(500, r#"{"error":{"message":"Internal"}}"#, &headers) {
            ThumbnailError::Api { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "Internal");
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
