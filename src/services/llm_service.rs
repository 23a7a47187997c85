use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::errors::LlmError;

/// Persona for the finance chat assistant
pub const CHAT_SYSTEM_INSTRUCTION: &str = "You are ChatFin, a friendly and knowledgeable finance \
chatbot for our finance app. Explain finance in simple, clear language without technical jargon; \
when a term is unavoidable, say what it means. Use relatable examples and a few fitting emojis \
(for example 📈 for growth, 📉 for decline, 💰 for money). When the user shares an analysis of \
their own behaviour, tailor your guidance on buying and selling stocks and funds to it and say \
why it suits them. Stay positive, supportive and non-judgmental.";

/// Trait for generative-text providers
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Generates a reply to `prompt`, optionally steered by a system
    /// instruction
    async fn generate(&self, system_instruction: Option<&str>, prompt: &str) -> Result<String, LlmError>;
}

#[derive(Debug, Serialize)]
struct GeminiPart {
    text: String,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
    contents: Vec<GeminiContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiResponseContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponseContent {
    #[serde(default)]
    parts: Vec<GeminiResponsePart>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponsePart {
    #[serde(default)]
    text: String,
}

fn text_content(role: Option<&str>, text: &str) -> GeminiContent {
    GeminiContent {
        role: role.map(str::to_string),
        parts: vec![GeminiPart { text: text.to_string() }],
    }
}

/// Google Gemini `generateContent` client
pub struct GeminiProvider {
    api_key: String,
    model: String,
    base_url: String,
    client: Client,
}

impl GeminiProvider {
    pub fn new(api_key: String, model: String, timeout: Duration) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LlmError::NetworkError(e.to_string()))?;

        Ok(Self {
            api_key,
            model,
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            client,
        })
    }

    async fn call_gemini(&self, request: &GeminiRequest) -> Result<GeminiResponse, LlmError> {
        let url = format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::Timeout
                } else {
                    LlmError::NetworkError(e.to_string())
                }
            })?;

        let status = response.status();

        if status == 429 {
            return Err(LlmError::RateLimited);
        }

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(LlmError::ApiError(format!("HTTP {}: {}", status, error_text)));
        }

        response
            .json::<GeminiResponse>()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl LlmProvider for GeminiProvider {
    async fn generate(&self, system_instruction: Option<&str>, prompt: &str) -> Result<String, LlmError> {
        info!("Generating Gemini completion (model: {}, prompt {} chars)", self.model, prompt.len());

        let request = GeminiRequest {
            system_instruction: system_instruction.map(|s| text_content(None, s)),
            contents: vec![text_content(Some("user"), prompt)],
        };

        let response = self.call_gemini(&request).await?;
        let text: String = response
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .ok_or_else(|| LlmError::InvalidResponse("No candidates in response".to_string()))?
            .parts
            .into_iter()
            .map(|p| p.text)
            .collect();

        if text.is_empty() {
            warn!("Gemini returned an empty completion");
        }
        Ok(text)
    }
}

/// Front door for generative-text features.
///
/// Without a provider every call fails with `LlmError::Disabled`, which
/// handlers surface as 503.
#[derive(Clone)]
pub struct LlmService {
    provider: Option<Arc<dyn LlmProvider>>,
}

impl LlmService {
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self { provider: Some(provider) }
    }

    pub fn disabled() -> Self {
        Self { provider: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.provider.is_some()
    }

    fn provider(&self) -> Result<&Arc<dyn LlmProvider>, LlmError> {
        self.provider.as_ref().ok_or(LlmError::Disabled)
    }

    pub async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        self.provider()?.generate(None, prompt).await
    }

    pub async fn chat(&self, message: &str) -> Result<String, LlmError> {
        self.provider()?.generate(Some(CHAT_SYSTEM_INSTRUCTION), message).await
    }
}
