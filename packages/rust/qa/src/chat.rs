//! OpenAI-compatible chat-completions client.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use sitechat_shared::{EngineConfig, Result, SiteChatError};

use crate::LanguageModel;

/// System instruction sent with every generation request.
const SYSTEM_INSTRUCTION: &str =
    "You answer questions about a website strictly from the context provided in the user message. \
     Follow the grounding rules in the message exactly.";

/// Language model backed by an OpenAI-compatible `/chat/completions` endpoint.
pub struct OpenAiChat {
    client: Client,
    api_base: String,
    api_key: String,
    model: String,
    temperature: f32,
}

impl OpenAiChat {
    /// Build a chat client from the engine configuration.
    pub fn new(config: &EngineConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| SiteChatError::Generation(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.chat_model.clone(),
            temperature: config.temperature,
        })
    }
}

#[async_trait::async_trait]
impl LanguageModel for OpenAiChat {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let body = ChatRequest {
            model: &self.model,
            temperature: self.temperature,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_INSTRUCTION,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.api_base))
            .bearer_auth(self.api_key.trim())
            .json(&body)
            .send()
            .await
            .map_err(|e| SiteChatError::Generation(format!("chat request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(SiteChatError::Generation(format!(
                "chat endpoint returned {status}: {text}"
            )));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| SiteChatError::Generation(format!("invalid chat response: {e}")))?;

        let answer = parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| SiteChatError::Generation("chat response had no choices".into()))?;

        debug!(model = %self.model, chars = answer.len(), "generated answer");
        Ok(answer.trim().to_string())
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: AssistantMessage,
}

#[derive(Deserialize)]
struct AssistantMessage {
    content: String,
}
