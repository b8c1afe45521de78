use serde::{Deserialize, Serialize};

use crate::config::ProviderConfig;
use crate::error::{Result, WeaverError};

/// Token usage reported by the chat-completions endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenUsage {
    #[serde(default)]
    pub prompt_tokens: u64,
    #[serde(default)]
    pub completion_tokens: u64,
    #[serde(default)]
    pub total_tokens: u64,
}

/// Parsed result of one completion call.
#[derive(Debug, Clone)]
pub struct Completion {
    pub content: String,
    pub usage: Option<TokenUsage>,
}

/// Blocking single-shot client for an OpenAI-compatible chat-completions
/// endpoint. One request per call, no retry, no streaming.
pub struct CompletionClient {
    config: ProviderConfig,
    http: reqwest::Client,
}

impl CompletionClient {
    pub fn new(config: ProviderConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| WeaverError::Provider(format!("failed to build http client: {}", e)))?;

        Ok(Self { config, http })
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    pub fn has_api_key(&self) -> bool {
        self.config.has_api_key()
    }

    /// Send one prompt as a single user message and extract the answer text.
    pub async fn complete(&self, prompt: &str) -> Result<Completion> {
        let url = self.chat_completions_url();
        let payload = ChatCompletionsRequest {
            model: self.config.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
        };

        let mut request = self.http.post(&url).json(&payload);
        if let Some(api_key) = self.config.api_key.as_ref() {
            request = request.bearer_auth(api_key);
        }
        if let Some(org) = self.config.organization.as_ref() {
            request = request.header("OpenAI-Organization", org);
        }
        if let Some(project) = self.config.project.as_ref() {
            request = request.header("OpenAI-Project", project);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                WeaverError::Provider(format!(
                    "completion request timed out after {:?} (model={})",
                    self.config.timeout, self.config.model
                ))
            } else {
                WeaverError::Provider(format!(
                    "completion request failed (model={}): {}",
                    self.config.model, e
                ))
            }
        })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| WeaverError::Provider(format!("failed to read response body: {}", e)))?;

        if !status.is_success() {
            return Err(WeaverError::Provider(format!(
                "completion endpoint returned HTTP {}: {}",
                status,
                truncate_body(&body)
            )));
        }

        let parsed: ChatCompletionsResponse = serde_json::from_str(&body).map_err(|e| {
            WeaverError::Provider(format!(
                "invalid JSON from completion endpoint: {} (body={})",
                e,
                truncate_body(&body)
            ))
        })?;

        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or(WeaverError::EmptyResponse)?;

        let content = choice
            .message
            .content
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
            .ok_or(WeaverError::EmptyResponse)?;

        Ok(Completion {
            content,
            usage: parsed.usage,
        })
    }

    fn chat_completions_url(&self) -> String {
        let endpoint = self.config.endpoint.trim().trim_end_matches('/');
        if endpoint.ends_with("/chat/completions") {
            endpoint.to_string()
        } else if endpoint.ends_with("/v1") {
            format!("{}/chat/completions", endpoint)
        } else {
            format!("{}/v1/chat/completions", endpoint)
        }
    }
}

fn truncate_body(value: &str) -> String {
    const LIMIT: usize = 400;
    if value.len() <= LIMIT {
        value.to_string()
    } else {
        format!("{}...", &value[..LIMIT])
    }
}

#[derive(Debug, Clone, Serialize)]
struct ChatCompletionsRequest {
    model: String,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Clone, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatCompletionsResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<TokenUsage>,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatChoice {
    message: ChatMessageBody,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatMessageBody {
    #[serde(default)]
    content: Option<String>,
}
