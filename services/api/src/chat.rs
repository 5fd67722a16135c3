//! Client for the third-party chat-completion API behind the style assistant

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::env;
use thiserror::Error;
use tracing::{error, warn};

pub const SYSTEM_PROMPT: &str = "You are a knowledgeable style assistant for Coretta Styles, \
     helping customers with fashion advice, product recommendations, and styling tips.";

/// Returned when the upstream answers without any completion text
pub const FALLBACK_RESPONSE: &str =
    "I apologize, but I could not generate a response at this time.";

const DEFAULT_API_URL: &str = "https://api.gpt4.ai/v1/chat/completions";
const DEFAULT_MODEL: &str = "gpt-4o-mini";

#[derive(Error, Debug)]
pub enum ChatError {
    #[error("Failed to generate response: {0}")]
    Upstream(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
    System,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    fn system(content: &str) -> Self {
        Self {
            role: ChatRole::System,
            content: content.to_string(),
        }
    }
}

/// Chat upstream configuration
#[derive(Clone)]
pub struct ChatConfig {
    /// Completion endpoint URL
    pub api_url: String,
    /// Bearer key; requests go out unauthenticated when unset
    pub api_key: Option<String>,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl std::fmt::Debug for ChatConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatConfig")
            .field("api_url", &self.api_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.7,
            max_tokens: 1000,
        }
    }
}

impl ChatConfig {
    /// Create a new ChatConfig from environment variables
    ///
    /// # Environment Variables
    /// - `OPENAI_API_KEY`: Bearer key for the completion API
    /// - `CHAT_API_URL`: Completion endpoint (default: `https://api.gpt4.ai/v1/chat/completions`)
    /// - `CHAT_MODEL`: Model name (default: `gpt-4o-mini`)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let api_key = env::var("OPENAI_API_KEY").ok().filter(|k| !k.is_empty());
        if api_key.is_none() {
            warn!("OPENAI_API_KEY is not set; the chat upstream will reject requests");
        }

        Self {
            api_url: env::var("CHAT_API_URL").unwrap_or(defaults.api_url),
            api_key,
            model: env::var("CHAT_MODEL").unwrap_or(defaults.model),
            ..defaults
        }
    }
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Clone)]
pub struct ChatClient {
    http: reqwest::Client,
    config: ChatConfig,
}

impl ChatClient {
    pub fn new(config: ChatConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    /// Send the conversation, prefixed with the style-assistant prompt, and
    /// return the first completion
    pub async fn generate_response(&self, messages: &[ChatMessage]) -> Result<String, ChatError> {
        let mut conversation = Vec::with_capacity(messages.len() + 1);
        conversation.push(ChatMessage::system(SYSTEM_PROMPT));
        conversation.extend_from_slice(messages);

        let body = CompletionRequest {
            model: &self.config.model,
            messages: &conversation,
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };

        let mut request = self.http.post(&self.config.api_url).json(&body);
        if let Some(key) = &self.config.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| {
            error!("Chat upstream unreachable: {}", e);
            ChatError::Upstream(e.to_string())
        })?;

        let status = response.status();
        if !status.is_success() {
            let body: Value = response.json().await.unwrap_or(Value::Null);
            error!("Chat upstream answered {}: {}", status, body);

            let message = body["error"]["message"]
                .as_str()
                .map(str::to_string)
                .unwrap_or_else(|| format!("Request failed with status code {}", status.as_u16()));
            return Err(ChatError::Upstream(message));
        }

        let completion: CompletionResponse = response.json().await.map_err(|e| {
            error!("Unreadable chat completion: {}", e);
            ChatError::Upstream(e.to_string())
        })?;

        let content = completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .filter(|content| !content.is_empty());

        Ok(content.unwrap_or_else(|| FALLBACK_RESPONSE.to_string()))
    }
}
