//! Groq API client (OpenAI-compatible chat completions)
//!
//! Uses a long-lived reqwest::Client for connection pooling. The reasoning
//! backend is consumed purely by contract: prompt in, completion out.

use crate::error::AgentError;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error};

const DEFAULT_MODEL: &str = "llama3-70b-8192";
const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";
const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Reusable Groq client (connection-pooled)
pub struct GroqClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl GroqClient {
    pub fn new(api_key: String) -> Self {
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(8)
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Run one chat completion in JSON mode and return the raw content.
    pub async fn chat(&self, system: &str, user: &str) -> crate::Result<String> {
        if self.api_key.is_empty() {
            return Err(AgentError::BackendUnavailable(
                "GROQ_API_KEY is not configured".to_string(),
            ));
        }

        let request = ChatRequest {
            model: DEFAULT_MODEL,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            temperature: 0.1,
            max_tokens: 1024,
            response_format: ResponseFormat {
                format_type: "json_object",
            },
        };

        debug!("Calling Groq API");

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!("Groq API request failed: {}", e);
                AgentError::BackendUnavailable(format!("Groq API request failed: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("Groq API error response: {}", error_text);
            return Err(AgentError::BackendError(format!(
                "Groq API returned {}: {}",
                status, error_text
            )));
        }

        let parsed: ChatResponse = response.json().await.map_err(|e| {
            error!("Failed to parse Groq response: {}", e);
            AgentError::BackendError(format!("Groq response parse error: {}", e))
        })?;

        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AgentError::BackendError("No choices in Groq response".to_string()))?;

        if let Some(reason) = &choice.finish_reason {
            debug!(finish_reason = %reason, "Groq completion finished");
        }

        Ok(choice.message.content)
    }

    /// Lightweight reachability check for health reporting. Never errors.
    pub async fn probe(&self) -> bool {
        if self.api_key.is_empty() {
            return false;
        }

        match self
            .client
            .get(format!("{}/models", self.base_url))
            .bearer_auth(&self.api_key)
            .timeout(PROBE_TIMEOUT)
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                debug!("Groq probe failed: {}", e);
                false
            }
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
    response_format: ResponseFormat<'a>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat<'a> {
    #[serde(rename = "type")]
    format_type: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: AssistantMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    content: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_serialization() {
        let request = ChatRequest {
            model: DEFAULT_MODEL,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: "You are a financial data analyst",
                },
                ChatMessage {
                    role: "user",
                    content: "List clients from New York",
                },
            ],
            temperature: 0.1,
            max_tokens: 1024,
            response_format: ResponseFormat {
                format_type: "json_object",
            },
        };

        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains("List clients from New York"));
        assert!(json.contains(r#""type":"json_object""#));
    }

    #[test]
    fn test_response_deserialization() {
        let body = r#"{
            "choices": [
                {
                    "message": {"role": "assistant", "content": "{\"action\":\"finish\"}"},
                    "finish_reason": "stop"
                }
            ]
        }"#;

        let parsed: ChatResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.choices.len(), 1);
        assert_eq!(parsed.choices[0].finish_reason.as_deref(), Some("stop"));
    }

    #[tokio::test]
    async fn test_chat_without_key_is_unavailable() {
        let client = GroqClient::new(String::new());
        let result = client.chat("system", "user").await;
        assert!(matches!(
            result,
            Err(AgentError::BackendUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_probe_without_key_is_false() {
        let client = GroqClient::new(String::new());
        assert!(!client.probe().await);
    }
}
