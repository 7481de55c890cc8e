//! Blocking OpenAI chat-completions client for safety advisories.
//!
//! One failed call must never take down an interactive session, so every
//! failure is absorbed here: quota exhaustion and everything else each map
//! to a fixed sentinel string that the pipeline records like any other
//! result. The underlying cause goes to the logs for the operator.

use cq_core::{Advisor, Advisory};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{error, warn};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Deterministic-leaning sampling for safety answers.
const TEMPERATURE: f32 = 0.5;

/// Connection settings injected at construction; no ambient credential
/// state anywhere in the crate.
#[derive(Debug, Clone)]
pub struct AdvisoryConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl AdvisoryConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[derive(Debug, Error)]
enum CallError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("rate limited")]
    RateLimited,
    #[error("api error {status}: {body}")]
    Api { status: u16, body: String },
    #[error("malformed response: {0}")]
    Malformed(String),
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

pub struct OpenAiAdvisor {
    config: AdvisoryConfig,
    client: reqwest::blocking::Client,
}

impl OpenAiAdvisor {
    pub fn new(config: AdvisoryConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .build()?;
        Ok(Self { config, client })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    fn call(&self, prompt: &str) -> Result<String, CallError> {
        let request = ChatRequest {
            model: &self.config.model,
            messages: [ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: TEMPERATURE,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.config.base_url))
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(CallError::RateLimited);
        }
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(CallError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let body: ChatResponse = response
            .json()
            .map_err(|err| CallError::Malformed(err.to_string()))?;
        extract_answer(body)
    }
}

/// First choice's message content. Empty or missing content counts as
/// malformed: a recorded result must never be empty.
fn extract_answer(response: ChatResponse) -> Result<String, CallError> {
    let content = response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .unwrap_or_default();
    if content.is_empty() {
        return Err(CallError::Malformed("no completion content".to_string()));
    }
    Ok(content)
}

fn absorb(result: Result<String, CallError>) -> Advisory {
    match result {
        Ok(answer) => Advisory::Answer(answer),
        Err(CallError::RateLimited) => {
            warn!("advisory quota exhausted");
            Advisory::RateLimited
        }
        Err(err) => {
            error!("advisory call failed: {err}");
            Advisory::Failed(err.to_string())
        }
    }
}

impl Advisor for OpenAiAdvisor {
    fn advise(&self, prompt: &str) -> Advisory {
        absorb(self.call(prompt))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cq_core::{FAILURE_SENTINEL, RATE_LIMIT_SENTINEL};

    #[test]
    fn config_defaults_to_the_public_endpoint() {
        let config = AdvisoryConfig::new("sk-test");
        assert_eq!(config.base_url, "https://api.openai.com/v1");
        assert_eq!(config.model, "gpt-3.5-turbo");
        assert_eq!(config.timeout, Duration::from_secs(60));
    }

    #[test]
    fn config_builders_override_defaults() {
        let config = AdvisoryConfig::new("sk-test")
            .with_model("gpt-4")
            .with_base_url("http://localhost:8080/v1")
            .with_timeout(Duration::from_secs(5));
        assert_eq!(config.model, "gpt-4");
        assert_eq!(config.base_url, "http://localhost:8080/v1");
        assert_eq!(config.timeout, Duration::from_secs(5));
    }

    #[test]
    fn request_wire_format_is_a_single_user_message_at_half_temperature() {
        let request = ChatRequest {
            model: "gpt-3.5-turbo",
            messages: [ChatMessage {
                role: "user",
                content: "Is the product acetone dangerous and how should it be handled safely?",
            }],
            temperature: TEMPERATURE,
        };
        let value = serde_json::to_value(&request).expect("serializable");
        assert_eq!(value["model"], "gpt-3.5-turbo");
        assert_eq!(value["temperature"], 0.5);
        assert_eq!(value["messages"].as_array().map(Vec::len), Some(1));
        assert_eq!(value["messages"][0]["role"], "user");
    }

    #[test]
    fn extract_answer_takes_the_first_choice() {
        let response: ChatResponse = serde_json::from_str(
            r#"{"choices":[{"message":{"content":"Handle with gloves."}},{"message":{"content":"second"}}]}"#,
        )
        .expect("valid body");
        assert_eq!(extract_answer(response).expect("content"), "Handle with gloves.");
    }

    #[test]
    fn extract_answer_rejects_empty_choices() {
        let response: ChatResponse =
            serde_json::from_str(r#"{"choices":[]}"#).expect("valid body");
        assert!(matches!(
            extract_answer(response),
            Err(CallError::Malformed(_))
        ));
    }

    #[test]
    fn extract_answer_rejects_empty_content() {
        let response: ChatResponse =
            serde_json::from_str(r#"{"choices":[{"message":{"content":""}}]}"#)
                .expect("valid body");
        assert!(matches!(
            extract_answer(response),
            Err(CallError::Malformed(_))
        ));
    }

    #[test]
    fn rate_limits_absorb_into_the_quota_sentinel() {
        let advisory = absorb(Err(CallError::RateLimited));
        assert_eq!(advisory, Advisory::RateLimited);
        assert_eq!(advisory.text(), RATE_LIMIT_SENTINEL);
    }

    #[test]
    fn other_failures_absorb_into_the_generic_sentinel() {
        for err in [
            CallError::Api {
                status: 401,
                body: "invalid api key".to_string(),
            },
            CallError::Malformed("no completion content".to_string()),
        ] {
            let advisory = absorb(Err(err));
            assert_eq!(advisory.text(), FAILURE_SENTINEL);
            assert!(matches!(advisory, Advisory::Failed(_)));
        }
    }

    #[test]
    fn successful_answers_pass_through() {
        let advisory = absorb(Ok("Store below 25C.".to_string()));
        assert_eq!(advisory.text(), "Store below 25C.");
    }
}
