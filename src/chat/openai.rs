use super::{ChatBackend, ChatMessage};
use crate::config::ChatConfig;
use crate::error::ChatError;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

/// OpenAI-compatible chat completions endpoint (works with local servers too).
pub struct OpenAiChat {
    http: Client,
    url: String,
    api_key: String,
    model: String,
}

impl OpenAiChat {
    pub fn new(cfg: &ChatConfig, api_key: String) -> Result<Self, ChatError> {
        let http = Client::builder().timeout(cfg.timeout).build()?;
        Ok(Self {
            http,
            url: cfg.completions_url(),
            api_key,
            model: cfg.model.clone(),
        })
    }
}

impl ChatBackend for OpenAiChat {
    fn is_ready(&self) -> bool {
        true
    }

    fn reply(&self, messages: &[ChatMessage]) -> Result<String, ChatError> {
        let payload = CompletionRequest {
            model: &self.model,
            messages,
        };
        let response = self
            .http
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ErrorResponse>()
                .map(|body| body.error.message)
                .unwrap_or_else(|_| status.to_string());
            return Err(ChatError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let completion: CompletionResponse = response.json()?;
        extract_reply(completion)
    }
}

fn extract_reply(completion: CompletionResponse) -> Result<String, ChatError> {
    completion
        .choices
        .into_iter()
        .find_map(|choice| choice.message.content)
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
        .ok_or(ChatError::EmptyReply)
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}
