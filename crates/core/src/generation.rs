//! Hosted model client: one prompt in, raw text out.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::GenerationSettings;
use crate::error::PipelineError;
use crate::http;

/// Low temperature keeps the output close to the requested format.
pub const TEMPERATURE: f32 = 0.1;

/// Output token budget per generation.
pub const MAX_TOKENS: u32 = 6000;

/// Trait for calling a model to turn a prompt into text.
pub trait CodeGenerator {
    fn generate(&self, prompt: &str, access_token: &str) -> Result<String, PipelineError>;
}

// ── Request / Response types ─────────────────────────────────────────────────

#[derive(Serialize)]
struct ChatRequest<'a> {
    messages: Vec<ChatMessage<'a>>,
    project_id: &'a str,
    model_id: &'a str,
    max_tokens: u32,
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
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

// ── Client ───────────────────────────────────────────────────────────────────

/// watsonx.ai text-chat client.
pub struct GraniteClient {
    endpoint: String,
    model_id: String,
    project_id: String,
    agent: ureq::Agent,
}

impl GraniteClient {
    pub fn new(settings: &GenerationSettings, project_id: String) -> Self {
        Self {
            endpoint: settings.endpoint.clone(),
            model_id: settings.model_id.clone(),
            project_id,
            agent: http::agent(Duration::from_secs(settings.timeout_secs)),
        }
    }
}

impl CodeGenerator for GraniteClient {
    fn generate(&self, prompt: &str, access_token: &str) -> Result<String, PipelineError> {
        let request_body = ChatRequest {
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            project_id: &self.project_id,
            model_id: &self.model_id,
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
        };

        tracing::info!(model = %self.model_id, "requesting generation");
        let response = self
            .agent
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", access_token))
            .header("Accept", "application/json")
            .send_json(&request_body)
            .map_err(|e| PipelineError::Generation(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = http::error_body(response, 500);
            return Err(PipelineError::Generation(format!(
                "model endpoint returned {}: {}",
                status.as_u16(),
                body
            )));
        }

        let resp: ChatResponse = response
            .into_body()
            .read_json()
            .map_err(|e| PipelineError::Generation(format!("invalid response: {}", e)))?;

        let text = first_choice_text(resp)?;
        tracing::info!(chars = text.chars().count(), "code generated");
        Ok(text)
    }
}

fn first_choice_text(resp: ChatResponse) -> Result<String, PipelineError> {
    resp.choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .ok_or_else(|| PipelineError::Generation("response contained no content".to_string()))
}
