//! HTTP backend for a Gemini-style `generateContent` endpoint.

use pals_core::config::AssistantConfig;
use pals_core::{AssistantBackend, ChatMessage, ChatRole, Error, Result};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

pub struct GeminiBackend {
    client: reqwest::blocking::Client,
    endpoint: String,
    model: String,
    temperature: f64,
    api_key_env: String,
    api_key: Option<String>,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

impl GeminiBackend {
    /// Build a client from config; the API key is read from the environment now
    pub fn from_config(config: &AssistantConfig) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| Error::Assistant(format!("Failed to build HTTP client: {}", e)))?;

        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty());

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            temperature: config.temperature,
            api_key_env: config.api_key_env.clone(),
            api_key,
        })
    }

    fn url(&self) -> String {
        format!("{}/models/{}:generateContent", self.endpoint, self.model)
    }
}

/// Request body: the whole history, assistant turns mapped to `model`
pub fn build_request_body(system_prompt: &str, history: &[ChatMessage], temperature: f64) -> Value {
    let contents: Vec<Value> = history
        .iter()
        .map(|m| {
            let role = match m.role {
                ChatRole::Assistant => "model",
                ChatRole::User => "user",
            };
            json!({ "role": role, "parts": [{ "text": m.content }] })
        })
        .collect();

    json!({
        "contents": contents,
        "systemInstruction": { "parts": [{ "text": system_prompt }] },
        "generationConfig": { "temperature": temperature },
    })
}

/// Concatenated text of the first candidate; empty if there is none
fn reply_text(response: GenerateResponse) -> String {
    response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .map(|p| p.text)
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default()
}

impl AssistantBackend for GeminiBackend {
    fn generate(&self, system_prompt: &str, history: &[ChatMessage]) -> Result<String> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            Error::Assistant(format!("API key not set (export {})", self.api_key_env))
        })?;

        let body = build_request_body(system_prompt, history, self.temperature);
        tracing::debug!("POST {} ({} message(s))", self.url(), history.len());

        let response = self
            .client
            .post(self.url())
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .map_err(|e| Error::Assistant(format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().unwrap_or_default();
            return Err(Error::Assistant(format!(
                "Provider returned {}: {}",
                status,
                detail.chars().take(200).collect::<String>()
            )));
        }

        let parsed: GenerateResponse = response
            .json()
            .map_err(|e| Error::Assistant(format!("Malformed response: {}", e)))?;
        Ok(reply_text(parsed))
    }
}
