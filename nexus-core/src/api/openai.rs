// nexus-core/src/api/openai.rs
use super::{CompletionGateway, FOLLOW_UP_FAILED, REQUEST_FAILED};
use crate::config::RuntimeConfig;
use crate::errors::NexusError;
use crate::models::chat::{ApiResponse, ChatMessage};
use crate::models::tools::ToolDefinition;
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde_json::{Value, json};
use std::collections::HashMap;
use tracing::{debug, trace, warn};

/// OpenAI-compatible chat completions client (OpenAI itself, LiteLLM proxies, ...).
pub struct OpenAiGateway {
    http_client: Client,
    endpoint: String,
    api_key: String,
    model_name: String,
    default_temperature: f64,
}

impl OpenAiGateway {
    pub fn new(config: &RuntimeConfig) -> Result<Self, NexusError> {
        let http_client = Client::builder()
            .build()
            .map_err(|e| NexusError::config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            http_client,
            endpoint: config.completions_endpoint(),
            api_key: config.api_key.clone(),
            model_name: config.model_name.clone(),
            default_temperature: config.temperature,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn build_payload(
        &self,
        messages: &[ChatMessage],
        session_id: &str,
        tools: Option<&[ToolDefinition]>,
        temperature: Option<f64>,
    ) -> Value {
        let mut payload = json!({
            "model": self.model_name,
            "messages": messages,
            "temperature": temperature.unwrap_or(self.default_temperature),
            "litellm_session_id": session_id,
        });

        if let Some(tools) = tools.filter(|t| !t.is_empty()) {
            let tools_with_type: Vec<Value> = tools
                .iter()
                .map(|t| {
                    json!({
                        "type": "function",
                        "function": {
                            "name": t.name,
                            "description": t.description,
                            "parameters": t.parameters
                        }
                    })
                })
                .collect();
            payload["tools"] = json!(tools_with_type);
            payload["tool_choice"] = json!("auto");
        }

        payload
    }

    pub fn build_headers(&self) -> HashMap<String, String> {
        let mut headers = HashMap::new();
        headers.insert("Content-Type".to_string(), "application/json".to_string());
        if self.api_key.is_empty() {
            warn!("API key is empty. API call might fail if endpoint requires authentication.");
        } else {
            headers.insert(
                "Authorization".to_string(),
                format!("Bearer {}", self.api_key),
            );
        }
        headers
    }

    /// Extracts the first choice's message.
    pub fn parse_response(response_body: &str) -> Result<ChatMessage> {
        let response: ApiResponse = serde_json::from_str(response_body)
            .with_context(|| format!("Failed to parse completion response: {}", response_body))?;
        response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message)
            .ok_or_else(|| anyhow!("Completion response contained no choices: {}", response_body))
    }

    /// Converts [`Self::build_headers`] for reqwest. A value that is not a valid header (an API
    /// key with a newline, say) is an error rather than a request sent without it.
    pub fn header_map(&self) -> Result<HeaderMap> {
        let mut header_map = HeaderMap::new();
        for (key, value) in self.build_headers() {
            let name = HeaderName::from_bytes(key.as_bytes())
                .with_context(|| format!("Invalid header name {:?}", key))?;
            let val = HeaderValue::from_str(&value).map_err(|e| {
                warn!(header = %key, "Header value rejected");
                anyhow!("Invalid value for header {}: {}", key, e)
            })?;
            header_map.insert(name, val);
        }
        Ok(header_map)
    }

    async fn send(&self, payload: Value) -> Result<ChatMessage> {
        let header_map = self.header_map()?;

        trace!(payload = %payload, "Sending completion request");
        let response = self
            .http_client
            .post(&self.endpoint)
            .headers(header_map)
            .json(&payload)
            .send()
            .await
            .with_context(|| format!("POST {}", self.endpoint))?;

        let status = response.status();
        let response_text = response
            .text()
            .await
            .context("Failed to read completion response body")?;
        trace!(status = %status, body = %response_text, "Received completion response");

        if !status.is_success() {
            return Err(anyhow!(
                "API call failed with status {}: {}",
                status,
                response_text
            ));
        }

        Self::parse_response(&response_text)
    }
}

#[async_trait]
impl CompletionGateway for OpenAiGateway {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        session_id: &str,
        tools: Option<&[ToolDefinition]>,
        temperature: Option<f64>,
    ) -> Result<ChatMessage, NexusError> {
        debug!(
            model = %self.model_name,
            num_messages = messages.len(),
            with_tools = tools.is_some(),
            session_id = %session_id,
            "Requesting completion"
        );
        let payload = self.build_payload(messages, session_id, tools, temperature);
        self.send(payload)
            .await
            .map_err(|e| NexusError::gateway(REQUEST_FAILED, e))
    }

    async fn follow_up(
        &self,
        messages: &[ChatMessage],
        session_id: &str,
    ) -> Result<ChatMessage, NexusError> {
        debug!(
            model = %self.model_name,
            num_messages = messages.len(),
            session_id = %session_id,
            "Requesting follow-up completion"
        );
        let payload = self.build_payload(messages, session_id, None, None);
        self.send(payload)
            .await
            .map_err(|e| NexusError::gateway(FOLLOW_UP_FAILED, e))
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}
