use super::logging::{debug_payload_enabled, emit_debug_payload};
use crate::config::{ApiProtocol, Config};
use crate::types::SummaryRequest;
use crate::util::{context_to_text, is_local_endpoint_url};
use anyhow::{anyhow, Result};
use bytes::Bytes;
use futures::{Stream, StreamExt};
use serde_json::{json, Value};
use std::pin::Pin;
#[cfg(test)]
use std::sync::Arc;
use tracing::debug;

pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes>> + Send>>;

#[cfg(test)]
pub trait MockStreamProducer: Send + Sync {
    fn create_mock_stream(&self, request: &SummaryRequest) -> Result<ByteStream>;
}

/// Streams completions for summary requests from a remote model endpoint.
#[derive(Clone)]
pub struct CompletionClient {
    http: reqwest::Client,
    api_key: Option<String>,
    api_url: String,
    anthropic_version: String,
    api_protocol: ApiProtocol,
    max_tokens: u32,
    #[cfg(test)]
    mock_stream_producer: Option<Arc<dyn MockStreamProducer>>,
}

impl CompletionClient {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            http: reqwest::Client::builder()
                .user_agent(concat!("summary-port/", env!("CARGO_PKG_VERSION")))
                .build()?,
            api_key: config.api_key.clone(),
            api_url: config.api_url.clone(),
            anthropic_version: config.anthropic_version.clone(),
            api_protocol: config.api_protocol,
            max_tokens: config.max_tokens,
            #[cfg(test)]
            mock_stream_producer: None,
        })
    }

    #[cfg(test)]
    pub fn new_mock(mock_producer: Arc<dyn MockStreamProducer>, api_protocol: ApiProtocol) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: None,
            api_url: "http://localhost:8000/v1/messages".to_string(),
            anthropic_version: "2023-06-01".to_string(),
            api_protocol,
            max_tokens: 256,
            mock_stream_producer: Some(mock_producer),
        }
    }

    pub fn protocol(&self) -> ApiProtocol {
        self.api_protocol
    }

    pub async fn create_stream(&self, request: &SummaryRequest) -> Result<ByteStream> {
        #[cfg(test)]
        {
            if let Some(producer) = &self.mock_stream_producer {
                return producer.create_mock_stream(request);
            }
        }

        let payload = self.payload(request);
        if debug_payload_enabled() {
            emit_debug_payload(&self.api_url, &payload);
        }
        debug!(model = %request.model, generation = request.generation_id, "completion streaming request");

        let mut builder = self
            .http
            .post(&self.api_url)
            .header("content-type", "application/json")
            .json(&payload);

        match self.api_protocol {
            ApiProtocol::AnthropicMessages => {
                if let Some(api_key) = &self.api_key {
                    builder = builder.header("x-api-key", api_key);
                }
                if !self.anthropic_version.trim().is_empty() {
                    builder = builder.header("anthropic-version", &self.anthropic_version);
                }
            }
            ApiProtocol::OpenAiChatCompletions => {
                if let Some(api_key) = &self.api_key {
                    builder = builder.header("authorization", format!("Bearer {api_key}"));
                }
            }
        }

        let response = builder
            .send()
            .await
            .map_err(|error| map_request_error(error, &self.api_url))?
            .error_for_status()
            .map_err(|error| map_request_error(error, &self.api_url))?;

        let request_url = self.api_url.clone();
        let stream = response
            .bytes_stream()
            .map(move |item| item.map_err(|error| map_request_error(error, &request_url)));
        Ok(Box::pin(stream))
    }

    fn payload(&self, request: &SummaryRequest) -> Value {
        let user_text = context_to_text(&request.context);
        match self.api_protocol {
            ApiProtocol::AnthropicMessages => json!({
                "model": request.model,
                "max_tokens": self.max_tokens,
                "stream": true,
                "system": request.prompt,
                "messages": [{ "role": "user", "content": user_text }],
            }),
            ApiProtocol::OpenAiChatCompletions => json!({
                "model": request.model,
                "max_tokens": self.max_tokens,
                "stream": true,
                "messages": [
                    { "role": "system", "content": request.prompt },
                    { "role": "user", "content": user_text },
                ],
            }),
        }
    }
}

fn map_request_error(error: reqwest::Error, request_url: &str) -> anyhow::Error {
    if error.is_connect() && is_local_endpoint_url(request_url) {
        return anyhow!(
            "cannot reach local completion endpoint '{}': {}. Start your local server or update SUMMARY_API_URL.",
            request_url,
            error
        );
    }
    if error.is_connect() {
        return anyhow!("cannot reach completion endpoint '{}': {}", request_url, error);
    }
    if error.is_timeout() {
        return anyhow!("completion request to '{}' timed out: {}", request_url, error);
    }
    if let Some(status) = error.status() {
        return anyhow!(
            "completion endpoint '{}' returned {}: {}",
            request_url,
            status,
            error
        );
    }
    anyhow!("completion request to '{}' failed: {}", request_url, error)
}
