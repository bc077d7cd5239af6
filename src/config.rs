use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::util::{env_flag, is_local_endpoint_url};

const DEFAULT_API_URL: &str = "https://api.anthropic.com/v1/messages";
const DEFAULT_ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_MAX_TOKENS: u32 = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiProtocol {
    AnthropicMessages,
    OpenAiChatCompletions,
}

impl ApiProtocol {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "anthropic" | "messages" => Some(Self::AnthropicMessages),
            "openai" | "chat" | "chat_completions" => Some(Self::OpenAiChatCompletions),
            _ => None,
        }
    }

    fn infer(api_url: &str) -> Self {
        if api_url.contains("/chat/completions") || api_url.contains("openai") {
            Self::OpenAiChatCompletions
        } else {
            Self::AnthropicMessages
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub api_key: Option<String>,
    pub api_url: String,
    pub api_protocol: ApiProtocol,
    pub anthropic_version: String,
    pub max_tokens: u32,
    /// Clear the generating flag when the channel reports an error.
    pub end_generation_on_error: bool,
}

impl Config {
    pub fn load() -> Result<Self> {
        let api_url =
            std::env::var("SUMMARY_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        let api_key = std::env::var("SUMMARY_API_KEY")
            .ok()
            .filter(|v| !v.trim().is_empty());
        let api_protocol = std::env::var("SUMMARY_API_PROTOCOL")
            .ok()
            .and_then(|v| ApiProtocol::parse(&v))
            .unwrap_or_else(|| ApiProtocol::infer(&api_url));
        let anthropic_version = std::env::var("SUMMARY_ANTHROPIC_VERSION")
            .unwrap_or_else(|_| DEFAULT_ANTHROPIC_VERSION.to_string());
        let max_tokens = match std::env::var("SUMMARY_MAX_TOKENS") {
            Ok(raw) => raw
                .trim()
                .parse::<u32>()
                .with_context(|| format!("SUMMARY_MAX_TOKENS is not a number: '{raw}'"))?,
            Err(_) => DEFAULT_MAX_TOKENS,
        };

        Ok(Self {
            api_key,
            api_url,
            api_protocol,
            anthropic_version,
            max_tokens,
            end_generation_on_error: env_flag("SUMMARY_END_ON_ERROR").unwrap_or(false),
        })
    }

    pub fn validate(&self) -> Result<()> {
        if !self.api_url.starts_with("http://") && !self.api_url.starts_with("https://") {
            bail!(
                "Invalid SUMMARY_API_URL '{}': expected http:// or https:// URL",
                self.api_url
            );
        }

        if !self.is_local_endpoint() && self.api_key.is_none() {
            bail!(
                "SUMMARY_API_KEY must be set for non-local endpoints (url: '{}')",
                self.api_url
            );
        }

        if self.max_tokens == 0 {
            bail!("SUMMARY_MAX_TOKENS must be greater than zero");
        }

        Ok(())
    }

    pub fn is_local_endpoint(&self) -> bool {
        is_local_endpoint_url(&self.api_url)
    }
}
