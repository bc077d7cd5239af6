use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

use crate::error::SummaryError;

/// Outbound payload for one generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryRequest {
    pub prompt: String,
    pub model: String,
    /// Extension data at trigger time, forwarded untouched (may be null).
    pub context: Value,
    pub generation_id: u64,
}

/// One inbound event on the completion channel.
///
/// `message` is a cumulative snapshot of everything generated so far for the
/// request, not a delta. Receivers replace their content with it; appending
/// would duplicate text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_end: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<Value>,
    /// Echo of `SummaryRequest::generation_id`. Absent when the transport
    /// cannot carry envelopes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generation_id: Option<u64>,
}

impl PortData {
    pub fn partial(generation_id: u64, message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            is_end: Some(false),
            error: None,
            generation_id: Some(generation_id),
        }
    }

    pub fn end(generation_id: u64) -> Self {
        Self {
            is_end: Some(true),
            generation_id: Some(generation_id),
            ..Self::default()
        }
    }

    pub fn failure(generation_id: u64, error: impl Into<Value>) -> Self {
        Self {
            error: Some(error.into()),
            generation_id: Some(generation_id),
            ..Self::default()
        }
    }

    /// The partial-update shape: a message with an explicit `isEnd: false`.
    pub fn partial_message(&self) -> Option<&str> {
        match (&self.message, self.is_end) {
            (Some(message), Some(false)) => Some(message.as_str()),
            _ => None,
        }
    }

    /// A non-null error payload, if any. JSON `null` counts as absent.
    pub fn error_value(&self) -> Option<&Value> {
        self.error.as_ref().filter(|value| !value.is_null())
    }

    /// Events that carry only an error leave the message observation alone.
    pub fn is_error_only(&self) -> bool {
        self.message.is_none() && self.is_end.is_none() && self.error_value().is_some()
    }
}

/// Snapshot of the extraction collaborator's output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtensionContext {
    #[serde(rename = "extensionData", default)]
    pub data: Value,
    #[serde(rename = "extensionLoading", default)]
    pub loading: bool,
}

impl ExtensionContext {
    pub fn ready(data: impl Into<Value>) -> Self {
        Self {
            data: data.into(),
            loading: false,
        }
    }

    pub fn loading() -> Self {
        Self {
            data: Value::Null,
            loading: true,
        }
    }

    /// Reads extension data from disk. `.json` files are parsed, anything
    /// else becomes a JSON string.
    pub fn from_file(path: &Path) -> Result<Self, SummaryError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| SummaryError::Context(format!("{}: {e}", path.display())))?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let data = if is_json {
            serde_json::from_str(&raw)
                .map_err(|e| SummaryError::Context(format!("{}: {e}", path.display())))?
        } else {
            Value::String(raw)
        };
        Ok(Self::ready(data))
    }
}
