use serde::Deserialize;

use super::logging::emit_sse_parse_error;
use crate::config::ApiProtocol;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionEvent {
    TextDelta(String),
    Done,
    Error(String),
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum AnthropicEvent {
    ContentBlockDelta { delta: AnthropicDelta },
    MessageStop,
    Error { error: ApiErrorBody },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum AnthropicDelta {
    TextDelta {
        text: String,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct ChatChunk {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    #[serde(default)]
    error: Option<ApiErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    #[serde(default)]
    delta: ChatDelta,
}

#[derive(Debug, Default, Deserialize)]
struct ChatDelta {
    #[serde(default)]
    content: Option<String>,
}

/// Incremental server-sent-events decoder. Chunks may split events anywhere,
/// including inside a UTF-8 sequence or a CRLF pair; raw bytes stay buffered
/// until a blank line completes the event.
pub struct SseParser {
    protocol: ApiProtocol,
    buffer: Vec<u8>,
}

impl SseParser {
    pub fn new(protocol: ApiProtocol) -> Self {
        Self {
            protocol,
            buffer: Vec::new(),
        }
    }

    pub fn process(&mut self, chunk: &[u8]) -> Vec<CompletionEvent> {
        self.buffer.extend_from_slice(chunk);

        let mut events = Vec::new();
        let mut start = 0;

        while let Some(event_end) = find_event_end(&self.buffer[start..]) {
            let event_text = String::from_utf8_lossy(&self.buffer[start..start + event_end]);
            let (event_type, data) = split_fields(&event_text);
            start += event_end;

            let Some(data) = data else {
                continue;
            };
            if data == "[DONE]" {
                events.push(CompletionEvent::Done);
                continue;
            }
            if let Some(event) = self.decode(event_type.as_deref(), &data) {
                events.push(event);
            }
        }

        if start > 0 {
            self.buffer.drain(..start);
        }

        events
    }

    /// Decodes whatever is left once the byte stream ends, for servers that
    /// omit the final blank line.
    pub fn finish(&mut self) -> Vec<CompletionEvent> {
        if self.buffer.iter().all(u8::is_ascii_whitespace) {
            self.buffer.clear();
            return Vec::new();
        }
        self.process(b"\n\n")
    }

    fn decode(&self, event_type: Option<&str>, data: &str) -> Option<CompletionEvent> {
        match self.protocol {
            ApiProtocol::AnthropicMessages => match serde_json::from_str::<AnthropicEvent>(data) {
                Ok(AnthropicEvent::ContentBlockDelta {
                    delta: AnthropicDelta::TextDelta { text },
                }) => Some(CompletionEvent::TextDelta(text)),
                Ok(AnthropicEvent::MessageStop) => Some(CompletionEvent::Done),
                Ok(AnthropicEvent::Error { error }) => Some(CompletionEvent::Error(error.message)),
                Ok(_) => None,
                Err(error) => {
                    emit_sse_parse_error(event_type, data, &error);
                    None
                }
            },
            ApiProtocol::OpenAiChatCompletions => match serde_json::from_str::<ChatChunk>(data) {
                Ok(ChatChunk {
                    error: Some(error), ..
                }) => Some(CompletionEvent::Error(error.message)),
                Ok(chunk) => chunk
                    .choices
                    .into_iter()
                    .next()
                    .and_then(|choice| choice.delta.content)
                    .map(CompletionEvent::TextDelta),
                Err(error) => {
                    emit_sse_parse_error(event_type, data, &error);
                    None
                }
            },
        }
    }
}

/// Offset just past the first blank line, accepting `\n` or `\r\n` for
/// either of its two line endings.
fn find_event_end(buffer: &[u8]) -> Option<usize> {
    let mut index = 0;
    while index < buffer.len() {
        if buffer[index] == b'\n' {
            match &buffer[index + 1..] {
                [b'\n', ..] => return Some(index + 2),
                [b'\r', b'\n', ..] => return Some(index + 3),
                _ => {}
            }
        }
        index += 1;
    }
    None
}

fn split_fields(event_text: &str) -> (Option<String>, Option<String>) {
    let mut event_type = None;
    let mut data: Option<String> = None;

    for line in event_text.lines() {
        if let Some(rest) = line.strip_prefix("event:") {
            event_type = Some(rest.trim().to_string());
        } else if let Some(rest) = line.strip_prefix("data:") {
            let rest = rest.strip_prefix(' ').unwrap_or(rest);
            match data.as_mut() {
                Some(existing) => {
                    existing.push('\n');
                    existing.push_str(rest);
                }
                None => data = Some(rest.to_string()),
            }
        }
    }

    (event_type, data.map(|d| d.trim().to_string()))
}
