use crate::api::client::{ByteStream, MockStreamProducer};
use crate::types::SummaryRequest;
use anyhow::{anyhow, Result};
use bytes::Bytes;
use futures::stream;
use std::sync::{Arc, Mutex};

pub enum MockResponse {
    /// SSE chunks, each framed with a trailing blank line if missing.
    Chunks(Vec<String>),
    /// A stream that never yields.
    Hang,
    /// The request itself fails.
    Fail(String),
}

#[derive(Clone)]
pub struct MockCompletionClient {
    responses: Arc<Mutex<Vec<MockResponse>>>,
    seen: Arc<Mutex<Vec<SummaryRequest>>>,
}

impl MockCompletionClient {
    pub fn new(responses: Vec<MockResponse>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses)),
            seen: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn seen_requests(&self) -> Vec<SummaryRequest> {
        self.seen.lock().unwrap().clone()
    }
}

impl MockStreamProducer for MockCompletionClient {
    fn create_mock_stream(&self, request: &SummaryRequest) -> Result<ByteStream> {
        self.seen.lock().unwrap().push(request.clone());

        let mut responses_guard = self.responses.lock().unwrap();
        if responses_guard.is_empty() {
            return Err(anyhow!("MockCompletionClient: No more responses configured"));
        }

        match responses_guard.remove(0) {
            MockResponse::Chunks(chunks) => {
                let framed: Vec<Result<Bytes>> = chunks
                    .into_iter()
                    .map(|s| {
                        let framed = if s.ends_with("\n\n") {
                            s
                        } else {
                            format!("{s}\n\n")
                        };
                        Ok(Bytes::from(framed))
                    })
                    .collect();
                Ok(Box::pin(stream::iter(framed)))
            }
            MockResponse::Hang => Ok(Box::pin(stream::pending::<Result<Bytes>>())),
            MockResponse::Fail(message) => Err(anyhow!(message)),
        }
    }
}
