//! Background completion service answering requests from a [`ChannelPort`].
//!
//! Each request streams a completion and replies with cumulative snapshots
//! (`isEnd: false`), then a bare `isEnd: true`, or a single `error` event.
//! A new request cancels the one before it.
//!
//! [`ChannelPort`]: crate::port::ChannelPort

use std::sync::Arc;

use anyhow::{bail, Result};
use futures::StreamExt;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::api::{CompletionClient, CompletionEvent, SseParser};
use crate::port::PortEndpoint;
use crate::types::{PortData, SummaryRequest};

pub struct CompletionWorker {
    client: Arc<CompletionClient>,
}

impl CompletionWorker {
    pub fn new(client: CompletionClient) -> Self {
        Self {
            client: Arc::new(client),
        }
    }

    /// Serves requests until the provider side of the port closes.
    pub async fn run(self, endpoint: PortEndpoint) {
        let PortEndpoint {
            mut requests,
            replies,
        } = endpoint;
        let mut in_flight: Option<(u64, CancellationToken)> = None;

        while let Some(request) = requests.recv().await {
            if let Some((superseded, token)) = in_flight.take() {
                debug!(generation = superseded, "cancelling superseded completion");
                token.cancel();
            }

            let token = CancellationToken::new();
            in_flight = Some((request.generation_id, token.clone()));
            tokio::spawn(serve_request(
                Arc::clone(&self.client),
                request,
                replies.clone(),
                token,
            ));
        }

        if let Some((_, token)) = in_flight {
            token.cancel();
        }
        debug!("completion worker stopped");
    }
}

async fn serve_request(
    client: Arc<CompletionClient>,
    request: SummaryRequest,
    replies: mpsc::UnboundedSender<PortData>,
    token: CancellationToken,
) {
    let generation = request.generation_id;
    let outcome = tokio::select! {
        _ = token.cancelled() => {
            debug!(generation, "completion cancelled");
            return;
        }
        outcome = relay_completion(&client, &request, &replies) => outcome,
    };

    let reply = match outcome {
        Ok(length) => {
            info!(generation, length, "completion finished");
            PortData::end(generation)
        }
        Err(error) => {
            warn!(generation, error = %error, "completion failed");
            PortData::failure(generation, Value::String(error.to_string()))
        }
    };
    let _ = replies.send(reply);
}

/// Forwards the growing summary after every text delta. Returns the final
/// length in bytes.
async fn relay_completion(
    client: &CompletionClient,
    request: &SummaryRequest,
    replies: &mpsc::UnboundedSender<PortData>,
) -> Result<usize> {
    let generation = request.generation_id;
    let mut stream = client.create_stream(request).await?;
    let mut parser = SseParser::new(client.protocol());
    let mut summary = String::new();

    let apply = |events: Vec<CompletionEvent>, summary: &mut String| -> Result<bool> {
        for event in events {
            match event {
                CompletionEvent::TextDelta(text) => {
                    if text.is_empty() {
                        continue;
                    }
                    summary.push_str(&text);
                    let _ = replies.send(PortData::partial(generation, summary.clone()));
                }
                CompletionEvent::Done => return Ok(true),
                CompletionEvent::Error(message) => bail!("completion stream error: {message}"),
            }
        }
        Ok(false)
    };

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        if apply(parser.process(&chunk), &mut summary)? {
            return Ok(summary.len());
        }
    }
    apply(parser.finish(), &mut summary)?;

    Ok(summary.len())
}
