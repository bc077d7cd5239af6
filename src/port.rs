use tokio::sync::mpsc;
use tracing::warn;

use crate::types::{PortData, SummaryRequest};

/// Outbound half of the completion channel. Sends are fire-and-forget.
pub trait Port: Send {
    fn send(&self, request: SummaryRequest);
}

/// In-process channel pair connecting a provider to a background worker.
pub struct ChannelPort {
    request_tx: mpsc::UnboundedSender<SummaryRequest>,
}

/// The worker's side of a [`ChannelPort`].
pub struct PortEndpoint {
    pub requests: mpsc::UnboundedReceiver<SummaryRequest>,
    pub replies: mpsc::UnboundedSender<PortData>,
}

impl ChannelPort {
    /// Returns the port, the worker endpoint, and the inbound receiver the
    /// provider listens on.
    pub fn open() -> (Self, PortEndpoint, mpsc::UnboundedReceiver<PortData>) {
        let (request_tx, requests) = mpsc::unbounded_channel();
        let (replies, inbound) = mpsc::unbounded_channel();
        (
            Self { request_tx },
            PortEndpoint { requests, replies },
            inbound,
        )
    }
}

impl Port for ChannelPort {
    fn send(&self, request: SummaryRequest) {
        let generation = request.generation_id;
        if self.request_tx.send(request).is_err() {
            warn!(generation, "completion worker is gone; request dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn request(generation_id: u64) -> SummaryRequest {
        SummaryRequest {
            prompt: "p".to_string(),
            model: "m".to_string(),
            context: Value::Null,
            generation_id,
        }
    }

    #[tokio::test]
    async fn test_channel_port_delivers_in_order() {
        let (port, mut endpoint, mut inbound) = ChannelPort::open();
        port.send(request(1));
        port.send(request(2));

        assert_eq!(endpoint.requests.recv().await.unwrap().generation_id, 1);
        assert_eq!(endpoint.requests.recv().await.unwrap().generation_id, 2);

        endpoint.replies.send(PortData::end(2)).unwrap();
        assert_eq!(inbound.recv().await, Some(PortData::end(2)));
    }

    #[test]
    fn test_send_after_worker_drop_does_not_panic() {
        let (port, endpoint, _inbound) = ChannelPort::open();
        drop(endpoint);
        port.send(request(1));
    }
}
