//! Outbound send trait and the senders shipped with the workspace.
//!
//! Delivery guarantees belong to the transport; the session runtime only
//! hands a send request over and moves on.

use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::json;

use crate::gateway_contract::OutboundMessage;
use nab_core::{append_text_line, current_unix_timestamp_ms};

#[async_trait]
/// Sink for outbound session messages.
pub trait GatewaySender: Send + Sync {
    async fn send_message(&self, channel_id: u64, content: &str) -> Result<()>;
}

/// Appends send requests to a JSONL log for the transport bridge to drain.
#[derive(Debug)]
pub struct JsonlGatewaySender {
    path: PathBuf,
}

impl JsonlGatewaySender {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl GatewaySender for JsonlGatewaySender {
    async fn send_message(&self, channel_id: u64, content: &str) -> Result<()> {
        let entry = json!({
            "timestamp_unix_ms": current_unix_timestamp_ms(),
            "channel_id": channel_id,
            "content": content,
        });
        append_text_line(&self.path, &entry.to_string())
            .with_context(|| format!("failed to record outbound message for {channel_id}"))
    }
}

/// In-memory sender used by runtime tests to observe dispatches.
#[derive(Debug, Default)]
pub struct RecordingGatewaySender {
    sent: Mutex<Vec<OutboundMessage>>,
}

impl RecordingGatewaySender {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<OutboundMessage> {
        self.sent
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[async_trait]
impl GatewaySender for RecordingGatewaySender {
    async fn send_message(&self, channel_id: u64, content: &str) -> Result<()> {
        self.sent
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(OutboundMessage {
                channel_id,
                content: content.to_string(),
            });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn functional_jsonl_sender_appends_one_entry_per_send() {
        let tempdir = tempfile::tempdir().expect("tempdir");
        let path = tempdir.path().join("outbound-events.jsonl");
        let sender = JsonlGatewaySender::new(&path);

        sender.send_message(123, "first").await.expect("send");
        sender.send_message(456, "second").await.expect("send");

        let raw = std::fs::read_to_string(&path).expect("read log");
        let entries = raw
            .lines()
            .map(|line| serde_json::from_str::<serde_json::Value>(line).expect("entry json"))
            .collect::<Vec<_>>();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0]["channel_id"], 123);
        assert_eq!(entries[0]["content"], "first");
        assert_eq!(entries[1]["channel_id"], 456);
        assert!(entries[1]["timestamp_unix_ms"].as_u64().is_some());
    }

    #[tokio::test]
    async fn unit_recording_sender_captures_messages_in_order() {
        let sender = RecordingGatewaySender::new();
        sender.send_message(1, "a").await.expect("send");
        sender.send_message(2, "b").await.expect("send");
        let sent = sender.sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].channel_id, 1);
        assert_eq!(sent[1].content, "b");
    }
}
