//! Line-delimited ingress feed for session inbound queues.
//!
//! The transport bridge appends one JSON envelope per line; the pump polls
//! for new lines and forwards parsed events into the session's bounded queue.
//! Malformed lines are skipped with a log line, never retried.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::gateway_contract::{parse_incoming_message_envelope, IncomingMessage};

/// Tails a JSONL envelope file, tracking how many lines were already consumed.
#[derive(Debug)]
pub struct GatewayFileIngress {
    path: PathBuf,
    consumed_lines: usize,
}

impl GatewayFileIngress {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            consumed_lines: 0,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns events appended since the previous poll, skipping bad lines.
    pub fn poll_new_events(&mut self) -> Result<Vec<IncomingMessage>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let raw = std::fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read {}", self.path.display()))?;
        let mut events = Vec::new();
        for (index, line) in raw.lines().enumerate().skip(self.consumed_lines) {
            self.consumed_lines = index + 1;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            match parse_incoming_message_envelope(trimmed) {
                Ok(event) => events.push(event),
                Err(error) => {
                    warn!(
                        "gateway ingress skipped line: file={} line={} detail={error:#}",
                        self.path.display(),
                        index + 1
                    );
                }
            }
        }
        Ok(events)
    }
}

/// Runs the ingress pump until the session side closes its queue.
///
/// Queue-full events are rejected and counted rather than queued unbounded;
/// arrival order is preserved for everything accepted.
pub async fn run_file_ingress_pump(
    mut ingress: GatewayFileIngress,
    queue: mpsc::Sender<IncomingMessage>,
    poll_interval: Duration,
) {
    let mut rejected_full = 0_u64;
    loop {
        let events = match ingress.poll_new_events() {
            Ok(events) => events,
            Err(error) => {
                warn!("gateway ingress poll failed: detail={error:#}");
                Vec::new()
            }
        };
        for event in events {
            match queue.try_send(event) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(_)) => {
                    rejected_full += 1;
                    warn!(
                        "gateway ingress rejected event: file={} reason=queue_full total_rejected={rejected_full}",
                        ingress.path().display()
                    );
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    debug!(
                        "gateway ingress pump stopping: file={} reason=queue_closed",
                        ingress.path().display()
                    );
                    return;
                }
            }
        }
        if queue.is_closed() {
            return;
        }
        tokio::time::sleep(poll_interval).await;
    }
}

#[cfg(test)]
mod tests {
    use nab_core::append_text_line;

    use super::*;

    fn spawn_line(channel_id: u64) -> String {
        format!(
            r#"{{"author_id":716390085896962058,"channel_id":{channel_id},"content":"","embeds":[{{"title":"A wild pokémon has appeared!","image_url":"https://cdn.example/a.png"}}]}}"#
        )
    }

    #[test]
    fn unit_poll_new_events_returns_empty_for_missing_file() {
        let tempdir = tempfile::tempdir().expect("tempdir");
        let mut ingress = GatewayFileIngress::new(tempdir.path().join("inbound.jsonl"));
        let events = ingress.poll_new_events().expect("poll");
        assert!(events.is_empty());
    }

    #[test]
    fn functional_poll_new_events_consumes_each_line_once() {
        let tempdir = tempfile::tempdir().expect("tempdir");
        let path = tempdir.path().join("inbound.jsonl");
        append_text_line(&path, &spawn_line(11)).expect("append");
        append_text_line(&path, &spawn_line(12)).expect("append");

        let mut ingress = GatewayFileIngress::new(&path);
        let first = ingress.poll_new_events().expect("first poll");
        assert_eq!(
            first.iter().map(|m| m.channel_id).collect::<Vec<_>>(),
            vec![11, 12]
        );

        assert!(ingress.poll_new_events().expect("second poll").is_empty());

        append_text_line(&path, &spawn_line(13)).expect("append");
        let third = ingress.poll_new_events().expect("third poll");
        assert_eq!(third.len(), 1);
        assert_eq!(third[0].channel_id, 13);
    }

    #[test]
    fn regression_poll_new_events_skips_malformed_lines_without_stalling() {
        let tempdir = tempfile::tempdir().expect("tempdir");
        let path = tempdir.path().join("inbound.jsonl");
        append_text_line(&path, "{not json").expect("append");
        append_text_line(&path, &spawn_line(21)).expect("append");

        let mut ingress = GatewayFileIngress::new(&path);
        let events = ingress.poll_new_events().expect("poll");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].channel_id, 21);
    }

    #[tokio::test]
    async fn integration_ingress_pump_forwards_into_queue_and_stops_on_close() {
        let tempdir = tempfile::tempdir().expect("tempdir");
        let path = tempdir.path().join("inbound.jsonl");
        append_text_line(&path, &spawn_line(31)).expect("append");

        let (tx, mut rx) = mpsc::channel(4);
        let pump = tokio::spawn(run_file_ingress_pump(
            GatewayFileIngress::new(&path),
            tx,
            Duration::from_millis(10),
        ));

        let event = rx.recv().await.expect("event should arrive");
        assert_eq!(event.channel_id, 31);

        drop(rx);
        pump.await.expect("pump should stop once the queue closes");
    }
}
