//! Inbound message envelope schema and validation.
//!
//! Envelopes are produced by the transport bridge and consumed exactly once
//! per classification pass; validation here keeps the session runtime free of
//! half-formed events.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

pub const GATEWAY_CONTRACT_SCHEMA_VERSION: u32 = 1;

fn gateway_contract_schema_version() -> u32 {
    GATEWAY_CONTRACT_SCHEMA_VERSION
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
/// Embed block attached to a gateway message.
pub struct MessageEmbed {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
/// One inbound gateway message, addressed to a single session.
pub struct IncomingMessage {
    #[serde(default = "gateway_contract_schema_version")]
    pub schema_version: u32,
    pub author_id: u64,
    pub channel_id: u64,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub embeds: Vec<MessageEmbed>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
/// One outbound send request handed to the gateway sink.
pub struct OutboundMessage {
    pub channel_id: u64,
    pub content: String,
}

/// Parses and validates one inbound envelope from its JSON form.
pub fn parse_incoming_message_envelope(raw: &str) -> Result<IncomingMessage> {
    let message = serde_json::from_str::<IncomingMessage>(raw)
        .context("failed to parse gateway message envelope")?;
    validate_incoming_message(&message)?;
    Ok(message)
}

pub fn validate_incoming_message(message: &IncomingMessage) -> Result<()> {
    if message.schema_version != GATEWAY_CONTRACT_SCHEMA_VERSION {
        bail!(
            "unsupported gateway envelope schema_version {} (expected {})",
            message.schema_version,
            GATEWAY_CONTRACT_SCHEMA_VERSION
        );
    }
    if message.author_id == 0 {
        bail!("gateway envelope has zero author_id");
    }
    if message.channel_id == 0 {
        bail!("gateway envelope has zero channel_id");
    }
    if message.content.trim().is_empty() && message.embeds.is_empty() {
        bail!("gateway envelope must include non-empty content or at least one embed");
    }
    for (index, embed) in message.embeds.iter().enumerate() {
        if let Some(url) = embed.image_url.as_deref() {
            let url = url.trim();
            if !(url.starts_with("https://") || url.starts_with("http://")) {
                bail!("gateway envelope embed index {index} has invalid image url '{url}'");
            }
        }
    }
    Ok(())
}
