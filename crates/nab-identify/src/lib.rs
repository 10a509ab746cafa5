//! Image classification collaborator interface for nab.
//!
//! The classification service itself is external; sessions only see the
//! `SpeciesIdentifier` contract: one image URL in, an ordered prediction
//! sequence out, with every failure mode collapsed into `IdentifyError`.

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

mod identify_client;

pub use identify_client::HttpSpeciesIdentifier;

#[derive(Debug, Clone, Deserialize, PartialEq)]
/// One candidate label with its confidence percentage in [0, 100].
pub struct SpeciesPrediction {
    pub label: String,
    pub confidence: f64,
}

#[derive(Debug, Error)]
pub enum IdentifyError {
    #[error("identify request failed: {0}")]
    Transport(String),
    #[error("identify request timed out")]
    Timeout,
    #[error("identify service rejected request: status={status} detail={detail}")]
    Service { status: u16, detail: String },
    #[error("identify response was malformed: {0}")]
    MalformedResponse(String),
}

#[async_trait]
/// Contract for the external image classification collaborator.
pub trait SpeciesIdentifier: Send + Sync {
    /// Classifies the image behind `image_url`.
    ///
    /// The returned order is the service's own ranking order; callers must
    /// not assume it is sorted by confidence.
    async fn identify(&self, image_url: &str) -> Result<Vec<SpeciesPrediction>, IdentifyError>;
}
