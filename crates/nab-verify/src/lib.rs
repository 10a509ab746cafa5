//! Challenge-solving collaborator interface for nab.
//!
//! Solving a verification challenge is an opaque external procedure; the
//! engine only needs its completion signal to flip a session back to
//! verified.

use async_trait::async_trait;
use thiserror::Error;

mod solve_client;

pub use solve_client::HttpChallengeSolver;

#[derive(Debug, Error)]
pub enum SolveError {
    #[error("solve request failed: {0}")]
    Transport(String),
    #[error("solve request timed out")]
    Timeout,
    #[error("solver rejected challenge: status={status} detail={detail}")]
    Rejected { status: u16, detail: String },
}

#[async_trait]
/// Contract for the external challenge-solving collaborator.
pub trait ChallengeSolver: Send + Sync {
    /// Completes the verification challenge at `captcha_url` for `account_id`.
    ///
    /// Returning `Ok(())` is the completion signal the session runtime uses
    /// to leave the pending state.
    async fn solve(&self, account_id: u64, captcha_url: &str) -> Result<(), SolveError>;
}
