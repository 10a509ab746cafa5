//! Event detection and orchestration engine for nab sessions.
//!
//! Classifies inbound gateway messages into spawn/challenge events, drives
//! the per-session verification state machine, runs the species resolution
//! pipeline, dispatches catch commands, and supervises many independent
//! account sessions over the same gateway contract.

pub mod session_classifier;
pub mod session_commands;
pub mod session_dispatch;
pub mod session_runtime;
pub mod session_state_store;
pub mod session_supervisor;
pub mod session_verification;
pub mod species_pipeline;

pub use session_classifier::*;
pub use session_commands::*;
pub use session_dispatch::*;
pub use session_runtime::*;
pub use session_state_store::*;
pub use session_supervisor::*;
pub use session_verification::*;
pub use species_pipeline::*;
