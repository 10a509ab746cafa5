//! Gateway message contract and source/sink plumbing for nab sessions.
//!
//! The live chat-platform transport stays outside this workspace; these types
//! model the interface it provides: validated inbound message envelopes, a
//! line-delimited ingress feed, and an outbound send trait.

pub mod gateway_contract;
pub mod gateway_ingress;
pub mod gateway_outbound;

pub use gateway_contract::*;
pub use gateway_ingress::*;
pub use gateway_outbound::*;
