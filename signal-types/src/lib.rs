//! # signal-types
//!
//! Wire format types for the call-signaling relay protocol.
//!
//! This crate provides the types shared between the relay server and
//! native clients:
//! - [`CallCode`] - The short rendezvous identifier for a call
//! - [`ClientMessage`] - Messages clients send to the relay
//! - [`ServerMessage`] - Messages the relay sends to clients
//! - [`SignalError`] - Error types
//!
//! Everything on the wire is a flat UTF-8 JSON object discriminated by
//! its `type` field. Negotiation payloads (SDP offers/answers, ICE
//! candidates) are opaque at this layer and forwarded verbatim.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod code;
mod error;
mod messages;

pub use code::{CallCode, CODE_LENGTH};
pub use error::SignalError;
pub use messages::{ClientMessage, ServerMessage};
