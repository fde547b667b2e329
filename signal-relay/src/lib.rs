//! # signal-relay
//!
//! Rendezvous relay for peer-to-peer call signaling.
//!
//! Two clients that want a direct media session find each other here:
//! a caller asks for a short code, shares it out-of-band, a receiver
//! joins with it, and the relay forwards their negotiation payloads
//! (SDP offers/answers, ICE candidates) verbatim until they connect
//! peer-to-peer. The relay is a dumb pipe: it never inspects payloads
//! and keeps no state beyond the live pairing table.
//!
//! ## Architecture
//!
//! ```text
//! Caller ──┐                      ┌── Receiver
//!          │   JSON / WebSocket   │
//!          ├─────────────────────►│
//!          │                      │
//!      ┌───┴──────────────────────┴───┐
//!      │        signal-relay          │
//!      │  ┌────────────────────────┐  │
//!      │  │ CallRegistry (in-mem)  │  │
//!      │  └────────────────────────┘  │
//!      └──────────────────────────────┘
//! ```
//!
//! ## Protocol
//!
//! Flat JSON objects tagged by `type`:
//! - startCall → callCreated (mint a code)
//! - searchCall → callJoined to the caller, or callNotFound
//! - offer / answer / ICECaller / ICEReceiver (forwarded verbatim)
//! - ping (server → client keepalive)

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cleanup;
pub mod config;
pub mod error;
pub mod keepalive;
pub mod registry;
pub mod server;
pub mod session;
