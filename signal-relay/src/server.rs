//! Shared relay state and the session-protocol dispatch.
//!
//! `SignalRelay` owns the call registry and the table of live
//! connections. Each connection task hands decoded frames to
//! [`SignalRelay::handle_text`]; delivery back out goes through a
//! per-connection channel, fire-and-forget.

use crate::config::Config;
use crate::registry::{CallRegistry, ConnId, JoinOutcome};
use dashmap::DashMap;
use signal_types::{CallCode, ClientMessage, ServerMessage};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;

/// Sending half of a connection's outbound frame queue.
///
/// Frames are pre-encoded JSON; the session's writer task wraps them
/// in WebSocket text frames. A closed channel means the connection is
/// gone, which the protocol treats the same as "no target".
pub type OutboundTx = mpsc::UnboundedSender<String>;

/// Operational counters for monitoring relay activity.
///
/// All counters are monotonically increasing (reset only on restart).
#[derive(Debug, Default)]
pub struct RelayMetrics {
    /// Total connections accepted.
    pub connections_total: AtomicU64,
    /// Total calls created.
    pub calls_created: AtomicU64,
    /// Total negotiation messages relayed to a peer.
    pub messages_relayed: AtomicU64,
    /// Total messages dropped (no session, no peer, or undecodable).
    pub messages_dropped: AtomicU64,
}

/// Main relay server state.
#[derive(Debug)]
pub struct SignalRelay {
    config: Config,
    registry: CallRegistry,
    /// Live connections, keyed by handle. Written only by session
    /// tasks on connect/disconnect; the keepalive broadcaster iterates
    /// it without touching the registry.
    connections: DashMap<ConnId, OutboundTx>,
    next_conn_id: AtomicU64,
    metrics: RelayMetrics,
}

impl SignalRelay {
    /// Create a relay with the given configuration and no live state.
    pub fn new(config: Config) -> Self {
        Self {
            config,
            registry: CallRegistry::new(),
            connections: DashMap::new(),
            next_conn_id: AtomicU64::new(1),
            metrics: RelayMetrics::default(),
        }
    }

    /// Get the relay configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get the call registry.
    pub fn registry(&self) -> &CallRegistry {
        &self.registry
    }

    /// Get the operational counters.
    pub fn metrics(&self) -> &RelayMetrics {
        &self.metrics
    }

    /// Number of live connections.
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Register a new connection and hand back its opaque handle.
    pub fn register_connection(&self, tx: OutboundTx) -> ConnId {
        let conn = ConnId::new(self.next_conn_id.fetch_add(1, Ordering::Relaxed));
        self.connections.insert(conn, tx);
        self.metrics.connections_total.fetch_add(1, Ordering::Relaxed);
        tracing::debug!("Registered {conn} (live: {})", self.connections.len());
        conn
    }

    /// Tear down a closed or errored connection.
    ///
    /// Removes it from the connection table and destroys every call it
    /// participates in, freeing those codes for reuse.
    pub fn unregister_connection(&self, conn: ConnId) {
        self.connections.remove(&conn);
        let removed = self.registry.remove_participant(conn);
        if removed.is_empty() {
            tracing::debug!("Unregistered {conn}");
        } else {
            tracing::info!(
                "Unregistered {conn}, ended {} call(s): {}",
                removed.len(),
                removed
                    .iter()
                    .map(CallCode::as_str)
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }
    }

    /// Send a message to one connection, fire-and-forget.
    ///
    /// A missing table entry and a closed channel are the same case at
    /// this layer: the target is gone and the message is dropped.
    pub fn send(&self, target: ConnId, message: &ServerMessage) {
        let frame = match message.to_json() {
            Ok(frame) => frame,
            Err(e) => {
                tracing::error!("Failed to encode outbound message: {e}");
                return;
            }
        };

        match self.connections.get(&target) {
            Some(tx) => {
                if tx.send(frame).is_err() {
                    tracing::debug!("Send to {target} failed: connection closing");
                }
            }
            None => tracing::debug!("Send to {target} dropped: no such connection"),
        }
    }

    /// Send a `ping` to every live connection.
    ///
    /// One dead connection never blocks delivery to the rest.
    pub fn broadcast_ping(&self) {
        let frame = match ServerMessage::Ping.to_json() {
            Ok(frame) => frame,
            Err(e) => {
                tracing::error!("Failed to encode ping: {e}");
                return;
            }
        };

        for entry in self.connections.iter() {
            if entry.value().send(frame.clone()).is_err() {
                tracing::debug!("Ping to {} failed: connection closing", entry.key());
            }
        }
    }

    /// Decode one inbound text frame and run it through the protocol.
    ///
    /// Undecodable input is discarded with no reply and no transition;
    /// the connection stays open.
    pub fn handle_text(&self, sender: ConnId, text: &str) {
        match ClientMessage::from_json(text) {
            Ok(message) => self.handle_message(sender, message),
            Err(e) => {
                self.metrics.messages_dropped.fetch_add(1, Ordering::Relaxed);
                tracing::debug!("Discarding undecodable message from {sender}: {e}");
            }
        }
    }

    /// Apply one decoded message against the current call state.
    pub fn handle_message(&self, sender: ConnId, message: ClientMessage) {
        match message {
            ClientMessage::StartCall => match self.registry.create(sender) {
                Ok(code) => {
                    self.metrics.calls_created.fetch_add(1, Ordering::Relaxed);
                    tracing::info!("{sender} created call {code}");
                    self.send(sender, &ServerMessage::CallCreated { call_code: code });
                }
                Err(e) => {
                    // No error reply exists on the wire for startCall;
                    // the caller's own timeout handles it.
                    tracing::warn!("Call creation for {sender} failed: {e}");
                }
            },

            ClientMessage::SearchCall { call_code } => {
                match self.registry.join(&call_code, sender) {
                    JoinOutcome::Joined { caller } => {
                        tracing::info!("{sender} joined call {call_code}");
                        self.send(caller, &ServerMessage::CallJoined { call_code });
                    }
                    JoinOutcome::AlreadyPaired => {
                        // First join won; nobody is notified.
                        tracing::debug!("{sender} tried to join paired call {call_code}");
                    }
                    JoinOutcome::NotFound => {
                        tracing::debug!("{sender} searched unknown call {call_code}");
                        self.send(sender, &ServerMessage::CallNotFound { call_code });
                    }
                }
            }

            ClientMessage::Offer { call_code, offer } => {
                let target = self.registry.lookup(&call_code).and_then(|c| c.receiver);
                let message = ServerMessage::Offer {
                    call_code: call_code.clone(),
                    offer,
                };
                self.forward(&call_code, target, message);
            }

            ClientMessage::Answer { call_code, answer } => {
                let target = self.registry.lookup(&call_code).map(|c| c.caller);
                let message = ServerMessage::Answer {
                    call_code: call_code.clone(),
                    answer,
                };
                self.forward(&call_code, target, message);
            }

            ClientMessage::IceCaller {
                call_code,
                candidate,
                sdp_mid,
                sdp_m_line_index,
            } => {
                let target = self.registry.lookup(&call_code).and_then(|c| c.receiver);
                let message = ServerMessage::IceCaller {
                    call_code: call_code.clone(),
                    candidate,
                    sdp_mid,
                    sdp_m_line_index,
                };
                self.forward(&call_code, target, message);
            }

            ClientMessage::IceReceiver {
                call_code,
                candidate,
                sdp_mid,
                sdp_m_line_index,
            } => {
                let target = self.registry.lookup(&call_code).map(|c| c.caller);
                let message = ServerMessage::IceReceiver {
                    call_code: call_code.clone(),
                    candidate,
                    sdp_mid,
                    sdp_m_line_index,
                };
                self.forward(&call_code, target, message);
            }

            ClientMessage::Unknown => {
                // Forward compatibility: newer clients may speak types
                // this server version does not know.
                tracing::trace!("Ignoring unrecognized message type from {sender}");
            }
        }
    }

    /// Relay a negotiation message to its freshly resolved target.
    ///
    /// The target is looked up per message, never cached, so a call
    /// destroyed since the last frame yields "no target" here instead
    /// of a stale handle. Best-effort: no target means a silent drop.
    fn forward(&self, code: &CallCode, target: Option<ConnId>, message: ServerMessage) {
        match target {
            Some(conn) => {
                self.registry.touch(code);
                self.metrics.messages_relayed.fetch_add(1, Ordering::Relaxed);
                self.send(conn, &message);
            }
            None => {
                self.metrics.messages_dropped.fetch_add(1, Ordering::Relaxed);
                tracing::debug!("Dropping relay message for {code}: no target");
            }
        }
    }
}
