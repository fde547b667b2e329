//! Protocol messages for the signaling relay.
//!
//! Every message is a flat JSON object tagged by its `type` field.
//! The field names below are the wire contract and must not change:
//! browser and native clients match on them literally.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{CallCode, SignalError};

/// Messages clients send to the relay.
///
/// Anything with a `type` the relay does not recognize decodes to
/// [`ClientMessage::Unknown`] and is dropped without a reply, so old
/// servers tolerate newer clients. Payload fields (`offer`, `answer`,
/// `candidate`, `sdpMid`, `sdpMLineIndex`) are opaque [`Value`]s:
/// the relay forwards them without inspection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    /// Caller requests a fresh call code.
    #[serde(rename = "startCall")]
    StartCall,

    /// Receiver asks to join the call with the given code.
    #[serde(rename = "searchCall")]
    SearchCall {
        /// Code the receiver was given out-of-band.
        #[serde(rename = "callCode")]
        call_code: CallCode,
    },

    /// Caller's SDP offer, to be forwarded to the receiver.
    #[serde(rename = "offer")]
    Offer {
        /// Code of the call being negotiated.
        #[serde(rename = "callCode")]
        call_code: CallCode,
        /// Opaque SDP payload.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        offer: Option<Value>,
    },

    /// Receiver's SDP answer, to be forwarded to the caller.
    #[serde(rename = "answer")]
    Answer {
        /// Code of the call being negotiated.
        #[serde(rename = "callCode")]
        call_code: CallCode,
        /// Opaque SDP payload.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        answer: Option<Value>,
    },

    /// ICE candidate from the caller, to be forwarded to the receiver.
    #[serde(rename = "ICECaller")]
    IceCaller {
        /// Code of the call being negotiated.
        #[serde(rename = "callCode")]
        call_code: CallCode,
        /// Opaque connectivity-probe payload.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        candidate: Option<Value>,
        /// Opaque positional metadata.
        #[serde(rename = "sdpMid", default, skip_serializing_if = "Option::is_none")]
        sdp_mid: Option<Value>,
        /// Opaque positional metadata.
        #[serde(
            rename = "sdpMLineIndex",
            default,
            skip_serializing_if = "Option::is_none"
        )]
        sdp_m_line_index: Option<Value>,
    },

    /// ICE candidate from the receiver, to be forwarded to the caller.
    #[serde(rename = "ICEReceiver")]
    IceReceiver {
        /// Code of the call being negotiated.
        #[serde(rename = "callCode")]
        call_code: CallCode,
        /// Opaque connectivity-probe payload.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        candidate: Option<Value>,
        /// Opaque positional metadata.
        #[serde(rename = "sdpMid", default, skip_serializing_if = "Option::is_none")]
        sdp_mid: Option<Value>,
        /// Opaque positional metadata.
        #[serde(
            rename = "sdpMLineIndex",
            default,
            skip_serializing_if = "Option::is_none"
        )]
        sdp_m_line_index: Option<Value>,
    },

    /// Any `type` this server version does not recognize.
    #[serde(other)]
    Unknown,
}

impl ClientMessage {
    /// Decode a message from its JSON wire form.
    pub fn from_json(text: &str) -> Result<Self, SignalError> {
        serde_json::from_str(text).map_err(SignalError::Deserialization)
    }
}

/// Messages the relay sends to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerMessage {
    /// Reply to `startCall` carrying the freshly minted code.
    #[serde(rename = "callCreated")]
    CallCreated {
        /// The minted code.
        #[serde(rename = "callCode")]
        call_code: CallCode,
    },

    /// Sent to the caller when a receiver joins its call.
    #[serde(rename = "callJoined")]
    CallJoined {
        /// Code of the joined call.
        #[serde(rename = "callCode")]
        call_code: CallCode,
    },

    /// Reply to `searchCall` when no call has the given code.
    #[serde(rename = "callNotFound")]
    CallNotFound {
        /// The code that matched nothing.
        #[serde(rename = "callCode")]
        call_code: CallCode,
    },

    /// Caller's SDP offer, relayed to the receiver.
    #[serde(rename = "offer")]
    Offer {
        /// Code of the call being negotiated.
        #[serde(rename = "callCode")]
        call_code: CallCode,
        /// Opaque SDP payload, forwarded verbatim.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        offer: Option<Value>,
    },

    /// Receiver's SDP answer, relayed to the caller.
    #[serde(rename = "answer")]
    Answer {
        /// Code of the call being negotiated.
        #[serde(rename = "callCode")]
        call_code: CallCode,
        /// Opaque SDP payload, forwarded verbatim.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        answer: Option<Value>,
    },

    /// Caller's ICE candidate, relayed to the receiver.
    #[serde(rename = "ICECaller")]
    IceCaller {
        /// Code of the call being negotiated.
        #[serde(rename = "callCode")]
        call_code: CallCode,
        /// Opaque connectivity-probe payload, forwarded verbatim.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        candidate: Option<Value>,
        /// Opaque positional metadata, forwarded verbatim.
        #[serde(rename = "sdpMid", default, skip_serializing_if = "Option::is_none")]
        sdp_mid: Option<Value>,
        /// Opaque positional metadata, forwarded verbatim.
        #[serde(
            rename = "sdpMLineIndex",
            default,
            skip_serializing_if = "Option::is_none"
        )]
        sdp_m_line_index: Option<Value>,
    },

    /// Receiver's ICE candidate, relayed to the caller.
    #[serde(rename = "ICEReceiver")]
    IceReceiver {
        /// Code of the call being negotiated.
        #[serde(rename = "callCode")]
        call_code: CallCode,
        /// Opaque connectivity-probe payload, forwarded verbatim.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        candidate: Option<Value>,
        /// Opaque positional metadata, forwarded verbatim.
        #[serde(rename = "sdpMid", default, skip_serializing_if = "Option::is_none")]
        sdp_mid: Option<Value>,
        /// Opaque positional metadata, forwarded verbatim.
        #[serde(
            rename = "sdpMLineIndex",
            default,
            skip_serializing_if = "Option::is_none"
        )]
        sdp_m_line_index: Option<Value>,
    },

    /// Transport keepalive; carries no call semantics.
    #[serde(rename = "ping")]
    Ping,
}

impl ServerMessage {
    /// Encode a message to its JSON wire form.
    pub fn to_json(&self) -> Result<String, SignalError> {
        serde_json::to_string(self).map_err(SignalError::Serialization)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn start_call_decodes() {
        let msg = ClientMessage::from_json(r#"{"type":"startCall"}"#).unwrap();
        assert_eq!(msg, ClientMessage::StartCall);
    }

    #[test]
    fn search_call_decodes_code() {
        let msg = ClientMessage::from_json(r#"{"type":"searchCall","callCode":"ABCDE"}"#).unwrap();
        assert_eq!(
            msg,
            ClientMessage::SearchCall {
                call_code: CallCode::from("ABCDE"),
            }
        );
    }

    #[test]
    fn search_call_without_code_fails_closed() {
        // Missing callCode is a decode error; the relay drops the message.
        assert!(ClientMessage::from_json(r#"{"type":"searchCall"}"#).is_err());
    }

    #[test]
    fn unknown_type_decodes_to_unknown() {
        let msg = ClientMessage::from_json(r#"{"type":"hangUp","callCode":"ABCDE"}"#).unwrap();
        assert_eq!(msg, ClientMessage::Unknown);
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let msg =
            ClientMessage::from_json(r#"{"type":"searchCall","callCode":"ABCDE","extra":42}"#)
                .unwrap();
        assert!(matches!(msg, ClientMessage::SearchCall { .. }));
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(ClientMessage::from_json("not json").is_err());
        assert!(ClientMessage::from_json("").is_err());
        assert!(ClientMessage::from_json(r#"{"callCode":"ABCDE"}"#).is_err());
    }

    #[test]
    fn offer_payload_is_opaque() {
        // Payloads pass through untouched, whether strings or objects.
        let msg = ClientMessage::from_json(
            r#"{"type":"offer","callCode":"ABCDE","offer":{"sdp":"v=0\r\n...","kind":"offer"}}"#,
        )
        .unwrap();
        match msg {
            ClientMessage::Offer { call_code, offer } => {
                assert_eq!(call_code.as_str(), "ABCDE");
                assert_eq!(offer, Some(json!({"sdp": "v=0\r\n...", "kind": "offer"})));
            }
            other => panic!("expected Offer, got {other:?}"),
        }
    }

    #[test]
    fn ice_wire_names_are_exact() {
        // ICECaller/ICEReceiver and sdpMid/sdpMLineIndex casing is load-bearing.
        let msg = ClientMessage::from_json(
            r#"{"type":"ICECaller","callCode":"ABCDE","candidate":"cand1","sdpMid":"0","sdpMLineIndex":0}"#,
        )
        .unwrap();
        match msg {
            ClientMessage::IceCaller {
                candidate,
                sdp_mid,
                sdp_m_line_index,
                ..
            } => {
                assert_eq!(candidate, Some(json!("cand1")));
                assert_eq!(sdp_mid, Some(json!("0")));
                assert_eq!(sdp_m_line_index, Some(json!(0)));
            }
            other => panic!("expected IceCaller, got {other:?}"),
        }
    }

    #[test]
    fn ice_metadata_may_be_absent_or_negative() {
        let msg = ClientMessage::from_json(r#"{"type":"ICEReceiver","callCode":"ABCDE"}"#).unwrap();
        match msg {
            ClientMessage::IceReceiver {
                candidate,
                sdp_mid,
                sdp_m_line_index,
                ..
            } => {
                assert_eq!(candidate, None);
                assert_eq!(sdp_mid, None);
                assert_eq!(sdp_m_line_index, None);
            }
            other => panic!("expected IceReceiver, got {other:?}"),
        }

        let msg = ClientMessage::from_json(
            r#"{"type":"ICECaller","callCode":"ABCDE","sdpMLineIndex":-1}"#,
        )
        .unwrap();
        match msg {
            ClientMessage::IceCaller {
                sdp_m_line_index, ..
            } => assert_eq!(sdp_m_line_index, Some(json!(-1))),
            other => panic!("expected IceCaller, got {other:?}"),
        }
    }

    #[test]
    fn unicode_and_empty_payloads_survive() {
        let msg = ClientMessage::from_json(
            r#"{"type":"answer","callCode":"ABCDE","answer":"日本語 🎥"}"#,
        )
        .unwrap();
        match msg {
            ClientMessage::Answer { answer, .. } => assert_eq!(answer, Some(json!("日本語 🎥"))),
            other => panic!("expected Answer, got {other:?}"),
        }

        let msg =
            ClientMessage::from_json(r#"{"type":"offer","callCode":"ABCDE","offer":""}"#).unwrap();
        match msg {
            ClientMessage::Offer { offer, .. } => assert_eq!(offer, Some(json!(""))),
            other => panic!("expected Offer, got {other:?}"),
        }
    }

    #[test]
    fn call_created_wire_shape() {
        let json = ServerMessage::CallCreated {
            call_code: CallCode::from("ABCDE"),
        }
        .to_json()
        .unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value, json!({"type": "callCreated", "callCode": "ABCDE"}));
    }

    #[test]
    fn call_joined_and_not_found_wire_shapes() {
        let joined = ServerMessage::CallJoined {
            call_code: CallCode::from("ABCDE"),
        }
        .to_json()
        .unwrap();
        let value: Value = serde_json::from_str(&joined).unwrap();
        assert_eq!(value, json!({"type": "callJoined", "callCode": "ABCDE"}));

        let not_found = ServerMessage::CallNotFound {
            call_code: CallCode::from("ZZZZZ"),
        }
        .to_json()
        .unwrap();
        let value: Value = serde_json::from_str(&not_found).unwrap();
        assert_eq!(value, json!({"type": "callNotFound", "callCode": "ZZZZZ"}));
    }

    #[test]
    fn ping_wire_shape() {
        let json = ServerMessage::Ping.to_json().unwrap();
        assert_eq!(json, r#"{"type":"ping"}"#);
    }

    #[test]
    fn forwarded_offer_preserves_payload() {
        let json = ServerMessage::Offer {
            call_code: CallCode::from("ABCDE"),
            offer: Some(json!("sdp-blob-1")),
        }
        .to_json()
        .unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(
            value,
            json!({"type": "offer", "callCode": "ABCDE", "offer": "sdp-blob-1"})
        );
    }

    #[test]
    fn forwarded_ice_omits_absent_metadata() {
        let json = ServerMessage::IceCaller {
            call_code: CallCode::from("ABCDE"),
            candidate: Some(json!("cand1")),
            sdp_mid: None,
            sdp_m_line_index: None,
        }
        .to_json()
        .unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(
            value,
            json!({"type": "ICECaller", "callCode": "ABCDE", "candidate": "cand1"})
        );
    }

    #[test]
    fn forwarded_ice_preserves_zero_index() {
        let json = ServerMessage::IceReceiver {
            call_code: CallCode::from("ABCDE"),
            candidate: Some(json!("cand2")),
            sdp_mid: Some(json!("0")),
            sdp_m_line_index: Some(json!(0)),
        }
        .to_json()
        .unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["sdpMLineIndex"], json!(0));
        assert_eq!(value["sdpMid"], json!("0"));
        assert_eq!(value["type"], json!("ICEReceiver"));
    }
}
