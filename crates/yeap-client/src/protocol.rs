// SPDX-FileCopyrightText: 2026 Yeap Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! JSON envelopes carried in WebSocket text frames.
//!
//! Client -> Server:
//! ```json
//! {"event": "joinStore", "data": "S1", "ack": 1}
//! ```
//!
//! Server -> Client:
//! ```json
//! {"ack": 1, "data": {"success": true}}
//! {"event": "orderReceived", "data": {...}}
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

use yeap_core::{PushFrame, YeapError};

#[derive(Debug, Serialize)]
struct Outgoing<'a> {
    event: &'a str,
    data: &'a Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    ack: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct IncomingEnvelope {
    #[serde(default)]
    event: Option<String>,
    #[serde(default)]
    data: Value,
    #[serde(default)]
    ack: Option<u64>,
}

/// A decoded server frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Incoming {
    /// Reply to an emit that asked for an acknowledgement.
    Ack { id: u64, data: Value },
    /// Unsolicited push.
    Push(PushFrame),
}

/// Encodes an emit. `ack` is set when the caller waits for a reply.
pub fn encode_emit(event: &str, data: &Value, ack: Option<u64>) -> Result<String, YeapError> {
    serde_json::to_string(&Outgoing { event, data, ack }).map_err(|e| YeapError::Transport {
        message: format!("failed to encode `{event}` emit"),
        source: Some(Box::new(e)),
    })
}

/// Decodes a server text frame.
pub fn decode_incoming(text: &str) -> Result<Incoming, YeapError> {
    let envelope: IncomingEnvelope =
        serde_json::from_str(text).map_err(|e| YeapError::Transport {
            message: "malformed server frame".to_string(),
            source: Some(Box::new(e)),
        })?;

    match (envelope.event, envelope.ack) {
        (Some(event), _) => Ok(Incoming::Push(PushFrame::new(event, envelope.data))),
        (None, Some(id)) => Ok(Incoming::Ack {
            id,
            data: envelope.data,
        }),
        (None, None) => Err(YeapError::transport(
            "server frame has neither an event nor an ack id",
        )),
    }
}
