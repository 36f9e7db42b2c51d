// SPDX-FileCopyrightText: 2026 Yeap Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Yeap store dashboard.

use thiserror::Error;

use crate::types::{OrderId, OrderStatus, StoreId};

/// The primary error type shared by every collaborator trait and the realtime core.
#[derive(Debug, Error)]
pub enum YeapError {
    /// Configuration errors (invalid TOML, missing store id, bad URLs).
    #[error("configuration error: {0}")]
    Config(String),

    /// Push transport errors (socket connect failure, closed stream, bad frame).
    #[error("transport error: {message}")]
    Transport {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The server acknowledged a join request with `success: false`.
    #[error("join rejected for store {store_id}")]
    JoinRejected { store_id: StoreId },

    /// An operation needed a joined session but none is active.
    #[error("channel session is not joined")]
    NotJoined,

    /// A join was requested for a different store while one is already joined.
    #[error("channel session already joined to store {store_id}")]
    AlreadyJoined { store_id: StoreId },

    /// REST collaborator errors (HTTP failure, non-2xx status, bad body).
    #[error("api error: {message}")]
    Api {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A pushed payload could not be decoded into its typed event.
    #[error("failed to decode `{event}` payload: {source}")]
    Decode {
        event: String,
        source: serde_json::Error,
    },

    /// An operator requested a status change the order lifecycle does not allow.
    #[error("invalid transition for order {order_id}: {from} -> {to}")]
    InvalidTransition {
        order_id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
    },

    /// A status transition for this order is already running.
    #[error("a status transition is already in flight for order {order_id}")]
    TransitionInFlight { order_id: OrderId },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl YeapError {
    /// Shorthand for a transport error without an underlying source.
    pub fn transport(message: impl Into<String>) -> Self {
        YeapError::Transport {
            message: message.into(),
            source: None,
        }
    }

    /// Shorthand for an API error without an underlying source.
    pub fn api(message: impl Into<String>) -> Self {
        YeapError::Api {
            message: message.into(),
            source: None,
        }
    }
}
