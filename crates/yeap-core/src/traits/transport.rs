// SPDX-FileCopyrightText: 2026 Yeap Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Push transport trait for the persistent bidirectional connection.

use async_trait::async_trait;

use crate::error::YeapError;
use crate::types::PushFrame;

/// A persistent, bidirectional connection to the realtime server.
///
/// The transport owns reconnection policy; the channel session only opens,
/// emits acknowledged requests, reads pushes in order, and closes.
#[async_trait]
pub trait PushTransport: Send + Sync + 'static {
    /// Human-readable name used in logs.
    fn name(&self) -> &str;

    /// Opens the underlying connection. Opening an already open transport is a no-op.
    async fn open(&self) -> Result<(), YeapError>;

    /// Emits `event` with `payload` and waits for the server's acknowledgement value.
    async fn emit_with_ack(
        &self,
        event: &str,
        payload: serde_json::Value,
    ) -> Result<serde_json::Value, YeapError>;

    /// Returns the next pushed frame in arrival order, or `None` once the
    /// connection is closed.
    async fn next_frame(&self) -> Result<Option<PushFrame>, YeapError>;

    /// Closes the connection, releasing any held resources.
    async fn close(&self) -> Result<(), YeapError>;
}
