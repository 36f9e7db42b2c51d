// SPDX-FileCopyrightText: 2026 Yeap Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock push transport for deterministic testing.
//!
//! `MockTransport` implements `PushTransport` with injectable server pushes,
//! a configurable join acknowledgement, and captured emits for assertion.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use serde_json::{Value, json};
use tokio::sync::Notify;

use yeap_core::{Order, PushFrame, PushTransport, YeapError};

/// How the mock answers `emit_with_ack`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AckBehavior {
    /// `{"success": true}`.
    #[default]
    Accept,
    /// `{"success": false}`.
    Reject,
    /// Never answers.
    Hang,
    /// Fails with a transport error.
    Fail,
}

#[derive(Default)]
struct State {
    frames: VecDeque<PushFrame>,
    emitted: Vec<(String, Value)>,
    ack: AckBehavior,
    closed: bool,
    open_count: usize,
    close_count: usize,
}

/// A mock realtime connection.
///
/// Pushes injected via [`push`](Self::push) are returned by `next_frame()` in
/// order; everything passed to `emit_with_ack()` is captured.
pub struct MockTransport {
    state: Mutex<State>,
    notify: Notify,
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::default()),
            notify: Notify::new(),
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Set how subsequent emits are acknowledged.
    pub fn set_ack(&self, ack: AckBehavior) {
        self.state().ack = ack;
    }

    /// Inject a server push.
    pub fn push(&self, event: &str, payload: Value) {
        self.state().frames.push_back(PushFrame::new(event, payload));
        self.notify.notify_one();
    }

    /// Inject an `orderReceived` push.
    pub fn push_order(&self, order: &Order) {
        let payload = serde_json::to_value(order).unwrap_or(Value::Null);
        self.push("orderReceived", payload);
    }

    /// Inject a `storeHaveNewMessage` push carrying a bare thread id.
    pub fn push_unread(&self, thread_id: &str) {
        self.push("storeHaveNewMessage", json!(thread_id));
    }

    /// Simulate the server dropping the connection.
    pub fn close_remote(&self) {
        self.state().closed = true;
        self.notify.notify_one();
    }

    /// Every `(event, payload)` passed to `emit_with_ack()`.
    pub fn emitted(&self) -> Vec<(String, Value)> {
        self.state().emitted.clone()
    }

    pub fn open_count(&self) -> usize {
        self.state().open_count
    }

    pub fn close_count(&self) -> usize {
        self.state().close_count
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PushTransport for MockTransport {
    fn name(&self) -> &str {
        "mock-transport"
    }

    async fn open(&self) -> Result<(), YeapError> {
        let mut state = self.state();
        state.open_count += 1;
        state.closed = false;
        Ok(())
    }

    async fn emit_with_ack(&self, event: &str, payload: Value) -> Result<Value, YeapError> {
        let ack = {
            let mut state = self.state();
            state.emitted.push((event.to_string(), payload));
            state.ack
        };
        match ack {
            AckBehavior::Accept => Ok(json!({"success": true})),
            AckBehavior::Reject => Ok(json!({"success": false})),
            AckBehavior::Hang => std::future::pending().await,
            AckBehavior::Fail => Err(YeapError::transport("mock emit failure")),
        }
    }

    async fn next_frame(&self) -> Result<Option<PushFrame>, YeapError> {
        loop {
            {
                let mut state = self.state();
                if state.closed {
                    return Ok(None);
                }
                if let Some(frame) = state.frames.pop_front() {
                    return Ok(Some(frame));
                }
            }
            self.notify.notified().await;
        }
    }

    async fn close(&self) -> Result<(), YeapError> {
        let mut state = self.state();
        state.close_count += 1;
        state.closed = true;
        drop(state);
        self.notify.notify_one();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn next_frame_returns_pushes_in_order() {
        let transport = MockTransport::new();
        transport.open().await.unwrap();
        transport.push("a", json!(1));
        transport.push("b", json!(2));

        assert_eq!(transport.next_frame().await.unwrap().unwrap().event, "a");
        assert_eq!(transport.next_frame().await.unwrap().unwrap().event, "b");
    }

    #[tokio::test]
    async fn emit_is_captured_and_acknowledged() {
        let transport = MockTransport::new();
        let ack = transport
            .emit_with_ack("joinStore", json!("S1"))
            .await
            .unwrap();
        assert_eq!(ack, json!({"success": true}));
        assert_eq!(
            transport.emitted(),
            vec![("joinStore".to_string(), json!("S1"))]
        );

        transport.set_ack(AckBehavior::Fail);
        assert!(transport.emit_with_ack("joinStore", json!("S1")).await.is_err());
    }

    #[tokio::test]
    async fn close_ends_the_stream_until_reopened() {
        let transport = MockTransport::new();
        transport.close().await.unwrap();
        assert!(transport.next_frame().await.unwrap().is_none());

        transport.open().await.unwrap();
        transport.push("a", json!(null));
        assert!(transport.next_frame().await.unwrap().is_some());
        assert_eq!(transport.close_count(), 1);
        assert_eq!(transport.open_count(), 1);
    }

    #[tokio::test]
    async fn waiting_reader_wakes_on_push() {
        let transport = std::sync::Arc::new(MockTransport::new());
        let reader = {
            let transport = transport.clone();
            tokio::spawn(async move { transport.next_frame().await })
        };
        tokio::task::yield_now().await;
        transport.push("late", json!(null));

        let frame = reader.await.unwrap().unwrap().unwrap();
        assert_eq!(frame.event, "late");
    }
}
