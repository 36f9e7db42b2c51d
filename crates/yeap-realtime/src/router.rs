// SPDX-FileCopyrightText: 2026 Yeap Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Routes server pushes from the session to the desk as typed events.

use serde::Deserialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, trace, warn};
use yeap_core::{Order, PushFrame, ThreadId, YeapError};

use crate::desk::DeskEvent;
use crate::session::SessionHandle;

/// A new or updated order for the joined store.
pub const ORDER_RECEIVED: &str = "orderReceived";
/// A chat thread of the joined store received a message.
pub const STORE_HAVE_NEW_MESSAGE: &str = "storeHaveNewMessage";

/// Typed push events the desk reacts to.
#[derive(Debug, Clone, PartialEq)]
pub enum PushEvent {
    OrderReceived(Order),
    UnreadMessage(ThreadId),
}

// The message push carries either the bare thread id or an object around it.
#[derive(Deserialize)]
#[serde(untagged)]
enum ThreadPayload {
    Bare(ThreadId),
    Object {
        #[serde(rename = "chatId", alias = "threadId")]
        chat_id: ThreadId,
    },
}

impl From<ThreadPayload> for ThreadId {
    fn from(payload: ThreadPayload) -> Self {
        match payload {
            ThreadPayload::Bare(id) | ThreadPayload::Object { chat_id: id } => id,
        }
    }
}

impl PushEvent {
    /// Decodes a frame. Events nobody routes yield `Ok(None)`.
    pub fn decode(frame: &PushFrame) -> Result<Option<Self>, YeapError> {
        let decode_err = |source| YeapError::Decode {
            event: frame.event.clone(),
            source,
        };

        match frame.event.as_str() {
            ORDER_RECEIVED => {
                let order = Order::deserialize(&frame.payload).map_err(decode_err)?;
                Ok(Some(PushEvent::OrderReceived(order)))
            }
            STORE_HAVE_NEW_MESSAGE => {
                let thread = ThreadPayload::deserialize(&frame.payload).map_err(decode_err)?;
                Ok(Some(PushEvent::UnreadMessage(thread.into())))
            }
            _ => Ok(None),
        }
    }
}

/// Subscription of the desk to the joined store's pushes.
///
/// Dropping the router stops forwarding; [`detach`](Self::detach) also waits
/// for the forwarding task to finish.
pub struct EventRouter {
    cancel: CancellationToken,
    _guard: DropGuard,
    task: JoinHandle<()>,
}

impl EventRouter {
    /// Subscribes to both routed events and forwards them to `sink` in arrival order.
    pub fn attach(
        session: &SessionHandle,
        sink: mpsc::UnboundedSender<DeskEvent>,
    ) -> Result<Self, YeapError> {
        let mut subscription = session.subscribe(&[ORDER_RECEIVED, STORE_HAVE_NEW_MESSAGE])?;
        let cancel = CancellationToken::new();
        let task_cancel = cancel.clone();
        let store_id = session.store_id().clone();

        let task = tokio::spawn(async move {
            loop {
                let frame = tokio::select! {
                    biased;
                    _ = task_cancel.cancelled() => break,
                    frame = subscription.recv() => frame,
                };
                let Some(frame) = frame else {
                    debug!(store_id = %store_id, "push subscription closed");
                    break;
                };

                match PushEvent::decode(&frame) {
                    Ok(Some(event)) => {
                        if sink.send(DeskEvent::Push(event)).is_err() {
                            debug!(store_id = %store_id, "desk gone, router stopping");
                            break;
                        }
                    }
                    Ok(None) => trace!(event = %frame.event, "ignoring unrouted push"),
                    Err(e) => warn!(store_id = %store_id, error = %e, "dropping malformed push"),
                }
            }
        });

        Ok(Self {
            _guard: cancel.clone().drop_guard(),
            cancel,
            task,
        })
    }

    /// Unsubscribes and waits for the forwarding task to exit.
    pub async fn detach(self) {
        self.cancel.cancel();
        let _ = self.task.await;
    }
}
