// SPDX-FileCopyrightText: 2026 Yeap Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Channel session: owns the push transport and the store-room membership.
//!
//! States: `Disconnected -> Joining -> Joined`, back to `Disconnected` on
//! rejection, timeout, explicit disconnect, or when the transport closes.
//!
//! While joined, a pump task reads frames from the transport in arrival
//! order and fans them out to [`Subscription`]s over unbounded channels, so
//! the transport is never blocked by a slow consumer.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex as StdMutex, MutexGuard, PoisonError};
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::{Mutex, mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};
use yeap_core::{JoinAck, PushFrame, PushTransport, StoreId, YeapError};

/// Event emitted to join a store room.
pub const JOIN_EVENT: &str = "joinStore";

/// Lifecycle state of a [`ChannelSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Joining,
    Joined,
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionState::Disconnected => write!(f, "disconnected"),
            SessionState::Joining => write!(f, "joining"),
            SessionState::Joined => write!(f, "joined"),
        }
    }
}

struct Subscriber {
    events: Vec<String>,
    tx: mpsc::UnboundedSender<PushFrame>,
}

/// Most frames held for a join that nobody has subscribed to yet.
const BACKLOG_LIMIT: usize = 1024;

/// Subscriptions of one join. Closed exactly once, on teardown.
///
/// Frames that arrive before the first subscription are held in a backlog and
/// handed to that subscription, so pushes sent right after the join ack are
/// not lost while the router attaches.
struct Registry {
    subscribers: DashMap<u64, Subscriber>,
    // `Some` until the first subscription. Dispatch and the first subscribe
    // both hold this lock, which keeps backlog frames ahead of live ones.
    backlog: StdMutex<Option<VecDeque<PushFrame>>>,
    next_id: AtomicU64,
    closed: CancellationToken,
}

impl Registry {
    fn new() -> Self {
        Self {
            subscribers: DashMap::new(),
            backlog: StdMutex::new(Some(VecDeque::new())),
            next_id: AtomicU64::new(1),
            closed: CancellationToken::new(),
        }
    }

    fn backlog(&self) -> MutexGuard<'_, Option<VecDeque<PushFrame>>> {
        self.backlog.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn dispatch(&self, frame: &PushFrame) -> usize {
        let mut backlog = self.backlog();
        if let Some(held) = backlog.as_mut() {
            if held.len() == BACKLOG_LIMIT {
                held.pop_front();
                warn!(event = %frame.event, "no subscriber yet, dropping oldest held push");
            }
            held.push_back(frame.clone());
            return 0;
        }

        let mut delivered = 0;
        for entry in self.subscribers.iter() {
            if entry.events.iter().any(|e| *e == frame.event) && entry.tx.send(frame.clone()).is_ok()
            {
                delivered += 1;
            }
        }
        delivered
    }

    /// Registers a subscriber. The first one also receives the held frames
    /// it subscribes to.
    fn register(&self, id: u64, subscriber: Subscriber) {
        let mut backlog = self.backlog();
        if let Some(held) = backlog.take() {
            let mut replayed = 0;
            for frame in held {
                if subscriber.events.iter().any(|e| *e == frame.event)
                    && subscriber.tx.send(frame).is_ok()
                {
                    replayed += 1;
                }
            }
            if replayed > 0 {
                debug!(subscription = id, replayed, "held pushes replayed");
            }
        }
        self.subscribers.insert(id, subscriber);
    }

    fn held(&self) -> usize {
        self.backlog().as_ref().map_or(0, VecDeque::len)
    }

    fn close(&self) {
        self.closed.cancel();
        self.backlog().take();
        self.subscribers.clear();
    }
}

/// A registration for a set of push events.
///
/// Frames arrive in transport order. Dropping the subscription unregisters it.
/// Once the session is torn down, [`recv`](Self::recv) returns `None` even if
/// frames were still queued.
pub struct Subscription {
    id: u64,
    rx: mpsc::UnboundedReceiver<PushFrame>,
    registry: Arc<Registry>,
}

impl Subscription {
    pub async fn recv(&mut self) -> Option<PushFrame> {
        if self.registry.closed.is_cancelled() {
            return None;
        }
        tokio::select! {
            biased;
            _ = self.registry.closed.cancelled() => None,
            frame = self.rx.recv() => frame,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.registry.subscribers.remove(&self.id);
    }
}

/// Handle to a joined store room, cloned freely by whoever needs to subscribe.
#[derive(Clone)]
pub struct SessionHandle {
    store_id: StoreId,
    registry: Arc<Registry>,
}

impl std::fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionHandle")
            .field("store_id", &self.store_id)
            .field("active", &self.is_active())
            .field("subscribers", &self.subscriber_count())
            .field("held", &self.registry.held())
            .finish()
    }
}

impl SessionHandle {
    pub fn store_id(&self) -> &StoreId {
        &self.store_id
    }

    /// Whether the join this handle belongs to is still live.
    pub fn is_active(&self) -> bool {
        !self.registry.closed.is_cancelled()
    }

    pub fn subscriber_count(&self) -> usize {
        self.registry.subscribers.len()
    }

    /// Registers for the named push events.
    pub fn subscribe(&self, events: &[&str]) -> Result<Subscription, YeapError> {
        if !self.is_active() {
            return Err(YeapError::NotJoined);
        }
        let id = self.registry.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::unbounded_channel();
        self.registry.register(
            id,
            Subscriber {
                events: events.iter().map(|e| e.to_string()).collect(),
                tx,
            },
        );
        debug!(store_id = %self.store_id, subscription = id, ?events, "subscribed");
        Ok(Subscription {
            id,
            rx,
            registry: Arc::clone(&self.registry),
        })
    }

    fn same_join(&self, other: &SessionHandle) -> bool {
        Arc::ptr_eq(&self.registry, &other.registry)
    }
}

struct ActiveJoin {
    handle: SessionHandle,
    pump_cancel: CancellationToken,
    pump: JoinHandle<()>,
}

/// Persistent connection scoped to one store room.
pub struct ChannelSession {
    transport: Arc<dyn PushTransport>,
    join_timeout: Duration,
    state: Arc<watch::Sender<SessionState>>,
    // Held across the whole join so only one attempt is ever in flight.
    active: Mutex<Option<ActiveJoin>>,
}

impl ChannelSession {
    pub fn new(transport: Arc<dyn PushTransport>, join_timeout: Duration) -> Self {
        let (state, _) = watch::channel(SessionState::Disconnected);
        Self {
            transport,
            join_timeout,
            state: Arc::new(state),
            active: Mutex::new(None),
        }
    }

    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    /// Receiver that observes every state change.
    pub fn watch_state(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Joins the room of `store_id`.
    ///
    /// Calling this again for the store already joined returns the existing
    /// handle without emitting a second join.
    pub async fn connect(&self, store_id: &StoreId) -> Result<SessionHandle, YeapError> {
        let mut active = self.active.lock().await;

        if let Some(current) = active.as_ref().filter(|join| join.handle.is_active()) {
            if current.handle.store_id() == store_id {
                debug!(store_id = %store_id, "already joined, reusing session");
                return Ok(current.handle.clone());
            }
            return Err(YeapError::AlreadyJoined {
                store_id: current.handle.store_id().clone(),
            });
        }

        // A previous join whose transport closed underneath it.
        if let Some(stale) = active.take() {
            stale.pump_cancel.cancel();
            let _ = stale.pump.await;
        }

        self.state.send_replace(SessionState::Joining);
        info!(store_id = %store_id, transport = self.transport.name(), "joining store room");

        if let Err(e) = self.join(store_id).await {
            warn!(store_id = %store_id, error = %e, "store join failed");
            if let Err(close_err) = self.transport.close().await {
                debug!(error = %close_err, "transport close after failed join");
            }
            self.state.send_replace(SessionState::Disconnected);
            return Err(e);
        }

        let registry = Arc::new(Registry::new());
        let handle = SessionHandle {
            store_id: store_id.clone(),
            registry: Arc::clone(&registry),
        };

        self.state.send_replace(SessionState::Joined);

        let pump_cancel = CancellationToken::new();
        let pump = tokio::spawn(pump_frames(
            Arc::clone(&self.transport),
            registry,
            pump_cancel.clone(),
            Arc::clone(&self.state),
            store_id.clone(),
        ));

        *active = Some(ActiveJoin {
            handle: handle.clone(),
            pump_cancel,
            pump,
        });

        info!(store_id = %store_id, "store room joined");
        Ok(handle)
    }

    async fn join(&self, store_id: &StoreId) -> Result<(), YeapError> {
        self.transport.open().await?;

        let ack = tokio::time::timeout(
            self.join_timeout,
            self.transport
                .emit_with_ack(JOIN_EVENT, serde_json::json!(store_id.as_str())),
        )
        .await
        .map_err(|_| YeapError::Timeout {
            duration: self.join_timeout,
        })??;

        let ack: JoinAck = serde_json::from_value(ack).map_err(|source| YeapError::Decode {
            event: JOIN_EVENT.to_string(),
            source,
        })?;

        if ack.success {
            Ok(())
        } else {
            Err(YeapError::JoinRejected {
                store_id: store_id.clone(),
            })
        }
    }

    /// Leaves the room: closes every subscription, stops the pump, then
    /// closes the transport. A handle from an earlier join is a no-op.
    pub async fn disconnect(&self, handle: SessionHandle) -> Result<(), YeapError> {
        let mut active = self.active.lock().await;

        let Some(current) = active.take() else {
            debug!("disconnect on idle session");
            return Ok(());
        };
        if !current.handle.same_join(&handle) {
            debug!(store_id = %handle.store_id(), "ignoring disconnect for a stale handle");
            *active = Some(current);
            return Ok(());
        }

        current.handle.registry.close();
        current.pump_cancel.cancel();
        let _ = current.pump.await;

        let closed = self.transport.close().await;
        self.state.send_replace(SessionState::Disconnected);
        info!(store_id = %handle.store_id(), "store room left");
        closed
    }
}

async fn pump_frames(
    transport: Arc<dyn PushTransport>,
    registry: Arc<Registry>,
    cancel: CancellationToken,
    state: Arc<watch::Sender<SessionState>>,
    store_id: StoreId,
) {
    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => return,
            next = transport.next_frame() => next,
        };

        match next {
            Ok(Some(frame)) => {
                let delivered = registry.dispatch(&frame);
                trace!(store_id = %store_id, event = %frame.event, delivered, "push dispatched");
            }
            Ok(None) => {
                info!(store_id = %store_id, "transport closed by remote");
                break;
            }
            Err(e) => {
                warn!(store_id = %store_id, error = %e, "transport read failed");
                break;
            }
        }
    }

    registry.close();
    state.send_replace(SessionState::Disconnected);
}
