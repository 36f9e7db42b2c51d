// SPDX-FileCopyrightText: 2026 Yeap Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! A running desk bound to a joined store room.
//!
//! Startup order: join the room, attach the router, fetch snapshots, run the
//! desk. Shutdown runs in reverse so no push reaches a desk that is gone.

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use yeap_core::{StoreId, YeapError};

use crate::desk::{DeskEvent, DeskNotice, StoreDesk};
use crate::intake::IntakeSignal;
use crate::router::EventRouter;
use crate::session::{ChannelSession, SessionHandle, SessionState};

pub struct LiveDesk {
    session: Arc<ChannelSession>,
    handle: SessionHandle,
    router: EventRouter,
    events: mpsc::UnboundedSender<DeskEvent>,
    notices: broadcast::Sender<DeskNotice>,
    intake: broadcast::Sender<IntakeSignal>,
    cancel: CancellationToken,
    task: JoinHandle<StoreDesk>,
}

impl LiveDesk {
    /// Joins the desk's store and starts processing.
    ///
    /// A join failure is returned as is and nothing is left running.
    pub async fn start(session: Arc<ChannelSession>, desk: StoreDesk) -> Result<Self, YeapError> {
        let store_id = desk.context().store_id().clone();
        let handle = session.connect(&store_id).await?;

        let router = match EventRouter::attach(&handle, desk.sender()) {
            Ok(router) => router,
            Err(e) => {
                if let Err(close_err) = session.disconnect(handle).await {
                    warn!(error = %close_err, "disconnect after failed attach");
                }
                return Err(e);
            }
        };

        desk.start();
        let events = desk.sender();
        let notices = desk.notice_sender();
        let intake = desk.intake().signal_sender();
        let cancel = CancellationToken::new();
        let task = tokio::spawn(desk.run(cancel.clone()));

        info!(store_id = %store_id, "desk live");
        Ok(Self {
            session,
            handle,
            router,
            events,
            notices,
            intake,
            cancel,
            task,
        })
    }

    pub fn store_id(&self) -> &StoreId {
        self.handle.store_id()
    }

    pub fn session_state(&self) -> SessionState {
        self.session.state()
    }

    /// Queues an event (operator input, navigation) for the desk.
    pub fn send(&self, event: DeskEvent) -> Result<(), YeapError> {
        self.events
            .send(event)
            .map_err(|_| YeapError::Internal("desk is no longer running".to_string()))
    }

    pub fn subscribe_notices(&self) -> broadcast::Receiver<DeskNotice> {
        self.notices.subscribe()
    }

    pub fn subscribe_intake(&self) -> broadcast::Receiver<IntakeSignal> {
        self.intake.subscribe()
    }

    /// Detaches the router, leaves the room and stops the desk, handing its
    /// final state back.
    pub async fn shutdown(self) -> Result<StoreDesk, YeapError> {
        let store_id = self.handle.store_id().clone();
        self.router.detach().await;
        let left = self.session.disconnect(self.handle).await;
        self.cancel.cancel();
        let desk = self
            .task
            .await
            .map_err(|e| YeapError::Internal(format!("desk task failed: {e}")))?;
        info!(store_id = %store_id, "desk stopped");
        left.map(|()| desk)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use serde_json::json;
    use yeap_core::{OrderId, StoreContext, StoreProfile};
    use yeap_test_utils::{AckBehavior, MockChatApi, MockOrdersApi, MockTransport};

    use crate::desk::{DeskSettings, OperatorAction};
    use crate::router::ORDER_RECEIVED;

    fn desk(orders: Arc<MockOrdersApi>) -> StoreDesk {
        let context = Arc::new(StoreContext::new(StoreProfile {
            id: StoreId::from("S1"),
            name: "Central".into(),
            opening_hours: None,
        }));
        StoreDesk::new(
            context,
            orders,
            Arc::new(MockChatApi::new()),
            DeskSettings::default(),
        )
    }

    #[tokio::test]
    async fn pushes_reach_the_desk_and_shutdown_returns_state() {
        let transport = Arc::new(MockTransport::new());
        let session = Arc::new(ChannelSession::new(transport.clone(), Duration::from_secs(10)));
        let orders = Arc::new(MockOrdersApi::new());
        let live = LiveDesk::start(session.clone(), desk(orders.clone()))
            .await
            .unwrap();
        let mut chime = live.subscribe_intake();

        transport.push(
            ORDER_RECEIVED,
            json!({
                "id": "O1",
                "orderNumber": 1,
                "userName": "Ana",
                "totalPrice": 9.9,
                "status": "PENDING",
                "createdAt": "2026-03-01T12:00:00Z"
            }),
        );
        chime.recv().await.unwrap();

        live.send(DeskEvent::Operator(OperatorAction::Dismiss(OrderId::from("O1"))))
            .unwrap();
        assert_eq!(chime.recv().await.unwrap(), IntakeSignal::BecameEmpty);

        let desk = live.shutdown().await.unwrap();
        assert!(desk.intake().is_empty());
        assert_eq!(session.state(), SessionState::Disconnected);
        assert_eq!(transport.close_count(), 1);
        assert!(orders.status_calls().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn pushes_sent_right_after_join_are_not_lost() {
        for round in 0..50 {
            let transport = Arc::new(MockTransport::new());
            transport.push(
                ORDER_RECEIVED,
                json!({
                    "id": format!("O{round}"),
                    "orderNumber": round,
                    "userName": "Ana",
                    "totalPrice": 12.0,
                    "status": "PENDING",
                    "createdAt": "2026-03-01T12:00:00Z"
                }),
            );
            let session = Arc::new(ChannelSession::new(transport, Duration::from_secs(10)));
            let desk = desk(Arc::new(MockOrdersApi::new()));
            let mut chime = desk.subscribe_intake();

            let live = LiveDesk::start(session, desk).await.unwrap();
            let signal = tokio::time::timeout(Duration::from_secs(5), chime.recv())
                .await
                .unwrap_or_else(|_| panic!("push lost in round {round}"))
                .unwrap();
            assert_eq!(signal, IntakeSignal::BecameNonEmpty { len: 1 });

            let desk = live.shutdown().await.unwrap();
            assert!(desk.intake().contains(&OrderId::from(format!("O{round}"))));
        }
    }

    #[tokio::test]
    async fn join_rejection_is_surfaced() {
        let transport = Arc::new(MockTransport::new());
        transport.set_ack(AckBehavior::Reject);
        let session = Arc::new(ChannelSession::new(transport.clone(), Duration::from_secs(10)));

        let result = LiveDesk::start(session.clone(), desk(Arc::new(MockOrdersApi::new()))).await;

        assert!(matches!(result, Err(YeapError::JoinRejected { .. })));
        assert_eq!(session.state(), SessionState::Disconnected);
    }
}
