// SPDX-FileCopyrightText: 2026 Yeap Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end integration testing.
//!
//! `TestHarness` assembles a live desk over the mock transport and mock REST
//! APIs, joined to a store. Tests inject pushes and operator input, call
//! [`settle`](TestHarness::settle), and assert on notices, recorded API calls,
//! or the desk state returned by [`shutdown`](TestHarness::shutdown).

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use yeap_config::model::OrdersConfig;
use yeap_core::{Order, StoreContext, StoreId, StoreProfile, ThreadId, YeapError};
use yeap_realtime::{
    ChannelSession, DeskEvent, DeskNotice, DeskSettings, IntakeSignal, LiveDesk, OperatorAction,
    SessionState, StoreDesk,
};

use crate::mock_api::{MockChatApi, MockOrdersApi};
use crate::mock_transport::{AckBehavior, MockTransport};

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    store_id: StoreId,
    ack: AckBehavior,
    join_timeout: Duration,
    orders: OrdersConfig,
    pending: Vec<Order>,
    unread: Vec<ThreadId>,
    fail_snapshots: bool,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            store_id: StoreId::from("S1"),
            ack: AckBehavior::Accept,
            join_timeout: Duration::from_secs(10),
            orders: OrdersConfig::default(),
            pending: Vec::new(),
            unread: Vec::new(),
            fail_snapshots: false,
        }
    }

    pub fn with_store(mut self, store_id: &str) -> Self {
        self.store_id = StoreId::from(store_id);
        self
    }

    /// Set how the mock server answers the join.
    pub fn with_join_ack(mut self, ack: AckBehavior) -> Self {
        self.ack = ack;
        self
    }

    pub fn with_orders_config(mut self, orders: OrdersConfig) -> Self {
        self.orders = orders;
        self
    }

    /// Orders returned by the pending-orders snapshot.
    pub fn with_pending(mut self, orders: Vec<Order>) -> Self {
        self.pending = orders;
        self
    }

    /// Threads returned by the unread snapshot.
    pub fn with_unread(mut self, threads: &[&str]) -> Self {
        self.unread = threads.iter().map(|t| ThreadId::from(*t)).collect();
        self
    }

    /// Make both startup snapshots fail.
    pub fn with_failing_snapshots(mut self) -> Self {
        self.fail_snapshots = true;
        self
    }

    /// Join the store and start the desk.
    pub async fn build(self) -> Result<TestHarness, YeapError> {
        let transport = Arc::new(MockTransport::new());
        transport.set_ack(self.ack);

        let orders = Arc::new(MockOrdersApi::new());
        orders.set_pending(self.pending);
        orders.fail_listing(self.fail_snapshots);
        let chat = Arc::new(MockChatApi::new());
        chat.set_unread(self.unread);
        chat.fail_unread(self.fail_snapshots);

        let session = Arc::new(ChannelSession::new(transport.clone(), self.join_timeout));
        let context = Arc::new(StoreContext::new(StoreProfile {
            id: self.store_id,
            name: "Test Store".to_string(),
            opening_hours: None,
        }));
        let desk = StoreDesk::new(
            context,
            orders.clone(),
            chat.clone(),
            DeskSettings::from(&self.orders),
        );
        let notices = desk.subscribe_notices();
        let intake = desk.subscribe_intake();

        let live = LiveDesk::start(session.clone(), desk).await?;

        Ok(TestHarness {
            transport,
            orders,
            chat,
            session,
            live,
            notices,
            intake,
        })
    }
}

/// A desk joined to a store over mocks.
pub struct TestHarness {
    pub transport: Arc<MockTransport>,
    pub orders: Arc<MockOrdersApi>,
    pub chat: Arc<MockChatApi>,
    pub session: Arc<ChannelSession>,
    live: LiveDesk,
    notices: broadcast::Receiver<DeskNotice>,
    intake: broadcast::Receiver<IntakeSignal>,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// A harness with defaults, joined to store `S1`.
    pub async fn new() -> Result<Self, YeapError> {
        Self::builder().build().await
    }

    pub fn session_state(&self) -> SessionState {
        self.session.state()
    }

    pub fn push_order(&self, order: &Order) {
        self.transport.push_order(order);
    }

    pub fn push_unread(&self, thread_id: &str) {
        self.transport.push_unread(thread_id);
    }

    pub fn operator(&self, action: OperatorAction) -> Result<(), YeapError> {
        self.live.send(DeskEvent::Operator(action))
    }

    pub fn navigate(&self, path: &str) -> Result<(), YeapError> {
        self.live.send(DeskEvent::Navigate(path.to_string()))
    }

    /// Lets every queued push, timer and API call run to completion.
    ///
    /// Under a paused clock this returns only once all tasks are idle.
    pub async fn settle(&self) {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    /// Advances the clock by `by`, then settles.
    pub async fn advance(&self, by: Duration) {
        tokio::time::sleep(by).await;
        self.settle().await;
    }

    /// Notices emitted since the last call.
    pub fn take_notices(&mut self) -> Vec<DeskNotice> {
        let mut out = Vec::new();
        while let Ok(notice) = self.notices.try_recv() {
            out.push(notice);
        }
        out
    }

    /// Intake signals (chime triggers) emitted since the last call.
    pub fn take_intake_signals(&mut self) -> Vec<IntakeSignal> {
        let mut out = Vec::new();
        while let Ok(signal) = self.intake.try_recv() {
            out.push(signal);
        }
        out
    }

    /// Stops everything and returns the desk's final state.
    pub async fn shutdown(self) -> Result<StoreDesk, YeapError> {
        self.live.shutdown().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample_order;
    use yeap_core::OrderStatus;

    #[tokio::test(start_paused = true)]
    async fn harness_joins_and_fetches_snapshots() {
        let harness = TestHarness::builder()
            .with_pending(vec![sample_order("O1", OrderStatus::Pending)])
            .with_unread(&["T1"])
            .build()
            .await
            .unwrap();
        harness.settle().await;

        assert_eq!(harness.session_state(), SessionState::Joined);
        assert_eq!(harness.orders.list_calls(), 1);
        assert_eq!(harness.chat.calls(), 1);

        let desk = harness.shutdown().await.unwrap();
        assert_eq!(desk.intake().len(), 1);
        assert_eq!(desk.unread().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn rejected_join_fails_build() {
        let result = TestHarness::builder()
            .with_join_ack(AckBehavior::Reject)
            .build()
            .await;
        assert!(matches!(result, Err(YeapError::JoinRejected { .. })));
    }
}
