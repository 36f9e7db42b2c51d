// SPDX-FileCopyrightText: 2026 Yeap Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The store desk: single owner of all dashboard state.
//!
//! Pushes, REST snapshots, countdown ticks, fade timers, API settlements and
//! operator input all arrive as [`DeskEvent`]s on one queue and are handled
//! one at a time, so the intake buffer, the unread set and the per-order
//! countdowns are never touched concurrently. Everything the UI should show
//! goes out as a [`DeskNotice`] on a broadcast channel.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};
use yeap_config::model::OrdersConfig;
use yeap_core::{
    ChatApi, Order, OrderId, OrderStatus, OrdersApi, StoreContext, ThreadId, YeapError,
};

use crate::countdown::{Countdown, CountdownTimer, TickOutcome};
use crate::intake::{IntakeSignal, OrderIntake};
use crate::router::PushEvent;
use crate::transition::{
    StatusTransition, TransitionOrigin, schedule_apply, spawn_status_update,
};
use crate::unread::{NavContext, UnreadThreads};

/// Inputs to the desk.
#[derive(Debug)]
pub enum DeskEvent {
    /// A decoded server push.
    Push(PushEvent),
    /// Result of the pending-orders snapshot.
    OrdersSnapshot(Result<Vec<Order>, YeapError>),
    /// Result of the unread-threads snapshot.
    UnreadSnapshot(Result<Vec<ThreadId>, YeapError>),
    /// One period of an armed countdown elapsed.
    CountdownTick { order_id: OrderId, generation: u64 },
    /// A button press on the dashboard.
    Operator(OperatorAction),
    /// The fade-out delay of a transition elapsed.
    TransitionDue(StatusTransition),
    /// The server answered a status update.
    TransitionSettled {
        transition: StatusTransition,
        result: Result<(), YeapError>,
    },
    /// The operator moved to another view.
    Navigate(String),
    /// The operator opened a chat thread.
    ThreadOpened(ThreadId),
}

/// Operator input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperatorAction {
    ChangeStatus {
        order_id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
    },
    /// Acknowledge a new order and drop it from the intake buffer.
    Dismiss(OrderId),
}

impl OperatorAction {
    pub fn accept(order_id: OrderId) -> Self {
        Self::ChangeStatus {
            order_id,
            from: OrderStatus::Pending,
            to: OrderStatus::InProgress,
        }
    }

    pub fn ship(order_id: OrderId) -> Self {
        Self::ChangeStatus {
            order_id,
            from: OrderStatus::InProgress,
            to: OrderStatus::Delivering,
        }
    }

    /// Mark delivered. Allowed from in-progress or delivering.
    pub fn finish(order_id: OrderId, from: OrderStatus) -> Self {
        Self::ChangeStatus {
            order_id,
            from,
            to: OrderStatus::Delivered,
        }
    }

    pub fn back_to_production(order_id: OrderId) -> Self {
        Self::ChangeStatus {
            order_id,
            from: OrderStatus::Delivering,
            to: OrderStatus::InProgress,
        }
    }
}

/// Outputs of the desk, for whatever renders the dashboard.
#[derive(Debug, Clone, PartialEq)]
pub enum DeskNotice {
    /// Show the "new message" prompt. `None` when raised by the unread snapshot.
    NewMessagePrompt { thread_id: Option<ThreadId> },
    /// Transient user-visible message.
    Banner(String),
    FadeOut(OrderId),
    FadeIn(OrderId),
    /// Remaining ticks of an armed countdown, sent on arm and on every tick.
    CountdownChanged { order_id: OrderId, remaining: u32 },
    /// The countdown reached zero and the order left the intake buffer.
    OrderExpired(OrderId),
    /// The server refused a transition; the order is back at `status`.
    TransitionRolledBack { order_id: OrderId, status: OrderStatus },
}

/// Timing knobs of the desk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeskSettings {
    pub countdown_ticks: u32,
    pub tick: Duration,
    pub fade_delay: Duration,
    pub snapshot_page_size: u32,
}

impl Default for DeskSettings {
    fn default() -> Self {
        Self::from(&OrdersConfig::default())
    }
}

impl From<&OrdersConfig> for DeskSettings {
    fn from(config: &OrdersConfig) -> Self {
        Self {
            countdown_ticks: config.countdown_secs,
            tick: config.tick(),
            fade_delay: config.fade_delay(),
            snapshot_page_size: config.snapshot_page_size,
        }
    }
}

struct ArmedCountdown {
    countdown: Countdown,
    timer: CountdownTimer,
}

/// Single-owner state of one store's dashboard.
pub struct StoreDesk {
    context: Arc<StoreContext>,
    orders_api: Arc<dyn OrdersApi>,
    chat_api: Arc<dyn ChatApi>,
    settings: DeskSettings,
    intake: OrderIntake,
    unread: UnreadThreads,
    nav: NavContext,
    countdowns: HashMap<OrderId, ArmedCountdown>,
    next_generation: u64,
    in_flight: HashSet<OrderId>,
    events_tx: mpsc::UnboundedSender<DeskEvent>,
    events_rx: mpsc::UnboundedReceiver<DeskEvent>,
    notices: broadcast::Sender<DeskNotice>,
}

impl StoreDesk {
    pub fn new(
        context: Arc<StoreContext>,
        orders_api: Arc<dyn OrdersApi>,
        chat_api: Arc<dyn ChatApi>,
        settings: DeskSettings,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (notices, _) = broadcast::channel(256);
        Self {
            context,
            orders_api,
            chat_api,
            settings,
            intake: OrderIntake::new(),
            unread: UnreadThreads::new(),
            nav: NavContext::default(),
            countdowns: HashMap::new(),
            next_generation: 0,
            in_flight: HashSet::new(),
            events_tx,
            events_rx,
            notices,
        }
    }

    /// Sender for feeding events into the desk.
    pub fn sender(&self) -> mpsc::UnboundedSender<DeskEvent> {
        self.events_tx.clone()
    }

    pub fn subscribe_notices(&self) -> broadcast::Receiver<DeskNotice> {
        self.notices.subscribe()
    }

    pub(crate) fn notice_sender(&self) -> broadcast::Sender<DeskNotice> {
        self.notices.clone()
    }

    /// Emptiness transitions of the intake buffer, for the new-order chime.
    pub fn subscribe_intake(&self) -> broadcast::Receiver<IntakeSignal> {
        self.intake.subscribe()
    }

    pub fn context(&self) -> &StoreContext {
        &self.context
    }

    pub fn intake(&self) -> &OrderIntake {
        &self.intake
    }

    pub fn unread(&self) -> &UnreadThreads {
        &self.unread
    }

    pub fn nav(&self) -> &NavContext {
        &self.nav
    }

    /// The armed countdown of `order_id`, if any.
    pub fn countdown(&self, order_id: &OrderId) -> Option<&Countdown> {
        self.countdowns.get(order_id).map(|armed| &armed.countdown)
    }

    pub fn armed_count(&self) -> usize {
        self.countdowns.len()
    }

    pub fn is_in_flight(&self, order_id: &OrderId) -> bool {
        self.in_flight.contains(order_id)
    }

    /// Fetches both REST snapshots in the background. Their results arrive
    /// as events, so pushes are processed while the fetches are outstanding.
    pub fn start(&self) {
        let store_id = self.context.store_id().clone();
        info!(store_id = %store_id, "fetching pending orders and unread threads");

        let api = Arc::clone(&self.orders_api);
        let sink = self.events_tx.clone();
        let page_size = self.settings.snapshot_page_size;
        let store = store_id.clone();
        tokio::spawn(async move {
            let result = api
                .list_by_status(&store, OrderStatus::Pending, 1, page_size)
                .await
                .map(|page| page.orders);
            let _ = sink.send(DeskEvent::OrdersSnapshot(result));
        });

        let chat = Arc::clone(&self.chat_api);
        let sink = self.events_tx.clone();
        tokio::spawn(async move {
            let result = chat.unread_threads(&store_id).await;
            let _ = sink.send(DeskEvent::UnreadSnapshot(result));
        });
    }

    /// Handles one event. Rejected operator actions come back as errors;
    /// everything else is recovered here.
    pub fn handle(&mut self, event: DeskEvent) -> Result<(), YeapError> {
        match event {
            DeskEvent::Push(PushEvent::OrderReceived(order)) => self.on_order_received(order),
            DeskEvent::Push(PushEvent::UnreadMessage(thread)) => self.on_unread_message(thread),
            DeskEvent::OrdersSnapshot(result) => self.on_orders_snapshot(result),
            DeskEvent::UnreadSnapshot(result) => self.on_unread_snapshot(result),
            DeskEvent::CountdownTick {
                order_id,
                generation,
            } => self.on_tick(order_id, generation),
            DeskEvent::Operator(action) => return self.on_operator(action),
            DeskEvent::TransitionDue(transition) => self.on_transition_due(transition),
            DeskEvent::TransitionSettled { transition, result } => {
                self.on_transition_settled(transition, result)
            }
            DeskEvent::Navigate(path) => {
                debug!(path = %path, "operator navigated");
                self.nav.navigate(path);
            }
            DeskEvent::ThreadOpened(thread) => {
                if self.unread.clear(&thread) {
                    debug!(thread_id = %thread, "thread read");
                }
            }
        }
        Ok(())
    }

    /// Handles every event already queued, without waiting for more.
    pub fn drain_queued(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(event) = self.events_rx.try_recv() {
            self.handle_logged(event);
            handled += 1;
        }
        handled
    }

    /// Processes events until `cancel` fires, then tears down every
    /// countdown and hands the desk back.
    pub async fn run(mut self, cancel: CancellationToken) -> Self {
        info!(store_id = %self.context.store_id(), "desk running");
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                Some(event) = self.events_rx.recv() => self.handle_logged(event),
            }
        }
        self.teardown();
        self
    }

    /// Cancels every countdown. Orders stay in the buffer.
    pub fn teardown(&mut self) {
        let armed = self.countdowns.len();
        for (_, entry) in self.countdowns.drain() {
            entry.timer.cancel();
        }
        info!(store_id = %self.context.store_id(), armed, "desk torn down");
    }

    fn handle_logged(&mut self, event: DeskEvent) {
        if let Err(e) = self.handle(event) {
            warn!(store_id = %self.context.store_id(), error = %e, "operator action rejected");
            self.notify(DeskNotice::Banner(e.to_string()));
        }
    }

    fn notify(&self, notice: DeskNotice) {
        trace!(?notice, "desk notice");
        let _ = self.notices.send(notice);
    }

    fn on_order_received(&mut self, order: Order) {
        let order_id = order.id.clone();
        let status = order.status;
        let number = order.display_number();
        debug!(order_id = %order_id, customer = %order.user_name, address = %order.user_address, "order details");
        let admission = self.intake.append(order);
        info!(
            store_id = %self.context.store_id(),
            order_id = %order_id,
            %number,
            %status,
            ?admission,
            buffered = self.intake.len(),
            "order received"
        );

        if status != OrderStatus::Delivering {
            self.disarm(&order_id);
        }
        self.arm_if_due(&order_id);
    }

    fn on_unread_message(&mut self, thread: ThreadId) {
        let fresh = self.unread.mark(thread.clone());
        debug!(thread_id = %thread, fresh, unread = self.unread.len(), "unread message");

        if self.nav.targets_chat() {
            debug!(thread_id = %thread, "operator is in chat, prompt suppressed");
            return;
        }
        self.notify(DeskNotice::NewMessagePrompt {
            thread_id: Some(thread),
        });
    }

    fn on_orders_snapshot(&mut self, result: Result<Vec<Order>, YeapError>) {
        match result {
            Ok(orders) => {
                let fetched = orders.len();
                let inserted = self.intake.merge_snapshot(orders);
                info!(
                    store_id = %self.context.store_id(),
                    fetched,
                    inserted = inserted.len(),
                    "pending orders merged"
                );
                for order_id in &inserted {
                    self.arm_if_due(order_id);
                }
            }
            Err(e) => {
                warn!(store_id = %self.context.store_id(), error = %e, "pending orders snapshot failed");
                self.notify(DeskNotice::Banner("Failed to load pending orders".to_string()));
            }
        }
    }

    fn on_unread_snapshot(&mut self, result: Result<Vec<ThreadId>, YeapError>) {
        match result {
            Ok(threads) => {
                let had_unread = !threads.is_empty();
                let added = self.unread.merge_snapshot(threads);
                info!(store_id = %self.context.store_id(), added, unread = self.unread.len(), "unread threads merged");
                if had_unread && !self.nav.targets_chat() {
                    self.notify(DeskNotice::NewMessagePrompt { thread_id: None });
                }
            }
            Err(e) => {
                warn!(store_id = %self.context.store_id(), error = %e, "unread threads snapshot failed");
            }
        }
    }

    /// Arms a countdown for a buffered DELIVERING order that has none.
    ///
    /// Orders with a transition in flight are left alone; the transition
    /// decides their countdown once it applies.
    fn arm_if_due(&mut self, order_id: &OrderId) {
        if self.in_flight.contains(order_id) {
            trace!(order_id = %order_id, "transition in flight, not arming");
            return;
        }
        self.arm_delivering(order_id);
    }

    fn arm_delivering(&mut self, order_id: &OrderId) {
        if self.countdowns.contains_key(order_id) {
            return;
        }
        let Some(order) = self.intake.get(order_id) else {
            return;
        };
        if !Countdown::should_arm(order) {
            return;
        }

        let mut countdown = Countdown::new(self.settings.countdown_ticks);
        countdown.arm();
        self.next_generation += 1;
        let timer = CountdownTimer::spawn(
            order_id.clone(),
            self.next_generation,
            self.settings.tick,
            self.events_tx.clone(),
        );
        info!(
            order_id = %order_id,
            generation = self.next_generation,
            remaining = countdown.remaining(),
            "countdown armed"
        );
        let remaining = countdown.remaining();
        self.countdowns
            .insert(order_id.clone(), ArmedCountdown { countdown, timer });
        self.notify(DeskNotice::CountdownChanged {
            order_id: order_id.clone(),
            remaining,
        });
    }

    fn disarm(&mut self, order_id: &OrderId) -> bool {
        let Some(mut entry) = self.countdowns.remove(order_id) else {
            return false;
        };
        entry.countdown.cancel();
        entry.timer.cancel();
        debug!(order_id = %order_id, remaining = entry.countdown.remaining(), "countdown cancelled");
        true
    }

    fn on_tick(&mut self, order_id: OrderId, generation: u64) {
        let Some(entry) = self.countdowns.get_mut(&order_id) else {
            trace!(order_id = %order_id, generation, "tick for disarmed order");
            return;
        };
        if entry.timer.generation() != generation {
            trace!(order_id = %order_id, generation, "stale countdown tick");
            return;
        }

        match entry.countdown.tick() {
            TickOutcome::Idle => {}
            TickOutcome::Running { remaining } => {
                self.notify(DeskNotice::CountdownChanged { order_id, remaining });
            }
            TickOutcome::Expired => {
                if let Some(entry) = self.countdowns.remove(&order_id) {
                    entry.timer.cancel();
                }
                self.expire(order_id);
            }
        }
    }

    fn expire(&mut self, order_id: OrderId) {
        self.intake.remove(&order_id);
        info!(
            store_id = %self.context.store_id(),
            order_id = %order_id,
            "countdown expired, re-asserting DELIVERING"
        );
        self.notify(DeskNotice::CountdownChanged {
            order_id: order_id.clone(),
            remaining: 0,
        });
        self.notify(DeskNotice::OrderExpired(order_id.clone()));
        spawn_status_update(
            Arc::clone(&self.orders_api),
            StatusTransition::expiry(order_id),
            self.events_tx.clone(),
        );
    }

    fn on_operator(&mut self, action: OperatorAction) -> Result<(), YeapError> {
        match action {
            OperatorAction::ChangeStatus { order_id, from, to } => {
                self.begin_transition(StatusTransition::operator(order_id, from, to))
            }
            OperatorAction::Dismiss(order_id) => {
                self.disarm(&order_id);
                match self.intake.remove(&order_id) {
                    Some(_) => info!(order_id = %order_id, "order dismissed"),
                    None => debug!(order_id = %order_id, "dismiss for order not in buffer"),
                }
                Ok(())
            }
        }
    }

    fn begin_transition(&mut self, transition: StatusTransition) -> Result<(), YeapError> {
        transition.validate()?;
        let order_id = transition.order_id.clone();

        if self.in_flight.contains(&order_id) {
            return Err(YeapError::TransitionInFlight { order_id });
        }
        if let Some(current) = self
            .intake
            .get(&order_id)
            .map(|order| order.status)
            .filter(|status| *status != transition.from)
        {
            return Err(YeapError::InvalidTransition {
                order_id,
                from: current,
                to: transition.to,
            });
        }
        if transition.is_back_to_production()
            && !self.countdown(&order_id).is_some_and(Countdown::is_armed)
        {
            return Err(YeapError::InvalidTransition {
                order_id,
                from: transition.from,
                to: transition.to,
            });
        }

        if self.disarm(&order_id) {
            info!(order_id = %order_id, to = %transition.to, "countdown cancelled by operator");
        }

        info!(
            order_id = %order_id,
            from = %transition.from,
            to = %transition.to,
            "status transition started"
        );
        self.in_flight.insert(order_id.clone());
        self.notify(DeskNotice::FadeOut(order_id));
        schedule_apply(transition, self.settings.fade_delay, self.events_tx.clone());
        Ok(())
    }

    fn on_transition_due(&mut self, transition: StatusTransition) {
        let order_id = transition.order_id.clone();
        self.intake.set_status(&order_id, transition.to);
        self.notify(DeskNotice::FadeIn(order_id.clone()));
        if transition.to == OrderStatus::Delivering {
            self.arm_delivering(&order_id);
        } else if self.disarm(&order_id) {
            debug!(order_id = %order_id, to = %transition.to, "countdown armed during fade cancelled");
        }
        spawn_status_update(
            Arc::clone(&self.orders_api),
            transition,
            self.events_tx.clone(),
        );
    }

    fn on_transition_settled(
        &mut self,
        transition: StatusTransition,
        result: Result<(), YeapError>,
    ) {
        let order_id = transition.order_id.clone();

        if transition.origin == TransitionOrigin::CountdownExpiry {
            match result {
                Ok(()) => debug!(order_id = %order_id, "expiry status confirmed"),
                Err(e) => warn!(order_id = %order_id, error = %e, "expiry status update failed"),
            }
            return;
        }

        self.in_flight.remove(&order_id);
        match result {
            Ok(()) => info!(order_id = %order_id, status = %transition.to, "status updated"),
            Err(e) => {
                warn!(
                    order_id = %order_id,
                    from = %transition.from,
                    to = %transition.to,
                    error = %e,
                    "status update failed, rolling back"
                );
                if self
                    .intake
                    .get(&order_id)
                    .is_some_and(|order| order.status == transition.to)
                {
                    self.intake.set_status(&order_id, transition.from);
                }
                if transition.to == OrderStatus::Delivering {
                    self.disarm(&order_id);
                }
                self.notify(DeskNotice::TransitionRolledBack {
                    order_id: order_id.clone(),
                    status: transition.from,
                });
                self.notify(DeskNotice::Banner(format!(
                    "Failed to update order {order_id}"
                )));
            }
        }
    }
}
