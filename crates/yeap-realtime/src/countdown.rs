// SPDX-FileCopyrightText: 2026 Yeap Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-order countdown before an automatic status confirmation.
//!
//! [`Countdown`] is the pure state machine: `Normal -> Armed -> Expired`,
//! with cancellation returning an armed countdown to `Normal`. The remaining
//! time only ever decreases and stops at zero.
//!
//! [`CountdownTimer`] is the clock that drives it. It sends one
//! [`DeskEvent::CountdownTick`] per period into the desk's queue, so every
//! tick is handled in the same execution context as pushes and operator input.
//! Dropping the timer stops it.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::trace;
use yeap_core::{Order, OrderId, OrderStatus};

use crate::desk::DeskEvent;

/// Phase of a countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownPhase {
    /// No countdown running.
    Normal,
    /// Counting down.
    Armed,
    /// Reached zero. Terminal.
    Expired,
}

/// Result of one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The countdown is not armed; nothing happened.
    Idle,
    /// Still counting, with this many ticks left.
    Running { remaining: u32 },
    /// This tick reached zero. Reported exactly once.
    Expired,
}

/// Countdown state machine for one order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Countdown {
    initial: u32,
    remaining: u32,
    phase: CountdownPhase,
}

impl Countdown {
    pub fn new(initial: u32) -> Self {
        Self {
            initial,
            remaining: initial,
            phase: CountdownPhase::Normal,
        }
    }

    /// A buffered order qualifies for a countdown once it has been handed to
    /// the courier. Membership of the intake buffer is what marks it new.
    pub fn should_arm(order: &Order) -> bool {
        order.status == OrderStatus::Delivering
    }

    /// Starts counting from the initial value. Only a `Normal` countdown can be armed.
    pub fn arm(&mut self) -> bool {
        if self.phase != CountdownPhase::Normal {
            return false;
        }
        self.remaining = self.initial;
        self.phase = CountdownPhase::Armed;
        true
    }

    pub fn tick(&mut self) -> TickOutcome {
        if self.phase != CountdownPhase::Armed {
            return TickOutcome::Idle;
        }
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.phase = CountdownPhase::Expired;
            TickOutcome::Expired
        } else {
            TickOutcome::Running {
                remaining: self.remaining,
            }
        }
    }

    /// Cancels an armed countdown. Returns `false` if it was not armed.
    pub fn cancel(&mut self) -> bool {
        if self.phase != CountdownPhase::Armed {
            return false;
        }
        self.phase = CountdownPhase::Normal;
        self.remaining = self.initial;
        true
    }

    pub fn phase(&self) -> CountdownPhase {
        self.phase
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn is_armed(&self) -> bool {
        self.phase == CountdownPhase::Armed
    }
}

/// Periodic tick source for one armed countdown.
///
/// `generation` identifies this arming, so ticks from a timer that was
/// replaced can be told apart from the current one.
pub struct CountdownTimer {
    order_id: OrderId,
    generation: u64,
    cancel: CancellationToken,
    _guard: DropGuard,
}

impl CountdownTimer {
    /// Spawns the tick task. The first tick fires one `period` after spawning.
    pub fn spawn(
        order_id: OrderId,
        generation: u64,
        period: Duration,
        sink: mpsc::UnboundedSender<DeskEvent>,
    ) -> Self {
        let cancel = CancellationToken::new();
        let task_cancel = cancel.clone();
        let task_order = order_id.clone();

        tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    biased;
                    _ = task_cancel.cancelled() => break,
                    _ = interval.tick() => {
                        trace!(order_id = %task_order, generation, "countdown tick");
                        let tick = DeskEvent::CountdownTick {
                            order_id: task_order.clone(),
                            generation,
                        };
                        if sink.send(tick).is_err() {
                            break;
                        }
                    }
                }
            }
        });

        Self {
            order_id,
            generation,
            _guard: cancel.clone().drop_guard(),
            cancel,
        }
    }

    pub fn order_id(&self) -> &OrderId {
        &self.order_id
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Stops the tick task without dropping the handle.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use yeap_core::types::Address;

    fn order(status: OrderStatus) -> Order {
        Order {
            id: OrderId::from("O1"),
            order_number: 7,
            user_name: "Ana".into(),
            user_address: Address::default(),
            total_price: 30.0,
            status,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn arms_only_delivering_orders() {
        assert!(Countdown::should_arm(&order(OrderStatus::Delivering)));
        assert!(!Countdown::should_arm(&order(OrderStatus::InProgress)));
        assert!(!Countdown::should_arm(&order(OrderStatus::Pending)));
    }

    #[test]
    fn thirty_ticks_reach_zero_and_expire_once() {
        let mut countdown = Countdown::new(30);
        assert!(countdown.arm());

        let mut expiries = 0;
        for _ in 0..30 {
            if countdown.tick() == TickOutcome::Expired {
                expiries += 1;
            }
        }
        assert_eq!(countdown.remaining(), 0);
        assert_eq!(expiries, 1);
        assert_eq!(countdown.phase(), CountdownPhase::Expired);

        // Further ticks never go negative or fire again.
        assert_eq!(countdown.tick(), TickOutcome::Idle);
        assert_eq!(countdown.remaining(), 0);
    }

    #[test]
    fn remaining_decreases_monotonically() {
        let mut countdown = Countdown::new(5);
        countdown.arm();
        let mut last = countdown.remaining();
        while let TickOutcome::Running { remaining } = countdown.tick() {
            assert_eq!(remaining, last - 1);
            last = remaining;
        }
        assert_eq!(countdown.remaining(), 0);
    }

    #[test]
    fn cancel_at_tick_ten_prevents_expiry() {
        let mut countdown = Countdown::new(30);
        countdown.arm();
        for _ in 0..10 {
            countdown.tick();
        }
        assert!(countdown.cancel());
        for _ in 0..40 {
            assert_eq!(countdown.tick(), TickOutcome::Idle);
        }
        assert_ne!(countdown.phase(), CountdownPhase::Expired);
    }

    #[test]
    fn expired_countdown_cannot_rearm_or_cancel() {
        let mut countdown = Countdown::new(1);
        countdown.arm();
        assert_eq!(countdown.tick(), TickOutcome::Expired);
        assert!(!countdown.arm());
        assert!(!countdown.cancel());
    }

    #[tokio::test(start_paused = true)]
    async fn timer_ticks_once_per_period_and_stops_on_drop() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let timer = CountdownTimer::spawn(
            OrderId::from("O1"),
            3,
            Duration::from_secs(1),
            tx,
        );

        tokio::time::sleep(Duration::from_millis(3500)).await;
        let mut ticks = 0;
        while let Ok(event) = rx.try_recv() {
            match event {
                DeskEvent::CountdownTick { order_id, generation } => {
                    assert_eq!(order_id.as_str(), "O1");
                    assert_eq!(generation, 3);
                    ticks += 1;
                }
                other => panic!("unexpected event {other:?}"),
            }
        }
        assert_eq!(ticks, 3);

        drop(timer);
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(rx.try_recv().is_err());
    }
}
