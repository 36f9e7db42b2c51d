// SPDX-FileCopyrightText: 2026 Yeap Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Status transitions and the tasks that carry them out.
//!
//! A transition runs in three steps, each reported back to the desk as an
//! event: the fade-out delay ([`schedule_apply`]), the local status change
//! (done by the desk on [`DeskEvent::TransitionDue`]), and the server update
//! ([`spawn_status_update`], reported as [`DeskEvent::TransitionSettled`]).

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;
use yeap_core::{OrderId, OrdersApi, OrderStatus, YeapError};

use crate::desk::DeskEvent;

/// Who asked for a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionOrigin {
    /// A button press on the dashboard.
    Operator,
    /// The countdown ran out and the order status is re-asserted.
    CountdownExpiry,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusTransition {
    pub order_id: OrderId,
    pub from: OrderStatus,
    pub to: OrderStatus,
    pub origin: TransitionOrigin,
}

impl StatusTransition {
    pub fn operator(order_id: OrderId, from: OrderStatus, to: OrderStatus) -> Self {
        Self {
            order_id,
            from,
            to,
            origin: TransitionOrigin::Operator,
        }
    }

    /// Re-assertion of DELIVERING sent when a countdown expires.
    pub fn expiry(order_id: OrderId) -> Self {
        Self {
            order_id,
            from: OrderStatus::Delivering,
            to: OrderStatus::Delivering,
            origin: TransitionOrigin::CountdownExpiry,
        }
    }

    /// Checks the move against the order lifecycle.
    pub fn validate(&self) -> Result<(), YeapError> {
        if self.from.can_transition_to(self.to) {
            Ok(())
        } else {
            Err(YeapError::InvalidTransition {
                order_id: self.order_id.clone(),
                from: self.from,
                to: self.to,
            })
        }
    }

    /// Delivering back to in-progress, the only move gated by the countdown.
    pub fn is_back_to_production(&self) -> bool {
        self.from == OrderStatus::Delivering && self.to == OrderStatus::InProgress
    }
}

/// Sends [`DeskEvent::TransitionDue`] once `delay` has elapsed.
pub fn schedule_apply(
    transition: StatusTransition,
    delay: Duration,
    sink: mpsc::UnboundedSender<DeskEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        let _ = sink.send(DeskEvent::TransitionDue(transition));
    })
}

/// Sends the status update to the server and reports the outcome.
pub fn spawn_status_update(
    api: Arc<dyn OrdersApi>,
    transition: StatusTransition,
    sink: mpsc::UnboundedSender<DeskEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        debug!(
            order_id = %transition.order_id,
            status = %transition.to,
            origin = ?transition.origin,
            "sending status update"
        );
        let result = api.update_status(&transition.order_id, transition.to).await;
        let _ = sink.send(DeskEvent::TransitionSettled { transition, result });
    })
}
