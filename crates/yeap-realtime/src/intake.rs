// SPDX-FileCopyrightText: 2026 Yeap Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Order intake buffer: the "new orders" list shown to the operator.
//!
//! The buffer is keyed by [`OrderId`] and never holds two entries for the
//! same order. A push for an order already buffered replaces the stored
//! record in place. Snapshot records never overwrite pushed ones, since a
//! push is always at least as fresh as the snapshot taken at session start.
//!
//! The buffer does not play sounds or touch the UI. It publishes
//! [`IntakeSignal`]s on a broadcast channel and the chime (or anything else)
//! subscribes to them.

use std::collections::HashMap;

use tokio::sync::broadcast;
use tracing::debug;
use yeap_core::{Order, OrderId, OrderStatus};

/// Emptiness transitions published by the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntakeSignal {
    /// The buffer went from zero to `len` orders.
    BecameNonEmpty { len: usize },
    /// The last order left the buffer.
    BecameEmpty,
}

/// What [`OrderIntake::append`] did with an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// A new entry was added.
    Inserted,
    /// An entry with the same id existed and was replaced in place.
    Merged,
}

/// Ordered, de-duplicated buffer of newly arrived orders.
pub struct OrderIntake {
    orders: Vec<Order>,
    index: HashMap<OrderId, usize>,
    signals: broadcast::Sender<IntakeSignal>,
}

impl Default for OrderIntake {
    fn default() -> Self {
        Self::new()
    }
}

impl OrderIntake {
    pub fn new() -> Self {
        let (signals, _) = broadcast::channel(64);
        Self {
            orders: Vec::new(),
            index: HashMap::new(),
            signals,
        }
    }

    /// Subscribe to emptiness transitions.
    pub fn subscribe(&self) -> broadcast::Receiver<IntakeSignal> {
        self.signals.subscribe()
    }

    pub(crate) fn signal_sender(&self) -> broadcast::Sender<IntakeSignal> {
        self.signals.clone()
    }

    /// Adds a pushed order, replacing any buffered record with the same id.
    pub fn append(&mut self, order: Order) -> Admission {
        let was_empty = self.orders.is_empty();

        if let Some(&pos) = self.index.get(&order.id) {
            debug!(order_id = %order.id, "merging duplicate order push");
            self.orders[pos] = order;
            return Admission::Merged;
        }

        self.index.insert(order.id.clone(), self.orders.len());
        self.orders.push(order);
        if was_empty {
            self.emit(IntakeSignal::BecameNonEmpty {
                len: self.orders.len(),
            });
        }
        Admission::Inserted
    }

    /// Merges a REST snapshot, skipping ids already buffered.
    ///
    /// The whole batch produces at most one [`IntakeSignal::BecameNonEmpty`].
    /// Returns the ids that were newly inserted.
    pub fn merge_snapshot(&mut self, orders: Vec<Order>) -> Vec<OrderId> {
        let was_empty = self.orders.is_empty();
        let mut inserted = Vec::new();

        for order in orders {
            if self.index.contains_key(&order.id) {
                continue;
            }
            self.index.insert(order.id.clone(), self.orders.len());
            inserted.push(order.id.clone());
            self.orders.push(order);
        }

        if was_empty && !self.orders.is_empty() {
            self.emit(IntakeSignal::BecameNonEmpty {
                len: self.orders.len(),
            });
        }
        inserted
    }

    /// Removes an order. Removing an id that is not buffered is a no-op.
    pub fn remove(&mut self, id: &OrderId) -> Option<Order> {
        let pos = self.index.remove(id)?;
        let order = self.orders.remove(pos);
        for entry in self.index.values_mut() {
            if *entry > pos {
                *entry -= 1;
            }
        }
        if self.orders.is_empty() {
            self.emit(IntakeSignal::BecameEmpty);
        }
        Some(order)
    }

    /// Overwrites the status of a buffered order, returning the previous status.
    pub fn set_status(&mut self, id: &OrderId, status: OrderStatus) -> Option<OrderStatus> {
        let pos = *self.index.get(id)?;
        let previous = self.orders[pos].status;
        self.orders[pos].status = status;
        Some(previous)
    }

    pub fn get(&self, id: &OrderId) -> Option<&Order> {
        self.index.get(id).map(|&pos| &self.orders[pos])
    }

    pub fn contains(&self, id: &OrderId) -> bool {
        self.index.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    /// Buffered orders in arrival order.
    pub fn iter(&self) -> impl Iterator<Item = &Order> {
        self.orders.iter()
    }

    pub fn ids(&self) -> Vec<OrderId> {
        self.orders.iter().map(|o| o.id.clone()).collect()
    }

    fn emit(&self, signal: IntakeSignal) {
        // No subscribers is fine.
        let _ = self.signals.send(signal);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use proptest::prelude::*;
    use yeap_core::types::Address;

    fn order(id: &str, status: OrderStatus) -> Order {
        Order {
            id: OrderId::from(id),
            order_number: 1,
            user_name: "Ana".into(),
            user_address: Address::default(),
            total_price: 10.0,
            status,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn duplicate_push_merges_in_place() {
        let mut intake = OrderIntake::new();
        assert_eq!(
            intake.append(order("O1", OrderStatus::Pending)),
            Admission::Inserted
        );
        assert_eq!(
            intake.append(order("O2", OrderStatus::Pending)),
            Admission::Inserted
        );
        assert_eq!(
            intake.append(order("O1", OrderStatus::Delivering)),
            Admission::Merged
        );

        assert_eq!(intake.len(), 2);
        assert_eq!(intake.ids(), vec![OrderId::from("O1"), OrderId::from("O2")]);
        assert_eq!(
            intake.get(&OrderId::from("O1")).unwrap().status,
            OrderStatus::Delivering
        );
    }

    #[test]
    fn snapshot_does_not_overwrite_pushed_orders() {
        let mut intake = OrderIntake::new();
        intake.append(order("O1", OrderStatus::Delivering));

        let inserted = intake.merge_snapshot(vec![
            order("O1", OrderStatus::Pending),
            order("O3", OrderStatus::Pending),
        ]);

        assert_eq!(inserted, vec![OrderId::from("O3")]);
        assert_eq!(
            intake.get(&OrderId::from("O1")).unwrap().status,
            OrderStatus::Delivering
        );
        assert_eq!(intake.len(), 2);
    }

    #[test]
    fn signals_only_on_emptiness_transitions() {
        let mut intake = OrderIntake::new();
        let mut rx = intake.subscribe();

        intake.append(order("O1", OrderStatus::Pending));
        intake.append(order("O2", OrderStatus::Pending));
        intake.append(order("O1", OrderStatus::Pending));

        assert_eq!(rx.try_recv().unwrap(), IntakeSignal::BecameNonEmpty { len: 1 });
        assert!(rx.try_recv().is_err());

        intake.remove(&OrderId::from("O1"));
        assert!(rx.try_recv().is_err());
        intake.remove(&OrderId::from("O2"));
        assert_eq!(rx.try_recv().unwrap(), IntakeSignal::BecameEmpty);

        intake.merge_snapshot(vec![
            order("O4", OrderStatus::Pending),
            order("O5", OrderStatus::Pending),
        ]);
        assert_eq!(rx.try_recv().unwrap(), IntakeSignal::BecameNonEmpty { len: 2 });
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn empty_snapshot_emits_nothing() {
        let mut intake = OrderIntake::new();
        let mut rx = intake.subscribe();
        assert!(intake.merge_snapshot(Vec::new()).is_empty());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn remove_unknown_is_noop_and_index_stays_consistent() {
        let mut intake = OrderIntake::new();
        for id in ["O1", "O2", "O3"] {
            intake.append(order(id, OrderStatus::Pending));
        }
        assert!(intake.remove(&OrderId::from("missing")).is_none());
        assert!(intake.remove(&OrderId::from("O1")).is_some());

        assert_eq!(
            intake.set_status(&OrderId::from("O3"), OrderStatus::InProgress),
            Some(OrderStatus::Pending)
        );
        assert_eq!(
            intake.get(&OrderId::from("O3")).unwrap().status,
            OrderStatus::InProgress
        );
        assert_eq!(intake.get(&OrderId::from("O2")).unwrap().id.as_str(), "O2");
    }

    proptest! {
        #[test]
        fn distinct_appends_keep_every_order(n in 0usize..64) {
            let mut intake = OrderIntake::new();
            for i in 0..n {
                intake.append(order(&format!("O{i}"), OrderStatus::Pending));
            }
            prop_assert_eq!(intake.len(), n);
        }

        #[test]
        fn buffer_never_holds_duplicate_ids(ids in proptest::collection::vec(0u8..16, 0..80)) {
            let mut intake = OrderIntake::new();
            for id in &ids {
                intake.append(order(&format!("O{id}"), OrderStatus::Pending));
            }
            let mut seen = intake.ids();
            let len = seen.len();
            seen.sort();
            seen.dedup();
            prop_assert_eq!(seen.len(), len);

            let distinct: std::collections::HashSet<_> = ids.iter().collect();
            prop_assert_eq!(len, distinct.len());
        }
    }
}
