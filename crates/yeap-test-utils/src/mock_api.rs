// SPDX-FileCopyrightText: 2026 Yeap Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock REST collaborators with canned data, failure injection and call capture.

use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use yeap_core::{ChatApi, Order, OrderId, OrderPage, OrderStatus, OrdersApi, StoreId, ThreadId, YeapError};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Default)]
struct OrdersState {
    orders: Vec<Order>,
    status_calls: Vec<(OrderId, OrderStatus)>,
    list_calls: usize,
    fail_listing: bool,
    fail_updates: bool,
}

/// A mock order service.
///
/// `list_by_status` pages through the orders given to [`set_pending`](Self::set_pending);
/// `update_status` calls are captured in order.
#[derive(Default)]
pub struct MockOrdersApi {
    state: Mutex<OrdersState>,
}

impl MockOrdersApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Orders the listing endpoint knows about.
    pub fn set_pending(&self, orders: Vec<Order>) {
        lock(&self.state).orders = orders;
    }

    pub fn fail_listing(&self, fail: bool) {
        lock(&self.state).fail_listing = fail;
    }

    pub fn fail_updates(&self, fail: bool) {
        lock(&self.state).fail_updates = fail;
    }

    /// Every `update_status` call, including failed ones.
    pub fn status_calls(&self) -> Vec<(OrderId, OrderStatus)> {
        lock(&self.state).status_calls.clone()
    }

    pub fn list_calls(&self) -> usize {
        lock(&self.state).list_calls
    }
}

#[async_trait]
impl OrdersApi for MockOrdersApi {
    async fn list_by_status(
        &self,
        _store: &StoreId,
        status: OrderStatus,
        page: u32,
        page_size: u32,
    ) -> Result<OrderPage, YeapError> {
        let mut state = lock(&self.state);
        state.list_calls += 1;
        if state.fail_listing {
            return Err(YeapError::api("mock listing failure"));
        }

        let matching: Vec<&Order> = state.orders.iter().filter(|o| o.status == status).collect();
        let skip = page.saturating_sub(1) as usize * page_size as usize;
        Ok(OrderPage {
            total: matching.len() as u64,
            orders: matching
                .into_iter()
                .skip(skip)
                .take(page_size as usize)
                .cloned()
                .collect(),
        })
    }

    async fn update_status(&self, order: &OrderId, status: OrderStatus) -> Result<(), YeapError> {
        let mut state = lock(&self.state);
        state.status_calls.push((order.clone(), status));
        if state.fail_updates {
            return Err(YeapError::api("mock status update failure"));
        }
        Ok(())
    }
}

#[derive(Default)]
struct ChatState {
    unread: Vec<ThreadId>,
    calls: usize,
    fail: bool,
}

/// A mock chat service returning a fixed unread snapshot.
#[derive(Default)]
pub struct MockChatApi {
    state: Mutex<ChatState>,
}

impl MockChatApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_unread(&self, threads: Vec<ThreadId>) {
        lock(&self.state).unread = threads;
    }

    pub fn fail_unread(&self, fail: bool) {
        lock(&self.state).fail = fail;
    }

    pub fn calls(&self) -> usize {
        lock(&self.state).calls
    }
}

#[async_trait]
impl ChatApi for MockChatApi {
    async fn unread_threads(&self, _store: &StoreId) -> Result<Vec<ThreadId>, YeapError> {
        let mut state = lock(&self.state);
        state.calls += 1;
        if state.fail {
            return Err(YeapError::api("mock unread failure"));
        }
        Ok(state.unread.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample_order;

    #[tokio::test]
    async fn listing_filters_and_pages() {
        let api = MockOrdersApi::new();
        api.set_pending(vec![
            sample_order("O1", OrderStatus::Pending),
            sample_order("O2", OrderStatus::Delivering),
            sample_order("O3", OrderStatus::Pending),
            sample_order("O4", OrderStatus::Pending),
        ]);

        let store = StoreId::from("S1");
        let first = api
            .list_by_status(&store, OrderStatus::Pending, 1, 2)
            .await
            .unwrap();
        assert_eq!(first.total, 3);
        let ids: Vec<&str> = first.orders.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, vec!["O1", "O3"]);

        let second = api
            .list_by_status(&store, OrderStatus::Pending, 2, 2)
            .await
            .unwrap();
        assert_eq!(second.orders.len(), 1);
        assert_eq!(api.list_calls(), 2);
    }

    #[tokio::test]
    async fn failed_updates_are_still_recorded() {
        let api = MockOrdersApi::new();
        api.fail_updates(true);
        let result = api
            .update_status(&OrderId::from("O1"), OrderStatus::Delivered)
            .await;
        assert!(result.is_err());
        assert_eq!(
            api.status_calls(),
            vec![(OrderId::from("O1"), OrderStatus::Delivered)]
        );
    }

    #[tokio::test]
    async fn chat_snapshot_and_failure() {
        let api = MockChatApi::new();
        api.set_unread(vec![ThreadId::from("T1")]);
        let store = StoreId::from("S1");
        assert_eq!(api.unread_threads(&store).await.unwrap().len(), 1);

        api.fail_unread(true);
        assert!(api.unread_threads(&store).await.is_err());
        assert_eq!(api.calls(), 2);
    }
}
