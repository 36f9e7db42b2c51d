// SPDX-FileCopyrightText: 2026 Yeap Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! REST collaborator for order listing and status updates.

use async_trait::async_trait;

use crate::error::YeapError;
use crate::types::{OrderId, OrderPage, OrderStatus, StoreId};

/// Order endpoints consumed by the realtime core.
#[async_trait]
pub trait OrdersApi: Send + Sync + 'static {
    /// Lists orders of `store` with `status`, one page at a time (pages start at 1).
    async fn list_by_status(
        &self,
        store: &StoreId,
        status: OrderStatus,
        page: u32,
        page_size: u32,
    ) -> Result<OrderPage, YeapError>;

    /// Requests that `order` be moved to `status`.
    async fn update_status(&self, order: &OrderId, status: OrderStatus) -> Result<(), YeapError>;
}
