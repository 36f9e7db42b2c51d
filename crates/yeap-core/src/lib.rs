// SPDX-FileCopyrightText: 2026 Yeap Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Yeap store dashboard.
//!
//! Provides the order/chat domain types, the shared [`YeapError`] type, the
//! per-login [`StoreContext`], and the collaborator traits the realtime core
//! is written against.

pub mod error;
pub mod store;
pub mod traits;
pub mod types;

pub use error::YeapError;
pub use store::{OpeningHours, StoreContext, StoreProfile};
pub use traits::{ChatApi, OrdersApi, PushTransport};
pub use types::{JoinAck, Order, OrderId, OrderPage, OrderStatus, PushFrame, StoreId, ThreadId};
