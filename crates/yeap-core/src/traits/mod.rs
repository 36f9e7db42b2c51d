// SPDX-FileCopyrightText: 2026 Yeap Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator traits the realtime core depends on.
//!
//! Every trait uses `#[async_trait]` so implementations can be held as
//! `Arc<dyn Trait>` and swapped for mocks in tests.

pub mod chat;
pub mod orders;
pub mod transport;

pub use chat::ChatApi;
pub use orders::OrdersApi;
pub use transport::PushTransport;
