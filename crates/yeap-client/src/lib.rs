// SPDX-FileCopyrightText: 2026 Yeap Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Concrete collaborators for the Yeap realtime core.
//!
//! - [`WsTransport`] - WebSocket [`PushTransport`](yeap_core::PushTransport) speaking JSON envelopes
//! - [`RestClient`] - [`OrdersApi`](yeap_core::OrdersApi) and [`ChatApi`](yeap_core::ChatApi) over HTTP

pub mod protocol;
pub mod rest;
pub mod ws;

pub use rest::RestClient;
pub use ws::WsTransport;
