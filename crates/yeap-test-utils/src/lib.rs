// SPDX-FileCopyrightText: 2026 Yeap Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Yeap integration tests.
//!
//! Provides mock collaborators and a test harness for fast, deterministic
//! tests without a realtime server or REST backend.
//!
//! # Components
//!
//! - [`MockTransport`] - Mock push transport with injectable pushes and captured emits
//! - [`MockOrdersApi`] / [`MockChatApi`] - Mock REST services with failure injection
//! - [`TestHarness`] - A live desk joined to a store over the mocks

pub mod harness;
pub mod mock_api;
pub mod mock_transport;

pub use harness::{TestHarness, TestHarnessBuilder};
pub use mock_api::{MockChatApi, MockOrdersApi};
pub use mock_transport::{AckBehavior, MockTransport};

use chrono::{TimeZone, Utc};
use yeap_core::types::Address;
use yeap_core::{Order, OrderId, OrderStatus};

/// A fixed, fully populated order for tests.
pub fn sample_order(id: &str, status: OrderStatus) -> Order {
    Order {
        id: OrderId::from(id),
        order_number: 42,
        user_name: "Ana Souza".to_string(),
        user_address: Address {
            street: Some("Rua das Flores".to_string()),
            number: Some("120".to_string()),
            city: Some("Recife".to_string()),
            ..Address::default()
        },
        total_price: 57.9,
        status,
        created_at: Utc
            .with_ymd_and_hms(2026, 3, 1, 12, 0, 0)
            .single()
            .unwrap_or_else(Utc::now),
    }
}
