// SPDX-FileCopyrightText: 2026 Yeap Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types exchanged between the realtime core and its collaborators.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

string_id!(
    /// Server-assigned order identifier.
    OrderId
);
string_id!(
    /// Identifier of the store whose room the dashboard joins.
    StoreId
);
string_id!(
    /// Opaque chat thread identifier, scoped to a store.
    ThreadId
);

/// Lifecycle status of an order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
    InProgress,
    Delivering,
    Delivered,
}

impl OrderStatus {
    /// Whether an operator may move an order from `self` to `to`.
    ///
    /// Delivered is terminal. Delivering -> InProgress is the "back to
    /// production" move; the desk additionally gates it on an armed countdown.
    pub fn can_transition_to(self, to: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, to),
            (Pending, InProgress)
                | (InProgress, Delivering)
                | (Delivering, Delivered)
                | (InProgress, Delivered)
                | (Delivering, InProgress)
        )
    }
}

/// Delivery address attached to an order. Every field is optional on the wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Address {
    pub street: Option<String>,
    pub number: Option<String>,
    pub neighborhood: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub complement: Option<String>,
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let street = match (&self.street, &self.number) {
            (Some(s), Some(n)) => Some(format!("{s}, {n}")),
            (Some(s), None) => Some(s.clone()),
            _ => None,
        };
        let parts: Vec<String> = [
            street,
            self.neighborhood.clone(),
            self.city.clone(),
            self.state.clone(),
        ]
        .into_iter()
        .flatten()
        .collect();
        f.write_str(&parts.join(" - "))
    }
}

/// An order as pushed by `orderReceived` or returned by the pending-orders listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub order_number: u64,
    pub user_name: String,
    #[serde(default)]
    pub user_address: Address,
    pub total_price: f64,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Display form of the order number, e.g. `#0042`.
    pub fn display_number(&self) -> String {
        format!("#{:04}", self.order_number)
    }
}

/// One page of orders from the paged listing endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderPage {
    pub orders: Vec<Order>,
    #[serde(default)]
    pub total: u64,
}

/// A single server push as delivered by the transport.
#[derive(Debug, Clone, PartialEq)]
pub struct PushFrame {
    /// Event name, e.g. `orderReceived`.
    pub event: String,
    /// Raw JSON payload.
    pub payload: serde_json::Value,
}

impl PushFrame {
    pub fn new(event: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            event: event.into(),
            payload,
        }
    }
}

/// Acknowledgement the server returns for a `joinStore` request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinAck {
    pub success: bool,
}
