// SPDX-FileCopyrightText: 2026 Yeap Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! REST collaborator for chat unread state.

use async_trait::async_trait;

use crate::error::YeapError;
use crate::types::{StoreId, ThreadId};

/// Chat endpoints consumed by the realtime core.
#[async_trait]
pub trait ChatApi: Send + Sync + 'static {
    /// Returns every thread of `store` that currently has unread activity.
    async fn unread_threads(&self, store: &StoreId) -> Result<Vec<ThreadId>, YeapError>;
}
