// SPDX-FileCopyrightText: 2026 Yeap Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Unread chat threads and the prompt-suppression rule.

use std::collections::BTreeSet;

use yeap_core::ThreadId;

/// Set of chat threads with unread activity. Insertion is idempotent.
#[derive(Debug, Default, Clone)]
pub struct UnreadThreads {
    threads: BTreeSet<ThreadId>,
}

impl UnreadThreads {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merges a REST snapshot. Returns how many threads were new.
    pub fn merge_snapshot(&mut self, threads: impl IntoIterator<Item = ThreadId>) -> usize {
        threads
            .into_iter()
            .filter(|thread| self.threads.insert(thread.clone()))
            .count()
    }

    /// Marks a thread unread. Returns `false` if it already was.
    pub fn mark(&mut self, thread: ThreadId) -> bool {
        self.threads.insert(thread)
    }

    /// Clears a thread once the operator opens it. Returns `false` if it was not unread.
    pub fn clear(&mut self, thread: &ThreadId) -> bool {
        self.threads.remove(thread)
    }

    pub fn contains(&self, thread: &ThreadId) -> bool {
        self.threads.contains(thread)
    }

    pub fn len(&self) -> usize {
        self.threads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.threads.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ThreadId> {
        self.threads.iter()
    }
}

/// Where the operator currently is in the dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NavContext {
    path: String,
}

impl NavContext {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn navigate(&mut self, path: impl Into<String>) {
        self.path = path.into();
    }

    /// Whether the current view is any chat screen. New-message prompts are
    /// suppressed there because the operator already sees the chat list.
    pub fn targets_chat(&self) -> bool {
        self.path
            .split('/')
            .any(|segment| segment.eq_ignore_ascii_case("chat") || segment.eq_ignore_ascii_case("chats"))
    }
}
