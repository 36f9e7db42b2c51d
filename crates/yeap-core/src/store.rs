// SPDX-FileCopyrightText: 2026 Yeap Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Store profile and the per-login session context.
//!
//! [`StoreContext`] is created once the operator has logged in and is handed
//! by `Arc` to the channel session and the desk. Nothing in the realtime core
//! reads store data from global state.

use chrono::{DateTime, Datelike, NaiveTime, TimeZone, Weekday};
use serde::{Deserialize, Serialize};

use crate::types::StoreId;

/// Opening window for a single weekday, as `HH:MM` strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayHours {
    #[serde(alias = "open_hour")]
    pub open_hour: String,
    #[serde(alias = "close_hour")]
    pub close_hour: String,
}

impl DayHours {
    /// Both times parse as `HH:MM`.
    pub fn is_valid(&self) -> bool {
        self.window().is_some()
    }

    fn window(&self) -> Option<(NaiveTime, NaiveTime)> {
        let open = NaiveTime::parse_from_str(&self.open_hour, "%H:%M").ok()?;
        let close = NaiveTime::parse_from_str(&self.close_hour, "%H:%M").ok()?;
        Some((open, close))
    }
}

/// Weekly opening hours of a store. Missing days are closed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OpeningHours {
    pub sunday: Option<DayHours>,
    pub monday: Option<DayHours>,
    pub tuesday: Option<DayHours>,
    pub wednesday: Option<DayHours>,
    pub thursday: Option<DayHours>,
    pub friday: Option<DayHours>,
    pub saturday: Option<DayHours>,
}

impl OpeningHours {
    /// Configured days, Sunday first.
    pub fn days(&self) -> impl Iterator<Item = (Weekday, &DayHours)> {
        [
            Weekday::Sun,
            Weekday::Mon,
            Weekday::Tue,
            Weekday::Wed,
            Weekday::Thu,
            Weekday::Fri,
            Weekday::Sat,
        ]
        .into_iter()
        .filter_map(|weekday| self.day(weekday).map(|hours| (weekday, hours)))
    }

    fn day(&self, weekday: Weekday) -> Option<&DayHours> {
        match weekday {
            Weekday::Sun => self.sunday.as_ref(),
            Weekday::Mon => self.monday.as_ref(),
            Weekday::Tue => self.tuesday.as_ref(),
            Weekday::Wed => self.wednesday.as_ref(),
            Weekday::Thu => self.thursday.as_ref(),
            Weekday::Fri => self.friday.as_ref(),
            Weekday::Sat => self.saturday.as_ref(),
        }
    }

    /// Whether the store is open at `at`, in the timezone `at` carries.
    ///
    /// A window whose close time is earlier than its open time runs past
    /// midnight, so the previous day's window is checked as well.
    pub fn is_open_at<Tz: TimeZone>(&self, at: &DateTime<Tz>) -> bool {
        let now = at.time();
        let today = at.weekday();

        if let Some((open, close)) = self.day(today).and_then(DayHours::window) {
            let open_now = if open <= close {
                now >= open && now < close
            } else {
                now >= open
            };
            if open_now {
                return true;
            }
        }

        // Spill-over from yesterday's overnight window.
        matches!(
            self.day(today.pred()).and_then(DayHours::window),
            Some((open, close)) if close < open && now < close
        )
    }
}

/// Profile of the store the operator manages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreProfile {
    pub id: StoreId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub opening_hours: Option<OpeningHours>,
}

/// Session-scoped context created on login and torn down on logout.
#[derive(Debug, Clone)]
pub struct StoreContext {
    pub store: StoreProfile,
    pub operator: Option<String>,
}

impl StoreContext {
    pub fn new(store: StoreProfile) -> Self {
        Self {
            store,
            operator: None,
        }
    }

    pub fn with_operator(mut self, operator: impl Into<String>) -> Self {
        self.operator = Some(operator.into());
        self
    }

    pub fn store_id(&self) -> &StoreId {
        &self.store.id
    }

    /// Whether the store is open at `at`. Stores without configured hours
    /// are treated as always open.
    pub fn is_open_at<Tz: TimeZone>(&self, at: &DateTime<Tz>) -> bool {
        self.store
            .opening_hours
            .as_ref()
            .is_none_or(|hours| hours.is_open_at(at))
    }
}
