// SPDX-FileCopyrightText: 2026 Yeap Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Realtime order and chat synchronisation for the Yeap store dashboard.
//!
//! - [`ChannelSession`] joins a store room over a [`PushTransport`](yeap_core::PushTransport)
//!   and hands out subscriptions.
//! - [`EventRouter`] decodes `orderReceived` / `storeHaveNewMessage` pushes
//!   and forwards them to the desk.
//! - [`StoreDesk`] owns the [`OrderIntake`] buffer, the [`UnreadThreads`]
//!   set and the per-order [`Countdown`]s, and serialises every change.
//! - [`LiveDesk`] wires the three together for one store.

pub mod countdown;
pub mod desk;
pub mod intake;
pub mod live;
pub mod router;
pub mod session;
pub mod shutdown;
pub mod transition;
pub mod unread;

pub use countdown::{Countdown, CountdownPhase, CountdownTimer, TickOutcome};
pub use desk::{DeskEvent, DeskNotice, DeskSettings, OperatorAction, StoreDesk};
pub use intake::{Admission, IntakeSignal, OrderIntake};
pub use live::LiveDesk;
pub use router::{EventRouter, ORDER_RECEIVED, PushEvent, STORE_HAVE_NEW_MESSAGE};
pub use session::{ChannelSession, JOIN_EVENT, SessionHandle, SessionState, Subscription};
pub use transition::{StatusTransition, TransitionOrigin};
pub use unread::{NavContext, UnreadThreads};
