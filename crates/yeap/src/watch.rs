// SPDX-FileCopyrightText: 2026 Yeap Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `yeap watch`: join one store and log its live activity.
//!
//! Runs until SIGTERM/SIGINT or until the realtime connection drops, then
//! leaves the room and reports what was still buffered.

use std::sync::Arc;

use chrono::Local;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};
use yeap_client::{RestClient, WsTransport};
use yeap_config::YeapConfig;
use yeap_core::{StoreContext, StoreId, StoreProfile, YeapError};
use yeap_realtime::shutdown::install_signal_handler;
use yeap_realtime::{
    ChannelSession, DeskNotice, DeskSettings, IntakeSignal, LiveDesk, SessionState, StoreDesk,
};

/// Initialize the tracing subscriber with the configured log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("yeap={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}

/// Picks the store from the command line, falling back to the config file.
fn resolve_store(config: &YeapConfig, cli_store: Option<String>) -> Result<StoreId, YeapError> {
    cli_store
        .or_else(|| config.store.id.clone())
        .filter(|id| !id.trim().is_empty())
        .map(StoreId::from)
        .ok_or_else(|| {
            YeapError::Config("no store selected: pass --store or set store.id".to_string())
        })
}

fn store_context(config: &YeapConfig, store_id: StoreId) -> StoreContext {
    let context = StoreContext::new(StoreProfile {
        id: store_id,
        name: config.store.name.clone(),
        opening_hours: config.store.opening_hours.clone(),
    });
    match &config.dashboard.operator_name {
        Some(operator) => context.with_operator(operator.clone()),
        None => context,
    }
}

/// Runs the watch loop until shutdown.
pub async fn run_watch(config: YeapConfig, cli_store: Option<String>) -> Result<(), YeapError> {
    init_tracing(&config.dashboard.log_level);

    let store_id = resolve_store(&config, cli_store)?;
    let context = Arc::new(store_context(&config, store_id.clone()));

    let rest = Arc::new(RestClient::from_config(&config.server)?);
    let transport = Arc::new(
        WsTransport::new(config.server.socket_url.clone())
            .with_token(config.server.api_token.clone()),
    );
    let session = Arc::new(ChannelSession::new(transport, config.server.join_timeout()));
    let desk = StoreDesk::new(
        context.clone(),
        rest.clone(),
        rest,
        DeskSettings::from(&config.orders),
    );

    let open = context.is_open_at(&Local::now());
    if !open {
        warn!(store_id = %store_id, "store is outside its opening hours");
    }

    let cancel = install_signal_handler();
    let live = LiveDesk::start(session.clone(), desk).await?;
    info!(store_id = %store_id, open, "watching store");

    let mut notices = live.subscribe_notices();
    let mut intake = live.subscribe_intake();
    let mut state = session.watch_state();

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                info!("shutdown requested");
                break;
            }
            changed = state.changed() => {
                if changed.is_err() || *state.borrow() == SessionState::Disconnected {
                    warn!(store_id = %store_id, "realtime connection lost");
                    break;
                }
            }
            signal = intake.recv() => match signal {
                Ok(signal) => log_intake(signal),
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "intake signals lagged"),
                Err(RecvError::Closed) => break,
            },
            notice = notices.recv() => match notice {
                Ok(notice) => log_notice(&notice),
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "desk notices lagged"),
                Err(RecvError::Closed) => break,
            },
        }
    }

    let desk = live.shutdown().await?;
    info!(
        store_id = %store_id,
        buffered = desk.intake().len(),
        unread = desk.unread().len(),
        "left store"
    );
    Ok(())
}

fn log_intake(signal: IntakeSignal) {
    match signal {
        IntakeSignal::BecameNonEmpty { len } => info!(len, "new orders waiting (chime)"),
        IntakeSignal::BecameEmpty => info!("no orders waiting"),
    }
}

fn log_notice(notice: &DeskNotice) {
    match notice {
        DeskNotice::NewMessagePrompt { thread_id } => match thread_id {
            Some(thread_id) => info!(thread_id = %thread_id, "new customer message"),
            None => info!("unread customer messages"),
        },
        DeskNotice::Banner(message) => warn!(%message, "banner"),
        DeskNotice::CountdownChanged { order_id, remaining } => {
            tracing::debug!(order_id = %order_id, remaining, "countdown");
        }
        DeskNotice::OrderExpired(order_id) => info!(order_id = %order_id, "order auto-confirmed"),
        DeskNotice::TransitionRolledBack { order_id, status } => {
            warn!(order_id = %order_id, %status, "status change rolled back");
        }
        DeskNotice::FadeOut(_) | DeskNotice::FadeIn(_) => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(toml: &str) -> YeapConfig {
        yeap_config::load_and_validate_str(toml).unwrap()
    }

    #[test]
    fn cli_store_wins_over_config() {
        let config = config("[store]\nid = \"S1\"\n");
        assert_eq!(resolve_store(&config, Some("S2".into())).unwrap().as_str(), "S2");
        assert_eq!(resolve_store(&config, None).unwrap().as_str(), "S1");
    }

    #[test]
    fn missing_store_is_a_config_error() {
        let config = config("");
        assert!(matches!(resolve_store(&config, None), Err(YeapError::Config(_))));
        assert!(matches!(
            resolve_store(&config, Some("  ".into())),
            Err(YeapError::Config(_))
        ));
    }

    #[test]
    fn context_carries_opening_hours() {
        use chrono::{TimeZone, Utc};

        let config = config(
            "[store.opening_hours.monday]\nopen_hour = \"11:00\"\nclose_hour = \"15:00\"\n",
        );
        let context = store_context(&config, StoreId::from("S1"));
        // 2026-03-02 is a Monday.
        let lunch = Utc.with_ymd_and_hms(2026, 3, 2, 12, 0, 0).unwrap();
        let evening = Utc.with_ymd_and_hms(2026, 3, 2, 20, 0, 0).unwrap();
        assert!(context.is_open_at(&lunch));
        assert!(!context.is_open_at(&evening));
    }

    #[test]
    fn context_carries_operator() {
        let config = config("[dashboard]\noperator_name = \"Rita\"\n[store]\nname = \"Pizzaria\"\n");
        let context = store_context(&config, StoreId::from("S1"));
        assert_eq!(context.operator.as_deref(), Some("Rita"));
        assert_eq!(context.store.name, "Pizzaria");
    }
}
