// SPDX-FileCopyrightText: 2026 Yeap Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Process signals mapped onto a [`CancellationToken`].
//!
//! `yeap watch` stops on the first SIGTERM or SIGINT, leaves the store room
//! and tears the desk down.

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Spawns a listener for SIGTERM and SIGINT. The returned token is
/// cancelled on whichever arrives first.
pub fn install_signal_handler() -> CancellationToken {
    let stop = CancellationToken::new();
    let trigger = stop.clone();

    tokio::spawn(async move {
        let signal = wait_for_signal().await;
        debug!(signal, "stopping desk");
        trigger.cancel();
    });

    stop
}

#[cfg(unix)]
async fn wait_for_signal() -> &'static str {
    use tokio::signal::unix::{SignalKind, signal};

    let signal = match signal(SignalKind::terminate()) {
        Ok(mut term) => tokio::select! {
            _ = tokio::signal::ctrl_c() => "SIGINT",
            _ = term.recv() => "SIGTERM",
        },
        Err(e) => {
            warn!(error = %e, "SIGTERM unavailable, only Ctrl+C stops the desk");
            let _ = tokio::signal::ctrl_c().await;
            "SIGINT"
        }
    };
    info!(signal, "shutdown signal received");
    signal
}

#[cfg(not(unix))]
async fn wait_for_signal() -> &'static str {
    let _ = tokio::signal::ctrl_c().await;
    info!("Ctrl+C received");
    "Ctrl+C"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn token_stays_live_until_a_signal() {
        let stop = install_signal_handler();
        tokio::task::yield_now().await;
        assert!(!stop.is_cancelled());

        stop.cancel();
        assert!(stop.is_cancelled());
    }
}
