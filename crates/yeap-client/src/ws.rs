// SPDX-FileCopyrightText: 2026 Yeap Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! WebSocket push transport.
//!
//! One connection runs two tasks:
//! 1. Writer: drains the outbound queue into the socket
//! 2. Reader: routes acknowledgements to their waiters, answers pings, and
//!    queues pushes in arrival order for `next_frame()`
//!
//! Waiters for acknowledgements are kept in a [`DashMap`] keyed by ack id.
//! When the connection ends every waiter is dropped and sees an error.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use futures::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::sync::{Mutex, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::handshake::client::Request;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::http::header::AUTHORIZATION;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use yeap_core::{PushFrame, PushTransport, YeapError};

use crate::protocol::{Incoming, decode_incoming, encode_emit};

type AckWaiters = Arc<DashMap<u64, oneshot::Sender<Value>>>;

struct Connection {
    outbound: mpsc::UnboundedSender<Message>,
    cancel: CancellationToken,
    writer: JoinHandle<()>,
    reader: JoinHandle<()>,
}

impl Connection {
    fn is_live(&self) -> bool {
        !self.cancel.is_cancelled()
    }
}

/// [`PushTransport`] over a WebSocket carrying JSON envelopes.
pub struct WsTransport {
    url: String,
    token: Option<String>,
    next_ack: AtomicU64,
    waiters: AckWaiters,
    connection: Mutex<Option<Connection>>,
    frames: Mutex<Option<mpsc::UnboundedReceiver<PushFrame>>>,
}

impl WsTransport {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            token: None,
            next_ack: AtomicU64::new(1),
            waiters: Arc::new(DashMap::new()),
            connection: Mutex::new(None),
            frames: Mutex::new(None),
        }
    }

    /// Sends `token` as a bearer `Authorization` header on the handshake.
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn handshake_request(&self) -> Result<Request, YeapError> {
        let mut request = self
            .url
            .as_str()
            .into_client_request()
            .map_err(|e| YeapError::Transport {
                message: format!("invalid websocket url {}", self.url),
                source: Some(Box::new(e)),
            })?;
        if let Some(token) = &self.token {
            let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|e| YeapError::Config(format!("invalid API token header value: {e}")))?;
            value.set_sensitive(true);
            request.headers_mut().insert(AUTHORIZATION, value);
        }
        Ok(request)
    }

    async fn outbound(&self) -> Result<mpsc::UnboundedSender<Message>, YeapError> {
        match self.connection.lock().await.as_ref() {
            Some(conn) if conn.is_live() => Ok(conn.outbound.clone()),
            _ => Err(YeapError::transport("websocket is not connected")),
        }
    }
}

#[async_trait]
impl PushTransport for WsTransport {
    fn name(&self) -> &str {
        "websocket"
    }

    async fn open(&self) -> Result<(), YeapError> {
        let mut connection = self.connection.lock().await;
        if connection.as_ref().is_some_and(Connection::is_live) {
            return Ok(());
        }

        let (socket, _) = connect_async(self.handshake_request()?)
            .await
            .map_err(|e| YeapError::Transport {
                message: format!("failed to connect to {}", self.url),
                source: Some(Box::new(e)),
            })?;
        info!(url = %self.url, "websocket connected");

        let (mut ws_tx, mut ws_rx) = socket.split();
        let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<Message>();
        let (frames_tx, frames_rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();

        let writer_cancel = cancel.clone();
        let writer = tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    _ = writer_cancel.cancelled() => {
                        let _ = ws_tx.send(Message::Close(None)).await;
                        break;
                    }
                    msg = outbound_rx.recv() => {
                        let Some(msg) = msg else { break };
                        if let Err(e) = ws_tx.send(msg).await {
                            warn!(error = %e, "websocket write failed");
                            break;
                        }
                    }
                }
            }
        });

        let reader_cancel = cancel.clone();
        let waiters = Arc::clone(&self.waiters);
        let pong_tx = outbound_tx.clone();
        let reader = tokio::spawn(async move {
            loop {
                let msg = tokio::select! {
                    biased;
                    _ = reader_cancel.cancelled() => break,
                    msg = ws_rx.next() => msg,
                };

                match msg {
                    Some(Ok(Message::Text(text))) => match decode_incoming(text.as_str()) {
                        Ok(Incoming::Ack { id, data }) => match waiters.remove(&id) {
                            Some((_, waiter)) => {
                                let _ = waiter.send(data);
                            }
                            None => debug!(ack = id, "ack without a waiter"),
                        },
                        Ok(Incoming::Push(frame)) => {
                            trace!(event = %frame.event, "push received");
                            if frames_tx.send(frame).is_err() {
                                break;
                            }
                        }
                        Err(e) => warn!(error = %e, "ignoring malformed server frame"),
                    },
                    Some(Ok(Message::Ping(data))) => {
                        let _ = pong_tx.send(Message::Pong(data));
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        info!("websocket closed by server");
                        break;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        warn!(error = %e, "websocket read failed");
                        break;
                    }
                }
            }
            // Pending emits will never be answered on this connection.
            waiters.clear();
            reader_cancel.cancel();
        });

        *self.frames.lock().await = Some(frames_rx);
        *connection = Some(Connection {
            outbound: outbound_tx,
            cancel,
            writer,
            reader,
        });
        Ok(())
    }

    async fn emit_with_ack(&self, event: &str, payload: Value) -> Result<Value, YeapError> {
        let outbound = self.outbound().await?;
        let id = self.next_ack.fetch_add(1, Ordering::Relaxed);
        let text = encode_emit(event, &payload, Some(id))?;

        let (tx, rx) = oneshot::channel();
        self.waiters.insert(id, tx);
        if outbound.send(Message::Text(text.into())).is_err() {
            self.waiters.remove(&id);
            return Err(YeapError::transport("websocket writer has stopped"));
        }
        debug!(event, ack = id, "emit sent, awaiting ack");

        rx.await.map_err(|_| {
            YeapError::transport(format!("connection closed before `{event}` was acknowledged"))
        })
    }

    async fn next_frame(&self) -> Result<Option<PushFrame>, YeapError> {
        let mut frames = self.frames.lock().await;
        match frames.as_mut() {
            Some(rx) => Ok(rx.recv().await),
            None => Ok(None),
        }
    }

    async fn close(&self) -> Result<(), YeapError> {
        let Some(conn) = self.connection.lock().await.take() else {
            return Ok(());
        };
        conn.cancel.cancel();
        let _ = conn.writer.await;
        let _ = conn.reader.await;
        self.waiters.clear();
        info!(url = %self.url, "websocket closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn emit_before_open_fails() {
        let transport = WsTransport::new("ws://127.0.0.1:9/socket");
        let err = transport
            .emit_with_ack("joinStore", serde_json::json!("S1"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("not connected"));
    }

    #[tokio::test]
    async fn next_frame_before_open_is_closed() {
        let transport = WsTransport::new("ws://127.0.0.1:9/socket");
        assert!(transport.next_frame().await.unwrap().is_none());
        transport.close().await.unwrap();
    }

    #[test]
    fn handshake_carries_bearer_token() {
        let transport =
            WsTransport::new("ws://127.0.0.1:9/socket").with_token(Some("tok".to_string()));
        let request = transport.handshake_request().unwrap();
        assert_eq!(request.headers()[AUTHORIZATION], "Bearer tok");
        assert_eq!(request.uri().path(), "/socket");
    }

    #[test]
    fn handshake_without_token_has_no_authorization() {
        let request = WsTransport::new("ws://127.0.0.1:9/socket")
            .handshake_request()
            .unwrap();
        assert!(request.headers().get(AUTHORIZATION).is_none());
    }

    #[tokio::test]
    async fn open_against_nothing_is_a_transport_error() {
        let transport = WsTransport::new("ws://127.0.0.1:9/socket");
        assert!(matches!(
            transport.open().await,
            Err(YeapError::Transport { .. })
        ));
    }
}
