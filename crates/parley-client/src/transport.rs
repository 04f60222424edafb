//! WebSocket transport for the session.
//!
//! Provides [`open_socket`] which runs one room socket on a tokio task and
//! bridges it to channels. This is a thin layer that only moves text frames;
//! protocol logic stays in the Sans-IO [`ChatSession`](crate::ChatSession).
//!
//! Connection failure is reported as a [`SocketEvent::Failed`] on the event
//! channel rather than as an error return, matching how the session expects
//! to learn about it.

use futures::{SinkExt, StreamExt};
use parley_core::OpenRequest;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_tungstenite::{
    connect_async,
    tungstenite::{
        Message as WsMessage,
        client::IntoClientRequest,
        http::{HeaderValue, header::AUTHORIZATION},
    },
};

/// Socket setup errors.
#[derive(Debug, Error)]
pub enum SocketError {
    /// Request could not be built from the open parameters.
    #[error("invalid request: {0}")]
    Request(String),
}

/// Events from the socket task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SocketEvent {
    /// Socket is open.
    Opened,
    /// Text frame received.
    Text(String),
    /// Socket closed.
    Closed {
        /// Close reason sent by the server, if any.
        reason: Option<String>,
    },
    /// Socket could not open or broke.
    Failed(String),
}

/// Handle to a running socket task.
///
/// The task stops on [`SocketHandle::close`] or when the handle is dropped.
pub struct SocketHandle {
    /// Send text frames to the server.
    pub to_server: mpsc::Sender<String>,
    abort_handle: tokio::task::AbortHandle,
}

impl SocketHandle {
    /// Stop the socket task immediately.
    pub fn close(&self) {
        self.abort_handle.abort();
    }
}

impl Drop for SocketHandle {
    fn drop(&mut self) {
        self.abort_handle.abort();
    }
}

/// Open a room socket on a new task.
///
/// Events are delivered on `events` in order; the last one is always
/// `Closed` or `Failed`.
///
/// # Errors
///
/// - `SocketError::Request` if the URL or auth header is unusable
pub fn open_socket(
    request: &OpenRequest,
    events: mpsc::Sender<SocketEvent>,
) -> Result<SocketHandle, SocketError> {
    let mut upgrade = request
        .url
        .as_str()
        .into_client_request()
        .map_err(|e| SocketError::Request(e.to_string()))?;

    if let Some(auth) = &request.auth_header {
        let value = HeaderValue::from_str(auth).map_err(|e| SocketError::Request(e.to_string()))?;
        upgrade.headers_mut().insert(AUTHORIZATION, value);
    }

    let (to_server_tx, to_server_rx) = mpsc::channel::<String>(32);
    let handle = tokio::spawn(run_socket(upgrade, to_server_rx, events));

    Ok(SocketHandle { to_server: to_server_tx, abort_handle: handle.abort_handle() })
}

/// Run the socket, bridging between channels and the WebSocket stream.
async fn run_socket(
    upgrade: tokio_tungstenite::tungstenite::handshake::client::Request,
    mut to_server: mpsc::Receiver<String>,
    events: mpsc::Sender<SocketEvent>,
) {
    let ws_stream = match connect_async(upgrade).await {
        Ok((stream, _response)) => stream,
        Err(e) => {
            tracing::warn!(error = %e, "socket connect failed");
            let _ = events.send(SocketEvent::Failed(e.to_string())).await;
            return;
        },
    };

    if events.send(SocketEvent::Opened).await.is_err() {
        return;
    }

    let (mut ws_tx, mut ws_rx) = ws_stream.split();

    let last = loop {
        tokio::select! {
            outgoing = to_server.recv() => {
                let Some(text) = outgoing else {
                    let _ = ws_tx.send(WsMessage::Close(None)).await;
                    break SocketEvent::Closed { reason: None };
                };
                if let Err(e) = ws_tx.send(WsMessage::Text(text)).await {
                    tracing::warn!(error = %e, "socket send failed");
                    break SocketEvent::Failed(e.to_string());
                }
            },
            incoming = ws_rx.next() => match incoming {
                Some(Ok(WsMessage::Text(text))) => {
                    if events.send(SocketEvent::Text(text)).await.is_err() {
                        return;
                    }
                },
                Some(Ok(WsMessage::Ping(data))) => {
                    let _ = ws_tx.send(WsMessage::Pong(data)).await;
                },
                Some(Ok(WsMessage::Close(frame))) => {
                    let reason = frame.map(|f| f.reason.to_string()).filter(|r| !r.is_empty());
                    break SocketEvent::Closed { reason };
                },
                Some(Ok(_)) => {},
                Some(Err(e)) => {
                    tracing::warn!(error = %e, "socket read failed");
                    break SocketEvent::Failed(e.to_string());
                },
                None => break SocketEvent::Closed { reason: None },
            },
        }
    };

    let _ = events.send(last).await;
}
