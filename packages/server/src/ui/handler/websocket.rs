//! WebSocket connection handlers.
//!
//! Each accepted socket gets two halves: a writer task that drains the
//! connection's mailbox into the socket, and a read loop that feeds text frames
//! into a [`Session`]. When either side finishes the other is stopped and the
//! session cleans up.

use std::{sync::Arc, time::Duration};

use axum::{
    extract::{
        State,
        ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade, close_code},
    },
    response::IntoResponse,
};
use futures_util::{
    sink::SinkExt,
    stream::{SplitSink, SplitStream, StreamExt},
};
use tokio::sync::mpsc;

use crate::{
    domain::{Mailbox, OutboundFrame},
    ui::state::AppState,
    usecase::{Session, SessionControl},
};

/// How long the writer gets to flush queued frames (e.g. a close frame) after the session ends
const WRITER_DRAIN_TIMEOUT: Duration = Duration::from_secs(1);

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (sender, mut receiver) = socket.split();
    let (mailbox, rx) = Mailbox::open();
    let connection_id = mailbox.connection_id();
    tracing::info!("Connection {} accepted", connection_id);

    let mut session = Session::new(state.registry.clone(), mailbox);

    // Spawn a task to write queued frames (replies, relays, notifications) to this client
    let mut send_task = tokio::spawn(write_frames(sender, rx));

    // Read from this client until it leaves or the writer stops
    tokio::select! {
        _ = read_frames(&mut receiver, &mut session) => {},
        _ = &mut send_task => {
            tracing::debug!("Writer for {} finished first", connection_id);
        },
    };

    session.terminate().await;
    drop(session);

    // The registry and the session have released their mailboxes, so the writer
    // ends once the queue is flushed.
    if tokio::time::timeout(WRITER_DRAIN_TIMEOUT, &mut send_task)
        .await
        .is_err()
    {
        send_task.abort();
    }
    tracing::info!("Connection {} closed", connection_id);
}

async fn read_frames(receiver: &mut SplitStream<WebSocket>, session: &mut Session) {
    while let Some(msg) = receiver.next().await {
        let msg = match msg {
            Ok(msg) => msg,
            Err(e) => {
                tracing::warn!("Client {} forcibly disconnected: {}", session.connection_id(), e);
                return;
            }
        };

        match msg {
            Message::Text(text) => {
                tracing::debug!("Received text from {}: {}", session.connection_id(), text);
                if session.handle_text(text.as_str()).await == SessionControl::Terminate {
                    return;
                }
            }
            Message::Close(_) => {
                tracing::info!(
                    "Client {} disconnected gracefully",
                    session.connection_id()
                );
                return;
            }
            // axum answers pings itself
            Message::Ping(_) | Message::Pong(_) => {}
            Message::Binary(_) => {
                tracing::debug!("Ignoring binary frame from {}", session.connection_id());
            }
        }
    }
}

async fn write_frames(
    mut sender: SplitSink<WebSocket, Message>,
    mut rx: mpsc::UnboundedReceiver<OutboundFrame>,
) {
    while let Some(frame) = rx.recv().await {
        match frame {
            OutboundFrame::Text(text) => {
                if sender.send(Message::Text(text.into())).await.is_err() {
                    break;
                }
            }
            OutboundFrame::Close { reason } => {
                let close = CloseFrame {
                    code: close_code::NORMAL,
                    reason: reason.into(),
                };
                if let Err(e) = sender.send(Message::Close(Some(close))).await {
                    tracing::debug!("Failed to send close frame: {}", e);
                }
                break;
            }
        }
    }
}
