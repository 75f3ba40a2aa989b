//! One client connection to the relay.

use std::time::Duration;

use futures_util::{
    SinkExt, StreamExt,
    stream::{SplitSink, SplitStream},
};
use hiroba_server::{
    domain::UserId,
    infrastructure::dto::websocket::{ClientMessage, RoomEvent, ServerMessage, StatusReply},
};
use tokio::{net::TcpStream, sync::mpsc, task::JoinHandle};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};

use crate::error::ClientError;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// How long `disconnect` waits for the server to close its side
const CLOSE_TIMEOUT: Duration = Duration::from_secs(2);

/// A joined connection plus the buffer of messages received on it.
pub struct ClientSession {
    user_id: UserId,
    writer: SplitSink<WsStream, Message>,
    inbound: mpsc::UnboundedReceiver<ServerMessage>,
    recv_task: JoinHandle<()>,
}

impl ClientSession {
    /// Connect to `url`, start the receive loop and send `join` for `user_id`.
    pub async fn connect(url: &str, user_id: &str) -> Result<Self, ClientError> {
        let user_id = UserId::try_from(user_id)?;

        let (ws, _) = connect_async(url).await.map_err(ClientError::Connect)?;
        tracing::info!("Websocket client connected to WebSocket server at {}", url);

        let (writer, reader) = ws.split();
        let (inbound_tx, inbound) = mpsc::unbounded_channel();
        let recv_task = tokio::spawn(receive_loop(reader, inbound_tx));

        let mut session = Self {
            user_id,
            writer,
            inbound,
            recv_task,
        };
        let join = ClientMessage::join(session.user_id.as_str());
        session.send(&join).await?;
        tracing::info!("Connected as {}", session.user_id);

        Ok(session)
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub async fn send(&mut self, message: &ClientMessage) -> Result<(), ClientError> {
        let text = message.encode()?;
        self.writer
            .send(Message::Text(text.into()))
            .await
            .map_err(ClientError::Send)?;
        tracing::debug!("Sent message: {:?}", message);
        Ok(())
    }

    pub async fn broadcast(&mut self, payload: &str) -> Result<(), ClientError> {
        let message = ClientMessage::broadcast(payload, self.user_id.as_str());
        self.send(&message).await
    }

    pub async fn hello(&mut self) -> Result<(), ClientError> {
        self.send(&ClientMessage::Hello).await
    }

    /// Next buffered server message.
    ///
    /// Returns `None` once the connection is closed and the buffer is empty.
    pub async fn recv(&mut self) -> Option<ServerMessage> {
        self.inbound.recv().await
    }

    /// Send `disconnect`, close the socket and wait for the receive loop to end.
    pub async fn disconnect(mut self) -> Result<(), ClientError> {
        let message = ClientMessage::disconnect(self.user_id.as_str());
        self.send(&message).await?;
        if let Err(e) = self.writer.close().await {
            tracing::debug!("Close handshake incomplete: {}", e);
        }
        if tokio::time::timeout(CLOSE_TIMEOUT, &mut self.recv_task)
            .await
            .is_err()
        {
            tracing::warn!("Server did not close the connection in time");
        }
        tracing::info!("WebSocket client connection closed");
        Ok(())
    }
}

impl Drop for ClientSession {
    fn drop(&mut self) {
        self.recv_task.abort();
    }
}

async fn receive_loop(
    mut reader: SplitStream<WsStream>,
    inbound: mpsc::UnboundedSender<ServerMessage>,
) {
    while let Some(msg) = reader.next().await {
        match msg {
            Ok(Message::Text(text)) => match ServerMessage::decode(text.as_str()) {
                Ok(message) => {
                    log_message(&message);
                    if inbound.send(message).is_err() {
                        break;
                    }
                }
                Err(e) => tracing::error!("Error receiving message: {} ({})", e, text.as_str()),
            },
            Ok(Message::Close(frame)) => {
                let reason = frame
                    .as_ref()
                    .map(|f| f.reason.as_str().to_string())
                    .unwrap_or_default();
                tracing::info!("Server closed the connection: {}", reason);
                break;
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!("WebSocket error: {}", e);
                break;
            }
        }
    }
    tracing::debug!("Receive loop finished");
}

fn log_message(message: &ServerMessage) {
    match message {
        ServerMessage::Event(RoomEvent::UserJoined { user_id, .. }) => {
            tracing::debug!("user_joined: {}", user_id)
        }
        ServerMessage::Event(RoomEvent::UserLeft { user_id, .. }) => {
            tracing::debug!("user_left: {}", user_id)
        }
        ServerMessage::Event(RoomEvent::Notification { payload }) => {
            tracing::debug!("notification: {}", payload)
        }
        ServerMessage::Status(StatusReply::Hello { payload }) => {
            tracing::debug!("Hello message: {}", payload)
        }
        ServerMessage::Status(StatusReply::Unknown { .. }) => {
            tracing::warn!("Server did not recognize a message we sent")
        }
        ServerMessage::Relay { from, .. } => tracing::debug!("relay from {}", from),
        ServerMessage::Error { error } => tracing::error!("Server error reply: {}", error),
    }
}
