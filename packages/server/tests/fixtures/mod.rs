//! Test fixtures: an in-process server on an ephemeral port and raw WebSocket peers.

#![allow(dead_code)]

use std::{net::SocketAddr, sync::Arc, time::Duration};

use futures_util::{SinkExt, StreamExt};
use hiroba_server::ui::{serve, state::AppState};
use tokio::{net::TcpListener, net::TcpStream, sync::oneshot, task::JoinHandle};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};

/// How long to wait for a frame that is expected to arrive
pub const RECV_TIMEOUT: Duration = Duration::from_secs(2);

/// How long to wait before concluding that nothing else will arrive
pub const QUIET_PERIOD: Duration = Duration::from_millis(200);

/// Server running inside the test runtime; shut down on drop.
pub struct TestServer {
    addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    handle: JoinHandle<()>,
}

impl TestServer {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("Failed to read local addr");
        let (shutdown, shutdown_rx) = oneshot::channel::<()>();

        let handle = tokio::spawn(async move {
            let signal = async move {
                let _ = shutdown_rx.await;
            };
            serve(listener, Arc::new(AppState::default()), signal)
                .await
                .expect("Server failed");
        });

        Self {
            addr,
            shutdown: Some(shutdown),
            handle,
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn ws_url(&self) -> String {
        format!("ws://{}/", self.addr)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        self.handle.abort();
    }
}

/// One raw WebSocket peer.
pub struct TestPeer {
    ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl TestPeer {
    pub async fn connect(server: &TestServer) -> Self {
        let (ws, _) = connect_async(server.ws_url())
            .await
            .expect("Failed to connect");
        Self { ws }
    }

    /// Connect and join, then wait until the server has processed the join.
    pub async fn joined(server: &TestServer, user_id: &str) -> Self {
        let mut peer = Self::connect(server).await;
        peer.send_json(serde_json::json!({"type": "join", "user_id": user_id}))
            .await;
        peer.sync().await;
        peer
    }

    pub async fn send_text(&mut self, text: &str) {
        self.ws
            .send(Message::Text(text.into()))
            .await
            .expect("Failed to send");
    }

    pub async fn send_json(&mut self, value: serde_json::Value) {
        self.send_text(&value.to_string()).await;
    }

    /// Round-trip a hello so that every earlier frame from this peer has been handled.
    pub async fn sync(&mut self) {
        self.send_json(serde_json::json!({"type": "hello"})).await;
        loop {
            let value = self.recv_json().await;
            if value["status"] == "hello" {
                return;
            }
        }
    }

    /// Next text frame as JSON.
    pub async fn recv_json(&mut self) -> serde_json::Value {
        self.try_recv_json(RECV_TIMEOUT)
            .await
            .expect("Expected a message")
    }

    /// Next text frame as JSON, or `None` on timeout/close.
    pub async fn try_recv_json(&mut self, wait: Duration) -> Option<serde_json::Value> {
        loop {
            match tokio::time::timeout(wait, self.ws.next()).await {
                Ok(Some(Ok(Message::Text(text)))) => {
                    return Some(serde_json::from_str(text.as_str()).expect("Invalid JSON"));
                }
                Ok(Some(Ok(Message::Ping(_) | Message::Pong(_)))) => continue,
                _ => return None,
            }
        }
    }

    /// Everything that arrives before the line goes quiet.
    pub async fn drain(&mut self) -> Vec<serde_json::Value> {
        let mut values = Vec::new();
        while let Some(value) = self.try_recv_json(QUIET_PERIOD).await {
            values.push(value);
        }
        values
    }

    /// Wait for the server to close this connection; returns the close reason.
    pub async fn expect_close(&mut self) -> String {
        loop {
            match tokio::time::timeout(RECV_TIMEOUT, self.ws.next()).await {
                Ok(Some(Ok(Message::Close(frame)))) => {
                    return frame.map(|f| f.reason.as_str().to_string()).unwrap_or_default();
                }
                Ok(Some(Ok(_))) => continue,
                Ok(Some(Err(_))) | Ok(None) => return String::new(),
                Err(_) => panic!("Connection was not closed"),
            }
        }
    }

    pub async fn close(mut self) {
        let _ = self.ws.close(None).await;
    }
}
