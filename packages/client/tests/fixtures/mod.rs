//! Test fixtures: an in-process relay server and joined client sessions.

#![allow(dead_code)]

use std::{sync::Arc, time::Duration};

use hiroba_client::ClientSession;
use hiroba_server::{
    infrastructure::dto::websocket::ServerMessage,
    ui::{serve, state::AppState},
};
use tokio::{net::TcpListener, sync::oneshot};

/// How long to wait for a message that is expected to arrive
pub const RECV_TIMEOUT: Duration = Duration::from_secs(2);

/// Server running inside the test runtime; shut down on drop.
pub struct TestServer {
    pub url: String,
    shutdown: Option<oneshot::Sender<()>>,
}

impl TestServer {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("ws://{}", listener.local_addr().unwrap());
        let (shutdown, shutdown_rx) = oneshot::channel::<()>();
        tokio::spawn(async move {
            let signal = async move {
                let _ = shutdown_rx.await;
            };
            serve(listener, Arc::new(AppState::default()), signal)
                .await
                .unwrap();
        });
        Self {
            url,
            shutdown: Some(shutdown),
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
    }
}

pub async fn recv(session: &mut ClientSession) -> ServerMessage {
    tokio::time::timeout(RECV_TIMEOUT, session.recv())
        .await
        .expect("Timed out waiting for a message")
        .expect("Connection closed")
}

/// Connect and wait until the server has registered the join.
pub async fn joined(server: &TestServer, user_id: &str) -> ClientSession {
    let mut session = ClientSession::connect(&server.url, user_id).await.unwrap();
    session.hello().await.unwrap();
    loop {
        if recv(&mut session).await == ServerMessage::hello() {
            return session;
        }
    }
}
