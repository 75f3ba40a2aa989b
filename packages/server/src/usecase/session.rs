//! UseCase: 接続ごとのセッション（状態機械）
//!
//! `Unidentified` → `Identified` → `Terminated` の 3 状態。
//! 受信したテキストを 1 通ずつ [`Session::handle_text`] に渡し、
//! 終了時に [`Session::terminate`] で後始末する。ソケットには触れず、
//! 返信は自分の Mailbox に積むだけなので、同じ接続への書き込み順が保たれる。
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - 各状態でのメッセージごとの遷移と返信
//!
//! ### なぜこのテストが必要か
//! - join の検証を通らないメッセージが Registry を変更しないことを保証
//! - 不正な入力で接続が閉じられないことを確認
//!
//! ### どのような状況を想定しているか
//! - 正常系：join → broadcast → disconnect
//! - 異常系：user_id のない join、JSON でない入力、未知の type
//! - エッジケース：join 前の broadcast / disconnect、同じ接続での再 join

use std::sync::Arc;

use crate::{
    domain::{ConnectionHandle, ConnectionId, ConnectionRegistry, Mailbox, OutboundFrame, UserId},
    infrastructure::dto::websocket::{ClientMessage, MISSING_USER_ID, ServerMessage},
};

use super::{
    BroadcastMessageUseCase, ConnectParticipantUseCase, DeliveryReport, DisconnectError,
    DisconnectParticipantUseCase,
};

/// クライアント要求で接続を閉じるときの理由
pub const CLIENT_DISCONNECT_REASON: &str = "Client requested disconnect";

/// セッションの状態
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// join 前
    Unidentified,
    /// join 済み
    Identified(UserId),
    /// 終了
    Terminated,
}

/// 1 通処理した後に受信ループを続けるか
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionControl {
    Continue,
    Terminate,
}

/// 1 接続分のセッション
pub struct Session {
    registry: Arc<dyn ConnectionRegistry>,
    mailbox: Mailbox,
    state: SessionState,
}

impl Session {
    /// 新しいセッションを `Unidentified` で作成
    pub fn new(registry: Arc<dyn ConnectionRegistry>, mailbox: Mailbox) -> Self {
        Self {
            registry,
            mailbox,
            state: SessionState::Unidentified,
        }
    }

    pub fn connection_id(&self) -> ConnectionId {
        self.mailbox.connection_id()
    }

    /// 受信したテキスト 1 通を処理する
    pub async fn handle_text(&mut self, text: &str) -> SessionControl {
        if self.state == SessionState::Terminated {
            return SessionControl::Terminate;
        }

        let message = match ClientMessage::decode(text) {
            Ok(message) => message,
            Err(e) => {
                tracing::error!("Received invalid message from {}: {}", self.connection_id(), e);
                return self.reply(&ServerMessage::error(e.to_string()));
            }
        };

        match message {
            ClientMessage::Join { user_id } => self.join(user_id).await,
            ClientMessage::Hello => self.reply(&ServerMessage::hello()),
            ClientMessage::Broadcast { payload, .. } => {
                self.broadcast(&payload).await;
                SessionControl::Continue
            }
            ClientMessage::Disconnect { .. } => self.disconnect().await,
            ClientMessage::Unknown => self.reply(&ServerMessage::unknown()),
        }
    }

    /// セッション終了時の後始末（何度呼んでもよい）
    pub async fn terminate(&mut self) {
        match std::mem::replace(&mut self.state, SessionState::Terminated) {
            SessionState::Identified(user_id) => self.unregister(&user_id).await,
            SessionState::Unidentified => {
                tracing::warn!(
                    "Client {} disconnected before registering.",
                    self.connection_id()
                );
            }
            SessionState::Terminated => {}
        }
    }

    async fn join(&mut self, user_id: Option<String>) -> SessionControl {
        let user_id = match user_id.map(UserId::try_from) {
            Some(Ok(user_id)) => user_id,
            Some(Err(_)) | None => return self.reply(&ServerMessage::error(MISSING_USER_ID)),
        };

        if let SessionState::Identified(current) = &self.state {
            if current == &user_id {
                tracing::debug!("{} joined again on the same connection; ignoring", user_id);
                return SessionControl::Continue;
            }
            let previous = current.clone();
            tracing::info!("Connection {} switches from {} to {}", self.connection_id(), previous, user_id);
            self.unregister(&previous).await;
        }

        let handle = ConnectionHandle::new(self.mailbox.clone());
        let outcome = ConnectParticipantUseCase::new(self.registry.clone())
            .execute(user_id.clone(), handle)
            .await;
        if outcome.evicted_previous {
            tracing::info!("{} took over from a previous connection", user_id);
        }
        log_undelivered("user_joined", &outcome.notified);
        self.state = SessionState::Identified(user_id);
        SessionControl::Continue
    }

    async fn broadcast(&self, payload: &str) {
        let SessionState::Identified(sender) = &self.state else {
            tracing::warn!(
                "Sender on {} not registered. Ignoring broadcast.",
                self.connection_id()
            );
            return;
        };

        if let Err(e) = BroadcastMessageUseCase::new(self.registry.clone())
            .execute(sender, self.connection_id(), payload)
            .await
        {
            tracing::warn!("{}", e);
        }
    }

    async fn disconnect(&mut self) -> SessionControl {
        if let SessionState::Identified(user_id) = &self.state {
            if self.registry.lookup(user_id).await == Some(self.connection_id()) {
                BroadcastMessageUseCase::new(self.registry.clone())
                    .notify_all(&ServerMessage::left_chat(user_id.as_str()), user_id)
                    .await;
            }
        } else {
            tracing::warn!(
                "Disconnect from unregistered connection {}",
                self.connection_id()
            );
        }

        if let Err(e) = self.mailbox.send(OutboundFrame::Close {
            reason: CLIENT_DISCONNECT_REASON.to_string(),
        }) {
            tracing::debug!("Close frame not queued: {}", e);
        }
        SessionControl::Terminate
    }

    async fn unregister(&self, user_id: &UserId) {
        match DisconnectParticipantUseCase::new(self.registry.clone())
            .execute(user_id, self.connection_id())
            .await
        {
            Ok(notified) => {
                tracing::info!("User unregistered. Id: {}", user_id);
                log_undelivered("user_left", &notified);
            }
            Err(e @ DisconnectError::NotRegistered(_)) => tracing::info!("{}", e),
            Err(e @ DisconnectError::BoundToOtherConnection(_)) => {
                tracing::info!("Skipping unregister: {}", e)
            }
        }
    }

    fn reply(&self, message: &ServerMessage) -> SessionControl {
        let text = match message.encode() {
            Ok(text) => text,
            Err(e) => {
                tracing::error!("Failed to encode reply: {}", e);
                return SessionControl::Continue;
            }
        };
        match self.mailbox.send_text(text) {
            Ok(()) => SessionControl::Continue,
            Err(e) => {
                tracing::warn!("Failed to reply: {}", e);
                SessionControl::Terminate
            }
        }
    }
}

fn log_undelivered(event: &str, report: &DeliveryReport) {
    for user_id in &report.failed {
        tracing::warn!("{} not delivered to {}: connection closed", event, user_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::repository::InMemoryConnectionRegistry;
    use tokio::sync::mpsc::UnboundedReceiver;

    struct Peer {
        session: Session,
        rx: UnboundedReceiver<OutboundFrame>,
    }

    impl Peer {
        fn new(registry: &Arc<InMemoryConnectionRegistry>) -> Self {
            let (mailbox, rx) = Mailbox::open();
            Self {
                session: Session::new(registry.clone(), mailbox),
                rx,
            }
        }

        async fn joined(registry: &Arc<InMemoryConnectionRegistry>, id: &str) -> Self {
            let mut peer = Self::new(registry);
            let text = ClientMessage::join(id).encode().unwrap();
            assert_eq!(peer.session.handle_text(&text).await, SessionControl::Continue);
            peer
        }

        async fn send(&mut self, text: &str) -> SessionControl {
            self.session.handle_text(text).await
        }

        fn frames(&mut self) -> Vec<OutboundFrame> {
            let mut frames = Vec::new();
            while let Ok(frame) = self.rx.try_recv() {
                frames.push(frame);
            }
            frames
        }

        fn messages(&mut self) -> Vec<ServerMessage> {
            self.frames()
                .into_iter()
                .filter_map(|frame| match frame {
                    OutboundFrame::Text(text) => Some(ServerMessage::decode(&text).unwrap()),
                    OutboundFrame::Close { .. } => None,
                })
                .collect()
        }
    }

    fn user(id: &str) -> UserId {
        UserId::try_from(id).unwrap()
    }

    #[tokio::test]
    async fn test_join_identifies_session() {
        // テスト項目: join でセッションが Identified になり、Registry に登録される
        // given (前提条件):
        let registry = Arc::new(InMemoryConnectionRegistry::new());
        let mut peer = Peer::new(&registry);

        // when (操作):
        let control = peer.send(r#"{"type":"join","user_id":"alice"}"#).await;

        // then (期待する結果):
        assert_eq!(control, SessionControl::Continue);
        assert_eq!(peer.session.state, SessionState::Identified(user("alice")));
        assert_eq!(
            registry.lookup(&user("alice")).await,
            Some(peer.session.connection_id())
        );
        assert!(peer.messages().is_empty());
    }

    #[tokio::test]
    async fn test_join_without_user_id_is_rejected() {
        // テスト項目: user_id のない / 空の join は Registry を変更せず、エラーを 1 通だけ返し、誰にも通知しない
        // given (前提条件):
        let registry = Arc::new(InMemoryConnectionRegistry::new());
        let mut bob = Peer::joined(&registry, "bob").await;
        let mut peer = Peer::new(&registry);

        // when (操作):
        let missing = peer.send(r#"{"type":"join"}"#).await;
        let missing_reply = peer.messages();
        let empty = peer.send(r#"{"type":"join","user_id":""}"#).await;
        let empty_reply = peer.messages();

        // then (期待する結果):
        assert_eq!(missing, SessionControl::Continue);
        assert_eq!(empty, SessionControl::Continue);
        assert_eq!(missing_reply, vec![ServerMessage::error(MISSING_USER_ID)]);
        assert_eq!(empty_reply, vec![ServerMessage::error(MISSING_USER_ID)]);
        assert_eq!(peer.session.state, SessionState::Unidentified);
        assert_eq!(registry.count().await, 1);
        assert!(bob.messages().is_empty());
    }

    #[tokio::test]
    async fn test_hello_replies_in_any_state() {
        // テスト項目: hello は join 前でも後でも返信される
        // given (前提条件):
        let registry = Arc::new(InMemoryConnectionRegistry::new());
        let mut anonymous = Peer::new(&registry);
        let mut alice = Peer::joined(&registry, "alice").await;

        // when (操作):
        anonymous.send(r#"{"type":"hello"}"#).await;
        alice.send(r#"{"type":"hello"}"#).await;

        // then (期待する結果):
        assert_eq!(anonymous.messages(), vec![ServerMessage::hello()]);
        assert_eq!(alice.messages(), vec![ServerMessage::hello()]);
    }

    #[tokio::test]
    async fn test_invalid_input_keeps_connection_open() {
        // テスト項目: JSON でない入力・フィールド不正・未知の type はエラーまたは unknown を返し、接続は続く
        // given (前提条件):
        let registry = Arc::new(InMemoryConnectionRegistry::new());
        let mut alice = Peer::joined(&registry, "alice").await;

        // when (操作):
        let not_json = alice.send("hello there").await;
        let not_json_reply = alice.messages();
        let bad_fields = alice.send(r#"{"type":"broadcast","payload":5}"#).await;
        let bad_fields_reply = alice.messages();
        let unknown = alice.send(r#"{"type":"dance"}"#).await;
        let unknown_reply = alice.messages();

        // then (期待する結果):
        assert_eq!(not_json, SessionControl::Continue);
        assert_eq!(
            not_json_reply,
            vec![ServerMessage::error("Invalid message format. Must be JSON.")]
        );
        assert_eq!(bad_fields, SessionControl::Continue);
        assert!(matches!(
            bad_fields_reply.as_slice(),
            [ServerMessage::Error { error }] if error.starts_with("Invalid message fields")
        ));
        assert_eq!(unknown, SessionControl::Continue);
        assert_eq!(unknown_reply, vec![ServerMessage::unknown()]);
        assert_eq!(alice.session.state, SessionState::Identified(user("alice")));
    }

    #[tokio::test]
    async fn test_non_object_json_gets_error_envelope() {
        // テスト項目: オブジェクトでない JSON にはエラーを返し、unknown は返さず、接続は続く
        // given (前提条件):
        let registry = Arc::new(InMemoryConnectionRegistry::new());
        let mut alice = Peer::joined(&registry, "alice").await;
        let mut bob = Peer::joined(&registry, "bob").await;
        bob.messages();

        for text in ["42", "[1,2]", "null", r#""join""#] {
            // when (操作):
            let control = alice.send(text).await;

            // then (期待する結果):
            assert_eq!(control, SessionControl::Continue);
            assert_eq!(
                alice.messages(),
                vec![ServerMessage::error("Invalid message format. Must be a JSON object.")],
                "reply to {text}"
            );
        }
        assert_eq!(alice.session.state, SessionState::Identified(user("alice")));
        assert!(bob.messages().is_empty());
    }

    #[tokio::test]
    async fn test_join_with_closed_peer_still_registers() {
        // テスト項目: 接続が閉じた参加者がいても join は成功し、残りの参加者には user_joined が届く
        // given (前提条件):
        let registry = Arc::new(InMemoryConnectionRegistry::new());
        let gone = Peer::joined(&registry, "gone").await;
        let mut bob = Peer::joined(&registry, "bob").await;
        drop(gone.rx);
        bob.messages();

        // when (操作):
        let alice = Peer::joined(&registry, "alice").await;

        // then (期待する結果):
        assert_eq!(alice.session.state, SessionState::Identified(user("alice")));
        assert_eq!(bob.messages(), vec![ServerMessage::user_joined("alice")]);
        assert_eq!(registry.count().await, 3);
    }

    #[tokio::test]
    async fn test_broadcast_before_join_is_ignored() {
        // テスト項目: join 前の broadcast は誰にも届かず、送信者にも返信されない
        // given (前提条件):
        let registry = Arc::new(InMemoryConnectionRegistry::new());
        let mut bob = Peer::joined(&registry, "bob").await;
        let mut anonymous = Peer::new(&registry);

        // when (操作):
        let control = anonymous
            .send(r#"{"type":"broadcast","payload":"hi"}"#)
            .await;

        // then (期待する結果):
        assert_eq!(control, SessionControl::Continue);
        assert!(anonymous.messages().is_empty());
        assert!(bob.messages().is_empty());
    }

    #[tokio::test]
    async fn test_disconnect_before_join_closes_without_notice() {
        // テスト項目: join 前の disconnect は通知なしで接続を閉じる
        // given (前提条件):
        let registry = Arc::new(InMemoryConnectionRegistry::new());
        let mut bob = Peer::joined(&registry, "bob").await;
        let mut anonymous = Peer::new(&registry);

        // when (操作):
        let control = anonymous.send(r#"{"type":"disconnect"}"#).await;
        anonymous.session.terminate().await;

        // then (期待する結果):
        assert_eq!(control, SessionControl::Terminate);
        assert_eq!(
            anonymous.frames(),
            vec![OutboundFrame::Close {
                reason: CLIENT_DISCONNECT_REASON.to_string()
            }]
        );
        assert!(bob.messages().is_empty());
        assert_eq!(registry.count().await, 1);
    }

    #[tokio::test]
    async fn test_three_peer_scenario() {
        // テスト項目: alice, bob, carol が参加し、bob の発言が alice と carol に届き、
        //             carol の disconnect で alice と bob に user_left が 1 通ずつ届く
        // given (前提条件):
        let registry = Arc::new(InMemoryConnectionRegistry::new());
        let mut alice = Peer::joined(&registry, "alice").await;
        let mut bob = Peer::joined(&registry, "bob").await;
        let mut carol = Peer::joined(&registry, "carol").await;
        alice.messages();
        bob.messages();
        carol.messages();

        // when (操作): bob が broadcast
        bob.send(r#"{"type":"broadcast","payload":"hi"}"#).await;

        // then (期待する結果):
        assert_eq!(alice.messages(), vec![ServerMessage::relay("bob", "hi")]);
        assert_eq!(carol.messages(), vec![ServerMessage::relay("bob", "hi")]);
        assert!(bob.messages().is_empty());

        // when (操作): carol が disconnect し、受信ループ終了後に後始末する
        let control = carol.send(r#"{"type":"disconnect","user_id":"carol"}"#).await;
        carol.session.terminate().await;

        // then (期待する結果):
        assert_eq!(control, SessionControl::Terminate);
        let expected = vec![
            ServerMessage::left_chat("carol"),
            ServerMessage::user_left("carol"),
        ];
        assert_eq!(alice.messages(), expected);
        assert_eq!(bob.messages(), expected);
        assert_eq!(
            carol.frames(),
            vec![OutboundFrame::Close {
                reason: CLIENT_DISCONNECT_REASON.to_string()
            }]
        );
        assert_eq!(registry.lookup(&user("carol")).await, None);
        assert_eq!(carol.session.state, SessionState::Terminated);
    }

    #[tokio::test]
    async fn test_duplicate_login_old_session_cleanup_keeps_new_entry() {
        // テスト項目: 重複ログインで追い出された古いセッションの後始末は新しい接続のエントリを消さず、
        //             user_left も送らない
        // given (前提条件):
        let registry = Arc::new(InMemoryConnectionRegistry::new());
        let mut bob = Peer::joined(&registry, "bob").await;
        let mut old = Peer::joined(&registry, "alice").await;
        let new = Peer::joined(&registry, "alice").await;
        bob.messages();

        // when (操作):
        old.session.terminate().await;

        // then (期待する結果):
        assert_eq!(
            old.frames(),
            vec![OutboundFrame::Close {
                reason: "Duplicate login".to_string()
            }]
        );
        assert_eq!(
            registry.lookup(&user("alice")).await,
            Some(new.session.connection_id())
        );
        assert!(bob.messages().is_empty());
    }

    #[tokio::test]
    async fn test_rejoin_with_other_identity_switches_binding() {
        // テスト項目: 同じ接続で別の ID で join し直すと古い ID は登録解除される
        // given (前提条件):
        let registry = Arc::new(InMemoryConnectionRegistry::new());
        let mut bob = Peer::joined(&registry, "bob").await;
        let mut peer = Peer::joined(&registry, "alice").await;
        bob.messages();

        // when (操作):
        peer.send(r#"{"type":"join","user_id":"alicia"}"#).await;
        peer.send(r#"{"type":"join","user_id":"alicia"}"#).await;

        // then (期待する結果):
        assert_eq!(registry.lookup(&user("alice")).await, None);
        assert_eq!(
            registry.lookup(&user("alicia")).await,
            Some(peer.session.connection_id())
        );
        assert_eq!(
            bob.messages(),
            vec![
                ServerMessage::user_left("alice"),
                ServerMessage::user_joined("alicia")
            ]
        );
        assert!(peer.messages().is_empty());
    }

    #[tokio::test]
    async fn test_terminate_unregisters_and_notifies() {
        // テスト項目: 接続断（terminate）で登録解除され、残りに user_left が届く
        // given (前提条件):
        let registry = Arc::new(InMemoryConnectionRegistry::new());
        let mut alice = Peer::joined(&registry, "alice").await;
        let mut bob = Peer::joined(&registry, "bob").await;
        alice.messages();

        // when (操作):
        bob.session.terminate().await;
        bob.session.terminate().await;

        // then (期待する結果):
        assert_eq!(alice.messages(), vec![ServerMessage::user_left("bob")]);
        assert_eq!(registry.lookup(&user("bob")).await, None);
        assert_eq!(
            bob.send(r#"{"type":"hello"}"#).await,
            SessionControl::Terminate
        );
    }
}
