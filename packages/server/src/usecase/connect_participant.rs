//! UseCase: 参加者接続（join）処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - ConnectParticipantUseCase::execute() メソッド
//! - ID の登録、重複ログイン時の古い接続の切断、user_joined 通知
//!
//! ### なぜこのテストが必要か
//! - 同じ ID は常に 1 つの接続にしか紐づかないことを保証
//! - 既存の参加者全員（本人以外）に user_joined が 1 通ずつ届くことを確認
//!
//! ### どのような状況を想定しているか
//! - 正常系：新規参加者の登録
//! - エッジケース：同じ ID での再ログイン（古い接続は "Duplicate login" で閉じられる）

use std::sync::Arc;

use crate::{
    domain::{ConnectionHandle, ConnectionRegistry, Timestamp, UserId},
    infrastructure::dto::websocket::ServerMessage,
};

use super::broadcast_message::{BroadcastMessageUseCase, DeliveryReport};

/// 重複ログインで古い接続を閉じるときの理由
pub const DUPLICATE_LOGIN_REASON: &str = "Duplicate login";

/// 接続処理の結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectOutcome {
    /// 同じ ID の古い接続を追い出したか
    pub evicted_previous: bool,
    /// user_joined 通知の配信結果
    pub notified: DeliveryReport,
}

/// 参加者接続のユースケース
pub struct ConnectParticipantUseCase {
    /// Registry（データアクセス層の抽象化）
    registry: Arc<dyn ConnectionRegistry>,
}

impl ConnectParticipantUseCase {
    /// 新しい ConnectParticipantUseCase を作成
    pub fn new(registry: Arc<dyn ConnectionRegistry>) -> Self {
        Self { registry }
    }

    /// 参加者接続を実行
    ///
    /// # Arguments
    ///
    /// * `user_id` - 登録する ID（Domain Model）
    /// * `handle` - この接続のハンドル
    pub async fn execute(&self, user_id: UserId, handle: ConnectionHandle) -> ConnectOutcome {
        let connection_id = handle.id();

        // 1. Registry に登録（既存の紐づけは置き換えられ、古いハンドルが返る）
        let evicted = self
            .registry
            .insert(user_id.clone(), handle, Timestamp::now())
            .await;

        // 2. 古い接続を閉じる（この時点で古いハンドルはスナップショットに含まれない）
        let evicted_previous = match evicted {
            Some(previous) => {
                tracing::warn!(
                    "user_id {} already connected. Disconnecting old session {}.",
                    user_id,
                    previous.id()
                );
                if let Err(e) = previous.close(DUPLICATE_LOGIN_REASON) {
                    tracing::debug!("Old session for {} already gone: {}", user_id, e);
                }
                true
            }
            None => false,
        };
        tracing::info!(
            "New client connected: {} with user_id: {}",
            connection_id,
            user_id
        );

        // 3. 本人以外に user_joined を通知
        let notified = BroadcastMessageUseCase::new(self.registry.clone())
            .notify_all(&ServerMessage::user_joined(user_id.as_str()), &user_id)
            .await;

        ConnectOutcome {
            evicted_previous,
            notified,
        }
    }
}
