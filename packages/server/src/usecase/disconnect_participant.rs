//! UseCase: 参加者切断処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - DisconnectParticipantUseCase::execute() メソッド
//! - 参加者の削除と user_left 通知
//!
//! ### なぜこのテストが必要か
//! - 残りの参加者全員に user_left が 1 通ずつ届くことを保証
//! - 重複ログインで置き換えられた古いセッションが新しいエントリを消さないことを確認
//!
//! ### どのような状況を想定しているか
//! - 正常系：参加者の切断と通知
//! - エッジケース：最後の参加者の切断（通知対象なし）
//! - 異常系：存在しない参加者、置き換え済みの接続からの切断

use std::sync::Arc;

use crate::{
    domain::{ConnectionId, ConnectionRegistry, UserId},
    infrastructure::dto::websocket::ServerMessage,
};

use super::{
    broadcast_message::{BroadcastMessageUseCase, DeliveryReport},
    error::DisconnectError,
};

/// 参加者切断のユースケース
pub struct DisconnectParticipantUseCase {
    /// Registry（データアクセス層の抽象化）
    registry: Arc<dyn ConnectionRegistry>,
}

impl DisconnectParticipantUseCase {
    /// 新しい DisconnectParticipantUseCase を作成
    pub fn new(registry: Arc<dyn ConnectionRegistry>) -> Self {
        Self { registry }
    }

    /// 参加者切断を実行
    ///
    /// # Arguments
    ///
    /// * `user_id` - 切断する ID
    /// * `connection_id` - 切断するセッションの接続 ID
    ///
    /// # Returns
    ///
    /// * `Ok(DeliveryReport)` - user_left 通知の配信結果
    /// * `Err(DisconnectError)` - 登録がない、または別の接続に紐づいている
    pub async fn execute(
        &self,
        user_id: &UserId,
        connection_id: ConnectionId,
    ) -> Result<DeliveryReport, DisconnectError> {
        // 1. Registry から削除（この接続に紐づいている場合のみ）
        if self.registry.remove(user_id, connection_id).await.is_none() {
            return Err(match self.registry.lookup(user_id).await {
                Some(_) => DisconnectError::BoundToOtherConnection(user_id.clone()),
                None => DisconnectError::NotRegistered(user_id.clone()),
            });
        }
        tracing::info!(
            "Client disconnected: {} with user_id: {}",
            connection_id,
            user_id
        );

        // 2. 残りの参加者に user_left を通知
        let notified = BroadcastMessageUseCase::new(self.registry.clone())
            .notify_all(&ServerMessage::user_left(user_id.as_str()), user_id)
            .await;
        tracing::info!("Remaining participants: {}", self.registry.count().await);

        Ok(notified)
    }
}
