//! UseCase: ブロードキャスト（fan-out）処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - BroadcastMessageUseCase::execute() と notify_all()
//!
//! ### なぜこのテストが必要か
//! - 送信者以外の全員に 1 通ずつ届くことを保証
//! - 1 人への送信失敗が残りの配信を止めないこと（失敗の分離）を保証
//! - 未登録の送信者からのブロードキャストが無視されることを確認
//!
//! ### どのような状況を想定しているか
//! - 正常系：3 人の部屋でのブロードキャスト
//! - 異常系：未登録の送信者、置き換え済みの接続からの送信
//! - エッジケース：受信者の 1 人の接続が既に閉じている

use std::sync::Arc;

use crate::{
    domain::{ConnectionId, ConnectionRegistry, UserId},
    infrastructure::dto::websocket::ServerMessage,
};

use super::error::BroadcastError;

/// fan-out の結果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    /// キューに積めた受信者
    pub delivered: Vec<UserId>,
    /// 接続が閉じていて積めなかった受信者
    pub failed: Vec<UserId>,
}

/// ブロードキャストのユースケース
pub struct BroadcastMessageUseCase {
    /// Registry（データアクセス層の抽象化）
    registry: Arc<dyn ConnectionRegistry>,
}

impl BroadcastMessageUseCase {
    /// 新しい BroadcastMessageUseCase を作成
    pub fn new(registry: Arc<dyn ConnectionRegistry>) -> Self {
        Self { registry }
    }

    /// 送信者以外の全員に `{from, message}` を中継する
    ///
    /// # Arguments
    ///
    /// * `sender` - 送信者の ID
    /// * `connection_id` - 送信者の接続 ID（Registry 上の紐づけと一致する必要がある）
    /// * `payload` - 中継する内容
    ///
    /// # Returns
    ///
    /// * `Ok(DeliveryReport)` - 配信結果
    /// * `Err(BroadcastError)` - 送信者が未登録
    pub async fn execute(
        &self,
        sender: &UserId,
        connection_id: ConnectionId,
        payload: &str,
    ) -> Result<DeliveryReport, BroadcastError> {
        if self.registry.lookup(sender).await != Some(connection_id) {
            return Err(BroadcastError::SenderNotRegistered(sender.to_string()));
        }

        tracing::info!("Broadcasting message from {}: {}", sender, payload);
        let relay = ServerMessage::relay(sender.as_str(), payload);
        Ok(self.notify_all(&relay, sender).await)
    }

    /// `exclude` 以外の全員にメッセージを送る
    ///
    /// 受信者ごとに送信結果を扱い、失敗しても残りの受信者への配信を続ける。
    /// 失敗した受信者の登録解除は行わない（その接続のセッションが後始末する）。
    pub async fn notify_all(&self, message: &ServerMessage, exclude: &UserId) -> DeliveryReport {
        let text = match message.encode() {
            Ok(text) => text,
            Err(e) => {
                tracing::error!("Failed to encode outbound message: {}", e);
                return DeliveryReport::default();
            }
        };

        let mut report = DeliveryReport::default();
        for recipient in self.registry.recipients(exclude).await {
            match recipient.mailbox.send_text(text.clone()) {
                Ok(()) => report.delivered.push(recipient.user_id),
                Err(e) => {
                    tracing::warn!("Error sending message to {}: {}", recipient.user_id, e);
                    report.failed.push(recipient.user_id);
                }
            }
        }
        report
    }
}
