//! UseCase 層のエラー定義

use thiserror::Error;

use crate::domain::UserId;

/// ブロードキャストのエラー
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BroadcastError {
    /// 送信者がこの接続で登録されていない
    #[error("Sender {0} not registered. Ignoring broadcast.")]
    SenderNotRegistered(String),
}

/// 参加者切断のエラー
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DisconnectError {
    /// ID が Registry に存在しない
    #[error("Client with user_id: {0} not found in clients")]
    NotRegistered(UserId),

    /// ID が別の接続に紐づいている（重複ログインで置き換え済み）
    #[error("user_id {0} is bound to another connection")]
    BoundToOtherConnection(UserId),
}
