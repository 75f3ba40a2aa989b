//! UseCase 層
//!
//! 中継のビジネスロジックを実装するレイヤー。
//! UI 層から呼び出され、Domain 層を操作します。

pub mod broadcast_message;
pub mod connect_participant;
pub mod disconnect_participant;
pub mod error;
pub mod session;

pub use broadcast_message::{BroadcastMessageUseCase, DeliveryReport};
pub use connect_participant::{ConnectOutcome, ConnectParticipantUseCase};
pub use disconnect_participant::DisconnectParticipantUseCase;
pub use error::{BroadcastError, DisconnectError};
pub use session::{Session, SessionControl, SessionState};
