//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{Json, extract::State};
use hiroba_shared::time::timestamp_to_jst_rfc3339;

use crate::{
    infrastructure::dto::http::{HealthDto, ParticipantDto},
    ui::state::AppState,
};

/// Health check endpoint
pub async fn health_check() -> Json<HealthDto> {
    Json(HealthDto {
        status: "ok".to_string(),
    })
}

/// List of identities currently online, in join order
pub async fn get_participants(State(state): State<Arc<AppState>>) -> Json<Vec<ParticipantDto>> {
    let participants = state
        .registry
        .snapshot()
        .await
        .into_iter()
        .map(|p| ParticipantDto {
            user_id: p.user_id.into_string(),
            connected_at: timestamp_to_jst_rfc3339(p.connected_at.value()),
        })
        .collect();

    Json(participants)
}
