use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};

use application::{ApplicationError, GlobalStats, RoomStatsDto};
use domain::{DomainError, RoomId};

use crate::{error::ApiError, state::AppState};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/stats", get(global_stats))
        .route("/rooms/{room_id}/stats", get(room_stats))
}

/// 全局统计：房间数、在线客户端数、增量总数、待发消息数
async fn global_stats(State(state): State<AppState>) -> Json<GlobalStats> {
    Json(state.collab.global_stats().await)
}

/// 单个房间统计；房间不存在时返回 404
async fn room_stats(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
) -> Result<Json<RoomStatsDto>, ApiError> {
    let room_id = RoomId::from(room_id);
    let stats = state.collab.room_stats(&room_id).await;
    if !stats.exists {
        return Err(ApplicationError::from(DomainError::room_not_found(&room_id)).into());
    }
    Ok(Json(RoomStatsDto::new(room_id, stats)))
}
