use domain::{RoomId, RoomStats};
use serde::{Deserialize, Serialize};

/// 全局统计信息
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalStats {
    pub room_count: usize,
    pub total_clients: usize,
    pub total_deltas: usize,
    pub pending_messages: usize,
    pub rooms: Vec<RoomId>,
}

/// 单个房间的统计信息（带房间ID）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomStatsDto {
    pub room_id: RoomId,
    #[serde(flatten)]
    pub stats: RoomStats,
}

impl RoomStatsDto {
    pub fn new(room_id: RoomId, stats: RoomStats) -> Self {
        Self { room_id, stats }
    }
}
