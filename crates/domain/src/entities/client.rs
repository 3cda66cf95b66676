//! 客户端实体定义

use serde::{Deserialize, Serialize};

use crate::value_objects::{ClientId, RoomId};

/// 已连接的协作参与者
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Client {
    /// 客户端ID
    pub id: ClientId,
    /// 显示名称
    pub name: String,
    /// 所在房间
    pub room_id: RoomId,
}

impl Client {
    pub fn new(id: ClientId, name: impl Into<String>, room_id: RoomId) -> Self {
        Self {
            id,
            name: name.into(),
            room_id,
        }
    }

    /// 协议中使用的客户端摘要
    pub fn info(&self) -> ClientInfo {
        ClientInfo {
            client_id: self.id.clone(),
            name: self.name.clone(),
        }
    }
}

/// 花名册条目（addclient / removeclient 消息中使用）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientInfo {
    pub client_id: ClientId,
    pub name: String,
}

impl ClientInfo {
    /// 离开通知只携带ID，名称留空
    pub fn departed(client_id: ClientId) -> Self {
        Self {
            client_id,
            name: String::new(),
        }
    }
}
