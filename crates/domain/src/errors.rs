//! 领域模型错误定义

use thiserror::Error;

use crate::value_objects::{ClientId, RoomId};

/// 领域模型错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    /// 客户端未注册
    #[error("client not found: {client_id}")]
    ClientNotFound { client_id: ClientId },

    /// 客户端ID已被在线连接占用
    #[error("client already registered: {client_id}")]
    ClientAlreadyRegistered { client_id: ClientId },

    /// 房间不存在
    #[error("room not found: {room_id}")]
    RoomNotFound { room_id: RoomId },
}

impl DomainError {
    pub fn client_not_found(client_id: &ClientId) -> Self {
        Self::ClientNotFound {
            client_id: client_id.clone(),
        }
    }

    pub fn client_already_registered(client_id: &ClientId) -> Self {
        Self::ClientAlreadyRegistered {
            client_id: client_id.clone(),
        }
    }

    pub fn room_not_found(room_id: &RoomId) -> Self {
        Self::RoomNotFound {
            room_id: room_id.clone(),
        }
    }
}

/// 领域模型结果类型
pub type DomainResult<T> = Result<T, DomainError>;
