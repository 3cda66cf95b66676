//! WebSocket 协议消息
//!
//! 客户端消息与服务器消息都是以 `type` 字段区分的 JSON 对象。
//! 一个文本帧可以携带单个对象，也可以携带对象数组（按数组顺序处理）。

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::entities::client::ClientInfo;
use crate::entities::document::{Delta, DeltaPayload};
use crate::value_objects::{ClientId, RoomId};

/// 客户端消息
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", deny_unknown_fields)]
pub enum ClientMessage {
    /// 加入房间，会话的第一条消息
    Connect {
        /// 房间ID
        room_id: RoomId,
        /// 显示名称
        name: String,
        /// 重连时沿用的客户端ID
        #[serde(default, skip_serializing_if = "Option::is_none")]
        client_id: Option<ClientId>,
    },
    /// 提交一批编辑增量
    Update {
        deltas: Vec<DeltaPayload>,
    },
    /// 光标位置
    Cursor {
        ln: i64,
        pos: i64,
    },
    /// 输入状态
    Typing {
        is_typing: bool,
    },
    /// 请求某个序列号之后的增量；负数表示从头回放
    InputRequest {
        last_message_id: i64,
    },
    /// 请求文档完整快照
    InitialDumpRequest {},
}

const CLIENT_MESSAGE_TYPES: &[&str] = &[
    "connect",
    "update",
    "cursor",
    "typing",
    "input_request",
    "initial_dump_request",
];

impl ClientMessage {
    /// 校验一条已解析的 JSON 值并转换为类型化消息
    pub fn validate(value: Value) -> Result<Self, ProtocolError> {
        let Value::Object(ref fields) = value else {
            return Err(ProtocolError::InvalidMessage(
                "message must be a JSON object".to_string(),
            ));
        };

        let message_type = match fields.get("type") {
            Some(Value::String(message_type)) => message_type.clone(),
            Some(_) => {
                return Err(ProtocolError::InvalidMessage(
                    "type must be a string".to_string(),
                ))
            }
            None => {
                return Err(ProtocolError::InvalidMessage(
                    "missing type field".to_string(),
                ))
            }
        };

        if !CLIENT_MESSAGE_TYPES.contains(&message_type.as_str()) {
            return Err(ProtocolError::UnknownType(message_type));
        }

        let message: ClientMessage = serde_json::from_value(value)
            .map_err(|e| ProtocolError::InvalidMessage(format!("{message_type}: {e}")))?;

        if let ClientMessage::Connect {
            room_id, client_id, ..
        } = &message
        {
            if room_id.as_str().trim().is_empty() {
                return Err(ProtocolError::InvalidMessage(
                    "connect: room_id cannot be empty".to_string(),
                ));
            }
            if client_id.as_ref().is_some_and(|id| id.as_str().is_empty()) {
                return Err(ProtocolError::InvalidMessage(
                    "connect: client_id cannot be empty".to_string(),
                ));
            }
        }

        Ok(message)
    }

    /// 协议中的类型名
    pub fn message_type(&self) -> &'static str {
        match self {
            ClientMessage::Connect { .. } => "connect",
            ClientMessage::Update { .. } => "update",
            ClientMessage::Cursor { .. } => "cursor",
            ClientMessage::Typing { .. } => "typing",
            ClientMessage::InputRequest { .. } => "input_request",
            ClientMessage::InitialDumpRequest {} => "initial_dump_request",
        }
    }
}

/// 解码一个文本帧
///
/// 帧内所有消息都通过校验才会返回；任意一条失败则整帧作废。
pub fn decode_frame(text: &str) -> Result<Vec<ClientMessage>, ProtocolError> {
    let value: Value =
        serde_json::from_str(text).map_err(|e| ProtocolError::MalformedFrame(e.to_string()))?;

    let items = match value {
        Value::Array(items) => items,
        other => vec![other],
    };

    items.into_iter().map(ClientMessage::validate).collect()
}

/// 服务器消息
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// 连接确认，携带分配的客户端ID
    ConnectAck { client_id: ClientId },
    /// 新成员（完整花名册或单个条目）
    #[serde(rename = "addclient")]
    AddClient { clients: Vec<ClientInfo> },
    /// 成员离开
    #[serde(rename = "removeclient")]
    RemoveClient { clients: Vec<ClientInfo> },
    /// 其他成员的光标位置
    CursorUpdate {
        client_id: ClientId,
        ln: i64,
        pos: i64,
    },
    /// 其他成员的输入状态
    TypingIndicator { client_id: ClientId, typing: bool },
    /// 其他成员提交的增量
    Update {
        client_id: ClientId,
        deltas: Vec<Delta>,
    },
    /// input_request 的应答
    InputResponse {
        deltas: Vec<Delta>,
        last_message_id: u64,
    },
    /// initial_dump_request 的应答
    InitialDump {
        content: String,
        last_message_id: u64,
    },
}

impl ServerMessage {
    /// 序列化为JSON字符串
    pub fn to_json(&self) -> Result<String, ProtocolError> {
        serde_json::to_string(self).map_err(|e| ProtocolError::Serialization(e.to_string()))
    }

    /// 从JSON字符串反序列化
    pub fn from_json(json: &str) -> Result<Self, ProtocolError> {
        serde_json::from_str(json).map_err(|e| ProtocolError::MalformedFrame(e.to_string()))
    }

    pub fn message_type(&self) -> &'static str {
        match self {
            ServerMessage::ConnectAck { .. } => "connect_ack",
            ServerMessage::AddClient { .. } => "addclient",
            ServerMessage::RemoveClient { .. } => "removeclient",
            ServerMessage::CursorUpdate { .. } => "cursor_update",
            ServerMessage::TypingIndicator { .. } => "typing_indicator",
            ServerMessage::Update { .. } => "update",
            ServerMessage::InputResponse { .. } => "input_response",
            ServerMessage::InitialDump { .. } => "initial_dump",
        }
    }
}

/// 协议错误类型
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProtocolError {
    /// 帧不是合法的JSON
    #[error("Invalid JSON format: {0}")]
    MalformedFrame(String),
    /// 未知的消息类型
    #[error("Unknown message type: {0}")]
    UnknownType(String),
    /// 字段缺失或类型错误
    #[error("Invalid message format: {0}")]
    InvalidMessage(String),
    /// 当前会话状态不接受该消息
    #[error("Unexpected message in current state: {0}")]
    OutOfSequence(String),
    /// 序列化失败
    #[error("Serialization failed: {0}")]
    Serialization(String),
}
