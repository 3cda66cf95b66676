//! 领域实体定义
//!
//! 包含协作服务的核心实体：客户端、房间、文档与增量，以及 WebSocket 协议消息。

pub mod client;
pub mod document;
pub mod room;
pub mod websocket;

// 重新导出核心实体
pub use client::{Client, ClientInfo};
pub use document::{Delta, DeltaPayload, Document};
pub use room::{Room, RoomStats};
pub use websocket::{decode_frame, ClientMessage, ProtocolError, ServerMessage};
