//! 连接会话状态机
//!
//! 每个 WebSocket 连接对应一个 [`Session`]：
//!
//! ```text
//! Unbound --connect--> Bound --违规/处理错误/断开--> Closed
//! ```
//!
//! 会话只消费文本帧，返回 [`SessionControl`] 告诉传输层是否需要关闭连接。

use std::sync::Arc;

use domain::{decode_frame, Client, ClientHandle, ClientMessage, DomainError, ProtocolError};
use tracing::{debug, error, warn};

use crate::error::ApplicationError;
use crate::handlers::{self, ConnectRequest};
use crate::state::CollabState;

/// 会话阶段
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionPhase {
    /// 等待 connect
    Unbound,
    /// 已加入房间
    Bound(Client),
    /// 终态
    Closed,
}

/// WebSocket 关闭码与原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CloseReason {
    pub code: u16,
    pub reason: &'static str,
}

impl CloseReason {
    pub const NORMAL: Self = Self::new(1000, "Session closed");
    pub const INVALID_JSON: Self = Self::new(1003, "Invalid JSON format");
    pub const UNKNOWN_TYPE: Self = Self::new(1003, "Unknown message type");
    pub const INVALID_MESSAGE: Self = Self::new(1003, "Invalid message format");
    pub const UNEXPECTED_MESSAGE: Self = Self::new(1003, "Unexpected message type");
    pub const CLIENT_ID_IN_USE: Self = Self::new(1008, "Client ID already in use");
    pub const INTERNAL_ERROR: Self = Self::new(1011, "Internal server error");

    const fn new(code: u16, reason: &'static str) -> Self {
        Self { code, reason }
    }

    /// 错误对应的关闭原因：协议违规 1003，ID 冲突 1008，其余 1011
    pub fn for_error(err: &ApplicationError) -> Self {
        match err {
            ApplicationError::Protocol(ProtocolError::MalformedFrame(_)) => Self::INVALID_JSON,
            ApplicationError::Protocol(ProtocolError::UnknownType(_)) => Self::UNKNOWN_TYPE,
            ApplicationError::Protocol(ProtocolError::InvalidMessage(_)) => Self::INVALID_MESSAGE,
            ApplicationError::Protocol(ProtocolError::OutOfSequence(_)) => Self::UNEXPECTED_MESSAGE,
            ApplicationError::Domain(DomainError::ClientAlreadyRegistered { .. }) => {
                Self::CLIENT_ID_IN_USE
            }
            _ => Self::INTERNAL_ERROR,
        }
    }
}

/// 处理一帧后的指示
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionControl {
    Continue,
    Close(CloseReason),
}

pub struct Session {
    state: Arc<CollabState>,
    handle: ClientHandle,
    phase: SessionPhase,
}

impl Session {
    pub fn new(state: Arc<CollabState>, handle: ClientHandle) -> Self {
        Self {
            state,
            handle,
            phase: SessionPhase::Unbound,
        }
    }

    pub fn phase(&self) -> &SessionPhase {
        &self.phase
    }

    pub fn client(&self) -> Option<&Client> {
        match &self.phase {
            SessionPhase::Bound(client) => Some(client),
            _ => None,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.phase == SessionPhase::Closed
    }

    /// 处理一个文本帧
    ///
    /// 整帧先完成解码和校验，任何一条消息无效都不会执行帧内的其他消息。
    pub async fn handle_frame(&mut self, text: &str) -> SessionControl {
        if self.is_closed() {
            return SessionControl::Close(CloseReason::NORMAL);
        }

        let messages = match decode_frame(text) {
            Ok(messages) => messages,
            Err(err) => {
                warn!(client_id = ?self.client().map(|c| c.id.as_str()), error = %err, "Rejected frame");
                return self.fail(ApplicationError::from(err)).await;
            }
        };

        for message in messages {
            debug!(
                client_id = ?self.client().map(|c| c.id.as_str()),
                message_type = message.message_type(),
                "Received message"
            );
            if let Err(err) = self.dispatch(message).await {
                return self.fail(err).await;
            }
        }

        SessionControl::Continue
    }

    /// 结束会话；已加入房间时执行离开清理。重复调用无副作用。
    pub async fn close(&mut self) {
        let phase = std::mem::replace(&mut self.phase, SessionPhase::Closed);
        if let SessionPhase::Bound(client) = phase {
            if let Err(err) = handlers::handle_disconnect(&self.state, &client).await {
                error!(client_id = %client.id, error = %err, "Failed to clean up session");
            }
        }
    }

    async fn fail(&mut self, err: ApplicationError) -> SessionControl {
        let reason = CloseReason::for_error(&err);
        if reason == CloseReason::INTERNAL_ERROR {
            error!(client_id = ?self.client().map(|c| c.id.as_str()), error = %err, "Error processing message");
        } else {
            warn!(
                client_id = ?self.client().map(|c| c.id.as_str()),
                error = %err,
                close_code = reason.code,
                "Closing session"
            );
        }
        self.close().await;
        SessionControl::Close(reason)
    }

    async fn dispatch(&mut self, message: ClientMessage) -> Result<(), ApplicationError> {
        let client = match &self.phase {
            SessionPhase::Bound(client) => client.clone(),
            SessionPhase::Unbound => return self.bind(message).await,
            SessionPhase::Closed => {
                return Err(ApplicationError::out_of_sequence(message.message_type()))
            }
        };

        let state = &self.state;
        match message {
            ClientMessage::Connect { .. } => {
                return Err(ApplicationError::out_of_sequence("connect"));
            }
            ClientMessage::Update { deltas } => {
                handlers::handle_update(state, &client, deltas).await?;
            }
            ClientMessage::Cursor { ln, pos } => {
                handlers::handle_cursor(state, &client, ln, pos).await?;
            }
            ClientMessage::Typing { is_typing } => {
                handlers::handle_typing(state, &client, is_typing).await?;
            }
            ClientMessage::InputRequest { last_message_id } => {
                handlers::handle_input_request(state, &client, last_message_id).await?;
            }
            ClientMessage::InitialDumpRequest {} => {
                handlers::handle_initial_dump_request(state, &client).await?;
            }
        }
        Ok(())
    }

    async fn bind(&mut self, message: ClientMessage) -> Result<(), ApplicationError> {
        let request = match message {
            ClientMessage::Connect {
                room_id,
                name,
                client_id,
            } => ConnectRequest {
                room_id,
                name,
                client_id,
            },
            other => return Err(ApplicationError::out_of_sequence(other.message_type())),
        };
        let client = handlers::handle_connect(&self.state, self.handle.clone(), request).await?;
        self.phase = SessionPhase::Bound(client);
        Ok(())
    }
}
