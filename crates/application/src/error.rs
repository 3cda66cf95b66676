use domain::{DeliveryError, DomainError, ProtocolError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApplicationError {
    #[error("domain error: {0}")]
    Domain(#[from] DomainError),
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),
    #[error("delivery error: {0}")]
    Delivery(#[from] DeliveryError),
    #[error("flush cycle failed: {0}")]
    Flush(String),
}

impl ApplicationError {
    /// 创建刷新周期错误
    pub fn flush(message: impl Into<String>) -> Self {
        ApplicationError::Flush(message.into())
    }

    /// 会话状态不接受该消息
    pub fn out_of_sequence(message_type: &str) -> Self {
        ApplicationError::Protocol(ProtocolError::OutOfSequence(message_type.to_string()))
    }
}
