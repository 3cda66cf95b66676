//! 出站发送接口
//!
//! 领域层只关心“把已序列化的消息交给某个客户端”，具体的传输（WebSocket 写任务、
//! 测试桩等）由上层注入。

use std::sync::Arc;

use async_trait::async_trait;

/// 单个客户端的出站句柄
#[async_trait]
pub trait OutboundHandle: Send + Sync {
    /// 立即发送一条消息（连接握手时使用）
    async fn send_text(&self, payload: String) -> Result<(), DeliveryError>;

    /// 作为一个整体发送一批消息（一次刷新周期内该客户端的全部待发消息）
    async fn send_batch(&self, payloads: Vec<String>) -> Result<(), DeliveryError>;
}

/// 共享的出站句柄
pub type ClientHandle = Arc<dyn OutboundHandle>;

/// 消息投递错误
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DeliveryError {
    /// 连接已关闭
    #[error("Connection closed: {0}")]
    Closed(String),
    /// 发送失败
    #[error("Failed to send message: {0}")]
    SendFailed(String),
}
