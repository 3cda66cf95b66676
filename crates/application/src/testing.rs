//! 测试替身
//!
//! 记录所有发送内容的出站句柄，供本 crate 及上层 crate 的测试使用。

use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use domain::{DeliveryError, OutboundHandle};
use serde_json::Value;

/// 一次发送
#[derive(Debug, Clone, PartialEq)]
pub enum Sent {
    Text(String),
    Batch(Vec<String>),
}

/// 记录发送内容的句柄；`failing` 模式下所有发送都返回错误
#[derive(Debug, Default)]
pub struct RecordingHandle {
    sent: Mutex<Vec<Sent>>,
    failing: bool,
}

impl RecordingHandle {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            sent: Mutex::new(Vec::new()),
            failing: true,
        })
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// 按发送顺序展开的全部消息
    pub fn messages(&self) -> Vec<Value> {
        self.sent()
            .into_iter()
            .flat_map(|sent| match sent {
                Sent::Text(text) => vec![text],
                Sent::Batch(batch) => batch,
            })
            .filter_map(|payload| serde_json::from_str(&payload).ok())
            .collect()
    }

    pub fn message_types(&self) -> Vec<String> {
        self.messages()
            .iter()
            .filter_map(|message| message["type"].as_str().map(str::to_owned))
            .collect()
    }

    pub fn batch_count(&self) -> usize {
        self.sent()
            .iter()
            .filter(|sent| matches!(sent, Sent::Batch(_)))
            .count()
    }

    pub fn clear(&self) {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    fn record(&self, sent: Sent) -> Result<(), DeliveryError> {
        if self.failing {
            return Err(DeliveryError::Closed("recording handle is failing".to_string()));
        }
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(sent);
        Ok(())
    }
}

#[async_trait]
impl OutboundHandle for RecordingHandle {
    async fn send_text(&self, payload: String) -> Result<(), DeliveryError> {
        self.record(Sent::Text(payload))
    }

    async fn send_batch(&self, payloads: Vec<String>) -> Result<(), DeliveryError> {
        self.record(Sent::Batch(payloads))
    }
}

/// 发送批量消息时直接 panic 的句柄，用于验证刷新循环的故障隔离
#[derive(Debug, Default)]
pub struct PanickingHandle;

#[async_trait]
impl OutboundHandle for PanickingHandle {
    async fn send_text(&self, _payload: String) -> Result<(), DeliveryError> {
        Ok(())
    }

    async fn send_batch(&self, _payloads: Vec<String>) -> Result<(), DeliveryError> {
        panic!("outbound handle panicked");
    }
}
