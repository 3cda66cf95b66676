//! 文档与增量日志
//!
//! 服务器不解析、不合并增量内容，只负责分配单调递增的序列号并按序回放。

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::value_objects::ClientId;

/// 客户端提交的原始编辑操作（不透明 JSON 对象）
pub type DeltaPayload = Map<String, Value>;

/// 带服务器戳记的增量
///
/// 序列化时戳记字段与原始载荷平铺在同一个对象中。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Delta {
    /// 房间内序列号，从 1 开始
    pub message_id: u64,
    /// 提交者
    pub client_id: ClientId,
    /// 原始载荷
    #[serde(flatten)]
    pub payload: DeltaPayload,
}

impl Delta {
    /// 为载荷加盖戳记；载荷中同名的 `message_id` / `client_id` 会被服务器值覆盖
    pub fn stamp(message_id: u64, client_id: ClientId, mut payload: DeltaPayload) -> Self {
        payload.remove("message_id");
        payload.remove("client_id");
        Self {
            message_id,
            client_id,
            payload,
        }
    }
}

/// 房间文档状态
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    content: String,
    last_message_id: u64,
    deltas: Vec<Delta>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加一条增量，返回分配的序列号
    pub fn append(&mut self, client_id: &ClientId, payload: DeltaPayload) -> &Delta {
        self.last_message_id += 1;
        self.deltas
            .push(Delta::stamp(self.last_message_id, client_id.clone(), payload));
        &self.deltas[self.deltas.len() - 1]
    }

    /// 返回序列号严格大于 `since_id` 的全部增量（升序）
    pub fn deltas_since(&self, since_id: u64) -> Vec<Delta> {
        let start = self
            .deltas
            .partition_point(|delta| delta.message_id <= since_id);
        self.deltas[start..].to_vec()
    }

    pub fn last_message_id(&self) -> u64 {
        self.last_message_id
    }

    pub fn delta_count(&self) -> usize {
        self.deltas.len()
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn set_content(&mut self, content: impl Into<String>) {
        self.content = content.into();
    }

    /// 内容为空时写入默认内容，返回当前内容
    pub fn seed_content(&mut self, default_content: &str) -> &str {
        if self.content.is_empty() {
            self.content = default_content.to_owned();
        }
        &self.content
    }
}
