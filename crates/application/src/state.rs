//! 共享协作状态
//!
//! 注册表、房间存储和出站队列放在同一把 `tokio::sync::Mutex` 之后，
//! 所有连接任务与刷新任务共享一个 `Arc<CollabState>`。
//! 锁内只做内存操作和消息序列化，网络发送一律在释放锁之后进行。

use std::collections::HashMap;

use config::RoomConfig;
use domain::{
    Client, ClientHandle, ClientId, ClientInfo, Delta, DeltaPayload, DomainResult, RoomId,
    RoomStats, ServerMessage,
};
use tokio::sync::Mutex;

use crate::dto::GlobalStats;
use crate::error::ApplicationError;
use crate::outbound::OutboundQueue;
use crate::registry::ClientRegistry;
use crate::rooms::RoomStore;

#[derive(Debug, Default)]
struct StateInner {
    registry: ClientRegistry,
    rooms: RoomStore,
    queue: OutboundQueue,
}

impl StateInner {
    /// 把同一份消息排队给房间内除发送者外的所有成员
    fn fan_out(&mut self, room_id: &RoomId, sender: &ClientId, payload: &str) -> usize {
        let recipients = self.rooms.others(room_id, sender);
        for recipient in &recipients {
            self.queue.enqueue(recipient, payload.to_owned());
        }
        recipients.len()
    }
}

/// 加入房间的结果
#[derive(Debug, Clone)]
pub struct JoinOutcome {
    /// 加入后的完整花名册（包含加入者本人）
    pub roster: Vec<ClientInfo>,
    /// 房间是否因本次加入而创建
    pub room_created: bool,
}

/// 离开房间的结果
#[derive(Debug, Clone)]
pub struct LeaveOutcome {
    pub client: Client,
    /// 房间是否因本次离开而删除
    pub room_deleted: bool,
}

/// 提交增量的结果
#[derive(Debug, Clone)]
pub struct UpdateOutcome {
    pub message_ids: Vec<u64>,
    pub recipients: usize,
}

/// 一个客户端在本次刷新中的待发消息
#[derive(Clone)]
pub struct PendingBatch {
    pub client_id: ClientId,
    pub handle: ClientHandle,
    pub payloads: Vec<String>,
}

/// 一次取出的结果
#[derive(Default)]
pub struct DrainedBatches {
    pub batches: Vec<PendingBatch>,
    /// 已离线客户端的消息数，这些消息被丢弃
    pub skipped_messages: usize,
}

pub struct CollabState {
    inner: Mutex<StateInner>,
    default_content: String,
}

impl Default for CollabState {
    fn default() -> Self {
        Self::new(&RoomConfig::default())
    }
}

impl CollabState {
    pub fn new(room_config: &RoomConfig) -> Self {
        Self::with_default_content(room_config.default_document_content.clone())
    }

    pub fn with_default_content(default_content: impl Into<String>) -> Self {
        Self {
            inner: Mutex::new(StateInner::default()),
            default_content: default_content.into(),
        }
    }

    pub fn default_content(&self) -> &str {
        &self.default_content
    }

    // ---- 客户端注册表 ----

    pub async fn lookup_client(&self, client_id: &ClientId) -> Option<Client> {
        let inner = self.inner.lock().await;
        inner
            .registry
            .lookup(client_id)
            .map(|registered| registered.client.clone())
    }

    pub async fn is_registered(&self, client_id: &ClientId) -> bool {
        self.inner.lock().await.registry.contains(client_id)
    }

    // ---- 房间 ----

    pub async fn room_exists(&self, room_id: &RoomId) -> bool {
        self.inner.lock().await.rooms.contains(room_id)
    }

    pub async fn member_count(&self, room_id: &RoomId) -> usize {
        self.inner.lock().await.rooms.member_count(room_id)
    }

    // ---- 文档与增量 ----

    pub async fn deltas_since(&self, room_id: &RoomId, since_id: u64) -> Vec<Delta> {
        self.inner.lock().await.rooms.deltas_since(room_id, since_id)
    }

    pub async fn set_content(&self, room_id: &RoomId, content: impl Into<String>) -> DomainResult<()> {
        self.inner.lock().await.rooms.set_content(room_id, content)
    }

    pub async fn last_message_id(&self, room_id: &RoomId) -> u64 {
        self.inner.lock().await.rooms.last_message_id(room_id)
    }

    /// 同时读取文档内容与最新序列号，保证两者一致
    pub async fn snapshot(&self, room_id: &RoomId) -> (String, u64) {
        let mut inner = self.inner.lock().await;
        let content = inner.rooms.get_content(room_id, &self.default_content);
        (content, inner.rooms.last_message_id(room_id))
    }

    /// 同时读取增量与最新序列号
    pub async fn replay(&self, room_id: &RoomId, since_id: u64) -> (Vec<Delta>, u64) {
        let inner = self.inner.lock().await;
        (
            inner.rooms.deltas_since(room_id, since_id),
            inner.rooms.last_message_id(room_id),
        )
    }

    // ---- 出站队列 ----

    pub async fn enqueue(&self, client_id: &ClientId, payload: String) {
        self.inner.lock().await.queue.enqueue(client_id, payload);
    }

    pub async fn pending_total(&self) -> usize {
        self.inner.lock().await.queue.pending_total()
    }

    pub async fn drain_all(&self) -> HashMap<ClientId, Vec<String>> {
        self.inner.lock().await.queue.drain_all()
    }

    /// 取出全部待发消息并解析出站句柄；已离线客户端的消息直接丢弃
    pub async fn take_batches(&self) -> DrainedBatches {
        let mut inner = self.inner.lock().await;
        let drained = inner.queue.drain_all();

        let mut result = DrainedBatches::default();
        for (client_id, payloads) in drained {
            match inner.registry.lookup(&client_id) {
                Some(registered) => result.batches.push(PendingBatch {
                    handle: registered.handle.clone(),
                    client_id,
                    payloads,
                }),
                None => result.skipped_messages += payloads.len(),
            }
        }
        result
    }

    // ---- 组合操作 ----

    /// 注册客户端并加入房间，返回加入后的花名册
    ///
    /// 注册和入房在同一临界区内完成，其他任务不会看到只完成一半的状态。
    pub async fn join(&self, client: Client, handle: ClientHandle) -> DomainResult<JoinOutcome> {
        let mut inner = self.inner.lock().await;
        let room_id = client.room_id.clone();

        inner.registry.register(client.clone(), handle)?;
        let room_created = !inner.rooms.contains(&room_id);
        inner.rooms.add_member(client);

        let roster = inner
            .rooms
            .get(&room_id)
            .map(|room| room.roster())
            .unwrap_or_default();

        Ok(JoinOutcome {
            roster,
            room_created,
        })
    }

    /// 注销客户端并离开房间
    pub async fn leave(&self, client_id: &ClientId) -> DomainResult<LeaveOutcome> {
        let mut inner = self.inner.lock().await;
        let client = inner.registry.unregister(client_id)?.client;
        let room_deleted = inner.rooms.remove_member(&client.room_id, client_id);

        Ok(LeaveOutcome {
            client,
            room_deleted,
        })
    }

    /// 排队给房间内除发送者外的所有成员，返回接收者数量
    pub async fn broadcast(&self, room_id: &RoomId, sender: &ClientId, payload: &str) -> usize {
        self.inner.lock().await.fan_out(room_id, sender, payload)
    }

    /// 追加一批增量并排队 `update` 给其他成员
    ///
    /// 序列号分配与排队在同一临界区内，其他成员收到的 update 顺序与序列号顺序一致。
    pub async fn submit_update(
        &self,
        client: &Client,
        payloads: Vec<DeltaPayload>,
    ) -> Result<UpdateOutcome, ApplicationError> {
        let mut inner = self.inner.lock().await;
        let deltas = inner
            .rooms
            .append_deltas(&client.room_id, &client.id, payloads)?;
        let message_ids: Vec<u64> = deltas.iter().map(|delta| delta.message_id).collect();

        let payload = ServerMessage::Update {
            client_id: client.id.clone(),
            deltas,
        }
        .to_json()?;
        let recipients = inner.fan_out(&client.room_id, &client.id, &payload);

        Ok(UpdateOutcome {
            message_ids,
            recipients,
        })
    }

    // ---- 统计 ----

    pub async fn room_stats(&self, room_id: &RoomId) -> RoomStats {
        self.inner.lock().await.rooms.stats(room_id)
    }

    pub async fn global_stats(&self) -> GlobalStats {
        let inner = self.inner.lock().await;
        GlobalStats {
            room_count: inner.rooms.len(),
            total_clients: inner.registry.len(),
            total_deltas: inner
                .rooms
                .rooms()
                .map(|room| room.document().delta_count())
                .sum(),
            pending_messages: inner.queue.pending_total(),
            rooms: inner.rooms.room_ids(),
        }
    }
}
