//! 房间实体定义
//!
//! 房间没有独立的生命周期：第一个成员加入时创建，最后一个成员离开时删除，
//! 文档和增量历史随房间一起丢弃。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entities::client::{Client, ClientInfo};
use crate::entities::document::Document;
use crate::value_objects::{ClientId, RoomId};

/// 协作房间
#[derive(Debug, Clone)]
pub struct Room {
    /// 房间ID
    pub room_id: RoomId,
    /// 成员列表（按加入顺序，ID唯一）
    members: Vec<Client>,
    /// 共享文档
    document: Document,
    /// 创建时间
    pub created_at: DateTime<Utc>,
}

impl Room {
    pub fn new(room_id: RoomId) -> Self {
        Self {
            room_id,
            members: Vec::new(),
            document: Document::new(),
            created_at: Utc::now(),
        }
    }

    /// 加入成员；同一ID重复加入时不做改动，返回是否新增
    pub fn add_member(&mut self, client: Client) -> bool {
        if self.contains(&client.id) {
            return false;
        }
        self.members.push(client);
        true
    }

    /// 移除成员，返回被移除的客户端
    pub fn remove_member(&mut self, client_id: &ClientId) -> Option<Client> {
        let index = self.members.iter().position(|m| &m.id == client_id)?;
        Some(self.members.remove(index))
    }

    pub fn contains(&self, client_id: &ClientId) -> bool {
        self.members.iter().any(|m| &m.id == client_id)
    }

    pub fn members(&self) -> &[Client] {
        &self.members
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// 完整花名册
    pub fn roster(&self) -> Vec<ClientInfo> {
        self.members.iter().map(Client::info).collect()
    }

    /// 除指定客户端外的其他成员ID
    pub fn others(&self, excluded: &ClientId) -> Vec<ClientId> {
        self.members
            .iter()
            .filter(|m| &m.id != excluded)
            .map(|m| m.id.clone())
            .collect()
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    pub fn stats(&self) -> RoomStats {
        RoomStats {
            exists: true,
            client_count: self.members.len(),
            document_length: self.document.content().chars().count(),
            delta_count: self.document.delta_count(),
            last_message_id: self.document.last_message_id(),
            created_at: Some(self.created_at),
        }
    }
}

/// 房间统计信息
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomStats {
    pub exists: bool,
    pub client_count: usize,
    pub document_length: usize,
    pub delta_count: usize,
    pub last_message_id: u64,
    /// 房间创建时间；不存在的房间没有该字段
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl RoomStats {
    /// 不存在的房间
    pub fn absent() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(id: &str, room: &Room) -> Client {
        Client::new(ClientId::from(id), id.to_uppercase(), room.room_id.clone())
    }

    #[test]
    fn test_membership_is_unique_and_ordered() {
        let mut room = Room::new(RoomId::from("demo"));
        let alice = client("alice", &room);
        let bob = client("bob", &room);

        assert!(room.add_member(alice.clone()));
        assert!(room.add_member(bob.clone()));
        assert!(!room.add_member(alice.clone()));

        let ids: Vec<&str> = room.members().iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["alice", "bob"]);
        assert_eq!(room.others(&alice.id), vec![bob.id.clone()]);
    }

    #[test]
    fn test_remove_member() {
        let mut room = Room::new(RoomId::from("demo"));
        let alice = client("alice", &room);
        room.add_member(alice.clone());

        assert_eq!(room.remove_member(&ClientId::from("nobody")), None);
        assert_eq!(room.remove_member(&alice.id), Some(alice));
        assert!(room.is_empty());
    }

    #[test]
    fn test_stats_reflect_document() {
        let mut room = Room::new(RoomId::from("demo"));
        let alice = client("alice", &room);
        room.add_member(alice.clone());
        room.document_mut().set_content("héllo");
        room.document_mut().append(&alice.id, Default::default());

        let stats = room.stats();
        assert!(stats.exists);
        assert_eq!(stats.client_count, 1);
        assert_eq!(stats.document_length, 5);
        assert_eq!(stats.delta_count, 1);
        assert_eq!(stats.last_message_id, 1);
        assert_eq!(stats.created_at, Some(room.created_at));

        let absent = RoomStats::absent();
        assert!(!absent.exists);
        assert_eq!(absent.created_at, None);
        assert!(serde_json::to_value(&absent)
            .unwrap()
            .get("created_at")
            .is_none());
    }
}
