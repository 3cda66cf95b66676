//! 房间存储
//!
//! 房间在第一个成员加入时创建，最后一个成员离开时连同文档一起删除。
//! 对不存在房间的读取不会创建房间，按新房间的状态作答。

use std::collections::HashMap;

use domain::{
    Client, ClientId, Delta, DeltaPayload, DomainError, DomainResult, Room, RoomId, RoomStats,
};

#[derive(Debug, Default)]
pub struct RoomStore {
    rooms: HashMap<RoomId, Room>,
}

impl RoomStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 获取房间，不存在则创建
    pub fn get_or_create(&mut self, room_id: &RoomId) -> &mut Room {
        self.rooms
            .entry(room_id.clone())
            .or_insert_with(|| Room::new(room_id.clone()))
    }

    pub fn get(&self, room_id: &RoomId) -> Option<&Room> {
        self.rooms.get(room_id)
    }

    pub fn contains(&self, room_id: &RoomId) -> bool {
        self.rooms.contains_key(room_id)
    }

    /// 把客户端加入其所属房间，返回是否新增成员
    pub fn add_member(&mut self, client: Client) -> bool {
        let room_id = client.room_id.clone();
        self.get_or_create(&room_id).add_member(client)
    }

    /// 移除成员，返回房间是否因此变空（变空的房间已被删除）
    pub fn remove_member(&mut self, room_id: &RoomId, client_id: &ClientId) -> bool {
        let Some(room) = self.rooms.get_mut(room_id) else {
            return false;
        };
        if room.remove_member(client_id).is_none() {
            return false;
        }
        if room.is_empty() {
            self.rooms.remove(room_id);
            return true;
        }
        false
    }

    /// 成员快照
    pub fn list_members(&self, room_id: &RoomId) -> Vec<Client> {
        self.rooms
            .get(room_id)
            .map(|room| room.members().to_vec())
            .unwrap_or_default()
    }

    pub fn member_count(&self, room_id: &RoomId) -> usize {
        self.rooms.get(room_id).map_or(0, Room::member_count)
    }

    /// 房间内除 `excluded` 外的其他成员
    pub fn others(&self, room_id: &RoomId, excluded: &ClientId) -> Vec<ClientId> {
        self.rooms
            .get(room_id)
            .map(|room| room.others(excluded))
            .unwrap_or_default()
    }

    /// 追加一条增量，返回分配的序列号
    pub fn append_delta(
        &mut self,
        room_id: &RoomId,
        client_id: &ClientId,
        payload: DeltaPayload,
    ) -> DomainResult<u64> {
        let room = self.room_mut(room_id)?;
        Ok(room.document_mut().append(client_id, payload).message_id)
    }

    /// 按提交顺序追加一批增量，返回加盖戳记后的副本
    pub fn append_deltas(
        &mut self,
        room_id: &RoomId,
        client_id: &ClientId,
        payloads: Vec<DeltaPayload>,
    ) -> DomainResult<Vec<Delta>> {
        let document = self.room_mut(room_id)?.document_mut();
        Ok(payloads
            .into_iter()
            .map(|payload| document.append(client_id, payload).clone())
            .collect())
    }

    pub fn deltas_since(&self, room_id: &RoomId, since_id: u64) -> Vec<Delta> {
        self.rooms
            .get(room_id)
            .map(|room| room.document().deltas_since(since_id))
            .unwrap_or_default()
    }

    pub fn last_message_id(&self, room_id: &RoomId) -> u64 {
        self.rooms
            .get(room_id)
            .map_or(0, |room| room.document().last_message_id())
    }

    pub fn delta_count(&self, room_id: &RoomId) -> usize {
        self.rooms
            .get(room_id)
            .map_or(0, |room| room.document().delta_count())
    }

    pub fn set_content(&mut self, room_id: &RoomId, content: impl Into<String>) -> DomainResult<()> {
        self.room_mut(room_id)?.document_mut().set_content(content);
        Ok(())
    }

    /// 文档快照；内容为空时先写入默认内容
    pub fn get_content(&mut self, room_id: &RoomId, default_content: &str) -> String {
        match self.rooms.get_mut(room_id) {
            Some(room) => room.document_mut().seed_content(default_content).to_owned(),
            None => default_content.to_owned(),
        }
    }

    pub fn stats(&self, room_id: &RoomId) -> RoomStats {
        self.rooms
            .get(room_id)
            .map_or_else(RoomStats::absent, Room::stats)
    }

    pub fn room_ids(&self) -> Vec<RoomId> {
        let mut ids: Vec<RoomId> = self.rooms.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn rooms(&self) -> impl Iterator<Item = &Room> {
        self.rooms.values()
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    fn room_mut(&mut self, room_id: &RoomId) -> DomainResult<&mut Room> {
        self.rooms
            .get_mut(room_id)
            .ok_or_else(|| DomainError::room_not_found(room_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn member(id: &str) -> Client {
        Client::new(ClientId::from(id), id, RoomId::from("demo"))
    }

    fn payload(text: &str) -> DeltaPayload {
        match json!({ "op": "insert", "text": text }) {
            serde_json::Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_room_lifecycle_follows_membership() {
        let mut store = RoomStore::new();
        let room_id = RoomId::from("demo");

        assert!(store.add_member(member("alice")));
        assert!(store.add_member(member("bob")));
        assert!(!store.add_member(member("alice")));
        assert_eq!(store.member_count(&room_id), 2);

        assert!(!store.remove_member(&room_id, &ClientId::from("alice")));
        assert!(store.contains(&room_id));
        assert!(store.remove_member(&room_id, &ClientId::from("bob")));
        assert!(!store.contains(&room_id));
        assert!(store.is_empty());
    }

    #[test]
    fn test_remove_from_unknown_room_is_noop() {
        let mut store = RoomStore::new();
        assert!(!store.remove_member(&RoomId::from("nowhere"), &ClientId::from("alice")));

        store.add_member(member("alice"));
        assert!(!store.remove_member(&RoomId::from("demo"), &ClientId::from("bob")));
        assert_eq!(store.member_count(&RoomId::from("demo")), 1);
    }

    #[test]
    fn test_deleted_room_starts_fresh() {
        let mut store = RoomStore::new();
        let room_id = RoomId::from("demo");
        let alice = member("alice");

        store.add_member(alice.clone());
        store
            .append_deltas(&room_id, &alice.id, vec![payload("a"), payload("b")])
            .unwrap();
        store.set_content(&room_id, "edited").unwrap();
        store.remove_member(&room_id, &alice.id);

        store.add_member(alice.clone());
        assert_eq!(store.last_message_id(&room_id), 0);
        assert!(store.deltas_since(&room_id, 0).is_empty());
        assert_eq!(store.get_content(&room_id, "default"), "default");
    }

    #[test]
    fn test_reads_do_not_create_rooms() {
        let mut store = RoomStore::new();
        let room_id = RoomId::from("ghost");

        assert!(store.deltas_since(&room_id, 0).is_empty());
        assert_eq!(store.last_message_id(&room_id), 0);
        assert_eq!(store.get_content(&room_id, "default"), "default");
        assert!(store.list_members(&room_id).is_empty());
        assert!(!store.stats(&room_id).exists);
        assert!(!store.contains(&room_id));
    }

    #[test]
    fn test_writes_require_existing_room() {
        let mut store = RoomStore::new();
        let room_id = RoomId::from("ghost");

        assert_eq!(
            store.append_delta(&room_id, &ClientId::from("alice"), payload("x")),
            Err(DomainError::room_not_found(&room_id))
        );
        assert!(store.set_content(&room_id, "text").is_err());
    }

    #[test]
    fn test_append_assigns_contiguous_ids() {
        let mut store = RoomStore::new();
        let room_id = RoomId::from("demo");
        let alice = member("alice");
        store.add_member(alice.clone());

        assert_eq!(store.append_delta(&room_id, &alice.id, payload("a")), Ok(1));
        let stamped = store
            .append_deltas(&room_id, &alice.id, vec![payload("b"), payload("c")])
            .unwrap();
        let ids: Vec<u64> = stamped.iter().map(|delta| delta.message_id).collect();
        assert_eq!(ids, vec![2, 3]);
        assert_eq!(store.delta_count(&room_id), 3);
        assert_eq!(store.deltas_since(&room_id, 2).len(), 1);
    }
}
