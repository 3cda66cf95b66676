//! 出站消息队列
//!
//! 按客户端缓存已序列化的消息，并维护全部待发消息的计数。
//! 追加与计数、取出与清零都在同一次 `&mut self` 调用中完成，
//! 外层锁保证它们对其他任务是原子的。

use std::collections::HashMap;
use std::mem;

use domain::ClientId;

#[derive(Debug, Default)]
pub struct OutboundQueue {
    pending: HashMap<ClientId, Vec<String>>,
    total: usize,
}

impl OutboundQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&mut self, client_id: &ClientId, payload: String) {
        self.pending
            .entry(client_id.clone())
            .or_default()
            .push(payload);
        self.total += 1;
    }

    pub fn pending_total(&self) -> usize {
        self.total
    }

    pub fn pending_for(&self, client_id: &ClientId) -> usize {
        self.pending.get(client_id).map_or(0, Vec::len)
    }

    /// 取出全部待发消息并清零计数
    pub fn drain_all(&mut self) -> HashMap<ClientId, Vec<String>> {
        self.total = 0;
        mem::take(&mut self.pending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enqueue_keeps_fifo_per_client() {
        let mut queue = OutboundQueue::new();
        let alice = ClientId::from("alice");
        let bob = ClientId::from("bob");

        queue.enqueue(&alice, "1".to_string());
        queue.enqueue(&bob, "x".to_string());
        queue.enqueue(&alice, "2".to_string());

        assert_eq!(queue.pending_total(), 3);
        assert_eq!(queue.pending_for(&alice), 2);

        let drained = queue.drain_all();
        assert_eq!(drained[&alice], vec!["1", "2"]);
        assert_eq!(drained[&bob], vec!["x"]);
        assert_eq!(queue.pending_total(), 0);
        assert!(queue.drain_all().is_empty());
    }

    #[test]
    fn test_enqueue_after_drain_lands_in_next_drain() {
        let mut queue = OutboundQueue::new();
        let alice = ClientId::from("alice");

        queue.enqueue(&alice, "first".to_string());
        let first = queue.drain_all();
        queue.enqueue(&alice, "second".to_string());

        assert_eq!(first[&alice], vec!["first"]);
        assert_eq!(queue.drain_all()[&alice], vec!["second"]);
    }
}
