//! 在线客户端注册表
//!
//! 记录 client_id 到客户端信息和出站句柄的映射。注册表本身不加锁，
//! 由 [`crate::state::CollabState`] 统一保护。

use std::collections::HashMap;
use std::fmt;

use domain::{Client, ClientHandle, ClientId, DomainError, DomainResult};

/// 已注册的客户端及其出站句柄
#[derive(Clone)]
pub struct RegisteredClient {
    pub client: Client,
    pub handle: ClientHandle,
}

impl fmt::Debug for RegisteredClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisteredClient")
            .field("client", &self.client)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Default)]
pub struct ClientRegistry {
    clients: HashMap<ClientId, RegisteredClient>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册客户端；同一ID已在线时返回错误
    pub fn register(&mut self, client: Client, handle: ClientHandle) -> DomainResult<()> {
        if self.clients.contains_key(&client.id) {
            return Err(DomainError::client_already_registered(&client.id));
        }
        self.clients
            .insert(client.id.clone(), RegisteredClient { client, handle });
        Ok(())
    }

    pub fn unregister(&mut self, client_id: &ClientId) -> DomainResult<RegisteredClient> {
        self.clients
            .remove(client_id)
            .ok_or_else(|| DomainError::client_not_found(client_id))
    }

    pub fn lookup(&self, client_id: &ClientId) -> Option<&RegisteredClient> {
        self.clients.get(client_id)
    }

    pub fn contains(&self, client_id: &ClientId) -> bool {
        self.clients.contains_key(client_id)
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}
