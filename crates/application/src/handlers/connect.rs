use domain::{Client, ClientHandle, ClientId, ClientInfo, RoomId, ServerMessage};
use tracing::{debug, info, warn};

use crate::error::ApplicationError;
use crate::handlers::disconnect::handle_disconnect;
use crate::state::CollabState;

/// connect 消息携带的参数
#[derive(Debug, Clone)]
pub struct ConnectRequest {
    pub room_id: RoomId,
    pub name: String,
    /// 重连时沿用的ID，缺省时由服务器生成
    pub client_id: Option<ClientId>,
}

/// 注册客户端并加入房间
///
/// 直接发送 `connect_ack` 与完整花名册，再排队通知其他成员。
/// 握手发送失败时会撤销本次加入，调用方不需要再做清理。
pub async fn handle_connect(
    state: &CollabState,
    handle: ClientHandle,
    request: ConnectRequest,
) -> Result<Client, ApplicationError> {
    let client_id = request.client_id.unwrap_or_else(ClientId::generate);
    let client = Client::new(client_id, request.name, request.room_id);

    let joined = state.join(client.clone(), handle.clone()).await?;
    if joined.room_created {
        info!(room_id = %client.room_id, "Room created");
    }
    info!(
        client_id = %client.id,
        client_name = %client.name,
        room_id = %client.room_id,
        room_size = joined.roster.len(),
        "Client joined room"
    );

    if let Err(err) = greet(state, &handle, &client, joined.roster).await {
        warn!(client_id = %client.id, error = %err, "Connect handshake failed, rolling back");
        if let Err(cleanup) = handle_disconnect(state, &client).await {
            warn!(client_id = %client.id, error = %cleanup, "Rollback after failed handshake failed");
        }
        return Err(err);
    }

    Ok(client)
}

async fn greet(
    state: &CollabState,
    handle: &ClientHandle,
    client: &Client,
    roster: Vec<ClientInfo>,
) -> Result<(), ApplicationError> {
    let ack = ServerMessage::ConnectAck {
        client_id: client.id.clone(),
    };
    handle.send_text(ack.to_json()?).await?;
    handle
        .send_text(ServerMessage::AddClient { clients: roster }.to_json()?)
        .await?;

    let announcement = ServerMessage::AddClient {
        clients: vec![client.info()],
    }
    .to_json()?;
    let recipients = state
        .broadcast(&client.room_id, &client.id, &announcement)
        .await;
    debug!(client_id = %client.id, recipients, "Queued join announcement");

    Ok(())
}
