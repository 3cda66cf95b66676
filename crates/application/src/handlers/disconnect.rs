use domain::{Client, ClientInfo, ServerMessage};
use tracing::info;

use crate::error::ApplicationError;
use crate::state::CollabState;

/// 完成离开房间的清理工作，返回收到离开通知的成员数量
///
/// 最后一个成员离开时房间连同文档被删除，不再发送通知。
pub async fn handle_disconnect(
    state: &CollabState,
    client: &Client,
) -> Result<usize, ApplicationError> {
    let outcome = state.leave(&client.id).await?;

    if outcome.room_deleted {
        info!(
            client_id = %client.id,
            room_id = %client.room_id,
            "Last client left, room deleted"
        );
        return Ok(0);
    }

    let payload = ServerMessage::RemoveClient {
        clients: vec![ClientInfo::departed(client.id.clone())],
    }
    .to_json()?;
    let recipients = state.broadcast(&client.room_id, &client.id, &payload).await;
    info!(
        client_id = %client.id,
        room_id = %client.room_id,
        remaining = recipients,
        "Client left room"
    );

    Ok(recipients)
}
