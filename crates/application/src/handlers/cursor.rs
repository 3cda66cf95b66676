use domain::{Client, ServerMessage};
use tracing::debug;

use crate::error::ApplicationError;
use crate::state::CollabState;

/// 把光标位置排队转发给其他成员，返回接收者数量
pub async fn handle_cursor(
    state: &CollabState,
    client: &Client,
    ln: i64,
    pos: i64,
) -> Result<usize, ApplicationError> {
    let payload = ServerMessage::CursorUpdate {
        client_id: client.id.clone(),
        ln,
        pos,
    }
    .to_json()?;

    let recipients = state.broadcast(&client.room_id, &client.id, &payload).await;
    debug!(client_id = %client.id, ln, pos, recipients, "Relayed cursor");
    Ok(recipients)
}
