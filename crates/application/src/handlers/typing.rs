use domain::{Client, ServerMessage};
use tracing::debug;

use crate::error::ApplicationError;
use crate::state::CollabState;

/// 把输入状态排队转发给其他成员，返回接收者数量
pub async fn handle_typing(
    state: &CollabState,
    client: &Client,
    is_typing: bool,
) -> Result<usize, ApplicationError> {
    let payload = ServerMessage::TypingIndicator {
        client_id: client.id.clone(),
        typing: is_typing,
    }
    .to_json()?;

    let recipients = state.broadcast(&client.room_id, &client.id, &payload).await;
    debug!(client_id = %client.id, is_typing, recipients, "Relayed typing indicator");
    Ok(recipients)
}
