//! 回放类请求：增量补齐与文档快照，只回复请求者本人

use domain::{Client, ServerMessage};
use tracing::debug;

use crate::error::ApplicationError;
use crate::state::CollabState;

/// 排队 `input_response`，包含序列号大于 `last_message_id` 的全部增量
///
/// 负数按 0 处理，即回放全部增量。
pub async fn handle_input_request(
    state: &CollabState,
    client: &Client,
    last_message_id: i64,
) -> Result<(), ApplicationError> {
    let since_id = u64::try_from(last_message_id).unwrap_or(0);
    let (deltas, latest) = state.replay(&client.room_id, since_id).await;
    debug!(
        client_id = %client.id,
        since = last_message_id,
        delta_count = deltas.len(),
        last_message_id = latest,
        "Replaying deltas"
    );

    let payload = ServerMessage::InputResponse {
        deltas,
        last_message_id: latest,
    }
    .to_json()?;
    state.enqueue(&client.id, payload).await;
    Ok(())
}

/// 排队 `initial_dump`，空文档会先写入默认内容
pub async fn handle_initial_dump_request(
    state: &CollabState,
    client: &Client,
) -> Result<(), ApplicationError> {
    let (content, last_message_id) = state.snapshot(&client.room_id).await;
    debug!(
        client_id = %client.id,
        content_length = content.chars().count(),
        last_message_id,
        "Sending document snapshot"
    );

    let payload = ServerMessage::InitialDump {
        content,
        last_message_id,
    }
    .to_json()?;
    state.enqueue(&client.id, payload).await;
    Ok(())
}
