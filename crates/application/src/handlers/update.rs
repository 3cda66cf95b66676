use domain::{Client, DeltaPayload};
use tracing::debug;

use crate::error::ApplicationError;
use crate::state::CollabState;

/// 记录一批增量并排队广播，返回分配的序列号
pub async fn handle_update(
    state: &CollabState,
    client: &Client,
    deltas: Vec<DeltaPayload>,
) -> Result<Vec<u64>, ApplicationError> {
    if deltas.is_empty() {
        debug!(client_id = %client.id, "Ignoring empty update");
        return Ok(Vec::new());
    }

    let delta_count = deltas.len();
    let outcome = state.submit_update(client, deltas).await?;
    debug!(
        client_id = %client.id,
        room_id = %client.room_id,
        delta_count,
        first_message_id = ?outcome.message_ids.first(),
        recipients = outcome.recipients,
        "Processed deltas"
    );

    Ok(outcome.message_ids)
}
