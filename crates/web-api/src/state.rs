use std::sync::Arc;

use application::CollabState;

#[derive(Clone)]
pub struct AppState {
    pub collab: Arc<CollabState>,
}

impl AppState {
    pub fn new(collab: Arc<CollabState>) -> Self {
        Self { collab }
    }
}
