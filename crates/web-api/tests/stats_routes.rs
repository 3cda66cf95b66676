use std::sync::Arc;

use application::{testing::RecordingHandle, CollabState};
use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use domain::{Client, ClientId, DeltaPayload, RoomId};
use serde_json::{json, Value};
use tower::ServiceExt;

use web_api::{router, AppState};

async fn seeded_router() -> Router {
    let collab = Arc::new(CollabState::default());
    let alice = Client::new(ClientId::from("A"), "Alice", RoomId::from("demo"));
    let bob = Client::new(ClientId::from("B"), "Bob", RoomId::from("demo"));
    collab.join(alice.clone(), RecordingHandle::new()).await.unwrap();
    collab.join(bob, RecordingHandle::new()).await.unwrap();

    let delta: DeltaPayload = match json!({"op": "insert", "text": "x"}) {
        Value::Object(map) => map,
        _ => unreachable!(),
    };
    collab.submit_update(&alice, vec![delta]).await.unwrap();
    collab.set_content(&alice.room_id, "hello").await.unwrap();

    router(AppState::new(collab))
}

async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn health_reports_ok() {
    let (status, body) = get_json(seeded_router().await, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok"}));
}

#[tokio::test]
async fn global_stats_summarise_state() {
    let (status, body) = get_json(seeded_router().await, "/stats").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "room_count": 1,
            "total_clients": 2,
            "total_deltas": 1,
            "pending_messages": 1,
            "rooms": ["demo"]
        })
    );
}

#[tokio::test]
async fn room_stats_for_existing_room() {
    let (status, mut body) = get_json(seeded_router().await, "/rooms/demo/stats").await;
    assert_eq!(status, StatusCode::OK);
    let created_at = body
        .as_object_mut()
        .and_then(|fields| fields.remove("created_at"))
        .unwrap();
    assert!(created_at.as_str().is_some_and(|s| s.ends_with('Z')));
    assert_eq!(
        body,
        json!({
            "room_id": "demo",
            "exists": true,
            "client_count": 2,
            "document_length": 5,
            "delta_count": 1,
            "last_message_id": 1
        })
    );
}

#[tokio::test]
async fn room_stats_for_unknown_room_is_404() {
    let (status, body) = get_json(seeded_router().await, "/rooms/nowhere/stats").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "ROOM_NOT_FOUND");
}
