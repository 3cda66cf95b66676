#![allow(dead_code)]

use std::{net::SocketAddr, sync::Arc, time::Duration};

use application::{CollabState, MessageFlusher};
use config::MessageQueueConfig;
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::{net::TcpListener, net::TcpStream, sync::oneshot, task::JoinHandle};
use tokio_tungstenite::{
    connect_async, tungstenite::Message as TungsteniteMessage, MaybeTlsStream, WebSocketStream,
};
use tokio_util::sync::CancellationToken;
use web_api::{router, AppState};

pub type WsClient = WebSocketStream<MaybeTlsStream<TcpStream>>;

const RECV_TIMEOUT: Duration = Duration::from_secs(5);

/// 进程内测试服务器：HTTP 服务加刷新任务
pub struct TestServer {
    pub addr: SocketAddr,
    pub collab: Arc<CollabState>,
    shutdown_tx: oneshot::Sender<()>,
    flusher_shutdown: CancellationToken,
    flusher: JoinHandle<()>,
}

impl TestServer {
    pub async fn start() -> Self {
        Self::start_with(MessageQueueConfig {
            sleep_duration: 0.02,
            ..MessageQueueConfig::default()
        })
        .await
    }

    pub async fn start_with(queue_config: MessageQueueConfig) -> Self {
        let collab = Arc::new(CollabState::default());
        let router = router(AppState::new(collab.clone()));

        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        tokio::spawn(async move {
            axum::serve(listener, router.into_make_service())
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
                .ok();
        });

        let flusher_shutdown = CancellationToken::new();
        let flusher =
            MessageFlusher::new(collab.clone(), queue_config).spawn(flusher_shutdown.clone());

        Self {
            addr,
            collab,
            shutdown_tx,
            flusher_shutdown,
            flusher,
        }
    }

    pub async fn connect(&self) -> WsClient {
        let (ws, _) = connect_async(format!("ws://{}/ws", self.addr))
            .await
            .expect("ws connect");
        ws
    }

    pub async fn stop(self) {
        self.flusher_shutdown.cancel();
        let _ = self.flusher.await;
        let _ = self.shutdown_tx.send(());
    }
}

pub async fn send_json(ws: &mut WsClient, value: Value) {
    ws.send(TungsteniteMessage::Text(value.to_string().into()))
        .await
        .expect("send frame");
}

/// 读取下一帧（跳过 ping/pong）
pub async fn next_message(ws: &mut WsClient) -> TungsteniteMessage {
    loop {
        let frame = tokio::time::timeout(RECV_TIMEOUT, ws.next())
            .await
            .expect("timed out waiting for frame")
            .expect("connection ended")
            .expect("websocket error");
        match frame {
            TungsteniteMessage::Ping(_) | TungsteniteMessage::Pong(_) => continue,
            other => return other,
        }
    }
}

/// 读取一个直接发送的 JSON 对象
pub async fn recv_direct(ws: &mut WsClient) -> Value {
    match next_message(ws).await {
        TungsteniteMessage::Text(payload) => {
            let value: Value = serde_json::from_str(&payload).expect("json");
            assert!(value.is_object(), "expected a single message, got {value}");
            value
        }
        other => panic!("unexpected frame {other:?}"),
    }
}

/// 读取一个批量帧并展开其中的消息
pub async fn recv_batch(ws: &mut WsClient) -> Vec<Value> {
    match next_message(ws).await {
        TungsteniteMessage::Text(payload) => {
            let items: Vec<String> = serde_json::from_str(&payload).expect("batch of strings");
            items
                .iter()
                .map(|item| serde_json::from_str(item).expect("queued json"))
                .collect()
        }
        other => panic!("unexpected frame {other:?}"),
    }
}

/// 持续读取批量帧，直到收集到 `count` 条消息
pub async fn recv_queued(ws: &mut WsClient, count: usize) -> Vec<Value> {
    let mut messages = Vec::new();
    while messages.len() < count {
        messages.extend(recv_batch(ws).await);
    }
    messages
}

/// 读取关闭帧，返回关闭码
pub async fn recv_close_code(ws: &mut WsClient) -> u16 {
    match next_message(ws).await {
        TungsteniteMessage::Close(Some(frame)) => u16::from(frame.code),
        other => panic!("expected close frame, got {other:?}"),
    }
}

/// 轮询直到条件成立
pub async fn eventually<F, Fut>(mut check: F)
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    for _ in 0..100 {
        if check().await {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("condition not met in time");
}
