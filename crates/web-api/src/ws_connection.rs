use std::sync::Arc;
use std::time::Duration;

use application::{CloseReason, Session, SessionControl};
use async_trait::async_trait;
use axum::body::Bytes;
use axum::extract::ws::{CloseFrame, Message as WsMessage, WebSocket};
use domain::{ClientHandle, DeliveryError, OutboundHandle};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::state::AppState;

/// 连接结束后等待写任务发完剩余帧的时间
const WRITER_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// WebSocket 写操作命令
///
/// 使用命令模式统一管理所有对 WebSocket sender 的写操作
#[derive(Debug)]
enum WsCommand {
    SendText(String),
    SendPong(Bytes),
    Close(CloseReason),
}

/// 连接的出站句柄
///
/// 直接发送是一帧一个 JSON 对象；批量发送把整批已序列化的消息
/// 编码成一个 JSON 字符串数组，作为一帧发出。
#[derive(Debug, Clone)]
pub struct WsOutbound {
    commands: mpsc::UnboundedSender<WsCommand>,
}

impl WsOutbound {
    fn new(commands: mpsc::UnboundedSender<WsCommand>) -> Self {
        Self { commands }
    }

    fn push(&self, text: String) -> Result<(), DeliveryError> {
        self.commands
            .send(WsCommand::SendText(text))
            .map_err(|_| DeliveryError::Closed("websocket writer has stopped".to_string()))
    }
}

#[async_trait]
impl OutboundHandle for WsOutbound {
    async fn send_text(&self, payload: String) -> Result<(), DeliveryError> {
        self.push(payload)
    }

    async fn send_batch(&self, payloads: Vec<String>) -> Result<(), DeliveryError> {
        let frame = serde_json::to_string(&payloads)
            .map_err(|err| DeliveryError::SendFailed(err.to_string()))?;
        self.push(frame)
    }
}

/// WebSocket 连接驱动
///
/// 一个写任务独占 socket 的发送端，读循环把文本帧交给会话状态机处理。
/// 任何一方结束都会触发会话清理。
pub struct WebSocketConnection {
    socket: WebSocket,
    state: AppState,
    connection_id: Uuid,
}

impl WebSocketConnection {
    pub fn new(socket: WebSocket, state: AppState) -> Self {
        Self {
            socket,
            state,
            connection_id: Uuid::new_v4(),
        }
    }

    pub async fn run(self) {
        let connection_id = self.connection_id;
        tracing::info!(connection_id = %connection_id, "WebSocket connection established");

        let (mut sender, mut incoming) = self.socket.split();
        let (cmd_tx, mut cmd_rx) = mpsc::unbounded_channel::<WsCommand>();

        let outbound: ClientHandle = Arc::new(WsOutbound::new(cmd_tx.clone()));
        let mut session = Session::new(self.state.collab.clone(), outbound);

        // 发送任务：统一处理所有对 WebSocket sender 的写操作
        let mut send_task = tokio::spawn(async move {
            while let Some(cmd) = cmd_rx.recv().await {
                match cmd {
                    WsCommand::SendText(text) => {
                        if sender.send(WsMessage::Text(text.into())).await.is_err() {
                            tracing::warn!(connection_id = %connection_id, "Failed to send text message");
                            break;
                        }
                    }
                    WsCommand::SendPong(data) => {
                        if sender.send(WsMessage::Pong(data)).await.is_err() {
                            tracing::warn!(connection_id = %connection_id, "Failed to send pong message");
                            break;
                        }
                    }
                    WsCommand::Close(reason) => {
                        let frame = CloseFrame {
                            code: reason.code,
                            reason: reason.reason.into(),
                        };
                        if let Err(err) = sender.send(WsMessage::Close(Some(frame))).await {
                            tracing::debug!(connection_id = %connection_id, error = %err, "Failed to send close frame");
                        }
                        break;
                    }
                }
            }
            tracing::debug!(connection_id = %connection_id, "WebSocket send task finished");
        });

        // 接收循环：文本帧交给会话处理
        let recv_loop = async {
            while let Some(frame) = incoming.next().await {
                let message = match frame {
                    Ok(message) => message,
                    Err(err) => {
                        tracing::warn!(connection_id = %connection_id, error = %err, "WebSocket receive error");
                        return;
                    }
                };

                match message {
                    WsMessage::Text(text) => {
                        if let SessionControl::Close(reason) = session.handle_frame(text.as_str()).await {
                            let _ = cmd_tx.send(WsCommand::Close(reason));
                            return;
                        }
                    }
                    WsMessage::Binary(_) => {
                        tracing::warn!(connection_id = %connection_id, "Binary frames are not supported");
                        session.close().await;
                        let _ = cmd_tx.send(WsCommand::Close(CloseReason::INVALID_MESSAGE));
                        return;
                    }
                    WsMessage::Ping(data) => {
                        tracing::debug!(connection_id = %connection_id, "Received ping");
                        if cmd_tx.send(WsCommand::SendPong(data)).is_err() {
                            return;
                        }
                    }
                    WsMessage::Pong(_) => {}
                    WsMessage::Close(_) => {
                        tracing::info!(connection_id = %connection_id, "Client closed the connection");
                        return;
                    }
                }
            }
        };

        // 等待任意一方结束（连接断开）
        let writer_finished = tokio::select! {
            _ = recv_loop => false,
            _ = &mut send_task => true,
        };

        let client_id = session.client().map(|client| client.id.clone());
        session.close().await;
        drop(session);
        drop(cmd_tx);

        if !writer_finished && tokio::time::timeout(WRITER_DRAIN_TIMEOUT, &mut send_task).await.is_err() {
            send_task.abort();
        }

        tracing::info!(
            connection_id = %connection_id,
            client_id = ?client_id.as_ref().map(|id| id.as_str()),
            "WebSocket connection closed"
        );
    }
}
