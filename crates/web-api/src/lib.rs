//! Web API 层。
//!
//! 提供 Axum 路由：WebSocket 协作通道、健康检查和统计查询，
//! 连接上的协议处理全部委托给应用层的会话状态机。

mod error;
mod routes;
mod state;
mod stats_routes;
mod ws_connection;

pub use error::{ApiError, ErrorBody};
pub use routes::router;
pub use state::AppState;
pub use ws_connection::{WebSocketConnection, WsOutbound};
