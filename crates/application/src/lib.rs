//! 应用层实现。
//!
//! 围绕领域模型组织协作会话：共享状态（注册表、房间、出站队列）、
//! 各协议消息的处理器、连接会话状态机以及出站队列的刷新任务。

pub mod dto;
pub mod error;
pub mod flush;
pub mod handlers;
pub mod outbound;
pub mod registry;
pub mod rooms;
pub mod session;
pub mod state;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use dto::{GlobalStats, RoomStatsDto};
pub use error::ApplicationError;
pub use flush::{CycleOutcome, FlushReport, MessageFlusher};
pub use handlers::ConnectRequest;
pub use outbound::OutboundQueue;
pub use registry::{ClientRegistry, RegisteredClient};
pub use rooms::RoomStore;
pub use session::{CloseReason, Session, SessionControl, SessionPhase};
pub use state::{CollabState, JoinOutcome, LeaveOutcome, UpdateOutcome};
