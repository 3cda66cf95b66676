//! 协议消息处理器
//!
//! 每个处理器对应一种客户端消息，只依赖 [`CollabState`](crate::state::CollabState)
//! 和发起者的 [`Client`](domain::Client)。会话状态机负责决定何时调用哪个处理器。

pub mod connect;
pub mod cursor;
pub mod disconnect;
pub mod input;
pub mod typing;
pub mod update;

pub use connect::{handle_connect, ConnectRequest};
pub use cursor::handle_cursor;
pub use disconnect::handle_disconnect;
pub use input::{handle_initial_dump_request, handle_input_request};
pub use typing::handle_typing;
pub use update::handle_update;
