//! 协作编辑核心领域模型
//!
//! 包含客户端、房间、文档增量日志等核心实体，以及客户端与服务器之间的
//! 消息协议定义。领域层不做任何 I/O，发送能力通过 [`services::OutboundHandle`] 注入。

pub mod entities;
pub mod errors;
pub mod services;
pub mod value_objects;

// 重新导出常用类型
pub use entities::*;
pub use errors::*;
pub use services::*;
pub use value_objects::*;
