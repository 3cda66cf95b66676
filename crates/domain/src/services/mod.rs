//! 领域服务接口

pub mod outbound;

pub use outbound::{ClientHandle, DeliveryError, OutboundHandle};
