pub mod connection;
pub mod handler;
pub mod relay;
pub mod types;

pub use connection::{ConnectionRegistry, WsSender};
pub use handler::ws_handler;
pub use relay::DeliveryRelay;
pub use types::{ClientMessage, WsMessage};
