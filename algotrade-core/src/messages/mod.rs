//! JSON wire protocol for the exchange websocket.
//!
//! Outbound command frames and inbound server frames are both discriminated
//! by a `type` tag. Every command carries a `user_request_id` echoed by its
//! reply; market data is pushed unsolicited.

pub mod market_data;
pub mod requests;
pub mod responses;

pub use market_data::{CandleData, DepthSnapshot, MarketDataUpdate};
pub use requests::CommandRequest;
pub use responses::{AddOrderData, CommandReply, Inventory, PendingOrders, ServerMessage};
