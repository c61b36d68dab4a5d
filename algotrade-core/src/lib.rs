//! Shared domain types for the AlgoTrade exchange client.
//!
//! Everything here is pure data: the JSON wire protocol spoken over the
//! exchange websocket, the canonical instrument identifier grammar, and the
//! integer value types used for prices and quantities. No I/O, no async.

pub mod entities;
pub mod instruments;
pub mod messages;
pub mod values;

// Re-export value types at crate root for convenience
pub use values::{InstrumentId, OrderId, Price, Quantity, Side, TeamId, Timestamp};

// Re-export instrument identifiers at crate root
pub use instruments::{InstrumentKind, InstrumentSpec, ParseInstrumentError};

// Re-export entities at crate root
pub use entities::Order;

// Re-export wire messages at crate root
pub use messages::{
    AddOrderData, CandleData, CommandReply, CommandRequest, DepthSnapshot, Inventory,
    MarketDataUpdate, PendingOrders, ServerMessage,
};
