//! Outbound command frames.

use serde::Serialize;

use crate::values::{InstrumentId, OrderId, Price, Quantity, Side, Timestamp};

/// A trading command as serialized onto the wire.
///
/// Constructors leave `user_request_id` empty; the correlator allocates the
/// identifier at send time and stamps it with [`CommandRequest::with_request_id`].
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CommandRequest {
    AddOrder {
        user_request_id: String,
        instrument_id: InstrumentId,
        price: Price,
        /// Expiry in milliseconds, exchange-relative.
        expiry: Timestamp,
        side: Side,
        quantity: Quantity,
    },
    CancelOrder {
        user_request_id: String,
        order_id: OrderId,
        instrument_id: InstrumentId,
    },
    GetInventory {
        user_request_id: String,
    },
    GetPendingOrders {
        user_request_id: String,
    },
}

impl CommandRequest {
    pub fn add_order(
        instrument_id: impl Into<InstrumentId>,
        price: Price,
        expiry: Timestamp,
        side: Side,
        quantity: Quantity,
    ) -> Self {
        CommandRequest::AddOrder {
            user_request_id: String::new(),
            instrument_id: instrument_id.into(),
            price,
            expiry,
            side,
            quantity,
        }
    }

    pub fn cancel_order(
        instrument_id: impl Into<InstrumentId>,
        order_id: impl Into<OrderId>,
    ) -> Self {
        CommandRequest::CancelOrder {
            user_request_id: String::new(),
            order_id: order_id.into(),
            instrument_id: instrument_id.into(),
        }
    }

    pub fn get_inventory() -> Self {
        CommandRequest::GetInventory {
            user_request_id: String::new(),
        }
    }

    pub fn get_pending_orders() -> Self {
        CommandRequest::GetPendingOrders {
            user_request_id: String::new(),
        }
    }

    /// Stamp the allocated request identifier onto the frame.
    pub fn with_request_id(mut self, rid: &str) -> Self {
        let slot = match &mut self {
            CommandRequest::AddOrder {
                user_request_id, ..
            }
            | CommandRequest::CancelOrder {
                user_request_id, ..
            }
            | CommandRequest::GetInventory { user_request_id }
            | CommandRequest::GetPendingOrders { user_request_id } => user_request_id,
        };
        *slot = rid.to_string();
        self
    }

    pub fn request_id(&self) -> &str {
        match self {
            CommandRequest::AddOrder {
                user_request_id, ..
            }
            | CommandRequest::CancelOrder {
                user_request_id, ..
            }
            | CommandRequest::GetInventory { user_request_id }
            | CommandRequest::GetPendingOrders { user_request_id } => user_request_id,
        }
    }

    /// Wire name of the command, useful for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            CommandRequest::AddOrder { .. } => "add_order",
            CommandRequest::CancelOrder { .. } => "cancel_order",
            CommandRequest::GetInventory { .. } => "get_inventory",
            CommandRequest::GetPendingOrders { .. } => "get_pending_orders",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_order_serialization() {
        let req = CommandRequest::add_order("$CARD_future_60", 100, 70_000, Side::Bid, 2)
            .with_request_id("0000000005");
        let json = serde_json::to_value(&req).unwrap();

        assert_eq!(json["type"], "add_order");
        assert_eq!(json["user_request_id"], "0000000005");
        assert_eq!(json["instrument_id"], "$CARD_future_60");
        assert_eq!(json["price"], 100);
        assert_eq!(json["expiry"], 70_000);
        assert_eq!(json["side"], "bid");
        assert_eq!(json["quantity"], 2);
    }

    #[test]
    fn test_cancel_order_serialization() {
        let req =
            CommandRequest::cancel_order("$CARD_future_60", "ord-9").with_request_id("0000000001");
        let json = serde_json::to_value(&req).unwrap();

        assert_eq!(json["type"], "cancel_order");
        assert_eq!(json["order_id"], "ord-9");
        assert_eq!(json["instrument_id"], "$CARD_future_60");
    }

    #[test]
    fn test_query_serialization() {
        let json = serde_json::to_value(CommandRequest::get_inventory().with_request_id("0000000002"))
            .unwrap();
        assert_eq!(json["type"], "get_inventory");
        assert_eq!(json["user_request_id"], "0000000002");

        let json =
            serde_json::to_value(CommandRequest::get_pending_orders().with_request_id("0000000003"))
                .unwrap();
        assert_eq!(json["type"], "get_pending_orders");
    }

    #[test]
    fn test_request_id_accessor() {
        let req = CommandRequest::get_inventory();
        assert_eq!(req.request_id(), "");
        let req = req.with_request_id("0000000042");
        assert_eq!(req.request_id(), "0000000042");
        assert_eq!(req.kind(), "get_inventory");
    }
}
