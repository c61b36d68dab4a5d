//! Inbound server frames and decoded command replies.

use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;

use super::market_data::MarketDataUpdate;
use crate::entities::Order;
use crate::values::{InstrumentId, OrderId, Quantity};

/// Holdings per instrument as `(reserved, owned)`. The cash balance is
/// reported under a reserved pseudo-instrument key.
pub type Inventory = HashMap<InstrumentId, (Quantity, Quantity)>;

/// Resting orders per instrument as `(bid orders, ask orders)`.
pub type PendingOrders = HashMap<InstrumentId, (Vec<Order>, Vec<Order>)>;

/// Payload of an `add_order_response`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AddOrderData {
    #[serde(default)]
    pub order_id: Option<OrderId>,
    #[serde(default)]
    pub message: Option<String>,
    /// Inventory delta applied immediately on a crossing order.
    #[serde(default)]
    pub immediate_inventory_change: Option<Quantity>,
    /// Balance delta applied immediately on a crossing order.
    #[serde(default)]
    pub immediate_balance_change: Option<Quantity>,
}

/// Every frame the server can send, discriminated by its `type` tag.
///
/// Frames with a `type` outside this set fail strict decoding; the
/// dispatcher handles those through its raw fallback path so new server
/// frame kinds never crash the read loop.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Handshake greeting, first frame on every connection.
    Welcome { message: String },
    MarketDataUpdate(MarketDataUpdate),
    AddOrderResponse {
        user_request_id: String,
        success: bool,
        #[serde(default)]
        data: AddOrderData,
    },
    CancelOrderResponse {
        user_request_id: String,
        success: bool,
        #[serde(default)]
        message: Option<String>,
    },
    GetInventoryResponse {
        user_request_id: String,
        data: Inventory,
    },
    GetPendingOrdersResponse {
        user_request_id: String,
        data: PendingOrders,
    },
    Error {
        #[serde(default)]
        user_request_id: Option<String>,
        message: String,
    },
}

impl ServerMessage {
    /// Split a command-response frame into its request identifier and the
    /// decoded reply.
    ///
    /// Market data, greetings and error frames without an identifier are
    /// returned unchanged: they never resolve a pending command.
    pub fn into_reply(self) -> Result<(String, CommandReply), ServerMessage> {
        match self {
            ServerMessage::AddOrderResponse {
                user_request_id,
                success,
                data,
            } => Ok((user_request_id, CommandReply::AddOrder { success, data })),
            ServerMessage::CancelOrderResponse {
                user_request_id,
                success,
                message,
            } => Ok((user_request_id, CommandReply::CancelOrder { success, message })),
            ServerMessage::GetInventoryResponse {
                user_request_id,
                data,
            } => Ok((user_request_id, CommandReply::Inventory(data))),
            ServerMessage::GetPendingOrdersResponse {
                user_request_id,
                data,
            } => Ok((user_request_id, CommandReply::PendingOrders(data))),
            ServerMessage::Error {
                user_request_id: Some(rid),
                message,
            } => Ok((rid, CommandReply::Error { message })),
            other => Err(other),
        }
    }
}

/// A decoded reply delivered to the caller that issued the command.
///
/// `Raw` carries frames whose `type` the client does not recognize but which
/// echo a pending request identifier; callers on the generic path can still
/// inspect them.
#[derive(Debug, Clone)]
pub enum CommandReply {
    AddOrder {
        success: bool,
        data: AddOrderData,
    },
    CancelOrder {
        success: bool,
        message: Option<String>,
    },
    Inventory(Inventory),
    PendingOrders(PendingOrders),
    Error {
        message: String,
    },
    Raw(Value),
}

impl CommandReply {
    /// Short tag for logging and error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            CommandReply::AddOrder { .. } => "add_order_response",
            CommandReply::CancelOrder { .. } => "cancel_order_response",
            CommandReply::Inventory(_) => "get_inventory_response",
            CommandReply::PendingOrders(_) => "get_pending_orders_response",
            CommandReply::Error { .. } => "error",
            CommandReply::Raw(_) => "raw",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_welcome_decodes() {
        let msg: ServerMessage =
            serde_json::from_str(r#"{"type": "welcome", "message": "hello team"}"#).unwrap();
        assert!(matches!(msg, ServerMessage::Welcome { message } if message == "hello team"));
    }

    #[test]
    fn test_add_order_response_decodes() {
        let json = r#"{
            "type": "add_order_response",
            "user_request_id": "0000000004",
            "success": true,
            "data": {"order_id": "ord-1", "immediate_balance_change": -200}
        }"#;

        let msg: ServerMessage = serde_json::from_str(json).unwrap();
        let (rid, reply) = msg.into_reply().unwrap();
        assert_eq!(rid, "0000000004");
        match reply {
            CommandReply::AddOrder { success, data } => {
                assert!(success);
                assert_eq!(data.order_id.as_deref(), Some("ord-1"));
                assert_eq!(data.immediate_balance_change, Some(-200));
                assert_eq!(data.immediate_inventory_change, None);
            }
            other => panic!("unexpected reply: {other:?}"),
        }
    }

    #[test]
    fn test_inventory_response_decodes() {
        let json = r#"{
            "type": "get_inventory_response",
            "user_request_id": "0000000008",
            "data": {"$CASH": [0, 100000], "$CARD_future_60": [1, 3]}
        }"#;

        let msg: ServerMessage = serde_json::from_str(json).unwrap();
        let (rid, reply) = msg.into_reply().unwrap();
        assert_eq!(rid, "0000000008");
        match reply {
            CommandReply::Inventory(inv) => {
                assert_eq!(inv["$CASH"], (0, 100_000));
                assert_eq!(inv["$CARD_future_60"], (1, 3));
            }
            other => panic!("unexpected reply: {other:?}"),
        }
    }

    #[test]
    fn test_pending_orders_response_decodes() {
        let json = r#"{
            "type": "get_pending_orders_response",
            "user_request_id": "0000000009",
            "data": {
                "$CARD_future_60": [
                    [{"orderID": "b1", "teamID": "t", "price": 99, "time": 1,
                      "expiry": 70000, "side": "bid", "unfilled_quantity": 1,
                      "total_quantity": 1, "live": true}],
                    []
                ]
            }
        }"#;

        let msg: ServerMessage = serde_json::from_str(json).unwrap();
        let (_, reply) = msg.into_reply().unwrap();
        match reply {
            CommandReply::PendingOrders(orders) => {
                let (bids, asks) = &orders["$CARD_future_60"];
                assert_eq!(bids.len(), 1);
                assert_eq!(bids[0].order_id, "b1");
                assert!(asks.is_empty());
            }
            other => panic!("unexpected reply: {other:?}"),
        }
    }

    #[test]
    fn test_error_without_request_id_is_not_a_reply() {
        let msg: ServerMessage =
            serde_json::from_str(r#"{"type": "error", "message": "session ending"}"#).unwrap();
        assert!(msg.into_reply().is_err());
    }

    #[test]
    fn test_market_data_is_never_a_reply() {
        // Even when the frame carries a stray user_request_id.
        let json = r#"{"type": "market_data_update", "time": 5, "user_request_id": "0000000001"}"#;
        let msg: ServerMessage = serde_json::from_str(json).unwrap();
        assert!(msg.into_reply().is_err());
    }

    #[test]
    fn test_unknown_type_fails_strict_decoding() {
        let json = r#"{"type": "settlement_notice", "user_request_id": "0000000002"}"#;
        assert!(serde_json::from_str::<ServerMessage>(json).is_err());
    }
}
