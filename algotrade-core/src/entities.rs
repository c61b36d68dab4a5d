//! Order entity as reported by the exchange.

use serde::{Deserialize, Serialize};

use crate::values::{OrderId, Price, Quantity, Side, TeamId, Timestamp};

/// A resting order as returned by `get_pending_orders`.
///
/// The exchange reports these; the client never caches them beyond the call
/// that returned them. Wire field names use the exchange's camelCase ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    #[serde(rename = "orderID")]
    pub order_id: OrderId,
    #[serde(rename = "teamID")]
    pub team_id: TeamId,
    pub price: Price,
    /// Placement time, exchange-relative.
    pub time: Timestamp,
    /// Expiry time in milliseconds.
    pub expiry: Timestamp,
    pub side: Side,
    pub unfilled_quantity: Quantity,
    pub total_quantity: Quantity,
    pub live: bool,
}

impl Order {
    pub fn filled_quantity(&self) -> Quantity {
        self.total_quantity - self.unfilled_quantity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_wire_names() {
        let json = r#"{
            "orderID": "ord-17",
            "teamID": "team-4",
            "price": 105,
            "time": 42,
            "expiry": 70000,
            "side": "bid",
            "unfilled_quantity": 3,
            "total_quantity": 5,
            "live": true
        }"#;

        let order: Order = serde_json::from_str(json).unwrap();
        assert_eq!(order.order_id, "ord-17");
        assert_eq!(order.team_id, "team-4");
        assert_eq!(order.side, Side::Bid);
        assert_eq!(order.filled_quantity(), 2);
        assert!(order.live);
    }
}
