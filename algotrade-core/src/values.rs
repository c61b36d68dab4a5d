//! Value types shared across the wire protocol and the cache.
//!
//! The exchange quotes every price in integer minor-currency-unit ticks and
//! every quantity in integer lots. Keeping them as `i64` (rather than any
//! floating-point representation) makes price-level identity and comparison
//! exact.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Price in minor currency units (ticks).
pub type Price = i64;

/// Quantity in integer lots.
pub type Quantity = i64;

/// Exchange-relative timestamp. Market data carries seconds, order expiries
/// are milliseconds; both fit here.
pub type Timestamp = i64;

/// Canonical instrument identifier string, e.g. `$CARD_call_500_60`.
pub type InstrumentId = String;

/// Order identifier assigned by the exchange.
pub type OrderId = String;

/// Team identifier as reported in order listings.
pub type TeamId = String;

/// Order side as it appears on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Bid,
    Ask,
}

impl Side {
    pub fn opposite(self) -> Side {
        match self {
            Side::Bid => Side::Ask,
            Side::Ask => Side::Bid,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Bid => write!(f, "bid"),
            Side::Ask => write!(f, "ask"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_side_wire_format() {
        assert_eq!(serde_json::to_string(&Side::Bid).unwrap(), "\"bid\"");
        assert_eq!(serde_json::to_string(&Side::Ask).unwrap(), "\"ask\"");
        let side: Side = serde_json::from_str("\"ask\"").unwrap();
        assert_eq!(side, Side::Ask);
    }

    #[test]
    fn test_side_opposite() {
        assert_eq!(Side::Bid.opposite(), Side::Ask);
        assert_eq!(Side::Ask.opposite(), Side::Bid);
    }
}
