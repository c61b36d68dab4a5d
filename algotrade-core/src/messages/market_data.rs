//! Unsolicited market data frames.
//!
//! The server pushes a `market_data_update` frame carrying full order book
//! depths, candle lists and free-form events. Depth maps arrive with string
//! keys (JSON objects) and, depending on server version, string or integer
//! quantities; everything is normalized to integer minor-unit ticks here so
//! nothing downstream ever compares prices as strings.

use serde::de::{self, Deserializer};
use serde::Deserialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

use crate::values::{InstrumentId, Price, Quantity, Timestamp};

/// Full replacement view of one instrument's depth at a point in time.
///
/// Both sides map price ticks to aggregate quantity. Levels with
/// non-positive quantity are dropped at the ingestion boundary, so
/// `best_bid`/`best_ask` never report an empty level.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct DepthSnapshot {
    #[serde(default, deserialize_with = "price_levels")]
    pub bids: BTreeMap<Price, Quantity>,
    #[serde(default, deserialize_with = "price_levels")]
    pub asks: BTreeMap<Price, Quantity>,
}

impl DepthSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a snapshot from explicit levels. Mainly for tests and fixtures.
    pub fn from_levels(bids: &[(Price, Quantity)], asks: &[(Price, Quantity)]) -> Self {
        DepthSnapshot {
            bids: bids.iter().copied().filter(|(_, q)| *q > 0).collect(),
            asks: asks.iter().copied().filter(|(_, q)| *q > 0).collect(),
        }
    }

    /// Highest bid price, if any bids are present.
    pub fn best_bid(&self) -> Option<Price> {
        self.bids.keys().next_back().copied()
    }

    /// Lowest ask price, if any asks are present.
    pub fn best_ask(&self) -> Option<Price> {
        self.asks.keys().next().copied()
    }

    /// Aggregate quantity across all bid levels.
    pub fn bid_volume(&self) -> Quantity {
        self.bids.values().sum()
    }

    /// Aggregate quantity across all ask levels.
    pub fn ask_volume(&self) -> Quantity {
        self.asks.values().sum()
    }

    /// Best ask minus best bid. Defined only when both sides are present.
    pub fn spread(&self) -> Option<Price> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => Some(ask - bid),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.bids.is_empty() && self.asks.is_empty()
    }
}

/// Candle lists keyed by instrument, split by tradeability.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CandleData {
    #[serde(default)]
    pub tradeable: HashMap<InstrumentId, Vec<Value>>,
    #[serde(default)]
    pub untradeable: HashMap<InstrumentId, Vec<Value>>,
}

/// One pushed market data frame.
///
/// `user_request_id` occasionally appears here even though the frame is
/// unsolicited; it is carried for completeness but never used to resolve a
/// pending command.
#[derive(Debug, Clone, Deserialize)]
pub struct MarketDataUpdate {
    pub time: Timestamp,
    #[serde(default)]
    pub candles: CandleData,
    #[serde(default)]
    pub orderbook_depths: HashMap<InstrumentId, DepthSnapshot>,
    #[serde(default)]
    pub events: Vec<Value>,
    #[serde(default)]
    pub user_request_id: Option<String>,
}

/// Quantities arrive as integers or decimal strings depending on server
/// version.
#[derive(Deserialize)]
#[serde(untagged)]
enum IntOrString {
    Int(i64),
    Str(String),
}

impl IntOrString {
    fn into_i64(self) -> Result<i64, String> {
        match self {
            IntOrString::Int(v) => Ok(v),
            IntOrString::Str(s) => s
                .trim()
                .parse::<i64>()
                .map_err(|_| format!("non-integer quantity: {s}")),
        }
    }
}

fn price_levels<'de, D>(deserializer: D) -> Result<BTreeMap<Price, Quantity>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: HashMap<String, IntOrString> = HashMap::deserialize(deserializer)?;
    let mut levels = BTreeMap::new();
    for (price, quantity) in raw {
        let price: Price = price
            .trim()
            .parse()
            .map_err(|_| de::Error::custom(format!("non-integer price level: {price}")))?;
        let quantity = quantity.into_i64().map_err(de::Error::custom)?;
        if quantity > 0 {
            levels.insert(price, quantity);
        }
    }
    Ok(levels)
}
