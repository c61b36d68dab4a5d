//! Market data cache.
//!
//! Holds the current and historical per-instrument depth fed by the
//! dispatcher, plus instrument discovery, current candle lists and a bounded
//! market event log. One `RwLock` around the whole state keeps every read
//! consistent: a reader never sees an instrument's best bid updated while
//! its volume still reflects the previous snapshot.

use parking_lot::RwLock;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::time::Instant;

use algotrade_core::{DepthSnapshot, InstrumentId, MarketDataUpdate, Price, Quantity, Timestamp};

/// Per-instrument history bound, FIFO eviction.
pub const ORDERBOOK_HISTORY_CAPACITY: usize = 1000;

/// Global event log bound, FIFO eviction.
pub const EVENT_CAPACITY: usize = 10_000;

/// Aggregate view of one instrument, recomputed on every snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstrumentInfo {
    pub instrument_id: InstrumentId,
    pub first_seen: Timestamp,
    pub last_updated: Timestamp,
    pub best_bid: Option<Price>,
    pub best_ask: Option<Price>,
    pub bid_volume: Quantity,
    pub ask_volume: Quantity,
}

impl InstrumentInfo {
    /// Best ask minus best bid, defined only when both sides exist.
    pub fn spread(&self) -> Option<Price> {
        match (self.best_bid, self.best_ask) {
            (Some(bid), Some(ask)) => Some(ask - bid),
            _ => None,
        }
    }
}

/// A market event with the feed time it arrived at.
#[derive(Debug, Clone)]
pub struct MarketEvent {
    pub time: Timestamp,
    pub payload: Value,
}

/// Cache-wide counters for monitoring.
#[derive(Debug, Clone)]
pub struct MarketStatistics {
    pub uptime_seconds: f64,
    pub total_updates_received: u64,
    pub instruments_discovered: usize,
    pub active_orderbooks: usize,
    pub total_events_cached: usize,
    pub last_market_time: Option<Timestamp>,
}

#[derive(Default)]
struct CacheState {
    books: HashMap<InstrumentId, DepthSnapshot>,
    info: HashMap<InstrumentId, InstrumentInfo>,
    history: HashMap<InstrumentId, VecDeque<(Timestamp, DepthSnapshot)>>,
    candles: HashMap<InstrumentId, Vec<Value>>,
    events: VecDeque<MarketEvent>,
    last_market_time: Option<Timestamp>,
    total_updates: u64,
}

/// Shared market view. The dispatcher is the only writer; strategies read
/// concurrently through cloned-out snapshots, never through references into
/// cache-owned structures.
pub struct MarketDataCache {
    state: RwLock<CacheState>,
    started_at: Instant,
}

impl MarketDataCache {
    pub fn new() -> Self {
        MarketDataCache {
            state: RwLock::new(CacheState::default()),
            started_at: Instant::now(),
        }
    }

    /// Ingest one pushed market data frame.
    pub fn apply(&self, update: MarketDataUpdate) {
        let time = update.time;
        let mut state = self.state.write();
        state.last_market_time = Some(time);
        state.total_updates += 1;

        for (instrument_id, depth) in update.orderbook_depths {
            // Discovery: first snapshot mentioning an instrument creates it.
            if !state.info.contains_key(&instrument_id) {
                tracing::info!("New instrument discovered: {}", instrument_id);
            }
            let info = state
                .info
                .entry(instrument_id.clone())
                .or_insert_with(|| InstrumentInfo {
                    instrument_id: instrument_id.clone(),
                    first_seen: time,
                    last_updated: time,
                    best_bid: None,
                    best_ask: None,
                    bid_volume: 0,
                    ask_volume: 0,
                });
            info.last_updated = time;
            // The snapshot replaces the book wholesale, so the aggregates
            // are recomputed from scratch; an emptied side clears them.
            info.best_bid = depth.best_bid();
            info.bid_volume = depth.bid_volume();
            info.best_ask = depth.best_ask();
            info.ask_volume = depth.ask_volume();

            let history = state.history.entry(instrument_id.clone()).or_default();
            history.push_back((time, depth.clone()));
            if history.len() > ORDERBOOK_HISTORY_CAPACITY {
                history.pop_front();
            }

            state.books.insert(instrument_id, depth);
        }

        // Candle lists arrive complete and replace the previous ones.
        for (instrument_id, candles) in update
            .candles
            .tradeable
            .into_iter()
            .chain(update.candles.untradeable)
        {
            state.candles.insert(instrument_id, candles);
        }

        for payload in update.events {
            if let Some(kind) = payload.get("type").and_then(Value::as_str)
                && matches!(kind, "trade" | "settlement")
            {
                tracing::info!("Market event: {}", payload);
            }
            state.events.push_back(MarketEvent { time, payload });
            if state.events.len() > EVENT_CAPACITY {
                state.events.pop_front();
            }
        }
    }

    /// Current depth for an instrument, if any snapshot has been seen.
    pub fn current_orderbook(&self, instrument_id: &str) -> Option<DepthSnapshot> {
        self.state.read().books.get(instrument_id).cloned()
    }

    /// Aggregate instrument view (first seen, best prices, volumes).
    pub fn instrument_info(&self, instrument_id: &str) -> Option<InstrumentInfo> {
        self.state.read().info.get(instrument_id).cloned()
    }

    /// Every instrument discovered so far, sorted for stable iteration.
    pub fn all_instruments(&self) -> Vec<InstrumentId> {
        let mut ids: Vec<InstrumentId> = self.state.read().info.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Best bid and ask for an instrument.
    pub fn best_prices(&self, instrument_id: &str) -> (Option<Price>, Option<Price>) {
        self.state
            .read()
            .info
            .get(instrument_id)
            .map(|info| (info.best_bid, info.best_ask))
            .unwrap_or((None, None))
    }

    /// Current bid-ask spread, defined only when both sides exist.
    pub fn spread(&self, instrument_id: &str) -> Option<Price> {
        self.state
            .read()
            .info
            .get(instrument_id)
            .and_then(InstrumentInfo::spread)
    }

    /// Tail of the global event log, most recent last.
    pub fn recent_events(&self, limit: usize) -> Vec<MarketEvent> {
        let state = self.state.read();
        let skip = state.events.len().saturating_sub(limit);
        state.events.iter().skip(skip).cloned().collect()
    }

    /// Tail of an instrument's depth history, most recent last.
    pub fn orderbook_history(
        &self,
        instrument_id: &str,
        limit: usize,
    ) -> Vec<(Timestamp, DepthSnapshot)> {
        let state = self.state.read();
        match state.history.get(instrument_id) {
            Some(history) => {
                let skip = history.len().saturating_sub(limit);
                history.iter().skip(skip).cloned().collect()
            }
            None => Vec::new(),
        }
    }

    /// Latest candle list for an instrument.
    pub fn candles(&self, instrument_id: &str) -> Option<Vec<Value>> {
        self.state.read().candles.get(instrument_id).cloned()
    }

    /// Feed time of the most recent update.
    pub fn last_market_time(&self) -> Option<Timestamp> {
        self.state.read().last_market_time
    }

    pub fn statistics(&self) -> MarketStatistics {
        let state = self.state.read();
        MarketStatistics {
            uptime_seconds: self.started_at.elapsed().as_secs_f64(),
            total_updates_received: state.total_updates,
            instruments_discovered: state.info.len(),
            active_orderbooks: state.books.len(),
            total_events_cached: state.events.len(),
            last_market_time: state.last_market_time,
        }
    }
}

impl Default for MarketDataCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use algotrade_core::CandleData;
    use std::collections::HashMap;

    fn update_with_depth(
        time: Timestamp,
        instrument: &str,
        depth: DepthSnapshot,
    ) -> MarketDataUpdate {
        let mut depths = HashMap::new();
        depths.insert(instrument.to_string(), depth);
        MarketDataUpdate {
            time,
            candles: CandleData::default(),
            orderbook_depths: depths,
            events: Vec::new(),
            user_request_id: None,
        }
    }

    fn update_with_events(time: Timestamp, events: Vec<Value>) -> MarketDataUpdate {
        MarketDataUpdate {
            time,
            candles: CandleData::default(),
            orderbook_depths: HashMap::new(),
            events,
            user_request_id: None,
        }
    }

    #[test]
    fn test_derived_fields_from_snapshot() {
        let cache = MarketDataCache::new();
        let depth = DepthSnapshot::from_levels(&[(100, 5), (99, 3)], &[(101, 2), (102, 4)]);
        cache.apply(update_with_depth(10, "$CARD_future_60", depth));

        let info = cache.instrument_info("$CARD_future_60").unwrap();
        assert_eq!(info.best_bid, Some(100));
        assert_eq!(info.best_ask, Some(101));
        assert_eq!(info.bid_volume, 8);
        assert_eq!(info.ask_volume, 6);
        assert_eq!(info.spread(), Some(1));
        assert_eq!(info.first_seen, 10);

        assert_eq!(cache.best_prices("$CARD_future_60"), (Some(100), Some(101)));
        assert_eq!(cache.spread("$CARD_future_60"), Some(1));
    }

    #[test]
    fn test_snapshot_replaced_wholesale() {
        let cache = MarketDataCache::new();
        cache.apply(update_with_depth(
            1,
            "$CARD_future_60",
            DepthSnapshot::from_levels(&[(100, 5), (99, 3)], &[(101, 2)]),
        ));
        cache.apply(update_with_depth(
            2,
            "$CARD_future_60",
            DepthSnapshot::from_levels(&[(98, 1)], &[(103, 7)]),
        ));

        let book = cache.current_orderbook("$CARD_future_60").unwrap();
        assert_eq!(book.bids.len(), 1);
        assert_eq!(book.best_bid(), Some(98));

        let info = cache.instrument_info("$CARD_future_60").unwrap();
        assert_eq!(info.best_bid, Some(98));
        assert_eq!(info.best_ask, Some(103));
        assert_eq!(info.first_seen, 1);
        assert_eq!(info.last_updated, 2);
    }

    #[test]
    fn test_emptied_side_clears_best_price() {
        let cache = MarketDataCache::new();
        cache.apply(update_with_depth(
            1,
            "$CARD_future_60",
            DepthSnapshot::from_levels(&[(100, 5)], &[(101, 2)]),
        ));
        cache.apply(update_with_depth(
            2,
            "$CARD_future_60",
            DepthSnapshot::from_levels(&[], &[(101, 2)]),
        ));

        let info = cache.instrument_info("$CARD_future_60").unwrap();
        assert_eq!(info.best_bid, None);
        assert_eq!(info.bid_volume, 0);
        assert_eq!(info.best_ask, Some(101));
        assert!(cache.spread("$CARD_future_60").is_none());
    }

    #[test]
    fn test_history_bounded_fifo() {
        let cache = MarketDataCache::new();
        for t in 0..1001 {
            cache.apply(update_with_depth(
                t,
                "$CARD_future_60",
                DepthSnapshot::from_levels(&[(100 + t, 1)], &[]),
            ));
        }

        let full = cache.orderbook_history("$CARD_future_60", usize::MAX);
        assert_eq!(full.len(), ORDERBOOK_HISTORY_CAPACITY);
        // Oldest entry (t=0) evicted; t=1 survives, most recent last.
        assert_eq!(full.first().unwrap().0, 1);
        assert_eq!(full.last().unwrap().0, 1000);
    }

    #[test]
    fn test_history_tail_slice() {
        let cache = MarketDataCache::new();
        for t in 0..5 {
            cache.apply(update_with_depth(
                t,
                "$CARD_future_60",
                DepthSnapshot::from_levels(&[(100, 1)], &[]),
            ));
        }
        let tail = cache.orderbook_history("$CARD_future_60", 2);
        assert_eq!(tail.len(), 2);
        assert_eq!(tail[0].0, 3);
        assert_eq!(tail[1].0, 4);
        assert!(cache.orderbook_history("unknown", 10).is_empty());
    }

    #[test]
    fn test_event_log_bounded_fifo() {
        let cache = MarketDataCache::new();
        for i in 0..(EVENT_CAPACITY as i64 + 1) {
            cache.apply(update_with_events(i, vec![serde_json::json!({"seq": i})]));
        }

        let stats = cache.statistics();
        assert_eq!(stats.total_events_cached, EVENT_CAPACITY);

        let recent = cache.recent_events(2);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[1].payload["seq"], EVENT_CAPACITY as i64);

        // Oldest (seq 0) evicted.
        let all = cache.recent_events(usize::MAX);
        assert_eq!(all.first().unwrap().payload["seq"], 1);
    }

    #[test]
    fn test_reads_are_idempotent() {
        let cache = MarketDataCache::new();
        cache.apply(update_with_depth(
            7,
            "$CARD_call_500_60",
            DepthSnapshot::from_levels(&[(200, 2)], &[(205, 1)]),
        ));

        let first = cache.best_prices("$CARD_call_500_60");
        let second = cache.best_prices("$CARD_call_500_60");
        assert_eq!(first, second);
        assert_eq!(first, (Some(200), Some(205)));
    }

    #[test]
    fn test_unknown_instrument_reads() {
        let cache = MarketDataCache::new();
        assert!(cache.current_orderbook("nope").is_none());
        assert_eq!(cache.best_prices("nope"), (None, None));
        assert!(cache.spread("nope").is_none());
        assert!(cache.all_instruments().is_empty());
    }

    #[test]
    fn test_statistics_counts() {
        let cache = MarketDataCache::new();
        cache.apply(update_with_depth(
            1,
            "$A_future_60",
            DepthSnapshot::from_levels(&[(1, 1)], &[]),
        ));
        cache.apply(update_with_depth(
            2,
            "$B_future_60",
            DepthSnapshot::from_levels(&[(2, 1)], &[]),
        ));

        let stats = cache.statistics();
        assert_eq!(stats.total_updates_received, 2);
        assert_eq!(stats.instruments_discovered, 2);
        assert_eq!(stats.active_orderbooks, 2);
        assert_eq!(stats.last_market_time, Some(2));
        assert_eq!(
            cache.all_instruments(),
            vec!["$A_future_60".to_string(), "$B_future_60".to_string()]
        );
    }

    #[test]
    fn test_candles_replaced_per_update() {
        let cache = MarketDataCache::new();
        let mut candles = HashMap::new();
        candles.insert("$CARD".to_string(), vec![serde_json::json!({"close": 100})]);
        cache.apply(MarketDataUpdate {
            time: 1,
            candles: CandleData {
                tradeable: HashMap::new(),
                untradeable: candles,
            },
            orderbook_depths: HashMap::new(),
            events: Vec::new(),
            user_request_id: None,
        });

        let stored = cache.candles("$CARD").unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0]["close"], 100);
    }
}
