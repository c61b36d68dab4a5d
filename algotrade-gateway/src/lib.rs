//! Client gateway to the AlgoTrade trading-simulation exchange.
//!
//! One persistent websocket multiplexes request/response trading commands
//! with an unsolicited market data feed. The gateway correlates replies to
//! commands by request identifier, demultiplexes inbound frames, and keeps a
//! bounded in-memory view of the market that any number of strategy tasks
//! can read concurrently.
//!
//! ```text
//!  strategy tasks ──► GatewayClient (command façade)
//!                          │ register waiter, send frame
//!                          ▼
//!                     Correlator ◄──────────────┐ resolve by id
//!                          │                    │
//!                          ▼                    │
//!                     WsTransport ──► Dispatcher┤
//!                     (one socket)              │ market_data_update
//!                                               ▼
//!  strategy tasks ◄──────────────────── MarketDataCache
//! ```
//!
//! Exactly one task (the dispatcher) consumes the inbound stream; commands
//! resolve strictly by identifier match, never by send order. There is no
//! reconnection: a dropped connection fails outstanding commands and the
//! caller builds a fresh client.

pub mod cache;
pub mod client;
pub mod config;
pub mod correlator;
pub mod dispatcher;
pub mod error;
pub mod transport;

// Re-export key types
pub use cache::{InstrumentInfo, MarketDataCache, MarketEvent, MarketStatistics};
pub use client::{CancelAck, GatewayClient, OrderAck};
pub use config::{ConfigError, GatewayConfig, load_config, load_config_from_str};
pub use correlator::Correlator;
pub use dispatcher::Dispatcher;
pub use error::GatewayError;
pub use transport::{FrameSink, TransportError, WsTransport};
