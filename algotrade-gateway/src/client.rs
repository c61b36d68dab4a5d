//! Command façade.
//!
//! `GatewayClient` owns one exchange session: it connects the transport,
//! spawns the dispatcher, and exposes typed trading commands that route
//! through the correlator. A command's lifecycle is
//! Created → Sent → {Resolved | TimedOut}; both terminal states release the
//! correlator entry.

use std::sync::Arc;
use std::time::Duration;

use algotrade_core::{
    CommandReply, CommandRequest, InstrumentSpec, Inventory, OrderId, PendingOrders, Price,
    Quantity, Side, Timestamp,
};

use crate::cache::MarketDataCache;
use crate::config::GatewayConfig;
use crate::correlator::Correlator;
use crate::dispatcher::Dispatcher;
use crate::error::GatewayError;
use crate::transport::{FrameSink, WsTransport};

/// Grace period added to an order's expiry, in seconds. Orders stay valid
/// slightly past their instrument's expiry so late fills settle.
const ORDER_EXPIRY_GRACE_SECONDS: i64 = 10;

/// Expiry timestamp for an order on an instrument expiring at
/// `expiry_seconds`: the grace buffer applied, converted to milliseconds.
fn order_expiry_ms(expiry_seconds: i64) -> Timestamp {
    (expiry_seconds + ORDER_EXPIRY_GRACE_SECONDS) * 1000
}

/// Decoded result of an `add_order` command.
///
/// `success: false` is a structured outcome, not an error: the exchange
/// accepted and answered the command but declined the order.
#[derive(Debug, Clone)]
pub struct OrderAck {
    pub success: bool,
    pub order_id: Option<OrderId>,
    pub message: Option<String>,
    pub immediate_inventory_change: Option<Quantity>,
    pub immediate_balance_change: Option<Quantity>,
}

/// Decoded result of a `cancel_order` command.
#[derive(Debug, Clone)]
pub struct CancelAck {
    pub success: bool,
    pub message: Option<String>,
}

/// One client session against the exchange.
///
/// Cheap to share behind an `Arc`; strategy tasks issue commands and read
/// the cache concurrently. There is no reconnection: once the connection
/// drops, every command fails with `ConnectionClosed` and the caller builds
/// a fresh client (fresh identifier counter, empty cache).
pub struct GatewayClient {
    sink: FrameSink,
    correlator: Arc<Correlator>,
    cache: Arc<MarketDataCache>,
    command_timeout: Duration,
}

impl GatewayClient {
    /// Connect to the exchange, perform the welcome handshake, and spawn
    /// the dispatcher task.
    pub async fn connect(config: GatewayConfig) -> Result<Self, GatewayError> {
        config.validate()?;

        let transport = WsTransport::new(&config)?;
        let (sink, frames, _welcome) = transport.connect().await?;

        let correlator = Arc::new(Correlator::new());
        let cache = Arc::new(MarketDataCache::new());

        let dispatcher = Dispatcher::new(frames, Arc::clone(&correlator), Arc::clone(&cache));
        tokio::spawn(dispatcher.run());

        Ok(GatewayClient {
            sink,
            correlator,
            cache,
            command_timeout: config.command_timeout(),
        })
    }

    /// Override the per-command deadline (default from config, 3 s).
    pub fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    /// Shared read handle to the market view fed by this session.
    pub fn cache(&self) -> Arc<MarketDataCache> {
        Arc::clone(&self.cache)
    }

    /// Number of commands currently awaiting a reply.
    pub fn pending_requests(&self) -> usize {
        self.correlator.pending_count()
    }

    /// Close the connection. The dispatcher loop ends and every outstanding
    /// command fails with `ConnectionClosed`.
    pub async fn close(&self) {
        self.sink.close().await;
    }

    /// Send a command and await its correlated reply.
    ///
    /// This is the generic path every typed method goes through; it returns
    /// the decoded reply including `Raw` for frame kinds this client does
    /// not recognize.
    pub async fn execute(&self, request: CommandRequest) -> Result<CommandReply, GatewayError> {
        // Register before transmitting so the reply cannot race the waiter.
        let (rid, rx) = self.correlator.register();
        let request = request.with_request_id(&rid);

        let json = match serde_json::to_string(&request) {
            Ok(json) => json,
            Err(e) => {
                self.correlator.abandon(&rid);
                return Err(GatewayError::Protocol(e.to_string()));
            }
        };

        tracing::debug!("Sending request {}: {}", rid, request.kind());
        if self.sink.send(json).await.is_err() {
            self.correlator.abandon(&rid);
            return Err(GatewayError::ConnectionClosed);
        }

        match tokio::time::timeout(self.command_timeout, rx).await {
            Ok(Ok(reply)) => Ok(reply),
            // Waiter dropped: the dispatcher failed all outstanding
            // requests on stream end.
            Ok(Err(_)) => Err(GatewayError::ConnectionClosed),
            Err(_) => {
                self.correlator.abandon(&rid);
                Err(GatewayError::Timeout(rid))
            }
        }
    }

    // ---- Trading commands ----

    pub async fn buy_future(
        &self,
        underlying: &str,
        expiry_seconds: i64,
        price: Price,
        quantity: Quantity,
    ) -> Result<OrderAck, GatewayError> {
        self.place_order(
            InstrumentSpec::future(underlying, expiry_seconds),
            Side::Bid,
            price,
            quantity,
        )
        .await
    }

    pub async fn sell_future(
        &self,
        underlying: &str,
        expiry_seconds: i64,
        price: Price,
        quantity: Quantity,
    ) -> Result<OrderAck, GatewayError> {
        self.place_order(
            InstrumentSpec::future(underlying, expiry_seconds),
            Side::Ask,
            price,
            quantity,
        )
        .await
    }

    pub async fn buy_call(
        &self,
        underlying: &str,
        strike: Price,
        expiry_seconds: i64,
        price: Price,
        quantity: Quantity,
    ) -> Result<OrderAck, GatewayError> {
        self.place_order(
            InstrumentSpec::call(underlying, strike, expiry_seconds),
            Side::Bid,
            price,
            quantity,
        )
        .await
    }

    pub async fn sell_call(
        &self,
        underlying: &str,
        strike: Price,
        expiry_seconds: i64,
        price: Price,
        quantity: Quantity,
    ) -> Result<OrderAck, GatewayError> {
        self.place_order(
            InstrumentSpec::call(underlying, strike, expiry_seconds),
            Side::Ask,
            price,
            quantity,
        )
        .await
    }

    pub async fn buy_put(
        &self,
        underlying: &str,
        strike: Price,
        expiry_seconds: i64,
        price: Price,
        quantity: Quantity,
    ) -> Result<OrderAck, GatewayError> {
        self.place_order(
            InstrumentSpec::put(underlying, strike, expiry_seconds),
            Side::Bid,
            price,
            quantity,
        )
        .await
    }

    pub async fn sell_put(
        &self,
        underlying: &str,
        strike: Price,
        expiry_seconds: i64,
        price: Price,
        quantity: Quantity,
    ) -> Result<OrderAck, GatewayError> {
        self.place_order(
            InstrumentSpec::put(underlying, strike, expiry_seconds),
            Side::Ask,
            price,
            quantity,
        )
        .await
    }

    pub async fn cancel_order(
        &self,
        instrument_id: &str,
        order_id: &str,
    ) -> Result<CancelAck, GatewayError> {
        let request = CommandRequest::cancel_order(instrument_id, order_id);
        match self.execute(request).await? {
            CommandReply::CancelOrder { success, message } => Ok(CancelAck { success, message }),
            CommandReply::Error { message } => Err(GatewayError::Application(message)),
            other => Err(unexpected_reply("cancel_order", &other)),
        }
    }

    /// Current holdings per instrument as `(reserved, owned)`. The cash
    /// balance is reported under the exchange's pseudo-instrument key.
    pub async fn get_inventory(&self) -> Result<Inventory, GatewayError> {
        match self.execute(CommandRequest::get_inventory()).await? {
            CommandReply::Inventory(inventory) => Ok(inventory),
            CommandReply::Error { message } => Err(GatewayError::Application(message)),
            other => Err(unexpected_reply("get_inventory", &other)),
        }
    }

    /// Resting orders per instrument as `(bid orders, ask orders)`.
    pub async fn get_pending_orders(&self) -> Result<PendingOrders, GatewayError> {
        match self.execute(CommandRequest::get_pending_orders()).await? {
            CommandReply::PendingOrders(orders) => Ok(orders),
            CommandReply::Error { message } => Err(GatewayError::Application(message)),
            other => Err(unexpected_reply("get_pending_orders", &other)),
        }
    }

    async fn place_order(
        &self,
        instrument: InstrumentSpec,
        side: Side,
        price: Price,
        quantity: Quantity,
    ) -> Result<OrderAck, GatewayError> {
        let request = build_add_order(&instrument, side, price, quantity);
        match self.execute(request).await? {
            CommandReply::AddOrder { success, data } => Ok(OrderAck {
                success,
                order_id: data.order_id,
                message: data.message,
                immediate_inventory_change: data.immediate_inventory_change,
                immediate_balance_change: data.immediate_balance_change,
            }),
            CommandReply::Error { message } => Err(GatewayError::Application(message)),
            other => Err(unexpected_reply("add_order", &other)),
        }
    }
}

fn build_add_order(
    instrument: &InstrumentSpec,
    side: Side,
    price: Price,
    quantity: Quantity,
) -> CommandRequest {
    CommandRequest::add_order(
        instrument.id(),
        price,
        order_expiry_ms(instrument.expiry_seconds),
        side,
        quantity,
    )
}

fn unexpected_reply(command: &str, reply: &CommandReply) -> GatewayError {
    GatewayError::Protocol(format!(
        "unexpected reply kind {} for {}",
        reply.kind(),
        command
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_expiry_includes_grace_in_ms() {
        assert_eq!(order_expiry_ms(60), 70_000);
        assert_eq!(order_expiry_ms(0), 10_000);
    }

    #[test]
    fn test_build_add_order_for_option() {
        let request = build_add_order(&InstrumentSpec::call("$CARD", 500, 60), Side::Ask, 42, 3);
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["type"], "add_order");
        assert_eq!(json["instrument_id"], "$CARD_call_500_60");
        assert_eq!(json["expiry"], 70_000);
        assert_eq!(json["side"], "ask");
        assert_eq!(json["price"], 42);
        assert_eq!(json["quantity"], 3);
    }

    #[test]
    fn test_build_add_order_for_future() {
        let request = build_add_order(&InstrumentSpec::future("$JUMP", 120), Side::Bid, 7, 1);
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["instrument_id"], "$JUMP_future_120");
        assert_eq!(json["expiry"], 130_000);
    }
}
