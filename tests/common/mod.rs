//! Common test utilities and fixtures

#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use netflow_scalper::common::types::{DepthSnapshot, TradeEvent};
use netflow_scalper::config::types::StrategyConfig;
use netflow_scalper::execution::ExecutionCommand;
use netflow_scalper::StrategyEngine;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tokio::sync::mpsc;

/// Fixed epoch for deterministic event times
pub const T0_MS: i64 = 1_700_000_000_000;

/// Event time `ms` milliseconds after [`T0_MS`]
pub fn t(ms: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(T0_MS + ms).unwrap()
}

pub fn buy(price: Decimal, qty: Decimal, ms: i64) -> TradeEvent {
    TradeEvent::new(price, qty, true, t(ms))
}

pub fn sell(price: Decimal, qty: Decimal, ms: i64) -> TradeEvent {
    TradeEvent::new(price, qty, false, t(ms))
}

/// Spread of 0.0001, inside the default 0.0002 gate
pub fn tight_depth(ms: i64) -> DepthSnapshot {
    DepthSnapshot::new(dec!(99.9999), dec!(100.0000), t(ms))
}

/// Spread of 0.0005, outside the default gate
pub fn wide_depth(ms: i64) -> DepthSnapshot {
    DepthSnapshot::new(dec!(99.9995), dec!(100.0000), t(ms))
}

/// Engine with the default configuration and its command receiver
pub fn engine() -> (StrategyEngine, mpsc::UnboundedReceiver<ExecutionCommand>) {
    engine_with(StrategyConfig::default())
}

pub fn engine_with(
    config: StrategyConfig,
) -> (StrategyEngine, mpsc::UnboundedReceiver<ExecutionCommand>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (StrategyEngine::new(config, tx), rx)
}

/// Everything the engine has sent so far
pub fn drain(rx: &mut mpsc::UnboundedReceiver<ExecutionCommand>) -> Vec<ExecutionCommand> {
    let mut commands = Vec::new();
    while let Ok(command) = rx.try_recv() {
        commands.push(command);
    }
    commands
}

/// Put a default engine into a long position at `price`, entered at `ms`
pub fn enter_long(
    engine: &mut StrategyEngine,
    rx: &mut mpsc::UnboundedReceiver<ExecutionCommand>,
    price: Decimal,
    ms: i64,
) {
    engine.on_depth(&tight_depth(ms));
    let transition = engine.on_trade(&buy(price, dec!(900), ms)).unwrap();
    assert!(transition.is_some_and(|tr| tr.is_entry()));
    drain(rx);
}

/// Put a default engine into a short position at `price`, entered at `ms`
pub fn enter_short(
    engine: &mut StrategyEngine,
    rx: &mut mpsc::UnboundedReceiver<ExecutionCommand>,
    price: Decimal,
    ms: i64,
) {
    engine.on_depth(&tight_depth(ms));
    let transition = engine.on_trade(&sell(price, dec!(900), ms)).unwrap();
    assert!(transition.is_some_and(|tr| tr.is_entry()));
    drain(rx);
}

/// Sample combined-stream frames
pub mod ws_messages {
    pub const TRADE: &str = r#"{"stream":"suiusdt@trade","data":{"e":"trade","E":1700000000001,"s":"SUIUSDT","t":1,"p":"1.2345","q":"250","T":1700000000000,"m":false,"M":true}}"#;

    pub const AGG_TRADE_SELL: &str = r#"{"stream":"suiusdt@aggTrade","data":{"e":"aggTrade","E":1700000000002,"s":"SUIUSDT","a":7,"p":"1.2344","q":"120","f":1,"l":2,"T":1700000000001,"m":true,"M":true}}"#;

    pub const DEPTH: &str = r#"{"stream":"suiusdt@depth5@100ms","data":{"lastUpdateId":160,"bids":[["1.2344","900"],["1.2343","400"]],"asks":[["1.2345","700"],["1.2346","300"]]}}"#;
}

/// Sample REST responses
pub mod api_responses {
    pub const ORDER_FILLED: &str = r#"{
        "orderId": 22542179,
        "symbol": "SUIUSDT",
        "status": "FILLED",
        "clientOrderId": "testOrder",
        "executedQty": "100",
        "side": "BUY",
        "type": "MARKET"
    }"#;

    pub const INSUFFICIENT_MARGIN: &str = r#"{"code": -2019, "msg": "Margin is insufficient."}"#;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_spreads() {
        let tight = tight_depth(0);
        let wide = wide_depth(0);
        assert_eq!(tight.best_ask - tight.best_bid, dec!(0.0001));
        assert_eq!(wide.best_ask - wide.best_bid, dec!(0.0005));
    }
}
