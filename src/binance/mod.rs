//! Binance module - market-data feed over the public combined streams

pub mod client;
pub mod messages;
pub mod websocket;

pub use client::BinanceFeed;
