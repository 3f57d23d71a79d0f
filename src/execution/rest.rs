//! Signed market orders against the futures REST API

use async_trait::async_trait;
use reqwest::{Client, Response};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use super::auth::signed_query;
use crate::common::errors::{Result, ScalperError};
use crate::common::traits::ExecutionAdapter;
use crate::common::types::Side;
use crate::config::types::{ApiCredentials, RestConfig, SignatureEncoding};

const ORDER_PATH: &str = "/fapi/v1/order";
const PING_PATH: &str = "/fapi/v1/ping";

/// Order acknowledgement returned by the exchange
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderAck {
    pub order_id: i64,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub executed_qty: Option<String>,
}

/// Exchange error body (`{"code": -2019, "msg": "..."}`)
#[derive(Debug, Clone, Deserialize)]
struct ApiErrorBody {
    code: i64,
    msg: String,
}

/// Execution adapter that places MARKET orders over signed REST
#[derive(Debug, Clone)]
pub struct RestAdapter {
    client: Client,
    base_url: String,
    symbol: String,
    credentials: ApiCredentials,
    encoding: SignatureEncoding,
    recv_window_ms: u64,
    /// Quantity staged for the next open
    staged_qty: Option<Decimal>,
    /// Side and size of the last open, used to build the closing order
    open: Option<(Side, Decimal)>,
}

impl RestAdapter {
    /// Create the adapter; fails when API credentials are missing
    pub fn new(config: &RestConfig, timeout: Duration) -> Result<Self> {
        let credentials = config.credentials().ok_or_else(|| {
            ScalperError::Authentication("REST execution requires api_key and api_secret".to_string())
        })?;

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ScalperError::Internal(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            symbol: config.symbol.to_uppercase(),
            credentials,
            encoding: config.signature_encoding,
            recv_window_ms: config.recv_window_ms,
            staged_qty: None,
            open: None,
        })
    }

    pub fn staged_qty(&self) -> Option<Decimal> {
        self.staged_qty
    }

    /// Side and quantity of the position this adapter believes is open
    pub fn open_position(&self) -> Option<(Side, Decimal)> {
        self.open
    }

    #[instrument(skip(self), fields(symbol = %self.symbol))]
    async fn place_market_order(&self, side: Side, qty: Decimal, reduce_only: bool) -> Result<OrderAck> {
        let side_str = match side {
            Side::Buy => "BUY",
            Side::Sell => "SELL",
        };
        let mut params = vec![
            ("symbol", self.symbol.clone()),
            ("side", side_str.to_string()),
            ("type", "MARKET".to_string()),
            ("quantity", qty.normalize().to_string()),
        ];
        if reduce_only {
            params.push(("reduceOnly", "true".to_string()));
        }

        let query = signed_query(
            &params,
            self.recv_window_ms,
            chrono::Utc::now().timestamp_millis(),
            &self.credentials.api_secret,
            self.encoding,
        )?;
        let url = format!("{}{}?{}", self.base_url, ORDER_PATH, query);
        debug!(side = side_str, qty = %qty, reduce_only, "placing market order");

        let response = self
            .client
            .post(&url)
            .header("X-MBX-APIKEY", &self.credentials.api_key)
            .send()
            .await?;

        let ack: OrderAck = Self::check_response(response).await?.json().await?;
        info!(
            order_id = ack.order_id,
            status = %ack.status,
            executed_qty = ack.executed_qty.as_deref().unwrap_or("-"),
            "order accepted"
        );
        Ok(ack)
    }

    async fn check_response(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        match serde_json::from_str::<ApiErrorBody>(&body) {
            Ok(err) if status.as_u16() == 401 || err.code == -2014 || err.code == -2015 => Err(
                ScalperError::Authentication(format!("{} (code {})", err.msg, err.code)),
            ),
            Ok(err) => Err(ScalperError::Execution(format!(
                "order rejected: {} (code {})",
                err.msg, err.code
            ))),
            Err(_) => Err(ScalperError::InvalidResponse(format!(
                "Server returned status {}: {}",
                status, body
            ))),
        }
    }

    async fn open(&mut self, side: Side) -> Result<()> {
        let qty = self.staged_qty.ok_or_else(|| {
            ScalperError::Execution("no quantity staged before open".to_string())
        })?;
        if self.open.is_some() {
            warn!("opening while a previous position is still tracked as open");
        }
        self.place_market_order(side, qty, false).await?;
        self.open = Some((side, qty));
        Ok(())
    }
}

#[async_trait]
impl ExecutionAdapter for RestAdapter {
    async fn prepare_next_entry_qty(&mut self, qty: Decimal) -> Result<()> {
        if qty <= Decimal::ZERO {
            return Err(ScalperError::InvalidInput(format!(
                "order quantity must be positive, got {}",
                qty
            )));
        }
        self.staged_qty = Some(qty);
        Ok(())
    }

    async fn fast_click_long(&mut self) -> Result<()> {
        self.open(Side::Buy).await
    }

    async fn fast_click_short(&mut self) -> Result<()> {
        self.open(Side::Sell).await
    }

    async fn fast_click_settle(&mut self) -> Result<()> {
        let Some((side, qty)) = self.open else {
            warn!("settle requested with no tracked position");
            return Ok(());
        };
        let closing = match side {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        };
        self.place_market_order(closing, qty, true).await?;
        self.open = None;
        Ok(())
    }

    async fn heartbeat(&mut self) -> bool {
        let url = format!("{}{}", self.base_url, PING_PATH);
        match self.client.get(&url).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                debug!(error = %e, "ping failed");
                false
            }
        }
    }

    fn name(&self) -> &'static str {
        "rest"
    }
}
