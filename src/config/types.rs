//! Configuration types

use chrono::Duration;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::common::errors::{Result, ScalperError};

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Market-data feed configuration
    #[serde(default)]
    pub feed: FeedConfig,
    /// Strategy thresholds and timers
    #[serde(default)]
    pub strategy: StrategyConfig,
    /// Execution adapter selection and settings
    #[serde(default)]
    pub execution: ExecutionConfig,
    /// General application settings
    #[serde(default)]
    pub settings: AppSettings,
}

impl AppConfig {
    /// Reject configurations the engine cannot run with
    pub fn validate(&self) -> Result<()> {
        self.feed.validate()?;
        self.strategy.validate()?;
        self.execution.validate()
    }
}

/// Binance combined-stream feed configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Instrument symbol in stream form (lowercase)
    #[serde(default = "default_symbol")]
    pub symbol: String,
    /// WebSocket base URL
    #[serde(default = "default_binance_ws_url")]
    pub websocket_url: String,
    /// Stream suffixes subscribed for the symbol
    #[serde(default = "default_streams")]
    pub streams: Vec<String>,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            symbol: default_symbol(),
            websocket_url: default_binance_ws_url(),
            streams: default_streams(),
        }
    }
}

impl FeedConfig {
    fn validate(&self) -> Result<()> {
        if self.symbol.trim().is_empty() {
            return Err(ScalperError::Configuration("feed.symbol is empty".to_string()));
        }
        if self.streams.is_empty() {
            return Err(ScalperError::Configuration("feed.streams is empty".to_string()));
        }
        url::Url::parse(&self.websocket_url)?;
        Ok(())
    }
}

fn default_symbol() -> String {
    "suiusdt".to_string()
}

fn default_binance_ws_url() -> String {
    "wss://stream.binance.com:9443".to_string()
}

fn default_streams() -> Vec<String> {
    vec![
        "trade".to_string(),
        "aggTrade".to_string(),
        "depth5@100ms".to_string(),
    ]
}

/// Strategy thresholds, risk rules and gate timers
///
/// Ratios are fractions (0.001 = 0.1%), durations are seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyConfig {
    /// Net volume needed to open a position
    #[serde(default = "default_entry_threshold")]
    pub entry_threshold: Decimal,
    /// Opposing net volume that closes a position
    #[serde(default = "default_exit_threshold")]
    pub exit_threshold: Decimal,
    /// Maximum ask - bid for the spread gate to open
    #[serde(default = "default_spread_tight")]
    pub spread_tight: Decimal,
    #[serde(default = "default_take_profit_pct")]
    pub take_profit_pct: Decimal,
    #[serde(default = "default_stop_loss_pct")]
    pub stop_loss_pct: Decimal,
    #[serde(default = "default_max_hold_secs")]
    pub max_hold_secs: f64,
    /// Length of the net-volume window
    #[serde(default = "default_window_secs")]
    pub volume_window_secs: f64,
    /// How recent the last trade must be for an entry
    #[serde(default = "default_window_secs")]
    pub activity_window_secs: f64,
    #[serde(default = "default_cooldown_secs")]
    pub cooldown_secs: f64,
    /// Parsed and logged, not used by any gate
    #[serde(default = "default_burst_window_secs")]
    pub burst_window_secs: f64,
    /// Fixed order quantity
    #[serde(default = "default_order_qty")]
    pub order_qty: Decimal,
    /// Evaluate the entry gate before recording the current trade as activity
    #[serde(default)]
    pub check_gate_before_activity: bool,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            entry_threshold: default_entry_threshold(),
            exit_threshold: default_exit_threshold(),
            spread_tight: default_spread_tight(),
            take_profit_pct: default_take_profit_pct(),
            stop_loss_pct: default_stop_loss_pct(),
            max_hold_secs: default_max_hold_secs(),
            volume_window_secs: default_window_secs(),
            activity_window_secs: default_window_secs(),
            cooldown_secs: default_cooldown_secs(),
            burst_window_secs: default_burst_window_secs(),
            order_qty: default_order_qty(),
            check_gate_before_activity: false,
        }
    }
}

/// Longest accepted strategy window or timer, in seconds
pub const MAX_DURATION_SECS: f64 = 86_400.0;

impl StrategyConfig {
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("entry_threshold", self.entry_threshold),
            ("exit_threshold", self.exit_threshold),
            ("take_profit_pct", self.take_profit_pct),
            ("stop_loss_pct", self.stop_loss_pct),
            ("order_qty", self.order_qty),
        ];
        for (name, value) in positive {
            if value <= Decimal::ZERO {
                return Err(ScalperError::Configuration(format!(
                    "strategy.{} must be positive, got {}",
                    name, value
                )));
            }
        }
        if self.spread_tight < Decimal::ZERO {
            return Err(ScalperError::Configuration(format!(
                "strategy.spread_tight must not be negative, got {}",
                self.spread_tight
            )));
        }

        let durations = [
            ("max_hold_secs", self.max_hold_secs),
            ("volume_window_secs", self.volume_window_secs),
            ("activity_window_secs", self.activity_window_secs),
            ("burst_window_secs", self.burst_window_secs),
        ];
        for (name, secs) in durations {
            if !secs.is_finite() || secs <= 0.0 || secs > MAX_DURATION_SECS {
                return Err(ScalperError::Configuration(format!(
                    "strategy.{} must be in (0, {}] seconds, got {}",
                    name, MAX_DURATION_SECS, secs
                )));
            }
        }
        let cooldown = self.cooldown_secs;
        if !cooldown.is_finite() || cooldown < 0.0 || cooldown > MAX_DURATION_SECS {
            return Err(ScalperError::Configuration(format!(
                "strategy.cooldown_secs must be in [0, {}] seconds, got {}",
                MAX_DURATION_SECS, cooldown
            )));
        }
        Ok(())
    }

    pub fn max_hold(&self) -> Duration {
        secs_to_duration(self.max_hold_secs)
    }

    pub fn volume_window(&self) -> Duration {
        secs_to_duration(self.volume_window_secs)
    }

    pub fn activity_window(&self) -> Duration {
        secs_to_duration(self.activity_window_secs)
    }

    pub fn cooldown(&self) -> Duration {
        secs_to_duration(self.cooldown_secs)
    }
}

/// Fractional seconds to a chrono duration with millisecond resolution
pub fn secs_to_duration(secs: f64) -> Duration {
    Duration::milliseconds((secs * 1000.0).round() as i64)
}

fn default_entry_threshold() -> Decimal {
    dec!(800)
}

fn default_exit_threshold() -> Decimal {
    dec!(752)
}

fn default_spread_tight() -> Decimal {
    dec!(0.00020)
}

fn default_take_profit_pct() -> Decimal {
    dec!(0.00100)
}

fn default_stop_loss_pct() -> Decimal {
    dec!(0.00045)
}

fn default_max_hold_secs() -> f64 {
    5.0
}

fn default_window_secs() -> f64 {
    2.0
}

fn default_cooldown_secs() -> f64 {
    8.0
}

fn default_burst_window_secs() -> f64 {
    0.4
}

fn default_order_qty() -> Decimal {
    dec!(100)
}

/// Which execution adapter drives orders
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    /// Log-only, no orders leave the process
    #[default]
    DryRun,
    /// Browser automation over WebDriver
    WebDriver,
    /// Signed REST orders against the exchange API
    Rest,
}

impl std::fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExecutionMode::DryRun => write!(f, "dry_run"),
            ExecutionMode::WebDriver => write!(f, "web_driver"),
            ExecutionMode::Rest => write!(f, "rest"),
        }
    }
}

/// Execution adapter configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionConfig {
    #[serde(default)]
    pub mode: ExecutionMode,
    /// Use the dry-run adapter when a live adapter cannot be built
    #[serde(default = "default_true")]
    pub fallback_to_dry_run: bool,
    #[serde(default)]
    pub webdriver: WebDriverConfig,
    #[serde(default)]
    pub rest: RestConfig,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            mode: ExecutionMode::default(),
            fallback_to_dry_run: true,
            webdriver: WebDriverConfig::default(),
            rest: RestConfig::default(),
        }
    }
}

impl ExecutionConfig {
    fn validate(&self) -> Result<()> {
        match self.mode {
            ExecutionMode::DryRun => Ok(()),
            ExecutionMode::WebDriver => {
                url::Url::parse(&self.webdriver.driver_url)?;
                Ok(())
            }
            ExecutionMode::Rest => {
                url::Url::parse(&self.rest.base_url)?;
                Ok(())
            }
        }
    }
}

fn default_true() -> bool {
    true
}

/// Which quantity input the UI adapter types into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QtyInput {
    /// Order form on the right-hand panel
    #[default]
    Side,
    /// Quantity selector under the chart
    Bottom,
}

/// CSS selectors for the exchange web UI
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiSelectors {
    #[serde(default = "default_qty_side_selector")]
    pub qty_input_side: String,
    #[serde(default = "default_qty_bottom_selector")]
    pub qty_input_bottom: String,
    #[serde(default = "default_open_long_selector")]
    pub open_long: String,
    #[serde(default = "default_open_short_selector")]
    pub open_short: String,
    #[serde(default = "default_close_all_selector")]
    pub close_all: String,
    #[serde(default = "default_modal_confirm_selector")]
    pub modal_confirm: String,
    #[serde(default = "default_toast_selector")]
    pub toast: String,
    #[serde(default = "default_open_tab_selector")]
    pub open_tab: String,
}

impl Default for UiSelectors {
    fn default() -> Self {
        Self {
            qty_input_side: default_qty_side_selector(),
            qty_input_bottom: default_qty_bottom_selector(),
            open_long: default_open_long_selector(),
            open_short: default_open_short_selector(),
            close_all: default_close_all_selector(),
            modal_confirm: default_modal_confirm_selector(),
            toast: default_toast_selector(),
            open_tab: default_open_tab_selector(),
        }
    }
}

fn default_qty_side_selector() -> String {
    "#mexc_contract_v_open_position div.input-wrapper > div.extend-wrapper > input.ant-input"
        .to_string()
}

fn default_qty_bottom_selector() -> String {
    "input[id^=rc_select_]".to_string()
}

fn default_open_long_selector() -> String {
    r#"button[data-testid="contract-trade-open-long-btn"]"#.to_string()
}

fn default_open_short_selector() -> String {
    r#"button[data-testid="contract-trade-open-short-btn"]"#.to_string()
}

fn default_close_all_selector() -> String {
    r#"#mexc-web-futures-exchange-handle-content-right div[class^="CloseAllPosition_closeAllPosition"]"#
        .to_string()
}

fn default_modal_confirm_selector() -> String {
    "div.ant-modal-content > div.ant-modal-footer > button.ant-btn.ant-btn-primary".to_string()
}

fn default_toast_selector() -> String {
    "div.ant-notification-notice-message".to_string()
}

fn default_open_tab_selector() -> String {
    r#"span[data-testid="contract-trade-order-form-tab-open"]"#.to_string()
}

/// WebDriver (chromedriver) UI automation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebDriverConfig {
    /// chromedriver endpoint
    #[serde(default = "default_driver_url")]
    pub driver_url: String,
    /// Remote-debugging address of the already-running browser
    #[serde(default = "default_debugger_address")]
    pub debugger_address: String,
    /// How long to wait for an element to become available
    #[serde(default = "default_wait_timeout_ms")]
    pub wait_timeout_ms: u64,
    /// Per-element wait budget inside a heartbeat check
    #[serde(default = "default_heartbeat_wait_ms")]
    pub heartbeat_wait_ms: u64,
    /// Poll interval while waiting for an element
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Pause between the close-all click and the confirmation modal
    #[serde(default = "default_modal_delay_ms")]
    pub modal_delay_ms: u64,
    #[serde(default)]
    pub qty_input: QtyInput,
    /// Toast text after an open order fills
    #[serde(default = "default_open_fill_message")]
    pub open_fill_message: String,
    /// Toast text after close-all fills
    #[serde(default = "default_close_fill_message")]
    pub close_fill_message: String,
    #[serde(default)]
    pub selectors: UiSelectors,
}

impl Default for WebDriverConfig {
    fn default() -> Self {
        Self {
            driver_url: default_driver_url(),
            debugger_address: default_debugger_address(),
            wait_timeout_ms: default_wait_timeout_ms(),
            heartbeat_wait_ms: default_heartbeat_wait_ms(),
            poll_interval_ms: default_poll_interval_ms(),
            modal_delay_ms: default_modal_delay_ms(),
            qty_input: QtyInput::default(),
            open_fill_message: default_open_fill_message(),
            close_fill_message: default_close_fill_message(),
            selectors: UiSelectors::default(),
        }
    }
}

fn default_driver_url() -> String {
    "http://127.0.0.1:9515".to_string()
}

fn default_debugger_address() -> String {
    "127.0.0.1:9222".to_string()
}

fn default_wait_timeout_ms() -> u64 {
    10_000
}

fn default_heartbeat_wait_ms() -> u64 {
    500
}

fn default_poll_interval_ms() -> u64 {
    100
}

fn default_modal_delay_ms() -> u64 {
    500
}

fn default_open_fill_message() -> String {
    "order filled completely".to_string()
}

fn default_close_fill_message() -> String {
    "Order Filled".to_string()
}

/// How the HMAC signature is encoded on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignatureEncoding {
    #[default]
    Hex,
    Base64,
}

/// Signed REST order API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestConfig {
    /// Base URL for the futures REST API
    #[serde(default = "default_rest_url")]
    pub base_url: String,
    /// Order symbol (exchange form, uppercase)
    #[serde(default = "default_rest_symbol")]
    pub symbol: String,
    /// API key for authenticated requests
    #[serde(default)]
    pub api_key: Option<String>,
    /// API secret for signing requests
    #[serde(default)]
    pub api_secret: Option<String>,
    #[serde(default)]
    pub signature_encoding: SignatureEncoding,
    /// Signature validity window in milliseconds
    #[serde(default = "default_recv_window")]
    pub recv_window_ms: u64,
}

impl Default for RestConfig {
    fn default() -> Self {
        Self {
            base_url: default_rest_url(),
            symbol: default_rest_symbol(),
            api_key: None,
            api_secret: None,
            signature_encoding: SignatureEncoding::default(),
            recv_window_ms: default_recv_window(),
        }
    }
}

impl RestConfig {
    /// Credentials, if both halves are configured
    pub fn credentials(&self) -> Option<ApiCredentials> {
        match (&self.api_key, &self.api_secret) {
            (Some(key), Some(secret)) => Some(ApiCredentials::new(key.clone(), secret.clone())),
            _ => None,
        }
    }
}

fn default_rest_url() -> String {
    "https://fapi.binance.com".to_string()
}

fn default_rest_symbol() -> String {
    "SUIUSDT".to_string()
}

fn default_recv_window() -> u64 {
    5000
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Delay between reconnection attempts in milliseconds
    #[serde(default = "default_reconnect_delay")]
    pub reconnect_delay_ms: u64,
    /// Maximum reconnection attempts (0 = infinite)
    #[serde(default)]
    pub max_reconnect_attempts: u32,
    /// Execution heartbeat interval in seconds
    #[serde(default = "default_heartbeat_interval")]
    pub heartbeat_interval_seconds: u64,
    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
    /// Market event channel capacity
    #[serde(default = "default_channel_size")]
    pub channel_size: usize,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            reconnect_delay_ms: default_reconnect_delay(),
            max_reconnect_attempts: 0,
            heartbeat_interval_seconds: default_heartbeat_interval(),
            request_timeout_seconds: default_request_timeout(),
            channel_size: default_channel_size(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_reconnect_delay() -> u64 {
    5000
}

fn default_heartbeat_interval() -> u64 {
    10
}

fn default_request_timeout() -> u64 {
    30
}

fn default_channel_size() -> usize {
    crate::common::channels::DEFAULT_CHANNEL_SIZE
}

/// API credentials for authenticated requests
#[derive(Debug, Clone)]
pub struct ApiCredentials {
    pub api_key: String,
    pub api_secret: String,
}

impl ApiCredentials {
    pub fn new(api_key: String, api_secret: String) -> Self {
        Self {
            api_key,
            api_secret,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_reference_constants() {
        let cfg = StrategyConfig::default();
        assert_eq!(cfg.entry_threshold, dec!(800));
        assert_eq!(cfg.exit_threshold, dec!(752));
        assert_eq!(cfg.spread_tight, dec!(0.0002));
        assert_eq!(cfg.cooldown(), Duration::seconds(8));
        assert_eq!(cfg.max_hold(), Duration::seconds(5));
        assert_eq!(cfg.volume_window(), Duration::seconds(2));
        assert!(!cfg.check_gate_before_activity);
        assert!(AppConfig::default().validate().is_ok());
    }

    #[test]
    fn test_fractional_seconds() {
        assert_eq!(secs_to_duration(0.4), Duration::milliseconds(400));
        assert_eq!(secs_to_duration(2.5), Duration::milliseconds(2500));
    }

    #[test]
    fn test_validate_rejects_non_positive_values() {
        let cfg = StrategyConfig {
            entry_threshold: Decimal::ZERO,
            ..StrategyConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(ScalperError::Configuration(_))));

        let cfg = StrategyConfig {
            volume_window_secs: 0.0,
            ..StrategyConfig::default()
        };
        assert!(cfg.validate().is_err());

        let cfg = StrategyConfig {
            max_hold_secs: f64::NAN,
            ..StrategyConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_validate_bounds_durations() {
        let cfg = StrategyConfig {
            cooldown_secs: 1e13,
            ..StrategyConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(ScalperError::Configuration(_))));

        let cfg = StrategyConfig {
            volume_window_secs: 1e13,
            ..StrategyConfig::default()
        };
        assert!(cfg.validate().is_err());

        let cfg = StrategyConfig {
            max_hold_secs: MAX_DURATION_SECS + 1.0,
            ..StrategyConfig::default()
        };
        assert!(cfg.validate().is_err());

        let cfg = StrategyConfig {
            activity_window_secs: MAX_DURATION_SECS,
            cooldown_secs: MAX_DURATION_SECS,
            ..StrategyConfig::default()
        };
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_rest_credentials_need_both_halves() {
        let mut rest = RestConfig::default();
        assert!(rest.credentials().is_none());
        rest.api_key = Some("key".to_string());
        assert!(rest.credentials().is_none());
        rest.api_secret = Some("secret".to_string());
        assert_eq!(rest.credentials().map(|c| c.api_key), Some("key".to_string()));
    }

    #[test]
    fn test_feed_validation() {
        let mut feed = FeedConfig::default();
        assert!(feed.validate().is_ok());
        feed.websocket_url = "not a url".to_string();
        assert!(feed.validate().is_err());
    }
}
