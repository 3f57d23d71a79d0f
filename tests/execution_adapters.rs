//! Integration tests for the live execution adapters
//!
//! Both adapters are pointed at a local mock HTTP server: the REST adapter
//! at a fake futures order API, the WebDriver adapter at a fake
//! chromedriver.

mod common;

use common::api_responses;
use netflow_scalper::common::errors::ScalperError;
use netflow_scalper::common::types::Side;
use netflow_scalper::config::types::{RestConfig, SignatureEncoding, WebDriverConfig};
use netflow_scalper::execution::auth::sign_payload;
use netflow_scalper::execution::{run_dispatcher, ExecutionCommand};
use netflow_scalper::{ExecutionAdapter, RestAdapter, WebDriverAdapter};
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use std::time::Duration;
use tokio::sync::mpsc;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Match, Mock, MockServer, Request, ResponseTemplate};

const TIMEOUT: Duration = Duration::from_secs(5);
const SESSION: &str = "session-1";

// ============================================================================
// Matchers
// ============================================================================

/// Signature parameter is the HMAC of everything before it
struct ValidSignature {
    secret: &'static str,
    encoding: SignatureEncoding,
}

impl Match for ValidSignature {
    fn matches(&self, request: &Request) -> bool {
        let Some(query) = request.url.query() else {
            return false;
        };
        let Some((unsigned, _)) = query.rsplit_once("&signature=") else {
            return false;
        };
        let Some((_, signature)) = request.url.query_pairs().find(|(k, _)| k == "signature") else {
            return false;
        };
        sign_payload(self.secret, unsigned, self.encoding)
            .map(|expected| expected == signature)
            .unwrap_or(false)
    }
}

/// Element lookup by a specific CSS selector
struct FindBy(String);

impl Match for FindBy {
    fn matches(&self, request: &Request) -> bool {
        serde_json::from_slice::<Value>(&request.body)
            .map(|body| body["using"] == "css selector" && body["value"] == self.0.as_str())
            .unwrap_or(false)
    }
}

/// New-session request that attaches to the given debugger address
struct AttachesTo(&'static str);

impl Match for AttachesTo {
    fn matches(&self, request: &Request) -> bool {
        serde_json::from_slice::<Value>(&request.body)
            .map(|body| {
                body["capabilities"]["alwaysMatch"]["goog:chromeOptions"]["debuggerAddress"]
                    == self.0
            })
            .unwrap_or(false)
    }
}

// ============================================================================
// REST adapter
// ============================================================================

fn rest_config(server: &MockServer, encoding: SignatureEncoding) -> RestConfig {
    RestConfig {
        base_url: server.uri(),
        api_key: Some("test-key".to_string()),
        api_secret: Some("test-secret".to_string()),
        signature_encoding: encoding,
        ..RestConfig::default()
    }
}

fn filled() -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(api_responses::ORDER_FILLED, "application/json")
}

#[tokio::test]
async fn test_rest_open_and_settle_long() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/fapi/v1/order"))
        .and(header("X-MBX-APIKEY", "test-key"))
        .and(query_param("symbol", "SUIUSDT"))
        .and(query_param("side", "BUY"))
        .and(query_param("type", "MARKET"))
        .and(query_param("quantity", "100"))
        .and(ValidSignature {
            secret: "test-secret",
            encoding: SignatureEncoding::Hex,
        })
        .respond_with(filled())
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/fapi/v1/order"))
        .and(query_param("side", "SELL"))
        .and(query_param("reduceOnly", "true"))
        .and(query_param("quantity", "100"))
        .respond_with(filled())
        .expect(1)
        .mount(&server)
        .await;

    let mut adapter = RestAdapter::new(&rest_config(&server, SignatureEncoding::Hex), TIMEOUT).unwrap();
    adapter.prepare_next_entry_qty(dec!(100)).await.unwrap();
    adapter.fast_click_long().await.unwrap();
    assert_eq!(adapter.open_position(), Some((Side::Buy, dec!(100))));

    adapter.fast_click_settle().await.unwrap();
    assert!(adapter.open_position().is_none());
}

#[tokio::test]
async fn test_rest_base64_signature() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/fapi/v1/order"))
        .and(query_param("side", "SELL"))
        .and(ValidSignature {
            secret: "test-secret",
            encoding: SignatureEncoding::Base64,
        })
        .respond_with(filled())
        .expect(1)
        .mount(&server)
        .await;

    let mut adapter =
        RestAdapter::new(&rest_config(&server, SignatureEncoding::Base64), TIMEOUT).unwrap();
    adapter.prepare_next_entry_qty(dec!(25.5)).await.unwrap();
    adapter.fast_click_short().await.unwrap();
    assert_eq!(adapter.open_position(), Some((Side::Sell, dec!(25.5))));
}

#[tokio::test]
async fn test_rest_rejected_order() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/fapi/v1/order"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_raw(api_responses::INSUFFICIENT_MARGIN, "application/json"),
        )
        .mount(&server)
        .await;

    let mut adapter = RestAdapter::new(&rest_config(&server, SignatureEncoding::Hex), TIMEOUT).unwrap();
    adapter.prepare_next_entry_qty(dec!(100)).await.unwrap();

    let err = adapter.fast_click_long().await.unwrap_err();
    assert!(matches!(err, ScalperError::Execution(ref msg) if msg.contains("-2019")));
    assert!(adapter.open_position().is_none());
}

#[tokio::test]
async fn test_rest_bad_key() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/fapi/v1/order"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "code": -2015,
            "msg": "Invalid API-key, IP, or permissions for action."
        })))
        .mount(&server)
        .await;

    let mut adapter = RestAdapter::new(&rest_config(&server, SignatureEncoding::Hex), TIMEOUT).unwrap();
    adapter.prepare_next_entry_qty(dec!(100)).await.unwrap();

    let err = adapter.fast_click_short().await.unwrap_err();
    assert!(matches!(err, ScalperError::Authentication(_)));
}

#[tokio::test]
async fn test_rest_heartbeat() {
    let server = MockServer::start().await;
    let mut adapter = RestAdapter::new(&rest_config(&server, SignatureEncoding::Hex), TIMEOUT).unwrap();

    // Unmatched requests get a 404
    assert!(!adapter.heartbeat().await);

    Mock::given(method("GET"))
        .and(path("/fapi/v1/ping"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;
    assert!(adapter.heartbeat().await);
}

#[tokio::test]
async fn test_dispatcher_drives_rest_adapter() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/fapi/v1/order"))
        .and(query_param("side", "SELL"))
        .and(query_param("quantity", "40"))
        .respond_with(filled())
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/fapi/v1/order"))
        .and(query_param("side", "BUY"))
        .and(query_param("reduceOnly", "true"))
        .and(query_param("quantity", "40"))
        .respond_with(filled())
        .expect(1)
        .mount(&server)
        .await;

    let mut adapter = RestAdapter::new(&rest_config(&server, SignatureEncoding::Hex), TIMEOUT).unwrap();
    let (tx, rx) = mpsc::unbounded_channel();
    tx.send(ExecutionCommand::PrepareEntryQty(dec!(40))).unwrap();
    tx.send(ExecutionCommand::OpenShort).unwrap();
    tx.send(ExecutionCommand::Settle).unwrap();
    drop(tx);

    run_dispatcher(&mut adapter, rx, Duration::from_secs(3600)).await;
    assert!(adapter.open_position().is_none());
}

// ============================================================================
// WebDriver adapter
// ============================================================================

fn wd_config(server: &MockServer) -> WebDriverConfig {
    WebDriverConfig {
        driver_url: server.uri(),
        wait_timeout_ms: 300,
        poll_interval_ms: 10,
        modal_delay_ms: 0,
        ..WebDriverConfig::default()
    }
}

fn wd_value(value: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({ "value": value }))
}

fn element_path(id: &str, action: &str) -> String {
    format!("/session/{}/element/{}/{}", SESSION, id, action)
}

async fn mount_session(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/session"))
        .and(AttachesTo("127.0.0.1:9222"))
        .respond_with(wd_value(json!({ "sessionId": SESSION, "capabilities": {} })))
        .expect(1)
        .mount(server)
        .await;
}

/// A visible, enabled element; `clicks` is the exact number of clicks expected
async fn mount_element(server: &MockServer, selector: &str, id: &str, clicks: u64) {
    Mock::given(method("POST"))
        .and(path(format!("/session/{}/element", SESSION)))
        .and(FindBy(selector.to_string()))
        .respond_with(wd_value(
            json!({ "element-6066-11e4-a52e-4f735466cecf": id }),
        ))
        .mount(server)
        .await;

    for state in ["displayed", "enabled"] {
        Mock::given(method("GET"))
            .and(path(element_path(id, state)))
            .respond_with(wd_value(json!(true)))
            .mount(server)
            .await;
    }

    Mock::given(method("POST"))
        .and(path(element_path(id, "click")))
        .respond_with(wd_value(Value::Null))
        .expect(clicks)
        .mount(server)
        .await;
}

async fn mount_toast(server: &MockServer, config: &WebDriverConfig, text: &str) {
    mount_element(server, &config.selectors.toast, "toast", 0).await;
    Mock::given(method("GET"))
        .and(path(element_path("toast", "text")))
        .respond_with(wd_value(json!(text)))
        .mount(server)
        .await;
}

async fn connect(server: &MockServer, config: WebDriverConfig) -> WebDriverAdapter {
    mount_session(server).await;
    WebDriverAdapter::connect(config, TIMEOUT).await.unwrap()
}

#[tokio::test]
async fn test_webdriver_attaches_to_running_browser() {
    let server = MockServer::start().await;
    let adapter = connect(&server, wd_config(&server)).await;

    assert_eq!(adapter.session_id(), SESSION);
    assert_eq!(adapter.name(), "web_driver");
}

#[tokio::test]
async fn test_webdriver_sets_quantity() {
    let server = MockServer::start().await;
    let config = wd_config(&server);
    mount_element(&server, &config.selectors.qty_input_side, "qty", 0).await;
    // select-all, delete, value, tab
    Mock::given(method("POST"))
        .and(path(element_path("qty", "value")))
        .respond_with(wd_value(Value::Null))
        .expect(4)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(element_path("qty", "property/value")))
        .respond_with(wd_value(json!("100")))
        .mount(&server)
        .await;

    let mut adapter = connect(&server, config).await;
    adapter.prepare_next_entry_qty(dec!(100)).await.unwrap();
    assert_eq!(adapter.staged_qty(), Some(dec!(100)));
}

#[tokio::test]
async fn test_webdriver_quantity_mismatch() {
    let server = MockServer::start().await;
    let config = wd_config(&server);
    mount_element(&server, &config.selectors.qty_input_side, "qty", 0).await;
    Mock::given(method("POST"))
        .and(path(element_path("qty", "value")))
        .respond_with(wd_value(Value::Null))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(element_path("qty", "property/value")))
        .respond_with(wd_value(json!("10")))
        .mount(&server)
        .await;

    let mut adapter = connect(&server, config).await;
    let err = adapter.prepare_next_entry_qty(dec!(100)).await.unwrap_err();
    assert!(matches!(err, ScalperError::Execution(_)));
    assert!(adapter.staged_qty().is_none());
}

#[tokio::test]
async fn test_webdriver_open_long_checks_fill_toast() {
    let server = MockServer::start().await;
    let config = wd_config(&server);
    mount_element(&server, &config.selectors.open_long, "open-long", 1).await;
    mount_toast(&server, &config, "Open long: order filled completely").await;

    let mut adapter = connect(&server, config).await;
    adapter.fast_click_long().await.unwrap();
}

#[tokio::test]
async fn test_webdriver_unexpected_toast_is_an_error() {
    let server = MockServer::start().await;
    let config = wd_config(&server);
    mount_element(&server, &config.selectors.open_short, "open-short", 1).await;
    mount_toast(&server, &config, "Insufficient balance").await;

    let mut adapter = connect(&server, config).await;
    let err = adapter.fast_click_short().await.unwrap_err();
    assert!(matches!(err, ScalperError::Execution(ref msg) if msg.contains("toast")));
}

#[tokio::test]
async fn test_webdriver_settle_confirms_modal() {
    let server = MockServer::start().await;
    let config = wd_config(&server);
    mount_element(&server, &config.selectors.close_all, "close-all", 1).await;
    mount_element(&server, &config.selectors.modal_confirm, "confirm", 1).await;
    mount_toast(&server, &config, "Order Filled").await;

    let mut adapter = connect(&server, config).await;
    adapter.fast_click_settle().await.unwrap();
}

#[tokio::test]
async fn test_webdriver_missing_element_times_out() {
    let server = MockServer::start().await;
    let config = wd_config(&server);
    Mock::given(method("POST"))
        .and(path(format!("/session/{}/element", SESSION)))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "value": {
                "error": "no such element",
                "message": "Unable to locate element",
                "stacktrace": ""
            }
        })))
        .mount(&server)
        .await;

    let mut adapter = connect(&server, config).await;
    let err = adapter.fast_click_long().await.unwrap_err();
    assert!(matches!(err, ScalperError::Execution(ref msg) if msg.contains("timed out")));
}

#[tokio::test]
async fn test_webdriver_heartbeat() {
    let server = MockServer::start().await;
    let config = wd_config(&server);
    mount_element(&server, &config.selectors.open_tab, "open-tab", 1).await;
    mount_element(&server, &config.selectors.open_long, "open-long", 0).await;
    mount_element(&server, &config.selectors.open_short, "open-short", 0).await;

    let mut adapter = connect(&server, config).await;
    assert!(adapter.heartbeat().await);
}

#[tokio::test]
async fn test_webdriver_heartbeat_fails_without_order_form() {
    let server = MockServer::start().await;
    let config = wd_config(&server);

    let mut adapter = connect(&server, config).await;
    assert!(!adapter.heartbeat().await);
}
