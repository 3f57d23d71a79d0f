//! Exchange web UI automation over the W3C WebDriver protocol
//!
//! Attaches to an already-running Chrome (remote debugging enabled) through
//! chromedriver and drives the order form: quantity input, open long/short
//! buttons, close-all with its confirmation modal.

use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, instrument, warn};

use crate::common::errors::{Result, ScalperError};
use crate::common::traits::ExecutionAdapter;
use crate::config::types::{QtyInput, WebDriverConfig};

/// W3C web element reference key
const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

const KEY_CONTROL: char = '\u{E009}';
const KEY_DELETE: char = '\u{E017}';
const KEY_TAB: char = '\u{E004}';

const KEYSTROKE_PAUSE: Duration = Duration::from_millis(100);

#[derive(Debug, Deserialize)]
struct WdResponse<T> {
    value: T,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NewSession {
    session_id: String,
}

#[derive(Debug, Deserialize)]
struct WdError {
    error: String,
    #[serde(default)]
    message: String,
}

/// What an element must satisfy before it is returned from a wait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Condition {
    Visible,
    Clickable,
}

/// Minimal WebDriver session client
#[derive(Debug, Clone)]
struct Session {
    client: Client,
    base_url: String,
    session_id: String,
}

impl Session {
    async fn attach(client: Client, driver_url: &str, debugger_address: &str) -> Result<Self> {
        let base_url = driver_url.trim_end_matches('/').to_string();
        let body = json!({
            "capabilities": {
                "alwaysMatch": {
                    "browserName": "chrome",
                    "goog:chromeOptions": { "debuggerAddress": debugger_address }
                }
            }
        });

        let response = client
            .post(format!("{}/session", base_url))
            .json(&body)
            .send()
            .await?;
        let session: NewSession = Self::decode(response).await?;

        Ok(Self {
            client,
            base_url,
            session_id: session.session_id,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/session/{}{}", self.base_url, self.session_id, path)
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(match serde_json::from_str::<WdResponse<WdError>>(&body) {
                Ok(err) => ScalperError::Execution(format!(
                    "{}: {}",
                    err.value.error, err.value.message
                )),
                Err(_) => ScalperError::InvalidResponse(format!(
                    "WebDriver returned status {}: {}",
                    status, body
                )),
            });
        }

        let parsed: WdResponse<T> = serde_json::from_str(&body)?;
        Ok(parsed.value)
    }

    async fn post<T: DeserializeOwned>(&self, path: &str, body: Value) -> Result<T> {
        let response = self.client.post(self.url(path)).json(&body).send().await?;
        Self::decode(response).await
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self.client.get(self.url(path)).send().await?;
        Self::decode(response).await
    }

    async fn find(&self, selector: &str) -> Result<String> {
        let value: Value = self
            .post("/element", json!({ "using": "css selector", "value": selector }))
            .await?;
        value
            .get(ELEMENT_KEY)
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| ScalperError::InvalidResponse(format!("no element reference in {}", value)))
    }

    async fn is_displayed(&self, element: &str) -> Result<bool> {
        self.get(&format!("/element/{}/displayed", element)).await
    }

    async fn is_enabled(&self, element: &str) -> Result<bool> {
        self.get(&format!("/element/{}/enabled", element)).await
    }

    async fn click(&self, element: &str) -> Result<()> {
        let _: Value = self
            .post(&format!("/element/{}/click", element), json!({}))
            .await?;
        Ok(())
    }

    async fn send_keys(&self, element: &str, text: &str) -> Result<()> {
        let _: Value = self
            .post(&format!("/element/{}/value", element), json!({ "text": text }))
            .await?;
        Ok(())
    }

    async fn property_value(&self, element: &str) -> Result<Option<String>> {
        self.get(&format!("/element/{}/property/value", element)).await
    }

    async fn text(&self, element: &str) -> Result<String> {
        self.get(&format!("/element/{}/text", element)).await
    }

    async fn satisfies(&self, element: &str, condition: Condition) -> Result<bool> {
        let displayed = self.is_displayed(element).await?;
        match condition {
            Condition::Visible => Ok(displayed),
            Condition::Clickable => Ok(displayed && self.is_enabled(element).await?),
        }
    }
}

/// Execution adapter that clicks the exchange web UI
#[derive(Debug)]
pub struct WebDriverAdapter {
    session: Session,
    config: WebDriverConfig,
    /// Quantity staged by the last successful `prepare_next_entry_qty`
    staged_qty: Option<Decimal>,
}

impl WebDriverAdapter {
    /// Attach to the browser through chromedriver
    #[instrument(skip_all, fields(driver = %config.driver_url, debugger = %config.debugger_address))]
    pub async fn connect(config: WebDriverConfig, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ScalperError::Internal(e.to_string()))?;

        let session = Session::attach(client, &config.driver_url, &config.debugger_address).await?;
        info!(session_id = %session.session_id, "attached to browser");

        Ok(Self {
            session,
            config,
            staged_qty: None,
        })
    }

    pub fn session_id(&self) -> &str {
        &self.session.session_id
    }

    pub fn staged_qty(&self) -> Option<Decimal> {
        self.staged_qty
    }

    /// Poll for `selector` until it meets `condition` or the wait times out
    async fn wait_for(&self, selector: &str, condition: Condition) -> Result<String> {
        self.wait_within(selector, condition, Duration::from_millis(self.config.wait_timeout_ms))
            .await
    }

    async fn wait_within(
        &self,
        selector: &str,
        condition: Condition,
        budget: Duration,
    ) -> Result<String> {
        let deadline = Instant::now() + budget;
        let poll = Duration::from_millis(self.config.poll_interval_ms.max(1));

        loop {
            match self.probe(selector, condition).await {
                Ok(Some(element)) => return Ok(element),
                Ok(None) => {}
                // no such element / stale element reference
                Err(ScalperError::Execution(e)) => debug!(selector, error = %e, "element not ready"),
                Err(e) => return Err(e),
            }

            if Instant::now() + poll > deadline {
                return Err(ScalperError::Execution(format!(
                    "timed out waiting for {:?} element: {}",
                    condition, selector
                )));
            }
            sleep(poll).await;
        }
    }

    async fn probe(&self, selector: &str, condition: Condition) -> Result<Option<String>> {
        let element = self.session.find(selector).await?;
        if self.session.satisfies(&element, condition).await? {
            Ok(Some(element))
        } else {
            Ok(None)
        }
    }

    async fn click_when_ready(&self, selector: &str) -> Result<()> {
        let element = self.wait_for(selector, Condition::Clickable).await?;
        self.session.click(&element).await
    }

    /// Wait for the notification toast and check it reports a fill
    async fn expect_toast(&self, message: &str) -> Result<()> {
        let toast = self.wait_for(&self.config.selectors.toast, Condition::Visible).await?;
        let text = self.session.text(&toast).await?;
        if text.trim().contains(message) {
            info!(toast = %text.trim(), "order filled");
            Ok(())
        } else {
            Err(ScalperError::Execution(format!(
                "fill toast not detected (got {:?})",
                text.trim()
            )))
        }
    }

    async fn open(&self, selector: &str) -> Result<()> {
        self.click_when_ready(selector).await?;
        self.expect_toast(&self.config.open_fill_message).await
    }
}

#[async_trait]
impl ExecutionAdapter for WebDriverAdapter {
    async fn prepare_next_entry_qty(&mut self, qty: Decimal) -> Result<()> {
        let selector = match self.config.qty_input {
            QtyInput::Side => self.config.selectors.qty_input_side.clone(),
            QtyInput::Bottom => self.config.selectors.qty_input_bottom.clone(),
        };
        let wanted = qty.normalize().to_string();

        let input = self.wait_for(&selector, Condition::Clickable).await?;
        self.session
            .send_keys(&input, &format!("{}a", KEY_CONTROL))
            .await?;
        sleep(KEYSTROKE_PAUSE).await;
        self.session.send_keys(&input, &KEY_DELETE.to_string()).await?;
        sleep(KEYSTROKE_PAUSE).await;
        self.session.send_keys(&input, &wanted).await?;
        self.session.send_keys(&input, &KEY_TAB.to_string()).await?;

        let actual = self.session.property_value(&input).await?.unwrap_or_default();
        if actual != wanted {
            self.staged_qty = None;
            return Err(ScalperError::Execution(format!(
                "quantity input reads {:?}, expected {:?}",
                actual, wanted
            )));
        }
        self.staged_qty = Some(qty);
        Ok(())
    }

    async fn fast_click_long(&mut self) -> Result<()> {
        self.open(&self.config.selectors.open_long).await
    }

    async fn fast_click_short(&mut self) -> Result<()> {
        self.open(&self.config.selectors.open_short).await
    }

    async fn fast_click_settle(&mut self) -> Result<()> {
        self.click_when_ready(&self.config.selectors.close_all).await?;
        sleep(Duration::from_millis(self.config.modal_delay_ms)).await;
        self.click_when_ready(&self.config.selectors.modal_confirm).await?;
        self.expect_toast(&self.config.close_fill_message).await
    }

    async fn heartbeat(&mut self) -> bool {
        let selectors = &self.config.selectors;
        let budget = Duration::from_millis(self.config.heartbeat_wait_ms);
        let check = async {
            let tab = self.wait_within(&selectors.open_tab, Condition::Clickable, budget).await?;
            self.session.click(&tab).await?;
            self.wait_within(&selectors.open_long, Condition::Clickable, budget).await?;
            self.wait_within(&selectors.open_short, Condition::Clickable, budget).await?;
            Ok::<_, ScalperError>(())
        };
        match check.await {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "UI heartbeat failed");
                false
            }
        }
    }

    fn name(&self) -> &'static str {
        "web_driver"
    }
}
