//! Execution module - turns engine decisions into exchange actions
//!
//! The engine emits [`ExecutionCommand`]s; a single dispatcher task owns the
//! [`ExecutionAdapter`](crate::common::traits::ExecutionAdapter) and replays
//! them in order. Adapters:
//!
//! - [`DryRunAdapter`]: logs only
//! - [`WebDriverAdapter`]: clicks the exchange web UI through chromedriver
//! - [`RestAdapter`]: signed market orders against the futures REST API

pub mod auth;
pub mod dispatcher;
pub mod dry_run;
pub mod rest;
pub mod webdriver;

use rust_decimal::Decimal;
use std::time::Duration;
use tracing::{info, warn};

use crate::common::errors::Result;
use crate::common::traits::BoxedExecutionAdapter;
use crate::config::types::{AppSettings, ExecutionConfig, ExecutionMode};

pub use dispatcher::run_dispatcher;
pub use dry_run::DryRunAdapter;
pub use rest::RestAdapter;
pub use webdriver::WebDriverAdapter;

/// A single fire-and-forget instruction from the engine
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionCommand {
    /// Stage the quantity for the next open
    PrepareEntryQty(Decimal),
    OpenLong,
    OpenShort,
    /// Close the open position
    Settle,
}

impl std::fmt::Display for ExecutionCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExecutionCommand::PrepareEntryQty(qty) => write!(f, "prepare_qty({})", qty),
            ExecutionCommand::OpenLong => write!(f, "open_long"),
            ExecutionCommand::OpenShort => write!(f, "open_short"),
            ExecutionCommand::Settle => write!(f, "settle"),
        }
    }
}

/// Build the configured adapter, falling back to dry-run when allowed
pub async fn build_adapter(
    config: &ExecutionConfig,
    settings: &AppSettings,
) -> Result<BoxedExecutionAdapter> {
    let timeout = Duration::from_secs(settings.request_timeout_seconds);

    let built: Result<BoxedExecutionAdapter> = match config.mode {
        ExecutionMode::DryRun => Ok(Box::new(DryRunAdapter::new())),
        ExecutionMode::WebDriver => WebDriverAdapter::connect(config.webdriver.clone(), timeout)
            .await
            .map(|a| Box::new(a) as BoxedExecutionAdapter),
        ExecutionMode::Rest => {
            RestAdapter::new(&config.rest, timeout).map(|a| Box::new(a) as BoxedExecutionAdapter)
        }
    };

    match built {
        Ok(adapter) => {
            info!(adapter = adapter.name(), mode = %config.mode, "execution adapter ready");
            Ok(adapter)
        }
        Err(e) if config.fallback_to_dry_run => {
            warn!(mode = %config.mode, error = %e, "execution adapter failed to start, switching to dry run");
            Ok(Box::new(DryRunAdapter::new()))
        }
        Err(e) => Err(e),
    }
}
