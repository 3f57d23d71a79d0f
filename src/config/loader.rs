//! Configuration loader

use config::{Config, Environment, File};
use std::path::Path;

use super::types::AppConfig;
use crate::common::errors::{Result, ScalperError};

/// Load configuration from file and environment variables
///
/// Priority (highest to lowest):
/// 1. Environment variables (prefixed with APP__, e.g. APP__STRATEGY__ENTRY_THRESHOLD)
/// 2. Configuration file (TOML format)
/// 3. Default values
///
/// Exchange credentials are additionally picked up from BINANCE_API_KEY and
/// BINANCE_API_SECRET when the file and APP__ variables leave them unset.
pub fn load_config(config_path: Option<&str>) -> Result<AppConfig> {
    let mut builder = Config::builder();

    if let Some(path) = config_path {
        if Path::new(path).exists() {
            builder = builder.add_source(File::with_name(path).required(false));
        }
    }

    builder = builder.add_source(
        Environment::with_prefix("APP")
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder
        .build()
        .map_err(|e| ScalperError::Configuration(e.to_string()))?;

    let mut app_config: AppConfig = config
        .try_deserialize()
        .map_err(|e| ScalperError::Configuration(e.to_string()))?;

    apply_credential_env(&mut app_config);
    app_config.validate()?;
    Ok(app_config)
}

/// Fill REST credentials from the exchange-style environment variables
fn apply_credential_env(app_config: &mut AppConfig) {
    let rest = &mut app_config.execution.rest;
    if rest.api_key.is_none() {
        rest.api_key = std::env::var("BINANCE_API_KEY").ok();
    }
    if rest.api_secret.is_none() {
        rest.api_secret = std::env::var("BINANCE_API_SECRET").ok();
    }
}
