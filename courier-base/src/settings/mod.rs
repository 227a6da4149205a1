//! Settings for Courier processes
//!
//! Everything here is public configuration drawn from
//! `courier-configuration`. Resolution order:
//!  1. `CONFIG_PATH`, if set, names a json config file.
//!  2. Otherwise `RUN_ENV` names a builtin config (`development` by default).
//!  3. Environment overrides (`{CHAIN}_MIN_GAS_PRICE`, `METRICS_PORT`) are
//!     applied on top, then the result is validated.

use color_eyre::{eyre::eyre, Result};
use courier_configuration::{
    agent::OperatorConfig, get_builtin, CourierConfig, DispatchGasConfig, EnvOverridable,
};
use tracing_subscriber::prelude::*;

/// Tracing subscriber management
pub mod trace;

use trace::{fmt::LogOutputLayer, log_level_to_level_filter, SpanDurations};

const DEFAULT_RUN_ENV: &str = "development";

/// Resolved settings of a Courier process
#[derive(Debug, Clone)]
pub struct Settings {
    config: CourierConfig,
}

impl AsRef<CourierConfig> for Settings {
    fn as_ref(&self) -> &CourierConfig {
        &self.config
    }
}

impl Settings {
    /// Load settings from `CONFIG_PATH` or the builtin named by `RUN_ENV`
    pub fn new() -> Result<Self> {
        let config = match std::env::var("CONFIG_PATH").ok() {
            Some(path) => CourierConfig::from_file(&path)
                .map_err(|e| eyre!("Unable to load config at {}: {}", path, e))?,
            None => {
                let env = std::env::var("RUN_ENV").unwrap_or_else(|_| DEFAULT_RUN_ENV.to_owned());
                get_builtin(&env).map_err(|e| eyre!("{}", e))?
            }
        };
        Self::from_config(config)
    }

    /// Apply environment overrides to `config` and validate it
    pub fn from_config(mut config: CourierConfig) -> Result<Self> {
        config.load_env_overrides();
        if let Some(port) = crate::metrics::u16_from_env("METRICS_PORT") {
            config.metrics = Some(port);
        }
        config.validate().map_err(|e| eyre!("Invalid config: {}", e))?;
        Ok(Self { config })
    }

    /// The underlying config
    pub fn config(&self) -> &CourierConfig {
        &self.config
    }

    /// Dispatch gas settings for `chain`
    pub fn gas(&self, chain: &str) -> DispatchGasConfig {
        self.config.gas(chain)
    }

    /// Operator process settings. Errors if this deployment runs none
    pub fn operator(&self) -> Result<&OperatorConfig> {
        self.config.operator.as_ref().ok_or_else(|| {
            eyre!(
                "No operator configured for environment {}",
                self.config.environment
            )
        })
    }

    /// Attempt to instantiate and register a tracing subscriber setup from
    /// settings
    pub fn start_tracing(&self, latencies: prometheus::HistogramVec) -> Result<()> {
        let log = self.config.logging;
        let level_filter = log_level_to_level_filter(log.level);
        let fmt_layer: LogOutputLayer<_> = log.fmt.into();
        let err_layer = tracing_error::ErrorLayer::default();

        let subscriber = tracing_subscriber::Registry::default()
            .with(SpanDurations::new(latencies))
            .with(level_filter)
            .with(fmt_layer)
            .with(err_layer);

        subscriber.try_init()?;
        Ok(())
    }
}
