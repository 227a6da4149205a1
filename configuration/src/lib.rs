//! Courier configuration crate
//!
//! Public, signer-free configuration for the coordination protocol, the
//! dispatch helper, and operator agents.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

use std::{collections::HashMap, fs::File, path::Path};

pub mod agent;

mod traits;
pub use traits::*;

pub mod builtin;
pub use builtin::*;

pub mod gas;
pub use gas::*;

pub mod protocol;
pub use protocol::*;

pub mod retry;
pub use retry::*;

mod utils;
pub use utils::*;

use agent::{LogConfig, OperatorConfig};
use courier_types::parse_u256;

/// A Courier configuration json format
#[derive(Default, Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourierConfig {
    /// Config version
    pub version: u64,
    /// A name for the enviroment (development/production/local)
    pub environment: String,
    /// Destination-side coordination parameters
    #[serde(default)]
    pub protocol: ProtocolConfig,
    /// Per-chain dispatch gas configurations, keyed by chain name
    #[serde(default, deserialize_with = "gas::gas_map_ser::deserialize")]
    gas: HashMap<String, DispatchGasConfig>,
    /// Dispatch retry policy
    #[serde(default)]
    pub retry: RetryConfig,
    /// Tracing configuration
    #[serde(default)]
    pub logging: LogConfig,
    /// Port to listen for prometheus scrape requests
    #[serde(default)]
    pub metrics: Option<u16>,
    /// Operator process configuration, if this deployment runs one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operator: Option<OperatorConfig>,
}

impl CourierConfig {
    /// Instantiate CourierConfig from file
    pub fn from_file(path: impl AsRef<Path>) -> eyre::Result<Self> {
        let file = File::open(path)?;
        let config = serde_json::from_reader(file)?;
        Ok(config)
    }

    /// Gas config for a chain. Chains without an entry use the EVM default
    pub fn gas(&self, chain: &str) -> DispatchGasConfig {
        self.gas.get(chain).copied().unwrap_or(EVM_DEFAULT)
    }

    /// Insert or replace a chain's gas config
    pub fn set_gas(&mut self, chain: impl Into<String>, conf: DispatchGasConfig) {
        self.gas.insert(chain.into(), conf);
    }

    /// Syntactically validate the config
    pub fn validate(&self) -> eyre::Result<()> {
        self.protocol.validate()?;
        self.retry.validate()?;
        for (chain, conf) in self.gas.iter() {
            conf.validate(chain)?;
        }
        if let Some(operator) = &self.operator {
            eyre::ensure!(operator.interval > 0, "Operator interval must be non-zero");
            eyre::ensure!(
                !operator.operator.is_zero(),
                "Operator address must not be the zero address"
            );
        }
        Ok(())
    }
}

impl EnvOverridable for CourierConfig {
    /// `{CHAIN}_MIN_GAS_PRICE` overrides a single chain's floor,
    /// `DEFAULT_MIN_GAS_PRICE` overrides every chain without its own
    fn load_env_overrides(&mut self) {
        for (chain, conf) in self.gas.iter_mut() {
            if let Some(raw) = network_or_default_from_env(chain, "MIN_GAS_PRICE") {
                if let Ok(floor) = parse_u256(&raw) {
                    conf.min_gas_price = Some(floor);
                }
            }
        }
    }
}

#[cfg(test)]
mod test {
    use ethers::types::U256;
    use serde_json::json;
    use serial_test::serial;

    use super::*;

    fn config() -> CourierConfig {
        serde_json::from_value(json! {{
            "version": 1,
            "environment": "local",
            "gas": {
                "goerli": "evmDefault",
                "mumbai": "polygonDefault"
            },
            "operator": {
                "operator": "0x00000000000000000000000000000000000000aa",
                "interval": 5
            }
        }})
        .unwrap()
    }

    #[test]
    fn it_fills_defaults() {
        let config = config();
        assert_eq!(config.protocol, ProtocolConfig::default());
        assert_eq!(config.retry, RetryConfig::default());
        assert_eq!(config.gas("unlisted"), EVM_DEFAULT);
        let operator = config.operator.as_ref().unwrap();
        assert!(operator.execute_as_fallback);
        assert!(operator.pods.is_none());
        config.validate().unwrap();
    }

    #[test]
    #[serial]
    fn it_loads_gas_floor_overrides() {
        std::env::set_var("GOERLI_MIN_GAS_PRICE", "0x3b9aca00");
        let mut config = config();
        config.load_env_overrides();
        std::env::remove_var("GOERLI_MIN_GAS_PRICE");

        assert_eq!(config.gas("goerli").min_gas_price, Some(U256::from(1_000_000_000u64)));
        // untouched chain keeps its own floor
        assert_eq!(config.gas("mumbai"), POLYGON_DEFAULT);
    }

    #[test]
    #[serial]
    fn default_floor_override_applies_to_all_chains() {
        std::env::set_var("DEFAULT_MIN_GAS_PRICE", "7");
        let mut config = config();
        config.load_env_overrides();
        std::env::remove_var("DEFAULT_MIN_GAS_PRICE");

        assert_eq!(config.gas("goerli").min_gas_price, Some(U256::from(7)));
        assert_eq!(config.gas("mumbai").min_gas_price, Some(U256::from(7)));
    }
}
