//! Per-chain dispatch gas configurations

use courier_types::{deser_courier_opt_u256, deser_courier_u32, deser_courier_u64};
use ethers::types::U256;
use serde::{de, Deserialize, Serialize};
use std::{fmt, str::FromStr};

mod defaults;
pub use defaults::{EVM_DEFAULT, POLYGON_DEFAULT};

/// Basis point denominator used by every multiplier in this module
pub const BPS_DENOMINATOR: u32 = 10_000;

/// Gas estimation settings used when dispatching a job to a destination chain
#[derive(Debug, Copy, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DispatchGasConfig {
    /// Gas allowance handed to the first simulation. Used gas is this minus
    /// the reported leftover
    #[serde(deserialize_with = "deser_courier_u64")]
    pub simulation_allowance: u64,
    /// Padding applied to the simulated gas before it is embedded in the
    /// payload
    #[serde(deserialize_with = "deser_courier_u32")]
    pub gas_margin_bps: u32,
    /// Safety multiplier over the observed destination gas price
    #[serde(deserialize_with = "deser_courier_u32")]
    pub price_multiplier_bps: u32,
    /// Margin added to the quoted service + transport fee
    #[serde(deserialize_with = "deser_courier_u32")]
    pub fee_margin_bps: u32,
    /// Chain-enforced minimum gas price. Applied after the multiplier
    #[serde(
        default,
        deserialize_with = "deser_courier_opt_u256",
        skip_serializing_if = "Option::is_none"
    )]
    pub min_gas_price: Option<U256>,
}

impl DispatchGasConfig {
    /// Pad a simulated gas figure by `gas_margin_bps`
    pub fn padded_gas(&self, used: u64) -> u64 {
        let padded = u128::from(used) * u128::from(self.gas_margin_bps) / u128::from(BPS_DENOMINATOR);
        u64::try_from(padded).unwrap_or(u64::MAX)
    }

    /// Apply the price multiplier, then the chain floor
    pub fn destination_price(&self, observed: U256) -> U256 {
        let scaled = apply_bps(observed, self.price_multiplier_bps);
        match self.min_gas_price {
            Some(floor) if floor > scaled => floor,
            _ => scaled,
        }
    }

    /// Apply the fee margin to a quoted fee
    pub fn fee_with_margin(&self, quoted: U256) -> U256 {
        apply_bps(quoted, self.fee_margin_bps)
    }

    /// Syntactically validate the gas config
    pub fn validate(&self, chain: &str) -> eyre::Result<()> {
        eyre::ensure!(
            self.simulation_allowance > 0,
            "Gas config for {} has a zero simulation allowance",
            chain
        );
        for (name, bps) in [
            ("gasMarginBps", self.gas_margin_bps),
            ("priceMultiplierBps", self.price_multiplier_bps),
            ("feeMarginBps", self.fee_margin_bps),
        ] {
            eyre::ensure!(
                bps >= BPS_DENOMINATOR,
                "Gas config for {} has {} of {}, which would shrink the estimate",
                chain,
                name,
                bps
            );
        }
        Ok(())
    }
}

/// Multiply `value` by `bps / 10_000`, saturating on overflow
pub fn apply_bps(value: U256, bps: u32) -> U256 {
    value.saturating_mul(U256::from(bps)) / U256::from(BPS_DENOMINATOR)
}

pub(crate) mod gas_map_ser {
    use serde::Deserializer;
    use std::collections::HashMap;

    use super::*;

    /// A convenience struct for intermediate deser of gas configs
    #[derive(Debug, Copy, Clone, Serialize, PartialEq)]
    pub(crate) struct DispatchGasConfigInternal(DispatchGasConfig);

    impl std::ops::Deref for DispatchGasConfigInternal {
        type Target = DispatchGasConfig;

        fn deref(&self) -> &Self::Target {
            &self.0
        }
    }

    impl<'de> Deserialize<'de> for DispatchGasConfigInternal {
        fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
        where
            D: serde::Deserializer<'de>,
        {
            deserializer.deserialize_any(DispatchGasConfigInternalVisitor)
        }
    }

    impl FromStr for DispatchGasConfigInternal {
        type Err = eyre::Report;

        fn from_str(s: &str) -> Result<Self, Self::Err> {
            match s {
                "evmDefault" => Ok(DispatchGasConfigInternal(EVM_DEFAULT)),
                "polygonDefault" => Ok(DispatchGasConfigInternal(POLYGON_DEFAULT)),
                _ => eyre::bail!("Unrecognized string variant for gas config: {}", s),
            }
        }
    }

    struct DispatchGasConfigInternalVisitor;
    impl<'de> de::Visitor<'de> for DispatchGasConfigInternalVisitor {
        type Value = DispatchGasConfigInternal;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a gas config map or gas config default")
        }

        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            FromStr::from_str(v).map_err(E::custom)
        }

        fn visit_map<A>(self, map: A) -> Result<Self::Value, A::Error>
        where
            A: de::MapAccess<'de>,
        {
            Ok(DispatchGasConfigInternal(DispatchGasConfig::deserialize(
                de::value::MapAccessDeserializer::new(map),
            )?))
        }
    }

    pub(crate) fn deserialize<'de, D>(
        d: D,
    ) -> Result<HashMap<String, DispatchGasConfig>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let map = HashMap::<String, DispatchGasConfigInternal>::deserialize(d)?;

        Ok(map.into_iter().map(|(k, v)| (k, *v)).collect())
    }
}
