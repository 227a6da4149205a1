use crate::DispatchGasConfig;
use ethers::types::U256;

/// Margins suited to mainnet-like EVM chains
pub const EVM_DEFAULT: DispatchGasConfig = DispatchGasConfig {
    simulation_allowance: 10_000_000,
    gas_margin_bps: 11_000,
    price_multiplier_bps: 15_000,
    fee_margin_bps: 12_500,
    min_gas_price: None,
};

/// EVM margins plus Polygon's 30 gwei floor. Validators reject anything
/// cheaper regardless of market price
pub const POLYGON_DEFAULT: DispatchGasConfig = DispatchGasConfig {
    min_gas_price: Some(U256([30_000_000_000, 0, 0, 0])),
    ..EVM_DEFAULT
};
