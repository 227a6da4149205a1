//! Pre-set configs bundled with the lib

use std::collections::HashMap;

use eyre::Context;
use once_cell::sync::OnceCell;

use crate::CourierConfig;

// built-in config objects
static DEVELOPMENT_JSON: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/configs/development.json"
));
static PRODUCTION_JSON: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/configs/production.json"
));
static BUILTINS: OnceCell<HashMap<&'static str, &'static str>> = OnceCell::new();

/// Get a built-in config object
pub fn get_builtin(name: &str) -> eyre::Result<CourierConfig> {
    let builtins = BUILTINS.get_or_init(|| {
        let mut map: HashMap<_, _> = Default::default();
        map.insert("development", DEVELOPMENT_JSON);
        map.insert("production", PRODUCTION_JSON);
        map
    });

    let json = builtins
        .get(name)
        .ok_or_else(|| eyre::eyre!("Unknown builtin config: {}", name))?;
    serde_json::from_str(json).wrap_err_with(|| format!("Configuration {}.json is malformed", name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn development_loads_and_validates() {
        get_builtin("development")
            .expect("config not found")
            .validate()
            .expect("invalid config");
    }

    #[test]
    fn production_loads_and_validates() {
        let config = get_builtin("production").expect("config not found");
        config.validate().expect("invalid config");
        assert!(config.gas("polygon").min_gas_price.is_some());
    }

    #[test]
    fn unknown_builtins_error() {
        assert!(get_builtin("staging").is_err());
    }
}
