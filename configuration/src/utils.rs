/// Get specified env var with format network_var OR get default_var if
/// network-specific not present.
pub fn network_or_default_from_env(network: &str, var: &str) -> Option<String> {
    let network = network.to_uppercase();
    std::env::var(format!("{}_{}", network, var))
        .ok()
        .or_else(|| std::env::var(format!("DEFAULT_{}", var)).ok())
}
