//! Ethereum-compatible chain clients for Courier: destination simulation
//! for gas estimation, and source-side dispatch submission

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(unused_extern_crates)]

use color_eyre::eyre::{Result, WrapErr};
use ethers::{
    core::types::Address,
    providers::{Http, Provider},
};
use std::{convert::TryFrom, sync::Arc};

#[macro_use]
mod macros;

mod destination;
pub use destination::*;

mod error;
pub use error::EthereumError;

mod submitter;
pub use submitter::*;

/// Connection details of an ethereum-compatible chain
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    /// Chain name, as used for gas config lookup
    pub name: String,
    /// HTTP JSON-RPC endpoint
    pub url: String,
}

impl Connection {
    fn provider(&self) -> Result<Arc<Provider<Http>>> {
        let provider = Provider::<Http>::try_from(self.url.as_str())
            .wrap_err_with(|| format!("Invalid rpc url for {}: {}", self.name, self.url))?;
        Ok(Arc::new(provider))
    }
}

/// Build a destination client over HTTP, simulating as `executor`
pub fn make_destination(
    conn: &Connection,
    executor: Address,
) -> Result<EthereumDestination<Provider<Http>>> {
    Ok(EthereumDestination::new(
        conn.name.clone(),
        conn.provider()?,
        executor,
    ))
}

/// Build a dispatch submitter over HTTP. The node at `conn` must hold the
/// key of `sender`
pub fn make_submitter(
    conn: &Connection,
    sender: Address,
    dispatcher: Address,
) -> Result<EthereumSubmitter<Provider<Http>>> {
    Ok(EthereumSubmitter::new(conn.provider()?, sender, dispatcher))
}

#[cfg(test)]
mod test {
    use courier_core::DestinationClient;
    use serde_json::json;

    use super::*;

    #[test]
    fn it_builds_clients_from_connections() {
        let conn: Connection = serde_json::from_value(json! {{
            "name": "goerli",
            "url": "http://localhost:8545"
        }})
        .unwrap();

        let destination = make_destination(&conn, Address::zero()).unwrap();
        assert_eq!(destination.name(), "goerli");
        make_submitter(&conn, Address::zero(), Address::zero()).unwrap();
    }

    #[test]
    fn it_rejects_malformed_urls() {
        let conn = Connection {
            name: "goerli".into(),
            url: "not a url".into(),
        };
        assert!(make_destination(&conn, Address::zero()).is_err());
    }
}
