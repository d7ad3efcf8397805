//! Gateway configuration.

use serde::Deserialize;

/// Configuration for the CineVault gateway.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Wallet-bridge JSON-RPC endpoint for contract reads/writes.
    #[serde(default = "defaults::bridge_url")]
    pub bridge_url: String,

    #[serde(default = "defaults::fallback_bridge_url")]
    pub fallback_bridge_url: String,

    /// Address of the CineVault contract, passed through to the bridge.
    #[serde(default = "defaults::contract_address")]
    pub contract_address: String,

    #[serde(default = "defaults::bind_address")]
    pub bind_address: String,

    /// Pinning provider API base.
    #[serde(default = "defaults::pinata_api_url")]
    pub pinata_api_url: String,

    /// Public gateway base used to resolve a CID to a fetchable URL.
    #[serde(default = "defaults::ipfs_gateway")]
    pub ipfs_gateway: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bridge_url: defaults::bridge_url(),
            fallback_bridge_url: defaults::fallback_bridge_url(),
            contract_address: defaults::contract_address(),
            bind_address: defaults::bind_address(),
            pinata_api_url: defaults::pinata_api_url(),
            ipfs_gateway: defaults::ipfs_gateway(),
        }
    }
}

impl Config {
    /// Resolve a stored CID to a fetchable URL on the configured gateway.
    pub fn ipfs_url(&self, cid: &str) -> String {
        format!("{}/ipfs/{}", self.ipfs_gateway.trim_end_matches('/'), cid)
    }
}

mod defaults {
    pub fn bridge_url() -> String {
        if let Ok(url) = std::env::var("CINEVAULT_BRIDGE_URL") {
            if !url.is_empty() {
                return url;
            }
        }
        "http://127.0.0.1:8545".into()
    }

    pub fn fallback_bridge_url() -> String {
        std::env::var("CINEVAULT_FALLBACK_BRIDGE_URL")
            .ok()
            .filter(|u| !u.is_empty())
            .unwrap_or_else(bridge_url)
    }

    pub fn contract_address() -> String {
        std::env::var("CINEVAULT_CONTRACT_ADDRESS").unwrap_or_default()
    }

    pub fn bind_address() -> String {
        "0.0.0.0:3050".into()
    }

    pub fn pinata_api_url() -> String {
        "https://api.pinata.cloud".into()
    }

    pub fn ipfs_gateway() -> String {
        std::env::var("CINEVAULT_IPFS_GATEWAY")
            .ok()
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| "https://gateway.pinata.cloud".into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ipfs_url_joins_gateway_and_cid() {
        let config = Config {
            ipfs_gateway: "https://gateway.pinata.cloud/".into(),
            ..Config::default()
        };
        assert_eq!(
            config.ipfs_url("bafybeigdyr"),
            "https://gateway.pinata.cloud/ipfs/bafybeigdyr"
        );
    }
}
