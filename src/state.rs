//! Application state shared across handlers.

use crate::config::Config;
use crate::contract::Contract;
use crate::rpc::RpcClient;
use std::sync::atomic::AtomicU64;
use std::time::Instant;
use tracing::{info, warn};

/// Shared application state. Initialized at startup, lives for the process.
pub struct AppState {
    pub config: Config,
    pub rpc: RpcClient,
    /// Outbound client for the pinning provider.
    pub http: reqwest::Client,
    /// Provider credential. Server-side only, never exposed to callers.
    pub pinata_jwt: Option<String>,
    pub start_time: Instant,
    pub request_count: AtomicU64,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let pinata_jwt = std::env::var("PINATA_JWT").ok().filter(|j| !j.is_empty());
        if pinata_jwt.is_none() {
            warn!("PINATA_JWT not set; media relay endpoints will return 500");
        }
        info!(contract = %config.contract_address, "contract gateway configured");

        Self {
            rpc: RpcClient::new(&config.bridge_url, &config.fallback_bridge_url),
            http: reqwest::Client::new(),
            pinata_jwt,
            config,
            start_time: Instant::now(),
            request_count: AtomicU64::new(0),
        }
    }

    /// Typed handle to the CineVault contract.
    pub fn contract(&self) -> Contract<'_> {
        Contract::new(&self.rpc, &self.config.contract_address)
    }
}
