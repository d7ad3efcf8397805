//! Chain bridge client with primary → fallback failover.
//!
//! Contract calls go through a wallet-bridge JSON-RPC endpoint that performs
//! ABI encoding and signing. Idempotent reads get retry with exponential
//! backoff plus failover behind a circuit breaker; writes get exactly one
//! attempt; a failed write is resubmitted by the user, never by us.

use crate::error::Error;
use crate::types::Amount;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tracing::{info, warn};

/// Consecutive failures before the circuit breaker opens.
const CIRCUIT_BREAKER_THRESHOLD: u64 = 5;
/// How long (ms) before a tripped breaker retries the primary.
const CIRCUIT_BREAKER_WINDOW_MS: u64 = 30_000;
/// Max retry attempts per provider, reads only.
const MAX_RETRIES: u32 = 2;
/// Base delay for exponential backoff (ms).
const BASE_DELAY_MS: u64 = 200;

struct CircuitState {
    failures: u64,
    last_failure_ms: u64,
    open: bool,
}

/// JSON-RPC client for the wallet bridge.
pub struct RpcClient {
    http: reqwest::Client,
    primary_url: String,
    fallback_url: String,
    circuit: Mutex<CircuitState>,
    total_failovers: AtomicU64,
    next_id: AtomicU64,
}

impl RpcClient {
    pub fn new(primary_url: &str, fallback_url: &str) -> Self {
        info!(
            primary = primary_url,
            fallback = fallback_url,
            "bridge client initialized with failover"
        );
        Self {
            http: reqwest::Client::new(),
            primary_url: primary_url.to_string(),
            fallback_url: fallback_url.to_string(),
            circuit: Mutex::new(CircuitState {
                failures: 0,
                last_failure_ms: 0,
                open: false,
            }),
            total_failovers: AtomicU64::new(0),
            next_id: AtomicU64::new(1),
        }
    }

    /// Read-only contract call. Idempotent, so retried and failed over.
    pub async fn view(&self, contract: &str, method: &str, args: Value) -> Result<Value, Error> {
        let params = json!({ "contract": contract, "method": method, "args": args });
        let primary_active = !self.is_circuit_open();
        let first = if primary_active {
            &self.primary_url
        } else {
            &self.fallback_url
        };

        match self.post_with_retries(first, "bridge_view", &params).await {
            Ok(value) => {
                if primary_active {
                    self.record_success();
                }
                Ok(value)
            }
            // A contract-reported error is deterministic; failover would
            // only repeat it.
            Err(e @ Error::Contract(_)) => Err(e),
            Err(primary_err) if primary_active => {
                self.record_failure();
                warn!(error = %primary_err, method, "primary bridge failed, trying fallback");
                self.post_with_retries(&self.fallback_url, "bridge_view", &params)
                    .await
            }
            Err(e) => Err(e),
        }
    }

    /// Submit a contract write through the connected wallet. Single attempt;
    /// returns a transaction hash to watch.
    pub async fn send(
        &self,
        contract: &str,
        method: &str,
        args: Value,
        deposit: Amount,
    ) -> Result<String, Error> {
        let params = json!({
            "contract": contract,
            "method": method,
            "args": args,
            "deposit": deposit,
        });
        let url = if self.is_circuit_open() {
            &self.fallback_url
        } else {
            &self.primary_url
        };
        let result = self.post(url, "bridge_send", &params).await?;
        result
            .get("tx_hash")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| Error::Rpc("bridge returned no transaction hash".into()))
    }

    /// Poll the lifecycle of a previously submitted transaction.
    pub async fn tx_status(&self, tx_hash: &str) -> Result<Value, Error> {
        let params = json!({ "tx_hash": tx_hash });
        let url = if self.is_circuit_open() {
            &self.fallback_url
        } else {
            &self.primary_url
        };
        self.post(url, "bridge_txStatus", &params).await
    }

    async fn post_with_retries(
        &self,
        url: &str,
        method: &str,
        params: &Value,
    ) -> Result<Value, Error> {
        let mut last_err = None;
        for attempt in 0..=MAX_RETRIES {
            if attempt > 0 {
                let delay = Self::retry_delay(attempt - 1);
                warn!(attempt, delay_ms = delay.as_millis() as u64, "retrying bridge call");
                tokio::time::sleep(delay).await;
            }
            match self.post(url, method, params).await {
                Ok(value) => return Ok(value),
                Err(e @ Error::Contract(_)) => return Err(e),
                Err(e) => last_err = Some(e),
            }
        }
        Err(last_err.unwrap_or_else(|| Error::Rpc("bridge call failed".into())))
    }

    async fn post(&self, url: &str, method: &str, params: &Value) -> Result<Value, Error> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        let response = self
            .http
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Rpc(format!("bridge unreachable: {e}")))?;

        let envelope: Value = response
            .json()
            .await
            .map_err(|e| Error::Rpc(format!("invalid bridge response: {e}")))?;

        parse_envelope(envelope)
    }

    /// Record a successful primary call, resetting the circuit.
    fn record_success(&self) {
        let mut circuit = self.circuit.lock().unwrap();
        if circuit.failures > 0 {
            info!(primary = %self.primary_url, "primary bridge recovered");
            circuit.failures = 0;
            circuit.open = false;
        }
    }

    /// Record a failed primary call, possibly opening the circuit.
    fn record_failure(&self) {
        let mut circuit = self.circuit.lock().unwrap();
        circuit.failures += 1;
        circuit.last_failure_ms = now_ms();
        if circuit.failures >= CIRCUIT_BREAKER_THRESHOLD && !circuit.open {
            circuit.open = true;
            self.total_failovers.fetch_add(1, Ordering::Relaxed);
            warn!(
                failures = circuit.failures,
                fallback = %self.fallback_url,
                "circuit breaker opened, routing to fallback"
            );
        }
    }

    fn is_circuit_open(&self) -> bool {
        let mut circuit = self.circuit.lock().unwrap();
        if !circuit.open {
            return false;
        }
        // Half-open: retry primary after the window.
        if now_ms().saturating_sub(circuit.last_failure_ms) > CIRCUIT_BREAKER_WINDOW_MS {
            circuit.open = false;
            circuit.failures = 0;
            info!(primary = %self.primary_url, "circuit breaker half-open, retrying primary");
            return false;
        }
        true
    }

    /// Total number of failover events (for the health endpoint).
    pub fn failover_count(&self) -> u64 {
        self.total_failovers.load(Ordering::Relaxed)
    }

    /// Which URL is currently active.
    pub fn active_url(&self) -> &str {
        if self.is_circuit_open() {
            &self.fallback_url
        } else {
            &self.primary_url
        }
    }

    fn retry_delay(attempt: u32) -> Duration {
        Duration::from_millis(BASE_DELAY_MS * 2u64.pow(attempt))
    }
}

/// Split a JSON-RPC envelope into a result or a classified error. An `error`
/// member is the bridge relaying what the contract said (a reverted call, a
/// rejected signature), not a transport failure, and surfaces as
/// `Error::Contract`; a malformed envelope is `Error::Rpc`.
fn parse_envelope(envelope: Value) -> Result<Value, Error> {
    if let Some(err) = envelope.get("error") {
        let message = err
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("bridge error")
            .to_string();
        return Err(Error::Contract(message));
    }
    envelope
        .get("result")
        .cloned()
        .ok_or_else(|| Error::Rpc("bridge response missing result".into()))
}

fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_delay_backoff() {
        assert_eq!(RpcClient::retry_delay(0), Duration::from_millis(200));
        assert_eq!(RpcClient::retry_delay(1), Duration::from_millis(400));
        assert_eq!(RpcClient::retry_delay(2), Duration::from_millis(800));
    }

    #[test]
    fn test_envelope_classifies_errors() {
        let reverted = json!({
            "jsonrpc": "2.0", "id": 1,
            "error": { "code": 3, "message": "execution reverted" }
        });
        assert!(matches!(parse_envelope(reverted), Err(Error::Contract(_))));

        let malformed = json!({ "jsonrpc": "2.0", "id": 1 });
        assert!(matches!(parse_envelope(malformed), Err(Error::Rpc(_))));

        let ok = json!({ "jsonrpc": "2.0", "id": 1, "result": 7 });
        assert_eq!(parse_envelope(ok).unwrap(), json!(7));
    }

    #[test]
    fn test_circuit_opens_after_threshold() {
        let rpc = RpcClient::new("http://primary", "http://fallback");
        assert_eq!(rpc.active_url(), "http://primary");
        for _ in 0..CIRCUIT_BREAKER_THRESHOLD {
            rpc.record_failure();
        }
        assert_eq!(rpc.active_url(), "http://fallback");
        assert_eq!(rpc.failover_count(), 1);
        rpc.record_success();
        assert_eq!(rpc.active_url(), "http://primary");
    }
}
