//! JSON-RPC 2.0 over HTTP.
//!
//! Transport failures are retried up to the configured count with a fixed
//! delay. An `error` member in the reply is returned immediately.

use std::time::Duration;

use testbed_common::config::CliConfig;
use testbed_common::error::{Result, TestbedError};

/// Delay between transport retries.
const RETRY_DELAY_MS: u64 = 500;

/// A blocking JSON-RPC endpoint.
pub trait RpcClient: std::fmt::Debug {
    /// Calls `method` with `params` and returns the `result` member.
    ///
    /// # Errors
    ///
    /// Returns [`TestbedError::Rpc`] if the call cannot be delivered or the
    /// service answers with an error.
    fn call(&self, method: &str, params: serde_json::Value) -> Result<serde_json::Value>;
}

/// [`RpcClient`] backed by a blocking `reqwest` client.
#[derive(Debug)]
pub struct HttpRpcClient {
    url: String,
    http: reqwest::blocking::Client,
    retries: u32,
}

impl HttpRpcClient {
    /// Creates a client for the endpoint and limits in `config`.
    ///
    /// # Errors
    ///
    /// Returns [`TestbedError::Config`] if the HTTP client cannot be built.
    pub fn new(config: &CliConfig) -> Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| TestbedError::Config {
                message: format!("failed to build HTTP client: {e}"),
            })?;
        Ok(Self {
            url: config.api_url.clone(),
            http,
            retries: config.http_retries,
        })
    }

    fn try_send(&self, request: &serde_json::Value) -> reqwest::Result<reqwest::blocking::Response> {
        self.http.post(&self.url).json(request).send()
    }
}

impl RpcClient for HttpRpcClient {
    fn call(&self, method: &str, params: serde_json::Value) -> Result<serde_json::Value> {
        let request = serde_json::json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": uuid::Uuid::new_v4().to_string(),
        });
        tracing::debug!(method, url = %self.url, "sending rpc request");

        let mut last_err = None;
        for attempt in 0..=self.retries {
            if attempt > 0 {
                std::thread::sleep(Duration::from_millis(RETRY_DELAY_MS));
            }
            match self.try_send(&request) {
                Ok(response) => {
                    let status = response.status();
                    let body: serde_json::Value = response.json().map_err(|e| {
                        TestbedError::rpc(method, format!("HTTP {status}: unreadable reply: {e}"))
                    })?;
                    return into_result(method, body);
                }
                Err(e) => {
                    tracing::debug!(method, attempt, error = %e, "rpc attempt failed, retrying");
                    last_err = Some(e);
                }
            }
        }
        Err(TestbedError::rpc(
            method,
            last_err.map_or_else(|| "failed after all retries".into(), |e| e.to_string()),
        ))
    }
}

/// Extracts `result` from a JSON-RPC reply, surfacing `error` if present.
///
/// # Errors
///
/// Returns [`TestbedError::Rpc`] if the reply carries a non-null `error`.
pub fn into_result(method: &str, mut reply: serde_json::Value) -> Result<serde_json::Value> {
    match reply.get("error") {
        None | Some(serde_json::Value::Null) => {}
        Some(error) => {
            let message = error
                .get("message")
                .and_then(serde_json::Value::as_str)
                .map_or_else(|| error.to_string(), str::to_string);
            return Err(TestbedError::rpc(method, message));
        }
    }
    Ok(reply
        .get_mut("result")
        .map(serde_json::Value::take)
        .unwrap_or_default())
}
