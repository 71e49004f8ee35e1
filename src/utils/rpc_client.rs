use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{future::Future, time::Duration};
use tokio::time::timeout;

use crate::balances::errors::ProviderError;

/// Default per-request wait ceiling in milliseconds
pub(crate) const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 5000;

/// Creates the HTTP client shared by every provider of a monitor
///
/// The client keeps its own connection pool, so one instance is built per monitor
/// and handed to providers by reference. The wait ceiling is enforced per request
/// by [`with_deadline`], not by the client, so that a timeout is reported the same
/// way whichever stage of the request it hits.
///
/// # Errors
///
/// Fails if the TLS backend cannot be initialised.
pub(crate) fn create_http_client() -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .user_agent(concat!(
            env!("CARGO_PKG_NAME"),
            "/",
            env!("CARGO_PKG_VERSION")
        ))
        .pool_idle_timeout(Duration::from_secs(90))
        .build()
}

/// Runs `operation` and reports [`ProviderError::Timeout`] if it does not finish
/// within `deadline`.
pub(crate) async fn with_deadline<F, T>(deadline: Duration, operation: F) -> Result<T, ProviderError>
where
    F: Future<Output = Result<T, ProviderError>>,
{
    match timeout(deadline, operation).await {
        Ok(result) => result,
        Err(_) => Err(ProviderError::Timeout),
    }
}

/// JSON-RPC 2.0 request envelope
#[derive(Debug, Serialize)]
pub(crate) struct RpcRequest<'a, P: Serialize> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: P,
}

impl<'a, P: Serialize> RpcRequest<'a, P> {
    pub(crate) fn new(method: &'a str, params: P) -> Self {
        Self {
            jsonrpc: "2.0",
            id: 1,
            method,
            params,
        }
    }
}

/// JSON-RPC 2.0 error object
#[derive(Debug, Deserialize)]
pub(crate) struct RpcErrorObject {
    code: i64,
    message: String,
}

/// JSON-RPC 2.0 response envelope
#[derive(Debug, Deserialize)]
pub(crate) struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcErrorObject>,
}

impl<T> RpcResponse<T> {
    /// Unwraps the `result` member, turning an `error` member or a missing result
    /// into a [`ProviderError`]
    pub(crate) fn into_result(self) -> Result<T, ProviderError> {
        if let Some(error) = self.error {
            return Err(ProviderError::Rpc {
                code: error.code,
                message: error.message,
            });
        }

        self.result
            .ok_or_else(|| ProviderError::Parse("missing field `result`".to_string()))
    }
}

/// POSTs a JSON-RPC call to `endpoint` and decodes the `result` member as `T`
pub(crate) async fn call<P, T>(
    client: &reqwest::Client,
    endpoint: &str,
    method: &str,
    params: P,
) -> Result<T, ProviderError>
where
    P: Serialize,
    T: DeserializeOwned,
{
    let response = client
        .post(endpoint)
        .json(&RpcRequest::new(method, params))
        .send()
        .await?;

    let body = read_success_body(response, endpoint).await?;
    let envelope: RpcResponse<T> = serde_json::from_slice(&body)?;
    envelope.into_result()
}

/// Returns the body of a 2xx response, or [`ProviderError::HttpStatus`]
pub(crate) async fn read_success_body(
    response: reqwest::Response,
    endpoint: &str,
) -> Result<Vec<u8>, ProviderError> {
    let status = response.status();
    if !status.is_success() {
        return Err(ProviderError::HttpStatus {
            status,
            endpoint: endpoint.to_string(),
        });
    }

    Ok(response.bytes().await?.to_vec())
}
