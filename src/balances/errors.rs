use std::error::Error as _;

use thiserror::Error;

/// Failure of a single balance lookup against one provider
#[derive(Debug, Error)]
pub(crate) enum ProviderError {
    #[error("Network request timed out")]
    Timeout,

    #[error("{0}")]
    HostUnreachable(String),

    #[error("{0}")]
    Transport(String),

    #[error("HTTP error {status} from {endpoint}")]
    HttpStatus {
        status: reqwest::StatusCode,
        endpoint: String,
    },

    #[error("JSON parsing failed: {0}")]
    Parse(String),

    #[error("JSON-RPC error {code}: {message}")]
    Rpc { code: i64, message: String },
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return ProviderError::Timeout;
        }

        let description = describe(&err);
        if err.is_connect() && is_resolution_failure(&description) {
            ProviderError::HostUnreachable(description)
        } else {
            ProviderError::Transport(description)
        }
    }
}

impl From<serde_json::Error> for ProviderError {
    fn from(err: serde_json::Error) -> Self {
        ProviderError::Parse(err.to_string())
    }
}

/// Flattens an error and its sources into one line.
///
/// reqwest only prints the outermost layer ("error sending request"), which hides
/// whether the host could not be resolved or the connection was refused.
fn describe(err: &reqwest::Error) -> String {
    let mut description = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        description.push_str(": ");
        description.push_str(&cause.to_string());
        source = cause.source();
    }
    description
}

fn is_resolution_failure(description: &str) -> bool {
    let lowered = description.to_ascii_lowercase();
    lowered.contains("dns error")
        || lowered.contains("failed to lookup address")
        || lowered.contains("name or service not known")
        || lowered.contains("no such host")
}

/// Failure raised by the monitor when it cannot route a request
#[derive(Debug, Error)]
pub(crate) enum MonitorError {
    #[error("No handler registered for this chain")]
    NoHandler,

    #[error("No provider configured for this chain")]
    NoProvider,

    #[error("Refresh interval must be greater than zero")]
    ZeroRefreshInterval,
}
