use std::error::Error;
use std::fmt;

/// Failures of a single gateway call. None of them are retried.
#[derive(Debug, Clone, PartialEq)]
pub enum GatewayError {
    /// No credential is configured; nothing was sent.
    Unauthenticated,
    /// The provider rejected the credential (HTTP 401).
    InvalidCredential,
    /// Any other non-success status, with the provider's message when it sent one.
    RequestFailed { status: u16, message: Option<String> },
    /// The request never completed and the machine has no network route.
    NetworkUnavailable,
    /// The request never completed although the machine is online.
    ServerUnreachable,
    /// A success status whose body could not be understood.
    MalformedResponse(String),
}

impl GatewayError {
    /// Whether the failure happened before any HTTP response arrived.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            GatewayError::NetworkUnavailable | GatewayError::ServerUnreachable
        )
    }
}

impl fmt::Display for GatewayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GatewayError::Unauthenticated => {
                write!(f, "No API key configured. Run 'causerie auth' or use /key first.")
            }
            GatewayError::InvalidCredential => {
                write!(f, "The API key was rejected. Check your settings.")
            }
            GatewayError::RequestFailed {
                status,
                message: Some(message),
            } => write!(f, "API request failed: {status} - {message}"),
            GatewayError::RequestFailed {
                status,
                message: None,
            } => write!(f, "API request failed: {status} - unknown error"),
            GatewayError::NetworkUnavailable => write!(f, "Network connection is unavailable."),
            GatewayError::ServerUnreachable => write!(f, "The API server is not responding."),
            GatewayError::MalformedResponse(detail) => {
                write!(f, "Unexpected response from the API: {detail}")
            }
        }
    }
}

impl Error for GatewayError {}

/// Pull a human-readable message out of a provider error body.
///
/// Understands `{"error":{"message":..}}`, `{"error":".."}` and
/// `{"message":..}`; whitespace runs are collapsed.
pub fn extract_error_summary(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body.trim()).ok()?;
    let summary = value
        .pointer("/error/message")
        .and_then(|v| v.as_str())
        .map(str::to_owned)
        .or_else(|| {
            value.get("error").and_then(|v| match v {
                serde_json::Value::String(s) => Some(s.to_string()),
                _ => None,
            })
        })
        .or_else(|| {
            value
                .get("message")
                .and_then(|v| v.as_str().map(str::to_owned))
        })?;

    let collapsed = summary.split_whitespace().collect::<Vec<_>>().join(" ");
    let collapsed = collapsed.trim().to_string();
    if collapsed.is_empty() {
        None
    } else {
        Some(collapsed)
    }
}
