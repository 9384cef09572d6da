//! Client errors
//!
//! Every failure keeps the HTTP status code of the call that produced it so
//! callers can tell "gone" from "broken" without parsing messages.

use scp_core::provider::{ErrorKind, ProviderError};
use scp_core::waiter::StatusError;
use thiserror::Error;

/// Payload messages the control plane uses for objects that no longer exist
const NOT_FOUND_MARKERS: &[&str] = &["does not exist", "not found", "already deleted"];

#[derive(Debug, Error)]
pub enum ClientError {
    /// Non-2xx answer from the control plane
    #[error("HTTP {status}: {message}")]
    Api {
        status: u16,
        code: Option<String>,
        message: String,
    },

    /// A lookup by key found no matching row in a list response
    #[error("{0} not found")]
    NotFound(String),

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("failed to decode response (HTTP {status}): {source}")]
    Decode {
        status: u16,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

pub type ClientResult<T> = Result<T, ClientError>;

impl ClientError {
    /// HTTP status code of the failed call; transport failures have none
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            ClientError::NotFound(_) => Some(404),
            ClientError::Transport(e) => e.status().map(|s| s.as_u16()),
            ClientError::Decode { status, .. } => Some(*status),
            ClientError::InvalidRequest(_) => None,
        }
    }

    fn message(&self) -> String {
        match self {
            ClientError::Api { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

impl StatusError for ClientError {
    fn status_code(&self) -> Option<u16> {
        self.status()
    }

    fn is_transient(&self) -> bool {
        match self {
            ClientError::Transport(e) => {
                e.is_timeout() || e.is_connect() || e.status().is_none_or(|s| s.is_server_error())
            }
            other => matches!(other.status(), Some(s) if s >= 500),
        }
    }
}

/// Whether the error means the remote object is gone
///
/// Handlers use this for reads and deletes. The waiter only looks at the
/// status code, so a 400 mentioning "not found" never ends a wait.
///
/// 404 and 403 both count: the control plane answers 403 for objects deleted
/// from a project the caller can no longer see.
pub fn is_deleted(err: &ClientError) -> bool {
    if matches!(err.status(), Some(404) | Some(403)) {
        return true;
    }
    match err {
        ClientError::Api { message, .. } => {
            let message = message.to_lowercase();
            NOT_FOUND_MARKERS.iter().any(|m| message.contains(m))
        }
        _ => false,
    }
}

impl From<ClientError> for ProviderError {
    fn from(err: ClientError) -> Self {
        let status = err.status();
        let kind = if is_deleted(&err) {
            ErrorKind::Gone
        } else if err.is_transient() {
            ErrorKind::Transient
        } else {
            match err {
                ClientError::InvalidRequest(_) => ErrorKind::Validation,
                _ => ErrorKind::Api,
            }
        };
        ProviderError::new(err.message())
            .with_kind(kind)
            .with_status(status)
            .with_cause(err)
    }
}
