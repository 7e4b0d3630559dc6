//! Shared plumbing for the Google REST APIs
//!
//! Gmail and Sheets share one OAuth token and one way of classifying HTTP
//! failures, so both live here.

mod auth;

pub use auth::GoogleAuth;

/// A failed Google API call, kept inside `anyhow::Error` so callers can
/// classify it with `downcast_ref` after context has been attached.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("could not obtain an access token: {0:#}")]
    Auth(anyhow::Error),

    #[error("{endpoint} returned HTTP {status}")]
    Status { endpoint: &'static str, status: u16 },

    #[error("{endpoint} request failed: {source}")]
    Transport {
        endpoint: &'static str,
        source: ureq::Error,
    },
}

impl ApiError {
    /// Map a ureq failure for the given endpoint
    pub fn from_ureq(endpoint: &'static str, err: ureq::Error) -> Self {
        match err {
            ureq::Error::StatusCode(status) => Self::Status { endpoint, status },
            source => Self::Transport { endpoint, source },
        }
    }

    /// Worth retrying: network trouble, throttling, server errors
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Auth(_) => false,
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            Self::Transport { source, .. } => matches!(
                source,
                ureq::Error::Io(_)
                    | ureq::Error::Timeout(_)
                    | ureq::Error::HostNotFound
                    | ureq::Error::ConnectionFailed
            ),
        }
    }

    /// The credentials were rejected or could not be obtained
    pub fn is_auth(&self) -> bool {
        matches!(
            self,
            Self::Auth(_) | Self::Status { status: 401 | 403, .. }
        )
    }
}

/// Retry predicate for `anyhow` errors coming out of the API clients
pub fn is_transient(err: &anyhow::Error) -> bool {
    err.downcast_ref::<ApiError>()
        .is_some_and(ApiError::is_transient)
}

/// Whether a failed call says something about the service as a whole
/// (connectivity, throttling, credentials) rather than about one resource
pub fn is_service_failure(err: &anyhow::Error) -> bool {
    err.downcast_ref::<ApiError>()
        .is_some_and(|e| e.is_transient() || e.is_auth())
}
