//! Errors surfaced by `Client::fetch` and `Client::fetch_ok`.

use crate::base::neterror::NetError;
use crate::http::cachekey::RequestKey;
use thiserror::Error;

/// Boxed error used for handler failures and body errors.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum FetchError {
    /// Connection, DNS, timeout and body-read failures. Never retried.
    #[error(transparent)]
    Net(#[from] NetError),

    /// Returned by `fetch_ok` when the delivered status is outside 200..=204.
    #[error("Unexpected status {code} {reason}")]
    StatusCode {
        code: u16,
        reason: String,
        body: String,
    },

    /// A 304 arrived for a key that has no cache entry. Validators are only
    /// sent when an entry exists, so this means the transport or server
    /// paired the exchange incorrectly.
    #[error("304 Not Modified for {key} without a cached entry")]
    NotModifiedWithoutEntry { key: RequestKey },

    /// The transport returned a response without an exchange context.
    #[error("Response carries no originating request context")]
    MissingRequestContext,

    /// The exchange context could not be turned back into an absolute URL.
    #[error("Cannot resolve request target {uri:?} against {target}")]
    UnresolvableRequest { target: String, uri: String },

    /// The caller's handler failed.
    #[error("Handler failed: {0}")]
    Handler(#[source] BoxError),
}

impl FetchError {
    /// Wrap an arbitrary error raised inside a handler.
    pub fn handler<E: Into<BoxError>>(err: E) -> Self {
        FetchError::Handler(err.into())
    }

    /// The HTTP status for `StatusCode` failures.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            FetchError::StatusCode { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Invariant or integration violations. These are bugs, not conditions
    /// a caller is expected to recover from.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            FetchError::NotModifiedWithoutEntry { .. }
                | FetchError::MissingRequestContext
                | FetchError::UnresolvableRequest { .. }
        )
    }
}
