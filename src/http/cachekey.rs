//! Cache keys and the exchange context they are recovered from.
//!
//! The request side keys an exchange from the request it is about to send,
//! the response side from the [`ExchangeContext`] the transport attaches to
//! the response. Both go through `Url` so the two derivations agree:
//! dot segments are removed, the host is lower-cased, default ports are
//! elided and the fragment is dropped.

use crate::base::error::FetchError;
use crate::http::method::Method;
use crate::http::request::OutgoingRequest;
use std::fmt;
use url::{Position, Url};

/// Identity of an outgoing request: method plus fully resolved URL.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct RequestKey {
    method: Method,
    url: String,
}

impl RequestKey {
    /// Key for a request about to be sent.
    pub fn from_request(method: Method, url: &Url) -> Self {
        let mut url = url.clone();
        url.set_fragment(None);
        Self {
            method,
            url: url.into(),
        }
    }

    /// Key for the request that produced a response.
    pub fn from_exchange(context: &ExchangeContext) -> Result<Self, FetchError> {
        let url = context.resolve()?;
        Ok(Self::from_request(context.method, &url))
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl fmt::Display for RequestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.url)
    }
}

/// What a transport records about the request behind a response: the
/// method, the origin the request was sent to, and the request-target as it
/// went on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangeContext {
    method: Method,
    target: Url,
    uri: String,
}

impl ExchangeContext {
    /// `target` is the origin (`scheme://host[:port]`) and `uri` the
    /// request-target, either origin-form (`/path?query`) or absolute.
    pub fn new(method: Method, target: Url, uri: impl Into<String>) -> Self {
        Self {
            method,
            target,
            uri: uri.into(),
        }
    }

    /// Context for a request sent in origin-form to its own host.
    pub fn for_request(request: &OutgoingRequest) -> Self {
        let url = request.url();
        let mut target = url.clone();
        target.set_path("/");
        target.set_query(None);
        target.set_fragment(None);
        Self {
            method: request.method(),
            target,
            uri: url[Position::BeforePath..Position::AfterQuery].to_string(),
        }
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn target(&self) -> &Url {
        &self.target
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Resolve the request-target against the target host.
    pub fn resolve(&self) -> Result<Url, FetchError> {
        self.target
            .join(&self.uri)
            .map_err(|_| FetchError::UnresolvableRequest {
                target: self.target.to_string(),
                uri: self.uri.clone(),
            })
    }
}
