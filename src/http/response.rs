//! HTTP Response with body access.

use crate::base::neterror::NetError;
use crate::http::cachekey::ExchangeContext;
use crate::http::ResponseBody;
use http::{HeaderMap, HeaderName, HeaderValue, StatusCode, Version};
use hyper::body::Incoming;

/// HTTP Response with accessible body.
///
/// Interceptors may rewrite the status and replace the entity; the exchange
/// context records which request produced it.
#[derive(Debug)]
pub struct HttpResponse {
    status: StatusCode,
    version: Version,
    headers: HeaderMap,
    reason: Option<String>,
    entity: Option<ResponseBody>,
    context: Option<ExchangeContext>,
}

impl HttpResponse {
    /// An HTTP/1.1 response with no headers, entity or context.
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            version: Version::HTTP_11,
            headers: HeaderMap::new(),
            reason: None,
            entity: None,
            context: None,
        }
    }

    /// Create from hyper Response<Incoming>.
    ///
    /// Bodies that are already known to be empty (HEAD, 204, 304) become an
    /// absent entity.
    pub fn from_hyper(resp: http::Response<Incoming>, context: ExchangeContext) -> Self {
        use http_body::Body;

        let (parts, body) = resp.into_parts();
        let reason = parts
            .extensions
            .get::<hyper::ext::ReasonPhrase>()
            .map(|r| String::from_utf8_lossy(r.as_bytes()).into_owned());
        let entity = if body.is_end_stream() {
            None
        } else {
            Some(ResponseBody::from_incoming(body))
        };
        Self {
            status: parts.status,
            version: parts.version,
            headers: parts.headers,
            reason,
            entity,
            context: Some(context),
        }
    }

    pub fn with_version(mut self, version: Version) -> Self {
        self.version = version;
        self
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    pub fn with_entity(mut self, entity: ResponseBody) -> Self {
        self.entity = Some(entity);
        self
    }

    pub fn with_context(mut self, context: ExchangeContext) -> Self {
        self.context = Some(context);
        self
    }

    /// Get the status code.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Rewrite the status line. The protocol version is untouched.
    pub fn set_status(&mut self, status: StatusCode) {
        if status != self.status {
            self.reason = None;
        }
        self.status = status;
    }

    /// Get the HTTP version.
    pub fn version(&self) -> Version {
        self.version
    }

    /// The reason phrase sent by the server, or the canonical one.
    pub fn reason(&self) -> &str {
        match &self.reason {
            Some(reason) => reason,
            None => self.status.canonical_reason().unwrap_or(""),
        }
    }

    /// Get a reference to the headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// First value of a header as a string, if it is valid visible ASCII.
    pub fn first_header(&self, name: &HeaderName) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn context(&self) -> Option<&ExchangeContext> {
        self.context.as_ref()
    }

    pub fn has_entity(&self) -> bool {
        self.entity.is_some()
    }

    pub fn entity(&self) -> Option<&ResponseBody> {
        self.entity.as_ref()
    }

    /// Take the entity for consumption.
    /// Can only be called once - subsequent calls return None.
    pub fn take_entity(&mut self) -> Option<ResponseBody> {
        self.entity.take()
    }

    /// Replace the entity, dropping whatever was there.
    pub fn set_entity(&mut self, entity: Option<ResponseBody>) {
        self.entity = entity;
    }

    /// Consume the entity as bytes. Empty when there is none.
    pub async fn bytes(&mut self) -> Result<bytes::Bytes, NetError> {
        match self.entity.take() {
            Some(body) => body.bytes().await,
            None => Ok(bytes::Bytes::new()),
        }
    }

    /// Consume the entity as text. Empty when there is none.
    pub async fn text(&mut self) -> Result<String, NetError> {
        match self.entity.take() {
            Some(body) => body.text().await,
            None => Ok(String::new()),
        }
    }

    /// Consume the entity as JSON.
    #[cfg(feature = "json")]
    pub async fn json<T: serde::de::DeserializeOwned>(&mut self) -> Result<T, NetError> {
        self.entity
            .take()
            .ok_or(NetError::EmptyResponse)?
            .json()
            .await
    }

    /// Drain and drop any unread entity.
    pub async fn release(&mut self) -> Result<(), NetError> {
        match self.entity.take() {
            Some(body) => body.release().await,
            None => Ok(()),
        }
    }
}
