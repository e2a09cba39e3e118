//! Request and response interceptors.
//!
//! Interceptors run inside the transaction around every hop of an exchange:
//! request interceptors after the request is resolved and before the
//! transport sends it, response interceptors after the transport returns
//! the response head and before the caller sees it. They do not share a
//! call stack, so the response side recovers the request key from the
//! [`ExchangeContext`](crate::http::cachekey::ExchangeContext) the transport
//! attached.
//!
//! [`ConditionalCache`] is the built-in pair: gzip negotiation plus
//! conditional GET backed by a [`ResponseCache`].

use crate::base::error::FetchError;
use crate::http::cachekey::RequestKey;
use crate::http::gzip::declares_gzip;
use crate::http::httpcache::{CacheEntry, ResponseCache};
use crate::http::request::OutgoingRequest;
use crate::http::response::HttpResponse;
use crate::http::responsebody::ResponseBody;
use futures::future::BoxFuture;
use http::header::{
    HeaderName, HeaderValue, ACCEPT_ENCODING, CONTENT_ENCODING, ETAG, IF_MODIFIED_SINCE,
    IF_NONE_MATCH, LAST_MODIFIED,
};
use http::{HeaderMap, StatusCode};
use std::sync::Arc;

/// Mutates a request before it is sent.
pub trait RequestInterceptor: Send + Sync {
    fn on_request_send(&self, request: &mut OutgoingRequest);
}

impl<F> RequestInterceptor for F
where
    F: Fn(&mut OutgoingRequest) + Send + Sync,
{
    fn on_request_send(&self, request: &mut OutgoingRequest) {
        self(request)
    }
}

/// Mutates a response after it is received.
///
/// Returning an error fails the exchange; the transaction does not run the
/// remaining interceptors.
pub trait ResponseInterceptor: Send + Sync {
    fn on_response_receive<'a>(
        &'a self,
        response: &'a mut HttpResponse,
    ) -> BoxFuture<'a, Result<(), FetchError>>;
}

/// Gzip negotiation and conditional GET over a shared cache.
#[derive(Debug, Clone, Default)]
pub struct ConditionalCache {
    cache: Arc<ResponseCache>,
}

impl ConditionalCache {
    pub fn new(cache: Arc<ResponseCache>) -> Self {
        Self { cache }
    }

    pub fn cache(&self) -> &Arc<ResponseCache> {
        &self.cache
    }
}

impl RequestInterceptor for ConditionalCache {
    fn on_request_send(&self, request: &mut OutgoingRequest) {
        on_request_send(request, &self.cache)
    }
}

impl ResponseInterceptor for ConditionalCache {
    fn on_response_receive<'a>(
        &'a self,
        response: &'a mut HttpResponse,
    ) -> BoxFuture<'a, Result<(), FetchError>> {
        Box::pin(on_response_receive(response, &self.cache))
    }
}

/// Ask for gzip and attach the cached validators for this request, if any.
pub fn on_request_send(request: &mut OutgoingRequest, cache: &ResponseCache) {
    if !request.headers().contains_key(ACCEPT_ENCODING) {
        request
            .headers_mut()
            .insert(ACCEPT_ENCODING, HeaderValue::from_static("gzip"));
    }

    let key = request.key();
    let Some(entry) = cache.get(&key) else {
        return;
    };
    if !entry.can_revalidate() {
        return;
    }

    let headers = request.headers_mut();
    if let Some(etag) = &entry.etag {
        set_validator(headers, IF_NONE_MATCH, etag);
    }
    if let Some(last_modified) = &entry.last_modified {
        set_validator(headers, IF_MODIFIED_SINCE, last_modified);
    }
    tracing::debug!(
        key = %key,
        etag = ?entry.etag,
        last_modified = ?entry.last_modified,
        "revalidating cached response"
    );
}

/// A validator the caller already set wins over the cached one.
fn set_validator(headers: &mut HeaderMap, name: HeaderName, value: &str) {
    if headers.contains_key(&name) {
        tracing::debug!(header = %name, "keeping caller's validator");
        return;
    }
    match HeaderValue::from_bytes(value.as_bytes()) {
        Ok(value) => {
            headers.insert(name, value);
        }
        Err(_) => tracing::warn!(header = %name, value, "cached validator is not a valid header"),
    }
}

/// Decode and store a 200-204 response, or substitute the cached body into a
/// 304 and deliver it as 200.
pub async fn on_response_receive(
    response: &mut HttpResponse,
    cache: &ResponseCache,
) -> Result<(), FetchError> {
    let context = response
        .context()
        .ok_or(FetchError::MissingRequestContext)?;
    let key = RequestKey::from_exchange(context)?;
    let status = response.status();

    if (200..=204).contains(&status.as_u16()) {
        let mut entry = CacheEntry {
            last_modified: raw_header(response.headers(), &LAST_MODIFIED),
            etag: raw_header(response.headers(), &ETAG),
            stored_body: None,
        };

        if let Some(entity) = response.take_entity() {
            let encoding = joined_header(response.headers(), &CONTENT_ENCODING);
            let text = decode_entity(entity, encoding.as_deref(), &key).await?;
            response.set_entity(Some(ResponseBody::from_text(text.clone())));
            entry.stored_body = Some(text);
        }

        tracing::debug!(
            key = %key,
            status = status.as_u16(),
            etag = ?entry.etag,
            last_modified = ?entry.last_modified,
            has_body = entry.stored_body.is_some(),
            "storing response"
        );
        cache.put(key, entry);
    } else if status == StatusCode::NOT_MODIFIED {
        let Some(entry) = cache.get(&key) else {
            tracing::error!(key = %key, "304 Not Modified without a cached entry");
            return Err(FetchError::NotModifiedWithoutEntry { key });
        };
        tracing::debug!(key = %key, "304 Not Modified, serving cached body");
        response.set_entity(entry.stored_body.map(ResponseBody::from_text));
        response.set_status(StatusCode::OK);
    }

    Ok(())
}

/// Read an entity fully as text, gunzipping when the encoding says so.
///
/// Any encoding other than gzip is logged and the bytes are read as they
/// are; the text may then be garbage, but the exchange still succeeds.
async fn decode_entity(
    entity: ResponseBody,
    encoding: Option<&str>,
    key: &RequestKey,
) -> Result<String, FetchError> {
    let entity = match encoding {
        None => entity,
        Some(encoding) if declares_gzip(encoding) => entity.gzip_decoded(),
        Some(encoding) => {
            tracing::warn!(
                key = %key,
                encoding,
                "unsupported Content-Encoding, reading body verbatim"
            );
            entity
        }
    };
    Ok(entity.text_lossy().await?)
}

/// First value of a header, verbatim.
fn raw_header(headers: &HeaderMap, name: &HeaderName) -> Option<String> {
    headers
        .get(name)
        .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
}

/// Every line of a list-valued header joined into one element list.
pub(crate) fn joined_header(headers: &HeaderMap, name: &HeaderName) -> Option<String> {
    let values: Vec<_> = headers
        .get_all(name)
        .iter()
        .map(|v| String::from_utf8_lossy(v.as_bytes()))
        .collect();
    if values.is_empty() {
        None
    } else {
        Some(values.join(", "))
    }
}
