//! HTTP Client with builder pattern.
//!
//! Every request goes through conditional GET (validators from the client's
//! [`ResponseCache`]) and gzip negotiation before the caller's handler sees
//! the response.
//!
//! # Example
//!
//! ```rust,ignore
//! use condnet::{Client, http::Request};
//!
//! let client = Client::new();
//!
//! // First call stores the body and validators; the second is sent with
//! // If-None-Match and a 304 comes back as 200 with the stored body.
//! for _ in 0..2 {
//!     let feed = client
//!         .fetch_ok(&Request::get("https://example.com/feed.xml"), |resp| {
//!             Box::pin(async move { resp.text().await.map_err(Into::into) })
//!         })
//!         .await?;
//!     println!("{} bytes", feed.len());
//! }
//! ```

use crate::base::error::FetchError;
use crate::http::gzip::declares_gzip;
use crate::http::interceptor::{
    joined_header, ConditionalCache, RequestInterceptor, ResponseInterceptor,
};
use crate::http::request::Request;
use crate::http::response::HttpResponse;
use crate::http::transaction::{HttpTransaction, Pipeline};
use crate::http::transport::{HyperTransport, Transport};
use crate::http::{Method, ResponseCache};
use futures::future::BoxFuture;
use http::header::{HeaderValue, CONTENT_ENCODING};
use std::sync::Arc;
use std::time::Duration;

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// `User-Agent` sent when a request has none. `None` sends no header.
    pub user_agent: Option<String>,

    /// Bound on DNS, TCP connect and TLS handshake together.
    pub connect_timeout: Option<Duration>,

    /// Bound on sending the request and receiving the response head.
    pub read_timeout: Option<Duration>,

    /// Redirect hops followed for GET and HEAD (0 disables).
    pub max_redirects: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            user_agent: Some(format!("condnet/{}", env!("CARGO_PKG_VERSION"))),
            connect_timeout: Some(Duration::from_secs(30)),
            read_timeout: Some(Duration::from_secs(60)),
            // Chromium's kMaxRedirects
            max_redirects: 20,
        }
    }
}

/// HTTP Client for making requests.
///
/// Use [`Client::builder()`] to configure and create a client. Clones share
/// the cache, the transport and the interceptors.
#[derive(Clone, Debug)]
pub struct Client {
    cache: Arc<ResponseCache>,
    pipeline: Arc<Pipeline>,
    config: Arc<ClientConfig>,
}

impl Default for Client {
    fn default() -> Self {
        Self::new()
    }
}

impl Client {
    /// Create a new client with default settings.
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Create a new client builder.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::default()
    }

    /// Default settings over a custom transport.
    pub fn with_transport<T: Transport + 'static>(transport: T) -> Self {
        Self::builder().transport(transport).build()
    }

    /// The conditional-GET cache shared by every exchange of this client.
    pub fn cache(&self) -> &Arc<ResponseCache> {
        &self.cache
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Execute `request` and hand the response to `handler`, whatever its
    /// status.
    ///
    /// Any entity left unread is drained once the handler returns, on
    /// success and on failure alike.
    pub async fn fetch<T, F>(&self, request: &Request, handler: F) -> Result<T, FetchError>
    where
        F: for<'a> FnOnce(&'a mut HttpResponse) -> BoxFuture<'a, Result<T, FetchError>>,
    {
        self.deliver(request, false, handler).await
    }

    /// Like [`fetch`](Self::fetch), but only statuses 200-204 reach the
    /// handler. Anything else fails with [`FetchError::StatusCode`] carrying
    /// the status, reason and body text.
    pub async fn fetch_ok<T, F>(&self, request: &Request, handler: F) -> Result<T, FetchError>
    where
        F: for<'a> FnOnce(&'a mut HttpResponse) -> BoxFuture<'a, Result<T, FetchError>>,
    {
        self.deliver(request, true, handler).await
    }

    /// GET a URL and return its (decoded) body text.
    pub async fn get_text(&self, url: &str) -> Result<String, FetchError> {
        self.fetch_ok(&Request::get(url), |resp| {
            Box::pin(async move { resp.text().await.map_err(FetchError::from) })
        })
        .await
    }

    /// POST form parameters to a URL and return the body text.
    pub async fn post_form<K, V, I>(&self, url: &str, params: I) -> Result<String, FetchError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let request = Request::new(Method::Post, url).params(params);
        self.fetch_ok(&request, |resp| {
            Box::pin(async move { resp.text().await.map_err(FetchError::from) })
        })
        .await
    }

    async fn deliver<T, F>(
        &self,
        request: &Request,
        require_success: bool,
        handler: F,
    ) -> Result<T, FetchError>
    where
        F: for<'a> FnOnce(&'a mut HttpResponse) -> BoxFuture<'a, Result<T, FetchError>>,
    {
        let outgoing = request.to_outgoing()?;
        let mut transaction = HttpTransaction::new(self.pipeline.clone());
        let mut response = transaction.start(outgoing).await?;

        let result = if require_success && !is_success(&response) {
            Err(status_error(&mut response).await)
        } else {
            handler(&mut response).await
        };

        if let Err(e) = response.release().await {
            tracing::warn!(url = %request.url(), error = %e, "failed to release response entity");
        }
        transaction.finish(result.is_ok());
        tracing::debug!(
            method = %request.method(),
            url = %request.url(),
            status = response.status().as_u16(),
            state = ?transaction.state(),
            "exchange finished"
        );
        result
    }
}

fn is_success(response: &HttpResponse) -> bool {
    (200..=204).contains(&response.status().as_u16())
}

/// Build the status failure, consuming the entity as its body text.
async fn status_error(response: &mut HttpResponse) -> FetchError {
    let body = match response.take_entity() {
        Some(entity) => {
            let gzipped = joined_header(response.headers(), &CONTENT_ENCODING)
                .is_some_and(|encoding| declares_gzip(&encoding));
            let entity = if gzipped {
                entity.gzip_decoded()
            } else {
                entity
            };
            entity.text_lossy().await.unwrap_or_else(|e| {
                tracing::debug!(error = %e, "could not read error body");
                String::new()
            })
        }
        None => String::new(),
    };
    FetchError::StatusCode {
        code: response.status().as_u16(),
        reason: response.reason().to_string(),
        body,
    }
}

/// Builder for creating a [`Client`].
#[derive(Default)]
pub struct ClientBuilder {
    config: ClientConfig,
    transport: Option<Arc<dyn Transport>>,
    cache: Option<Arc<ResponseCache>>,
    request_interceptors: Vec<Arc<dyn RequestInterceptor>>,
    response_interceptors: Vec<Arc<dyn ResponseInterceptor>>,
}

impl ClientBuilder {
    /// Replace the whole configuration.
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the default `User-Agent`.
    pub fn user_agent<S: Into<String>>(mut self, user_agent: S) -> Self {
        self.config.user_agent = Some(user_agent.into());
        self
    }

    /// Set connect timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = Some(timeout);
        self
    }

    /// Set timeout for the response head.
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.config.read_timeout = Some(timeout);
        self
    }

    pub fn max_redirects(mut self, max_redirects: usize) -> Self {
        self.config.max_redirects = max_redirects;
        self
    }

    /// Use a custom transport instead of [`HyperTransport`]. The timeouts
    /// are then the transport's business.
    pub fn transport<T: Transport + 'static>(mut self, transport: T) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    /// Share an existing cache, e.g. between clients with different settings.
    pub fn cache(mut self, cache: Arc<ResponseCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Extra request interceptor. Runs before the conditional-cache one, so
    /// headers it sets (e.g. `Accept-Encoding`) are respected.
    pub fn request_interceptor<I: RequestInterceptor + 'static>(mut self, interceptor: I) -> Self {
        self.request_interceptors.push(Arc::new(interceptor));
        self
    }

    /// Extra response interceptor. Runs after the conditional-cache one and
    /// sees decoded entities and rewritten 304s.
    pub fn response_interceptor<I: ResponseInterceptor + 'static>(
        mut self,
        interceptor: I,
    ) -> Self {
        self.response_interceptors.push(Arc::new(interceptor));
        self
    }

    /// Build the client.
    pub fn build(self) -> Client {
        let config = self.config;
        let transport: Arc<dyn Transport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(HyperTransport::new(
                config.connect_timeout,
                config.read_timeout,
            )),
        };
        let cache = self.cache.unwrap_or_default();
        let conditional = Arc::new(ConditionalCache::new(cache.clone()));

        let mut pipeline = Pipeline::new(transport);
        for interceptor in self.request_interceptors {
            pipeline.add_request_interceptor(interceptor);
        }
        pipeline.add_request_interceptor(conditional.clone());
        pipeline.add_response_interceptor(conditional);
        for interceptor in self.response_interceptors {
            pipeline.add_response_interceptor(interceptor);
        }

        let user_agent = config.user_agent.as_deref().and_then(|ua| {
            HeaderValue::from_str(ua)
                .map_err(|_| tracing::warn!(user_agent = ua, "invalid User-Agent, not sending one"))
                .ok()
        });
        pipeline.set_user_agent(user_agent);
        pipeline.set_max_redirects(config.max_redirects);

        Client {
            cache,
            pipeline: Arc::new(pipeline),
            config: Arc::new(config),
        }
    }
}
