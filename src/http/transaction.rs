//! One exchange through the interception pipeline.
//!
//! Chromium mapping: net/http/http_network_transaction.h, with the redirect
//! loop of net/url_request/url_request_http_job.h folded in.

use crate::base::error::FetchError;
use crate::base::loadstate::ExchangeState;
use crate::base::neterror::NetError;
use crate::http::interceptor::{RequestInterceptor, ResponseInterceptor};
use crate::http::request::OutgoingRequest;
use crate::http::response::HttpResponse;
use crate::http::transport::Transport;
use http::header::{HeaderValue, LOCATION, USER_AGENT};
use http::StatusCode;
use std::sync::Arc;
use url::Url;

/// Everything an exchange runs through: interceptors on both sides of a
/// transport, plus the per-client request defaults.
#[derive(Clone)]
pub struct Pipeline {
    transport: Arc<dyn Transport>,
    request_interceptors: Vec<Arc<dyn RequestInterceptor>>,
    response_interceptors: Vec<Arc<dyn ResponseInterceptor>>,
    user_agent: Option<HeaderValue>,
    max_redirects: usize,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("request_interceptors", &self.request_interceptors.len())
            .field("response_interceptors", &self.response_interceptors.len())
            .field("user_agent", &self.user_agent)
            .field("max_redirects", &self.max_redirects)
            .finish()
    }
}

impl Pipeline {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            request_interceptors: Vec::new(),
            response_interceptors: Vec::new(),
            user_agent: None,
            max_redirects: 0,
        }
    }

    /// Request interceptors run in registration order.
    pub fn add_request_interceptor(&mut self, interceptor: Arc<dyn RequestInterceptor>) {
        self.request_interceptors.push(interceptor);
    }

    /// Response interceptors run in registration order.
    pub fn add_response_interceptor(&mut self, interceptor: Arc<dyn ResponseInterceptor>) {
        self.response_interceptors.push(interceptor);
    }

    /// Sent as `User-Agent` unless the request already carries one.
    pub fn set_user_agent(&mut self, user_agent: Option<HeaderValue>) {
        self.user_agent = user_agent;
    }

    /// 0 disables redirect following.
    pub fn set_max_redirects(&mut self, max_redirects: usize) {
        self.max_redirects = max_redirects;
    }

    pub fn max_redirects(&self) -> usize {
        self.max_redirects
    }
}

/// Drives one request through the pipeline, following redirects for
/// methods that allow it.
pub struct HttpTransaction {
    pipeline: Arc<Pipeline>,
    state: ExchangeState,
    url_chain: Vec<Url>,
}

impl HttpTransaction {
    pub fn new(pipeline: Arc<Pipeline>) -> Self {
        Self {
            pipeline,
            state: ExchangeState::Pending,
            url_chain: Vec::new(),
        }
    }

    pub fn state(&self) -> ExchangeState {
        self.state
    }

    /// Every URL requested so far, the original first.
    pub fn url_chain(&self) -> &[Url] {
        &self.url_chain
    }

    /// Run the exchange up to the point where the caller gets the response.
    ///
    /// On error the state is `Failed` and any response received is dropped.
    pub async fn start(&mut self, request: OutgoingRequest) -> Result<HttpResponse, FetchError> {
        match self.do_loop(request).await {
            Ok(response) => Ok(response),
            Err(e) => {
                tracing::debug!(error = %e, state = ?self.state, "exchange failed");
                self.state = ExchangeState::Failed;
                Err(e)
            }
        }
    }

    /// Record the outcome once the caller is done with the response.
    pub fn finish(&mut self, delivered: bool) {
        self.state = if delivered {
            ExchangeState::Delivered
        } else {
            ExchangeState::Failed
        };
    }

    async fn do_loop(&mut self, mut request: OutgoingRequest) -> Result<HttpResponse, FetchError> {
        if let Some(user_agent) = &self.pipeline.user_agent {
            if !request.headers().contains_key(USER_AGENT) {
                request.headers_mut().insert(USER_AGENT, user_agent.clone());
            }
        }

        loop {
            self.state = ExchangeState::Sent;
            self.url_chain.push(request.url().clone());

            // Interceptors see a copy; a redirect hop restarts from the
            // caller's headers, not from this hop's validators.
            let mut outgoing = request.clone();
            for interceptor in &self.pipeline.request_interceptors {
                interceptor.on_request_send(&mut outgoing);
            }
            self.state = ExchangeState::InterceptedOutgoing;

            let mut response = self.pipeline.transport.execute(outgoing).await?;
            self.state = ExchangeState::TransportExecuted;

            for interceptor in &self.pipeline.response_interceptors {
                interceptor.on_response_receive(&mut response).await?;
            }
            self.state = ExchangeState::InterceptedIncoming;

            let Some(next) = self.redirect_target(&request, &response)? else {
                return Ok(response);
            };

            let hops = self.url_chain.len();
            if hops > self.pipeline.max_redirects {
                tracing::debug!(hops, limit = self.pipeline.max_redirects, "too many redirects");
                return Err(NetError::TooManyRedirects.into());
            }

            if let Err(e) = response.release().await {
                tracing::warn!(error = %e, "failed to drain redirect body");
            }
            tracing::debug!(
                from = %request.url(),
                to = %next,
                status = response.status().as_u16(),
                "following redirect"
            );
            request = request.redirected(next);
        }
    }

    fn redirect_target(
        &self,
        request: &OutgoingRequest,
        response: &HttpResponse,
    ) -> Result<Option<Url>, NetError> {
        if self.pipeline.max_redirects == 0 || !request.method().follows_redirects() {
            return Ok(None);
        }
        if !is_redirect(response.status()) {
            return Ok(None);
        }
        let Some(location) = response.first_header(&LOCATION) else {
            return Ok(None);
        };

        let next = request
            .url()
            .join(location)
            .map_err(|_| NetError::InvalidRedirect)?;
        match next.scheme() {
            "http" | "https" => Ok(Some(next)),
            _ => Err(NetError::InvalidRedirect),
        }
    }
}

fn is_redirect(status: StatusCode) -> bool {
    matches!(status.as_u16(), 301 | 302 | 303 | 307 | 308)
}
