//! The seam between the transaction and the network.
//!
//! A [`Transport`] sends one resolved request and returns the response head
//! with a streaming entity. It must attach an
//! [`ExchangeContext`](crate::http::cachekey::ExchangeContext) so response
//! interceptors can recover the request key.

use crate::base::neterror::NetError;
use crate::http::cachekey::ExchangeContext;
use crate::http::request::OutgoingRequest;
use crate::http::response::HttpResponse;
use crate::socket::connectjob::ConnectJob;
use bytes::Bytes;
use futures::future::BoxFuture;
use http_body_util::Full;
use hyper::client::conn::http1;
use hyper_util::rt::TokioIo;
use std::time::Duration;

/// Executes a single HTTP exchange.
pub trait Transport: Send + Sync {
    fn execute<'a>(&'a self, request: OutgoingRequest)
        -> BoxFuture<'a, Result<HttpResponse, NetError>>;
}

/// HTTP/1.1 over a fresh TCP (or TLS) connection per exchange.
#[derive(Debug, Clone, Default)]
pub struct HyperTransport {
    connector: ConnectJob,
    read_timeout: Option<Duration>,
}

impl HyperTransport {
    /// `read_timeout` bounds sending the request and reading the response
    /// head; the entity is streamed afterwards without a deadline.
    pub fn new(connect_timeout: Option<Duration>, read_timeout: Option<Duration>) -> Self {
        Self {
            connector: ConnectJob::new(connect_timeout),
            read_timeout,
        }
    }

    async fn send(&self, request: OutgoingRequest) -> Result<HttpResponse, NetError> {
        let context = ExchangeContext::for_request(&request);
        let socket = self.connector.connect(request.url()).await?;

        let io = TokioIo::new(socket);
        let (mut sender, conn) = http1::handshake::<_, Full<Bytes>>(io)
            .await
            .map_err(|e| {
                tracing::debug!(error = %e, "HTTP/1.1 handshake failed");
                NetError::ConnectionFailed
            })?;

        // The connection driver must run for the response body to stream.
        tokio::spawn(async move {
            if let Err(e) = conn.await {
                tracing::debug!(error = %e, "connection closed with error");
            }
        });

        let url = request.url().clone();
        let req = request.into_hyper()?;
        tracing::debug!(method = %req.method(), url = %url, "sending request");

        let sent = match self.read_timeout {
            Some(limit) => tokio::time::timeout(limit, sender.send_request(req))
                .await
                .map_err(|_| {
                    tracing::debug!(url = %url, ?limit, "response head timed out");
                    NetError::TimedOut
                })?,
            None => sender.send_request(req).await,
        };
        let resp = sent.map_err(|e| {
            tracing::debug!(url = %url, error = %e, "request failed");
            classify_hyper_error(&e)
        })?;

        tracing::debug!(url = %url, status = resp.status().as_u16(), "response head received");
        Ok(HttpResponse::from_hyper(resp, context))
    }
}

impl Transport for HyperTransport {
    fn execute<'a>(
        &'a self,
        request: OutgoingRequest,
    ) -> BoxFuture<'a, Result<HttpResponse, NetError>> {
        Box::pin(self.send(request))
    }
}

fn classify_hyper_error(err: &hyper::Error) -> NetError {
    if err.is_parse() || err.is_parse_status() {
        NetError::InvalidHttpResponse
    } else if err.is_incomplete_message() {
        NetError::EmptyResponse
    } else if err.is_timeout() {
        NetError::TimedOut
    } else if err.is_closed() || err.is_canceled() {
        NetError::ConnectionClosed
    } else {
        NetError::ConnectionFailed
    }
}
