//! Shared fixtures: a scripted in-memory transport and instrumented bodies.

#![allow(dead_code)]

use bytes::Bytes;
use condnet::http::{ExchangeContext, HttpResponse, OutgoingRequest, ResponseBody, Transport};
use condnet::NetError;
use flate2::write::GzEncoder;
use flate2::Compression;
use futures::future::BoxFuture;
use http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use http_body::{Body, Frame};
use std::collections::VecDeque;
use std::convert::Infallible;
use std::io::Write;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

/// One scripted response.
pub struct Reply {
    status: StatusCode,
    headers: HeaderMap,
    entity: Option<ResponseBody>,
}

impl Reply {
    pub fn status(status: u16) -> Self {
        Self {
            status: StatusCode::from_u16(status).unwrap(),
            headers: HeaderMap::new(),
            entity: None,
        }
    }

    pub fn header(mut self, name: &'static str, value: &str) -> Self {
        self.headers.append(
            HeaderName::from_static(name),
            HeaderValue::from_str(value).unwrap(),
        );
        self
    }

    pub fn text(mut self, body: &str) -> Self {
        self.entity = Some(ResponseBody::from_text(body.to_string()));
        self
    }

    pub fn gzip(self, body: &str) -> Self {
        let mut reply = self.header("content-encoding", "gzip");
        reply.entity = Some(ResponseBody::from_bytes(gzip(body.as_bytes())));
        reply
    }

    pub fn entity(mut self, entity: ResponseBody) -> Self {
        self.entity = Some(entity);
        self
    }
}

/// What the transport saw for one exchange.
#[derive(Debug, Clone)]
pub struct Seen {
    pub method: http::Method,
    pub url: String,
    pub headers: HeaderMap,
}

#[derive(Default)]
struct Inner {
    replies: Mutex<VecDeque<Reply>>,
    seen: Mutex<Vec<Seen>>,
}

/// Transport that answers from a queue and records every request.
#[derive(Clone, Default)]
pub struct FakeTransport {
    inner: Arc<Inner>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, reply: Reply) {
        self.inner.replies.lock().unwrap().push_back(reply);
    }

    pub fn seen(&self) -> Vec<Seen> {
        self.inner.seen.lock().unwrap().clone()
    }

    pub fn last(&self) -> Seen {
        self.seen().last().cloned().expect("no request seen")
    }
}

impl Transport for FakeTransport {
    fn execute<'a>(
        &'a self,
        request: OutgoingRequest,
    ) -> BoxFuture<'a, Result<HttpResponse, NetError>> {
        Box::pin(async move {
            self.inner.seen.lock().unwrap().push(Seen {
                method: request.method().into(),
                url: request.url().to_string(),
                headers: request.headers().clone(),
            });
            let reply = self
                .inner
                .replies
                .lock()
                .unwrap()
                .pop_front()
                .ok_or(NetError::ConnectionClosed)?;

            let mut resp = HttpResponse::new(reply.status)
                .with_context(ExchangeContext::for_request(&request));
            *resp.headers_mut() = reply.headers;
            resp.set_entity(reply.entity);
            Ok(resp)
        })
    }
}

pub fn gzip(data: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

/// Body that counts frames handed out and drops.
pub struct CountingBody {
    chunks: VecDeque<Bytes>,
    pub frames: Arc<AtomicUsize>,
    pub drops: Arc<AtomicUsize>,
}

impl CountingBody {
    pub fn new(chunks: &[&'static str]) -> Self {
        Self {
            chunks: chunks.iter().map(|c| Bytes::from_static(c.as_bytes())).collect(),
            frames: Arc::new(AtomicUsize::new(0)),
            drops: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl Body for CountingBody {
    type Data = Bytes;
    type Error = Infallible;

    fn poll_frame(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Bytes>, Infallible>>> {
        match self.chunks.pop_front() {
            Some(chunk) => {
                self.frames.fetch_add(1, Ordering::SeqCst);
                Poll::Ready(Some(Ok(Frame::data(chunk))))
            }
            None => Poll::Ready(None),
        }
    }
}

impl Drop for CountingBody {
    fn drop(&mut self) {
        self.drops.fetch_add(1, Ordering::SeqCst);
    }
}
