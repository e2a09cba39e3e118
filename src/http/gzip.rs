//! Lazy gzip decoding of a response body.
//!
//! Frames are pushed through a streaming decoder as they arrive, so nothing
//! is decompressed until the body is polled. The decoded length cannot be
//! known up front and the size hint is left unbounded. Concatenated gzip
//! members decode as one stream, and an empty entity decodes to nothing.

use crate::base::error::BoxError;
use bytes::Bytes;
use flate2::write::MultiGzDecoder;
use http_body::{Body, Frame, SizeHint};
use std::io::Write;
use std::pin::Pin;
use std::task::{ready, Context, Poll};

/// Does a `Content-Encoding` value list `gzip` among its elements?
pub fn declares_gzip(content_encoding: &str) -> bool {
    content_encoding
        .split(',')
        .any(|element| element.trim().eq_ignore_ascii_case("gzip"))
}

/// Body wrapper that gunzips the wrapped byte stream on demand.
pub struct GzipDecodingEntity<B> {
    inner: B,
    decoder: Option<MultiGzDecoder<Vec<u8>>>,
    seen_input: bool,
}

impl<B> GzipDecodingEntity<B> {
    pub fn new(inner: B) -> Self {
        Self {
            inner,
            decoder: Some(MultiGzDecoder::new(Vec::new())),
            seen_input: false,
        }
    }

    /// Always `None`: the decompressed length is unknown until the stream
    /// has been consumed.
    pub fn content_length(&self) -> Option<u64> {
        None
    }

    pub fn into_inner(self) -> B {
        self.inner
    }
}

impl<B> Body for GzipDecodingEntity<B>
where
    B: Body<Data = Bytes> + Unpin,
    B::Error: Into<BoxError>,
{
    type Data = Bytes;
    type Error = BoxError;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = self.get_mut();
        loop {
            if this.decoder.is_none() {
                return Poll::Ready(None);
            }

            match ready!(Pin::new(&mut this.inner).poll_frame(cx)) {
                Some(Ok(frame)) => {
                    let data = match frame.into_data() {
                        Ok(data) => data,
                        // Trailers carry no payload to decode.
                        Err(frame) => return Poll::Ready(Some(Ok(frame))),
                    };
                    let Some(decoder) = this.decoder.as_mut() else {
                        return Poll::Ready(None);
                    };
                    if data.is_empty() {
                        continue;
                    }
                    this.seen_input = true;
                    if let Err(e) = decoder.write_all(&data) {
                        this.decoder = None;
                        return Poll::Ready(Some(Err(e.into())));
                    }
                    let out = std::mem::take(decoder.get_mut());
                    if !out.is_empty() {
                        return Poll::Ready(Some(Ok(Frame::data(Bytes::from(out)))));
                    }
                }
                Some(Err(e)) => {
                    this.decoder = None;
                    return Poll::Ready(Some(Err(e.into())));
                }
                None => {
                    let Some(decoder) = this.decoder.take() else {
                        return Poll::Ready(None);
                    };
                    if !this.seen_input {
                        return Poll::Ready(None);
                    }
                    return match decoder.finish() {
                        Ok(rest) if rest.is_empty() => Poll::Ready(None),
                        Ok(rest) => Poll::Ready(Some(Ok(Frame::data(Bytes::from(rest))))),
                        Err(e) => Poll::Ready(Some(Err(e.into()))),
                    };
                }
            }
        }
    }

    fn is_end_stream(&self) -> bool {
        self.decoder.is_none()
    }

    fn size_hint(&self) -> SizeHint {
        SizeHint::default()
    }
}
