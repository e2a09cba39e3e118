//! Response body streaming.
//! Mirrors Chromium's HttpStream::ReadResponseBody.

use crate::base::error::BoxError;
use crate::base::neterror::NetError;
use crate::http::gzip::GzipDecodingEntity;
use bytes::Bytes;
use http_body::Body;
use http_body_util::combinators::UnsyncBoxBody;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;

/// Response entity: a type-erased byte stream.
///
/// Entities come either straight from the wire or, after the response
/// interceptors ran, from memory.
pub struct ResponseBody {
    inner: UnsyncBoxBody<Bytes, BoxError>,
}

impl std::fmt::Debug for ResponseBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseBody")
            .field("content_length", &self.content_length())
            .finish()
    }
}

impl ResponseBody {
    /// Wrap any body producing `Bytes`.
    pub fn new<B>(body: B) -> Self
    where
        B: Body<Data = Bytes> + Send + 'static,
        B::Error: Into<BoxError>,
    {
        Self {
            inner: body.map_err(Into::<BoxError>::into).boxed_unsync(),
        }
    }

    /// Wrap a hyper body read off the connection.
    pub fn from_incoming(inner: Incoming) -> Self {
        Self::new(inner)
    }

    /// In-memory text entity.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self::new(Full::new(Bytes::from(text.into())))
    }

    /// In-memory byte entity.
    pub fn from_bytes(bytes: impl Into<Bytes>) -> Self {
        Self::new(Full::new(bytes.into()))
    }

    /// Declared length, or `None` when unknown (streamed or decoded bodies).
    pub fn content_length(&self) -> Option<u64> {
        self.inner.size_hint().exact()
    }

    /// Whether the stream is known to be exhausted without polling it.
    pub fn is_end_stream(&self) -> bool {
        self.inner.is_end_stream()
    }

    /// Wrap this body in a lazy gzip decoder.
    pub fn gzip_decoded(self) -> Self {
        Self::new(GzipDecodingEntity::new(self.inner))
    }

    /// Read entire body as bytes.
    pub async fn bytes(self) -> Result<Bytes, NetError> {
        let collected = self.inner.collect().await.map_err(|e| {
            tracing::debug!(error = %e, "response body read failed");
            classify_body_error(&e)
        })?;
        Ok(collected.to_bytes())
    }

    /// Read body as UTF-8 string.
    pub async fn text(self) -> Result<String, NetError> {
        let bytes = self.bytes().await?;
        String::from_utf8(bytes.to_vec()).map_err(|_| NetError::InvalidUtf8)
    }

    /// Read body as UTF-8, replacing invalid sequences with U+FFFD.
    pub async fn text_lossy(self) -> Result<String, NetError> {
        let bytes = self.bytes().await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Read body as JSON, deserializing to type T.
    #[cfg(feature = "json")]
    pub async fn json<T: serde::de::DeserializeOwned>(self) -> Result<T, NetError> {
        let bytes = self.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|_| NetError::JsonParseError)
    }

    /// Drain whatever is left of the stream and drop it.
    pub async fn release(mut self) -> Result<(), NetError> {
        while let Some(frame) = self.inner.frame().await {
            frame.map_err(|e| classify_body_error(&e))?;
        }
        Ok(())
    }

    /// Get the inner body for low-level access.
    pub fn into_inner(self) -> UnsyncBoxBody<Bytes, BoxError> {
        self.inner
    }
}

/// Decoder failures surface as IO errors from flate2; everything else is a
/// plain read failure.
fn classify_body_error(err: &BoxError) -> NetError {
    if err.downcast_ref::<std::io::Error>().is_some() {
        NetError::ContentDecodingFailed
    } else {
        NetError::HttpBodyError
    }
}
