//! Request body for POST/PUT operations.

use bytes::Bytes;
use http_body_util::Full;
use url::form_urlencoded;

/// Request body for HTTP methods that send data.
#[derive(Debug, Clone, Default)]
pub enum RequestBody {
    /// No body (GET, HEAD, DELETE, OPTIONS, TRACE).
    #[default]
    Empty,
    /// Body with raw bytes.
    Bytes(Bytes),
}

impl From<String> for RequestBody {
    fn from(s: String) -> Self {
        RequestBody::Bytes(Bytes::from(s))
    }
}

impl From<Vec<u8>> for RequestBody {
    fn from(v: Vec<u8>) -> Self {
        RequestBody::Bytes(Bytes::from(v))
    }
}

impl From<&str> for RequestBody {
    fn from(s: &str) -> Self {
        RequestBody::Bytes(Bytes::from(s.to_owned()))
    }
}

impl From<&[u8]> for RequestBody {
    fn from(s: &[u8]) -> Self {
        RequestBody::Bytes(Bytes::copy_from_slice(s))
    }
}

impl From<Bytes> for RequestBody {
    fn from(b: Bytes) -> Self {
        RequestBody::Bytes(b)
    }
}

impl RequestBody {
    /// Encode ordered name/value pairs as `application/x-www-form-urlencoded`.
    pub fn form<'a, I>(params: I) -> Self
    where
        I: IntoIterator<Item = &'a (String, String)>,
    {
        let encoded = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(params.into_iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .finish();
        RequestBody::from(encoded)
    }

    /// Check if the body is empty.
    pub fn is_empty(&self) -> bool {
        matches!(self, RequestBody::Empty)
    }

    /// Get the length of the body in bytes.
    pub fn len(&self) -> usize {
        match self {
            RequestBody::Empty => 0,
            RequestBody::Bytes(b) => b.len(),
        }
    }

    /// Take the bytes out, leaving `Empty` behind.
    pub fn take_bytes(&mut self) -> Bytes {
        match std::mem::take(self) {
            RequestBody::Empty => Bytes::new(),
            RequestBody::Bytes(b) => b,
        }
    }

    /// Convert into a hyper-compatible body.
    pub fn into_full(self) -> Full<Bytes> {
        match self {
            RequestBody::Empty => Full::new(Bytes::new()),
            RequestBody::Bytes(b) => Full::new(b),
        }
    }
}
