//! Request methods supported by the client.

use crate::base::neterror::NetError;
use std::fmt;
use std::str::FromStr;

/// HTTP method of a [`Request`](crate::http::request::Request).
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum Method {
    Delete,
    Get,
    Head,
    Options,
    Post,
    Put,
    Trace,
}

/// Where a request's parameters are encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamPlacement {
    /// Appended to the URL query string.
    Query,
    /// Sent as an `application/x-www-form-urlencoded` body.
    FormBody,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Delete => "DELETE",
            Method::Get => "GET",
            Method::Head => "HEAD",
            Method::Options => "OPTIONS",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Trace => "TRACE",
        }
    }

    pub fn param_placement(self) -> ParamPlacement {
        match self {
            Method::Delete | Method::Get | Method::Head | Method::Options | Method::Trace => {
                ParamPlacement::Query
            }
            Method::Post | Method::Put => ParamPlacement::FormBody,
        }
    }

    /// Redirects are only followed for methods without side effects.
    pub fn follows_redirects(self) -> bool {
        matches!(self, Method::Get | Method::Head)
    }
}

impl From<Method> for http::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Delete => http::Method::DELETE,
            Method::Get => http::Method::GET,
            Method::Head => http::Method::HEAD,
            Method::Options => http::Method::OPTIONS,
            Method::Post => http::Method::POST,
            Method::Put => http::Method::PUT,
            Method::Trace => http::Method::TRACE,
        }
    }
}

impl TryFrom<&http::Method> for Method {
    type Error = NetError;

    fn try_from(method: &http::Method) -> Result<Self, Self::Error> {
        method.as_str().parse()
    }
}

impl FromStr for Method {
    type Err = NetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "DELETE" => Ok(Method::Delete),
            "GET" => Ok(Method::Get),
            "HEAD" => Ok(Method::Head),
            "OPTIONS" => Ok(Method::Options),
            "POST" => Ok(Method::Post),
            "PUT" => Ok(Method::Put),
            "TRACE" => Ok(Method::Trace),
            _ => Err(NetError::MethodNotSupported),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
