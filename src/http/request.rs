//! Caller-facing requests and their resolved, on-the-wire form.

use crate::base::neterror::NetError;
use crate::http::cachekey::RequestKey;
use crate::http::method::{Method, ParamPlacement};
use crate::http::requestbody::RequestBody;
use bytes::Bytes;
use http::header::{HeaderValue, CONTENT_TYPE, HOST};
use http::HeaderMap;
use http_body_util::Full;
use url::{Position, Url};

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded; charset=UTF-8";

/// A request as the caller describes it: method, URL and ordered parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    method: Method,
    url: String,
    params: Vec<(String, String)>,
}

impl Request {
    pub fn new<U: Into<String>>(method: Method, url: U) -> Self {
        Self {
            method,
            url: url.into(),
            params: Vec::new(),
        }
    }

    pub fn get<U: Into<String>>(url: U) -> Self {
        Self::new(Method::Get, url)
    }

    pub fn post<U: Into<String>>(url: U) -> Self {
        Self::new(Method::Post, url)
    }

    pub fn put<U: Into<String>>(url: U) -> Self {
        Self::new(Method::Put, url)
    }

    pub fn delete<U: Into<String>>(url: U) -> Self {
        Self::new(Method::Delete, url)
    }

    pub fn head<U: Into<String>>(url: U) -> Self {
        Self::new(Method::Head, url)
    }

    /// Append one parameter. Order is preserved on the wire.
    pub fn param<K: Into<String>, V: Into<String>>(mut self, name: K, value: V) -> Self {
        self.params.push((name.into(), value.into()));
        self
    }

    pub fn params<I, K, V>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.params
            .extend(params.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn parameters(&self) -> &[(String, String)] {
        &self.params
    }

    /// Resolve the URL and place the parameters according to the method.
    pub fn to_outgoing(&self) -> Result<OutgoingRequest, NetError> {
        let mut url = Url::parse(&self.url).map_err(|_| NetError::InvalidUrl)?;
        match url.scheme() {
            "http" | "https" => {}
            _ => return Err(NetError::UnknownUrlScheme),
        }

        let mut headers = HeaderMap::new();
        let body = match self.method.param_placement() {
            ParamPlacement::Query => {
                if !self.params.is_empty() {
                    url.query_pairs_mut().extend_pairs(&self.params);
                }
                RequestBody::Empty
            }
            ParamPlacement::FormBody => {
                headers.insert(CONTENT_TYPE, HeaderValue::from_static(FORM_CONTENT_TYPE));
                RequestBody::form(&self.params)
            }
        };

        Ok(OutgoingRequest::new(self.method, url, headers, body))
    }
}

/// A resolved request travelling through the interceptors to the transport.
#[derive(Debug, Clone)]
pub struct OutgoingRequest {
    method: Method,
    url: Url,
    headers: HeaderMap,
    body: RequestBody,
}

impl OutgoingRequest {
    pub fn new(method: Method, url: Url, headers: HeaderMap, body: RequestBody) -> Self {
        Self {
            method,
            url,
            headers,
            body,
        }
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    pub fn body(&self) -> &RequestBody {
        &self.body
    }

    pub fn key(&self) -> RequestKey {
        RequestKey::from_request(self.method, &self.url)
    }

    /// Same request aimed at a redirect target. Bodies are never replayed.
    pub fn redirected(&self, url: Url) -> Self {
        let mut headers = self.headers.clone();
        headers.remove(HOST);
        Self {
            method: self.method,
            url,
            headers,
            body: RequestBody::Empty,
        }
    }

    /// Build the HTTP/1.1 origin-form request hyper sends.
    pub fn into_hyper(self) -> Result<http::Request<Full<Bytes>>, NetError> {
        let host = self.url.host_str().ok_or(NetError::InvalidUrl)?;
        let host_value = match self.url.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        };

        let mut req = http::Request::builder()
            .method(http::Method::from(self.method))
            .uri(&self.url[Position::BeforePath..Position::AfterQuery])
            .body(self.body.into_full())
            .map_err(|_| NetError::InvalidUrl)?;

        *req.headers_mut() = self.headers;
        if !req.headers().contains_key(HOST) {
            let value = HeaderValue::from_str(&host_value).map_err(|_| NetError::InvalidUrl)?;
            req.headers_mut().insert(HOST, value);
        }
        Ok(req)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_params_go_to_query() {
        let out = Request::get("http://example.com/search?lang=en")
            .param("q", "a b")
            .param("page", "2")
            .to_outgoing()
            .unwrap();
        assert_eq!(
            out.url().as_str(),
            "http://example.com/search?lang=en&q=a+b&page=2"
        );
        assert!(out.body().is_empty());
        assert!(!out.headers().contains_key(CONTENT_TYPE));
    }

    #[test]
    fn test_get_without_params_keeps_url() {
        let out = Request::get("http://example.com/feed").to_outgoing().unwrap();
        assert_eq!(out.url().as_str(), "http://example.com/feed");
    }

    #[test]
    fn test_post_params_go_to_body() {
        let out = Request::post("http://example.com/submit")
            .params([("name", "ferris"), ("lang", "rust")])
            .to_outgoing()
            .unwrap();
        assert_eq!(out.url().as_str(), "http://example.com/submit");
        assert_eq!(out.body().len(), "name=ferris&lang=rust".len());
        assert_eq!(
            out.headers().get(CONTENT_TYPE).unwrap(),
            "application/x-www-form-urlencoded; charset=UTF-8"
        );
    }

    #[test]
    fn test_invalid_url() {
        assert_eq!(
            Request::get("not a url").to_outgoing().unwrap_err(),
            NetError::InvalidUrl
        );
        assert_eq!(
            Request::get("ftp://example.com/file").to_outgoing().unwrap_err(),
            NetError::UnknownUrlScheme
        );
    }

    #[test]
    fn test_into_hyper_sets_host_and_origin_form() {
        let out = Request::get("http://127.0.0.1:8080/a?b=c").to_outgoing().unwrap();
        let req = out.into_hyper().unwrap();
        assert_eq!(req.uri(), "/a?b=c");
        assert_eq!(req.headers().get(HOST).unwrap(), "127.0.0.1:8080");
        assert_eq!(req.method(), http::Method::GET);
    }

    #[test]
    fn test_redirected_drops_body() {
        let out = Request::post("http://example.com/a")
            .param("x", "1")
            .to_outgoing()
            .unwrap();
        let next = out.redirected(Url::parse("http://example.com/b").unwrap());
        assert!(next.body().is_empty());
        assert_eq!(next.method(), Method::Post);
    }
}
