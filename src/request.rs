//! Incoming HTTP request, normalized for dispatch.
//!
//! Normalization is O(1) in payload size: the target is split into a
//! pathname and a decoded query map, the param and body slots start empty,
//! and the transport body stays unread until a body-parsing middleware asks
//! for it. The matcher fills `params`;
//! [`json_body`](crate::middleware::json_body) fills `body`.

use std::collections::HashMap;

use bytes::Bytes;
use http_body_util::BodyExt;
use serde_json::Value;
use url::form_urlencoded;

use crate::error::Error;

/// An incoming HTTP request.
pub struct Request {
    pub(crate) method: http::Method,
    pub(crate) pathname: String,
    pub(crate) query: HashMap<String, Vec<String>>,
    pub(crate) headers: http::HeaderMap,
    pub(crate) params: HashMap<String, String>,
    pub(crate) body: Value,
    raw_body: RawBody,
}

/// Transport body state: unread, or collected into memory.
enum RawBody {
    Pending(hyper::body::Incoming),
    Buffered(Bytes),
}

impl Request {
    pub(crate) fn from_hyper(req: hyper::Request<hyper::body::Incoming>) -> Self {
        let (parts, body) = req.into_parts();
        let pathname = parts.uri.path().to_owned();
        let query = parse_query(parts.uri.query());
        Self {
            method: parts.method,
            pathname,
            query,
            headers: parts.headers,
            params: HashMap::new(),
            body: Value::Object(serde_json::Map::new()),
            raw_body: RawBody::Pending(body),
        }
    }

    /// The wire-level method, untouched — including methods the route table
    /// does not dispatch.
    pub fn method(&self) -> &http::Method {
        &self.method
    }

    /// The path component of the request target, exactly as received.
    pub fn pathname(&self) -> &str {
        &self.pathname
    }

    /// First value of a query parameter.
    ///
    /// For `?tag=a&tag=b`, `req.query("tag")` returns `Some("a")`; use
    /// [`query_all`](Request::query_all) for the rest.
    pub fn query(&self, name: &str) -> Option<&str> {
        self.query
            .get(name)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    /// Every value of a query parameter, in the order they appeared.
    pub fn query_all(&self, name: &str) -> &[String] {
        self.query.get(name).map_or(&[], |values| values.as_slice())
    }

    /// Header lookup; returns `None` for absent or non-UTF-8 values.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    /// Returns a named path parameter bound by the matcher.
    ///
    /// For a route `/products/:slug`, `req.param("slug")` on
    /// `/products/notebook` returns `Some("notebook")`.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    /// The parsed body slot. Empty object until a body-parsing middleware
    /// populates it.
    pub fn body(&self) -> &Value {
        &self.body
    }

    /// Replaces the parsed body slot. Meant for body-parsing middleware.
    pub fn set_body(&mut self, body: Value) {
        self.body = body;
    }

    /// Collects the transport body into memory.
    ///
    /// The first call drains the connection; the bytes are kept so repeated
    /// calls return the same payload without touching the transport again.
    pub async fn read_body(&mut self) -> Result<Bytes, Error> {
        match std::mem::replace(&mut self.raw_body, RawBody::Buffered(Bytes::new())) {
            RawBody::Pending(incoming) => {
                let bytes = incoming.collect().await?.to_bytes();
                self.raw_body = RawBody::Buffered(bytes.clone());
                Ok(bytes)
            }
            RawBody::Buffered(bytes) => {
                self.raw_body = RawBody::Buffered(bytes.clone());
                Ok(bytes)
            }
        }
    }
}

fn parse_query(raw: Option<&str>) -> HashMap<String, Vec<String>> {
    let mut query: HashMap<String, Vec<String>> = HashMap::new();
    for (name, value) in form_urlencoded::parse(raw.unwrap_or("").as_bytes()) {
        query.entry(name.into_owned()).or_default().push(value.into_owned());
    }
    query
}

#[cfg(test)]
impl Request {
    /// Builds a request without a transport, for pipeline tests.
    pub(crate) fn test(method: http::Method, target: &str) -> Self {
        let (pathname, raw_query) = match target.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (target, None),
        };
        Self {
            method,
            pathname: pathname.to_owned(),
            query: parse_query(raw_query),
            headers: http::HeaderMap::new(),
            params: HashMap::new(),
            body: Value::Object(serde_json::Map::new()),
            raw_body: RawBody::Buffered(Bytes::new()),
        }
    }

    pub(crate) fn test_with_body(
        method: http::Method,
        target: &str,
        content_type: &str,
        body: &[u8],
    ) -> Self {
        let mut req = Self::test(method, target);
        req.headers.insert(
            http::header::CONTENT_TYPE,
            content_type.parse().expect("valid content type"),
        );
        req.raw_body = RawBody::Buffered(Bytes::copy_from_slice(body));
        req
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_target_into_pathname_and_query() {
        let req = Request::test(http::Method::GET, "/products?color=blue&size=xl");
        assert_eq!(req.pathname(), "/products");
        assert_eq!(req.query("color"), Some("blue"));
        assert_eq!(req.query("size"), Some("xl"));
        assert_eq!(req.query("missing"), None);
    }

    #[test]
    fn query_keeps_repeated_values() {
        let req = Request::test(http::Method::GET, "/search?tag=a&tag=b&tag=c");
        assert_eq!(req.query("tag"), Some("a"));
        assert_eq!(req.query_all("tag"), ["a", "b", "c"]);
        assert!(req.query_all("other").is_empty());
    }

    #[test]
    fn query_values_are_percent_decoded() {
        let req = Request::test(http::Method::GET, "/search?q=caf%C3%A9+au+lait");
        assert_eq!(req.query("q"), Some("café au lait"));
    }

    #[test]
    fn pathname_is_kept_verbatim() {
        let req = Request::test(http::Method::GET, "/files/a%20b");
        assert_eq!(req.pathname(), "/files/a%20b");
    }

    #[test]
    fn slots_start_empty() {
        let req = Request::test(http::Method::POST, "/anything");
        assert_eq!(req.body(), &serde_json::json!({}));
        assert_eq!(req.param("id"), None);
    }

    #[tokio::test]
    async fn read_body_is_repeatable() {
        let mut req = Request::test_with_body(
            http::Method::POST,
            "/products",
            "application/json",
            br#"{"name":"notebook"}"#,
        );
        let first = req.read_body().await.unwrap();
        let second = req.read_body().await.unwrap();
        assert_eq!(first, second);
        assert_eq!(&first[..], br#"{"name":"notebook"}"#);
    }
}
