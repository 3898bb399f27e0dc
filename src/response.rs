//! Outgoing HTTP response type and the [`IntoResponse`] conversion trait.
//!
//! A handler builds exactly one [`Response`] and returns it; the server
//! converts it to the wire type once, at the edge. There is no way to
//! complete a response twice.

use bytes::Bytes;
use http::StatusCode;
use http_body_util::Full;
use serde::Serialize;
use tracing::error;

const JSON: &str = "application/json";
const PROBLEM_JSON: &str = "application/problem+json";
const TEXT: &str = "text/plain; charset=utf-8";

/// The error wire shape: `{"status": <int>, "title": <string>}`.
#[derive(Serialize)]
struct Problem<'a> {
    status: u16,
    title: &'a str,
}

/// An outgoing HTTP response.
///
/// ```rust
/// use switchboard::{Response, StatusCode};
///
/// Response::json(&serde_json::json!({ "id": 1 }));
/// Response::json(&serde_json::json!({ "id": 42 })).with_status(StatusCode::CREATED);
/// Response::status(StatusCode::NO_CONTENT);
/// ```
pub struct Response {
    pub(crate) status: StatusCode,
    pub(crate) headers: Vec<(String, String)>,
    pub(crate) body: Vec<u8>,
}

impl Response {
    /// Serializes `value` and completes the response as `application/json`
    /// with status 200. Chain [`with_status`](Response::with_status) for
    /// anything else.
    ///
    /// If serialization fails the response completes as a fixed 500 with a
    /// plain-text body instead; the failure is logged here and never
    /// re-enters the pipeline — by that point the response is the only
    /// thing left to send.
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Self {
        match serde_json::to_vec(value) {
            Ok(body) => Self::raw(StatusCode::OK, JSON, body),
            Err(e) => {
                error!("response serialization failed: {e}");
                Self::raw(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    TEXT,
                    b"failed to encode response".to_vec(),
                )
            }
        }
    }

    /// `text/plain; charset=utf-8` with status 200.
    pub fn text(body: impl Into<String>) -> Self {
        Self::raw(StatusCode::OK, TEXT, body.into().into_bytes())
    }

    /// Response with the given status and no body.
    pub fn status(code: StatusCode) -> Self {
        Self { status: code, headers: Vec::new(), body: Vec::new() }
    }

    /// Sets the status line, returns self for chaining.
    pub fn with_status(mut self, code: StatusCode) -> Self {
        self.status = code;
        self
    }

    /// Appends a header, returns self for chaining.
    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_owned(), value.to_owned()));
        self
    }

    /// The structured error response: `application/problem+json` carrying
    /// the status twice — on the status line and in the body.
    pub(crate) fn problem(status: StatusCode, title: &str) -> Self {
        let problem = Problem { status: status.as_u16(), title };
        match serde_json::to_vec(&problem) {
            Ok(body) => Self::raw(status, PROBLEM_JSON, body),
            Err(e) => {
                error!("problem body serialization failed: {e}");
                Self::raw(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    TEXT,
                    b"failed to encode response".to_vec(),
                )
            }
        }
    }

    fn raw(status: StatusCode, content_type: &str, body: Vec<u8>) -> Self {
        Self {
            status,
            headers: vec![("content-type".to_owned(), content_type.to_owned())],
            body,
        }
    }

    /// One-shot conversion to the wire type, consumed by the server edge.
    pub(crate) fn into_hyper(self) -> http::Response<Full<Bytes>> {
        let mut builder = http::Response::builder().status(self.status);
        for (name, value) in &self.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        builder
            .body(Full::new(Bytes::from(self.body)))
            .unwrap_or_else(|e| {
                error!("response build failed: {e}");
                let mut fallback = http::Response::new(Full::new(Bytes::new()));
                *fallback.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
                fallback
            })
    }
}

// ── IntoResponse ──────────────────────────────────────────────────────────────

/// Conversion into an HTTP [`Response`].
///
/// Handlers return `Result<impl IntoResponse, Error>`; these impls let the
/// common cases skip the explicit `Response` constructors.
pub trait IntoResponse {
    fn into_response(self) -> Response;
}

impl IntoResponse for Response {
    fn into_response(self) -> Response {
        self
    }
}

impl IntoResponse for &'static str {
    fn into_response(self) -> Response {
        Response::text(self)
    }
}

impl IntoResponse for String {
    fn into_response(self) -> Response {
        Response::text(self)
    }
}

/// Return a bare status from a handler: `Ok(StatusCode::NO_CONTENT)`.
impl IntoResponse for StatusCode {
    fn into_response(self) -> Response {
        Response::status(self)
    }
}

impl IntoResponse for serde_json::Value {
    fn into_response(self) -> Response {
        Response::json(&self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serializer;

    fn content_type(res: &Response) -> Option<&str> {
        res.headers
            .iter()
            .find(|(name, _)| name == "content-type")
            .map(|(_, value)| value.as_str())
    }

    #[test]
    fn json_serializes_and_sets_content_type() {
        let res = Response::json(&serde_json::json!({ "id": 1 }));
        assert_eq!(res.status, StatusCode::OK);
        assert_eq!(content_type(&res), Some(JSON));
        assert_eq!(res.body, br#"{"id":1}"#);
    }

    #[test]
    fn with_status_chains() {
        let res = Response::json(&serde_json::json!({})).with_status(StatusCode::CREATED);
        assert_eq!(res.status, StatusCode::CREATED);
        assert_eq!(content_type(&res), Some(JSON));
    }

    #[test]
    fn problem_carries_status_in_body_and_status_line() {
        let res = Response::problem(StatusCode::NOT_FOUND, "route not found");
        assert_eq!(res.status, StatusCode::NOT_FOUND);
        assert_eq!(content_type(&res), Some(PROBLEM_JSON));
        let body: serde_json::Value = serde_json::from_slice(&res.body).unwrap();
        assert_eq!(body, serde_json::json!({ "status": 404, "title": "route not found" }));
    }

    struct Unserializable;

    impl Serialize for Unserializable {
        fn serialize<S: Serializer>(&self, _: S) -> Result<S::Ok, S::Error> {
            Err(serde::ser::Error::custom("refused"))
        }
    }

    #[test]
    fn serialization_failure_degrades_to_plain_500() {
        let res = Response::json(&Unserializable);
        assert_eq!(res.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(content_type(&res), Some(TEXT));
        assert_eq!(res.body, b"failed to encode response");
    }

    #[test]
    fn into_hyper_keeps_status_and_headers() {
        let wire = Response::json(&serde_json::json!({ "ok": true }))
            .with_status(StatusCode::ACCEPTED)
            .header("x-request-id", "abc")
            .into_hyper();
        assert_eq!(wire.status(), StatusCode::ACCEPTED);
        assert_eq!(wire.headers().get("content-type").unwrap(), JSON);
        assert_eq!(wire.headers().get("x-request-id").unwrap(), "abc");
    }

    #[test]
    fn status_only_response_has_no_body() {
        let res = Response::status(StatusCode::NO_CONTENT);
        assert!(res.body.is_empty());
        assert!(res.headers.is_empty());
    }
}
