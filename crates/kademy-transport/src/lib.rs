//! Backend client abstraction for Kademy.
//!
//! Provides the [`Backend`] trait ("send this request, give me the
//! response") plus the plain request/response values that cross it.
//! The session layer is written against the trait, so tests can swap in
//! an in-memory backend that serves fixtures without any networking.
//!
//! # Feature Flags
//!
//! - `http` (default): [`HttpBackend`], a `reqwest` implementation

mod error;
#[cfg(feature = "http")]
mod http;

pub use error::TransportError;
#[cfg(feature = "http")]
pub use http::HttpBackend;

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use serde::de::DeserializeOwned;

/// HTTP method of an [`ApiRequest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    /// The method name as it appears on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An outbound request, relative to the backend's base URL.
///
/// Requests are plain values: they are `Clone` so the same request can be
/// replayed after a token refresh, and headers are an explicit list rather
/// than a client-wide default.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    /// Path relative to the base URL, e.g. `/api/v1/auth/profile/`.
    pub path: String,
    pub headers: Vec<(String, String)>,
    /// JSON body, sent with `Content-Type: application/json`.
    pub body: Option<serde_json::Value>,
}

impl ApiRequest {
    /// Creates a request with no headers and no body.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::Post, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::Put, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::Patch, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path)
    }

    /// Attaches a JSON body.
    pub fn with_json(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Sets a header, replacing any existing header with the same name.
    ///
    /// Header names compare case-insensitively, as in HTTP.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        self.headers.retain(|(n, _)| !n.eq_ignore_ascii_case(&name));
        self.headers.push((name, value.into()));
        self
    }

    /// Removes every header with the given name.
    pub fn without_header(mut self, name: &str) -> Self {
        self.headers.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
        self
    }

    /// Returns the value of the first header with the given name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// A response from the backend: status code plus raw body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// A response whose body is the serialized JSON `value`.
    pub fn json_body(status: u16, value: &serde_json::Value) -> Self {
        Self::new(status, value.to_string())
    }

    /// `true` for any 2xx status.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// `true` for 401: the access token is missing, invalid, or expired.
    pub fn is_unauthorized(&self) -> bool {
        self.status == 401
    }

    /// Decodes the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }

    /// The body as (lossy) UTF-8 text.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Sends requests to the backend.
///
/// Implementations must not interpret status codes: a 401 or 500 is
/// returned as an `Ok(ApiResponse)`. Only the absence of a response is a
/// [`TransportError`].
///
/// The returned future is `Send` because the session manager is shared
/// across Tokio tasks, and a refresh may be awaited on any of them.
pub trait Backend: Send + Sync + 'static {
    /// Executes one request and returns the backend's response.
    fn execute(
        &self,
        request: ApiRequest,
    ) -> impl Future<Output = Result<ApiResponse, TransportError>> + Send;
}

/// Lets a caller keep a handle on a backend (to inspect a test double,
/// or share one connection pool) while a session manager owns another.
impl<B: Backend> Backend for Arc<B> {
    fn execute(
        &self,
        request: ApiRequest,
    ) -> impl Future<Output = Result<ApiResponse, TransportError>> + Send {
        (**self).execute(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_display_uses_wire_names() {
        assert_eq!(Method::Get.to_string(), "GET");
        assert_eq!(Method::Patch.to_string(), "PATCH");
    }

    #[test]
    fn test_with_header_replaces_case_insensitively() {
        let req = ApiRequest::get("/x")
            .with_header("Authorization", "Bearer a")
            .with_header("authorization", "Bearer b");

        assert_eq!(req.headers.len(), 1);
        assert_eq!(req.header("AUTHORIZATION"), Some("Bearer b"));
    }

    #[test]
    fn test_without_header_removes_all_matches() {
        let mut req = ApiRequest::get("/x");
        req.headers.push(("Authorization".into(), "a".into()));
        req.headers.push(("authorization".into(), "b".into()));
        req.headers.push(("Accept".into(), "application/json".into()));

        let req = req.without_header("Authorization");

        assert_eq!(req.header("authorization"), None);
        assert_eq!(req.header("accept"), Some("application/json"));
    }

    #[test]
    fn test_request_constructors_set_method_and_path() {
        let req = ApiRequest::patch("/api/v1/auth/profile/")
            .with_json(serde_json::json!({"bio": "hi"}));
        assert_eq!(req.method, Method::Patch);
        assert_eq!(req.path, "/api/v1/auth/profile/");
        assert_eq!(req.body, Some(serde_json::json!({"bio": "hi"})));
    }

    #[test]
    fn test_response_status_helpers() {
        assert!(ApiResponse::new(200, "").is_success());
        assert!(ApiResponse::new(204, "").is_success());
        assert!(!ApiResponse::new(400, "").is_success());
        assert!(ApiResponse::new(401, "").is_unauthorized());
        assert!(!ApiResponse::new(403, "").is_unauthorized());
    }

    #[test]
    fn test_response_json_decodes_body() {
        let resp = ApiResponse::json_body(200, &serde_json::json!({"access": "a"}));
        let value: serde_json::Value = resp.json().unwrap();
        assert_eq!(value["access"], "a");
    }

    #[test]
    fn test_response_text_is_lossy() {
        let resp = ApiResponse::new(500, vec![b'o', b'k', 0xff]);
        assert!(resp.text().starts_with("ok"));
    }
}
