//! Request authentication: attaching the bearer token.
//!
//! There is no client-wide default header. Every request is passed
//! through [`authorize`] together with the credentials that are current
//! *at dispatch time*, and gets back a request with exactly the right
//! `Authorization` header (or none).

use kademy_store::CredentialPair;
use kademy_transport::ApiRequest;

/// Name of the header carrying the bearer token.
pub const AUTHORIZATION: &str = "Authorization";

/// Returns `request` authenticated with `credentials`.
///
/// - With a pair: exactly one `Authorization: Bearer <access>` header,
///   replacing whatever the caller set.
/// - Without a pair: any `Authorization` header is removed, so an
///   anonymous client never sends one.
///
/// # Example
///
/// ```rust
/// use kademy_session::authorize;
/// use kademy_store::CredentialPair;
/// use kademy_transport::ApiRequest;
///
/// let pair = CredentialPair::new("abc", "def");
/// let request = authorize(ApiRequest::get("/api/v1/books/"), Some(&pair));
/// assert_eq!(request.header("authorization"), Some("Bearer abc"));
///
/// let anonymous = authorize(request, None);
/// assert_eq!(anonymous.header("authorization"), None);
/// ```
pub fn authorize(request: ApiRequest, credentials: Option<&CredentialPair>) -> ApiRequest {
    match credentials {
        Some(pair) => request.with_header(AUTHORIZATION, pair.bearer()),
        None => request.without_header(AUTHORIZATION),
    }
}
