/// Errors that can occur in the transport layer.
///
/// Every variant means "no usable HTTP response arrived". A response with
/// any status code, 401 and 500 included, is a transport *success*; the
/// layers above decide what the status means.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The request path couldn't be joined onto the base URL.
    #[cfg(feature = "http")]
    #[error("invalid request URL: {0}")]
    InvalidUrl(#[source] url::ParseError),

    /// The request didn't complete within the configured timeout.
    #[error("request timed out")]
    Timeout,

    /// The request never produced a response (DNS, refused, reset, TLS).
    #[cfg(feature = "http")]
    #[error("network error: {0}")]
    Network(#[source] reqwest::Error),

    /// The HTTP client itself couldn't be built or used.
    #[error("client error: {0}")]
    Client(String),
}
