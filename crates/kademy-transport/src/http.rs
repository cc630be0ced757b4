//! HTTP [`Backend`] implementation using `reqwest`.

use std::time::Duration;

use url::Url;

use crate::{ApiRequest, ApiResponse, Backend, Method, TransportError};

/// A [`Backend`] that talks JSON over HTTP(S) to a base URL.
///
/// Cloning is cheap: `reqwest::Client` is an `Arc` around a connection
/// pool, so clones share connections.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: Url,
    timeout: Option<Duration>,
}

impl HttpBackend {
    /// Creates a backend for the given base URL with no request timeout.
    pub fn new(base_url: Url) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| TransportError::Client(e.to_string()))?;
        Ok(Self {
            client,
            base_url,
            timeout: None,
        })
    }

    /// Applies a timeout to every request.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// The base URL request paths are appended to.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Appends `path` to the base URL.
    ///
    /// This is a textual append rather than `Url::join`, so a base URL
    /// with a path prefix (`https://host/backend`) keeps its prefix.
    pub fn url_for(&self, path: &str) -> Result<Url, TransportError> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let joined = if path.starts_with('/') {
            format!("{base}{path}")
        } else {
            format!("{base}/{path}")
        };
        Url::parse(&joined).map_err(TransportError::InvalidUrl)
    }
}

fn to_reqwest(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Patch => reqwest::Method::PATCH,
        Method::Delete => reqwest::Method::DELETE,
    }
}

fn map_reqwest(e: reqwest::Error) -> TransportError {
    if e.is_timeout() {
        TransportError::Timeout
    } else {
        TransportError::Network(e)
    }
}

impl Backend for HttpBackend {
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        let url = self.url_for(&request.path)?;
        let method = request.method;

        let mut builder = self
            .client
            .request(to_reqwest(method), url)
            .header("Accept", "application/json");
        for (name, value) in request.headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder.send().await.map_err(map_reqwest)?;
        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(map_reqwest)?.to_vec();

        tracing::debug!(%method, path = %request.path, status, "backend responded");
        Ok(ApiResponse { status, body })
    }
}
