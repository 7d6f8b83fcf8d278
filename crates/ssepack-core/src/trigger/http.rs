//! reqwest-backed transport
//!
//! Resolves paths against an optional base URL, asks for an event stream, and
//! turns non-success statuses into errors. The response body is left unread.

use bytes::Bytes;
use futures::{Stream, TryStreamExt};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, CACHE_CONTROL};
use reqwest::{Client, Response, StatusCode};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

use super::Transport;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("invalid url {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned {status}: {body}")]
    Status { status: StatusCode, body: String },
}

#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: Option<Url>,
    headers: HeaderMap,
}

impl HttpTransport {
    /// Transport with a fresh client; relative paths need `base_url`
    pub fn new(base_url: Option<&str>) -> Result<Self, TransportError> {
        let base_url = base_url
            .map(|raw| {
                Url::parse(raw).map_err(|source| TransportError::InvalidUrl {
                    url: raw.to_string(),
                    source,
                })
            })
            .transpose()?;
        Ok(Self::with_client(Client::new(), base_url))
    }

    pub fn with_client(client: Client, base_url: Option<Url>) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("text/event-stream"));
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
        Self {
            client,
            base_url,
            headers,
        }
    }

    /// Extra header sent with every request
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn base_url(&self) -> Option<&Url> {
        self.base_url.as_ref()
    }

    /// Absolute URL for a path (or an already absolute URL)
    pub fn resolve(&self, url: &str) -> Result<Url, TransportError> {
        let resolved = match &self.base_url {
            Some(base) => base.join(url),
            None => Url::parse(url),
        };
        resolved.map_err(|source| TransportError::InvalidUrl {
            url: url.to_string(),
            source,
        })
    }

    async fn handle_error_response(response: Response) -> Result<Response, TransportError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        warn!(%status, "Stream request rejected");
        Err(TransportError::Status { status, body })
    }
}

#[async_trait::async_trait]
impl Transport for HttpTransport {
    type Response = Response;
    type Error = TransportError;

    async fn get(&self, url: &str) -> Result<Response, TransportError> {
        let url = self.resolve(url)?;
        debug!(%url, "GET");
        let response = self
            .client
            .get(url)
            .headers(self.headers.clone())
            .send()
            .await?;
        Self::handle_error_response(response).await
    }

    async fn post<B>(&self, url: &str, body: Option<&B>) -> Result<Response, TransportError>
    where
        B: Serialize + Send + Sync,
    {
        let url = self.resolve(url)?;
        debug!(%url, "POST");
        let mut request = self.client.post(url).headers(self.headers.clone());
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request.send().await?;
        Self::handle_error_response(response).await
    }
}

/// Response body as chunks, in arrival order
pub fn byte_stream(response: Response) -> impl Stream<Item = Result<Bytes, TransportError>> {
    response.bytes_stream().map_err(TransportError::from)
}
