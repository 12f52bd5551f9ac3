pub mod file_fetcher;
pub mod http_fetcher;
pub mod json;

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;

use crate::app::Result;

/// Identifies this tool in the `User-Agent` header of every request.
pub const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Result of a conditional (E-Tag) download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ETagContent {
    /// New content, or `None` when the server answered 304 Not Modified and
    /// the caller's cached copy is still current
    pub content: Option<String>,
    /// E-Tag of the latest content on the server
    pub etag: String,
}

impl ETagContent {
    pub fn is_modified(&self) -> bool {
        self.content.is_some()
    }
}

/// A settled HTTP response. The body is read lazily.
#[derive(Debug)]
pub struct Response {
    inner: reqwest::Response,
}

impl Response {
    pub(crate) fn new(inner: reqwest::Response) -> Self {
        Self { inner }
    }

    pub fn status(&self) -> StatusCode {
        self.inner.status()
    }

    pub fn headers(&self) -> &HeaderMap {
        self.inner.headers()
    }

    /// Header value by case-insensitive name, if present and valid text.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.inner.headers().get(name).and_then(|v| v.to_str().ok())
    }

    /// Read the (already decompressed) body as text.
    pub async fn text(self) -> Result<String> {
        Ok(self.inner.text().await?)
    }

    pub async fn json<T: DeserializeOwned>(self) -> Result<T> {
        let text = self.text().await?;
        Ok(serde_json::from_str(&text)?)
    }
}

/// Something that can produce a resource on demand.
#[async_trait]
pub trait ResourceFetcher {
    type Output;

    /// The resource, or `None` if it could not be retrieved and the fetcher
    /// is configured to swallow failures.
    async fn get(&self) -> Result<Option<Self::Output>>;
}
