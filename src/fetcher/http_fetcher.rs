use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_ENCODING, IF_NONE_MATCH, USER_AGENT as USER_AGENT_HEADER};
use reqwest::{Client, StatusCode};
use tracing::{debug, trace, warn};
use url::Url;

use crate::app::{FetchError, Result};
use crate::config::HttpConfig;
use crate::fetcher::{ETagContent, ResourceFetcher, Response, USER_AGENT};
use crate::retry::{wait_until, RetryPolicy};
use crate::timeout::{CancelAgent, CancelEvent, Timeout};

const FALLBACK_LOG_NAME: &str = "resource from URL";

/// Build the shared client. Compressed bodies are always decoded before
/// they reach callers. The client negotiates gzip and brotli on every request;
/// the E-Tag path narrows that to an explicit `Accept-Encoding: gzip`.
pub fn build_client(config: &HttpConfig) -> Result<Client> {
    let client = Client::builder()
        .connect_timeout(config.connect_timeout())
        .gzip(true)
        .brotli(true)
        .user_agent(config.user_agent())
        .build()?;

    Ok(client)
}

/// Options for a single [`HttpResourceFetcher`].
#[derive(Debug, Clone)]
pub struct FetcherOptions {
    /// Whether log lines may contain the URL itself
    pub show_url: bool,
    /// Replaces the URL in log lines when `show_url` is false
    pub friendly_name: Option<String>,
    /// Token whose cancellation aborts the in-flight request
    pub timeout: Option<Timeout>,
    /// Return request failures from `get()` instead of `Ok(None)`
    pub throw_on_error: bool,
    pub retry: RetryPolicy,
}

impl FetcherOptions {
    pub fn new(show_url: bool) -> Self {
        Self {
            show_url,
            friendly_name: None,
            timeout: None,
            throw_on_error: false,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_friendly_name(mut self, name: impl Into<String>) -> Self {
        self.friendly_name = Some(name.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Timeout) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_throw_on_error(mut self, throw_on_error: bool) -> Self {
        self.throw_on_error = throw_on_error;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

/// Per-attempt request header hints.
#[derive(Debug, Clone, Copy, Default)]
struct RequestHeaders<'a> {
    etag: Option<&'a str>,
    gzip: bool,
}

/// Downloads a single URL with retries, cancellation and E-Tag support.
#[derive(Debug, Clone)]
pub struct HttpResourceFetcher {
    url: Url,
    options: FetcherOptions,
    client: Client,
    user_agent: String,
}

impl HttpResourceFetcher {
    pub fn new(url: &str, options: FetcherOptions) -> Result<Self> {
        let client = build_client(&HttpConfig::default())?;
        Self::with_client(client, url, options)
    }

    pub fn with_client(client: Client, url: &str, options: FetcherOptions) -> Result<Self> {
        if url.trim().is_empty() {
            return Err(FetchError::EmptyUrl);
        }
        let url = Url::parse(url)?;

        Ok(Self {
            url,
            options,
            client,
            user_agent: USER_AGENT.to_string(),
        })
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    pub fn options(&self) -> &FetcherOptions {
        &self.options
    }

    /// The response, or `Ok(None)` on failure unless `throw_on_error` is set.
    pub async fn get(&self) -> Result<Option<Response>> {
        match self.try_get().await {
            Ok(response) => Ok(Some(response)),
            Err(e) if self.options.throw_on_error => Err(e),
            Err(_) => Ok(None),
        }
    }

    /// Like [`get`](Self::get) but always returns the failure.
    pub async fn try_get(&self) -> Result<Response> {
        debug!("downloading: {}", self.log_text());

        match self.get_response(RequestHeaders::default()).await {
            Ok(response) => {
                debug!("downloaded: {}", self.log_text());
                Ok(response)
            }
            Err(e) => {
                debug!("Error downloading {}: {}", self.log_text(), e.reason());
                Err(e)
            }
        }
    }

    /// Conditionally download the resource using `etag`.
    ///
    /// `content` is `None` when the server reports the E-Tag still matches.
    /// Failures are always returned, regardless of `throw_on_error`.
    pub async fn get_new_etag_content(&self, etag: Option<&str>) -> Result<ETagContent> {
        let response = self
            .get_response(RequestHeaders { etag, gzip: true })
            .await?;

        let new_etag = response
            .header("etag")
            .filter(|v| !v.is_empty())
            .map(String::from)
            .ok_or_else(|| FetchError::UnsupportedETag {
                url: self.url.to_string(),
            })?;

        if response.status() == StatusCode::NOT_MODIFIED {
            debug!(
                "E-Tag matched ({}). Download skipped: {}",
                new_etag,
                self.log_text()
            );
            return Ok(ETagContent {
                content: None,
                etag: new_etag,
            });
        }

        let content = response.text().await?;
        debug!("E-Tag not matched. Downloaded: {}", self.log_text());

        Ok(ETagContent {
            content: Some(content),
            etag: new_etag,
        })
    }

    fn log_text(&self) -> &str {
        if self.options.show_url {
            self.url.as_str()
        } else {
            self.options
                .friendly_name
                .as_deref()
                .unwrap_or(FALLBACK_LOG_NAME)
        }
    }

    fn log_cancellation(&self, event: CancelEvent) {
        let outcome = match event.agent {
            CancelAgent::User => "cancelled",
            CancelAgent::Timer => "timed out",
        };
        trace!("Download for \"{}\" {}", self.log_text(), outcome);
    }

    async fn get_response(&self, headers: RequestHeaders<'_>) -> Result<Response> {
        wait_until(
            move || self.attempt(headers),
            &self.options.retry,
            |e: &FetchError| !e.is_user_cancelled(),
        )
        .await
    }

    /// One GET. A configured timeout token is watched only for the duration
    /// of this attempt; the subscription is dropped on every exit path.
    async fn attempt(&self, headers: RequestHeaders<'_>) -> Result<Response> {
        let request = self
            .client
            .get(self.url.clone())
            .headers(self.build_request_headers(headers))
            .send();

        let Some(timeout) = &self.options.timeout else {
            return settle(request.await?);
        };

        // Already cancelled: issue nothing.
        if let Some(event) = timeout.cancel_event() {
            self.log_cancellation(event);
            return Err(FetchError::Cancelled(event.agent));
        }

        let mut subscription = timeout.subscribe();
        tokio::select! {
            biased;
            event = subscription.cancelled() => {
                self.log_cancellation(event);
                Err(FetchError::Cancelled(event.agent))
            }
            response = request => settle(response?),
        }
    }

    fn build_request_headers(&self, request_headers: RequestHeaders<'_>) -> HeaderMap {
        let mut headers = HeaderMap::new();

        match HeaderValue::from_str(&self.user_agent) {
            Ok(value) => {
                headers.insert(USER_AGENT_HEADER, value);
            }
            Err(_) => warn!("Ignoring invalid User-Agent: {}", self.user_agent),
        }

        if let Some(etag) = request_headers.etag {
            match HeaderValue::from_str(etag) {
                Ok(value) => {
                    headers.insert(IF_NONE_MATCH, value);
                }
                Err(_) => warn!("Ignoring invalid E-Tag: {}", etag),
            }
        }

        if request_headers.gzip {
            headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("gzip"));
        }

        headers
    }
}

/// 2xx and 304 are responses; every other status is a failed attempt.
fn settle(response: reqwest::Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() || status == StatusCode::NOT_MODIFIED {
        Ok(Response::new(response))
    } else {
        Err(FetchError::Status { status })
    }
}

#[async_trait]
impl ResourceFetcher for HttpResourceFetcher {
    type Output = Response;

    async fn get(&self) -> Result<Option<Response>> {
        HttpResourceFetcher::get(self).await
    }
}
