use reqwest::StatusCode;
use thiserror::Error;

use crate::timeout::CancelAgent;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected HTTP status {status}")]
    Status { status: StatusCode },

    #[error("{}", cancel_message(.0))]
    Cancelled(CancelAgent),

    #[error("This URL does not support E-Tags. Cannot use this function for: {url}")]
    UnsupportedETag { url: String },

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("URL must not be empty")]
    EmptyUrl,

    #[error("Configuration error: {0}")]
    Config(String),
}

fn cancel_message(agent: &CancelAgent) -> &'static str {
    match agent {
        CancelAgent::User => "Request cancelled by user",
        CancelAgent::Timer => "Request timed out",
    }
}

impl FetchError {
    /// Cancellations requested by the user are final and never retried.
    pub fn is_user_cancelled(&self) -> bool {
        matches!(self, FetchError::Cancelled(CancelAgent::User))
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, FetchError::Cancelled(_))
    }

    /// Human readable message, absent for bare status failures.
    pub fn message(&self) -> Option<String> {
        match self {
            FetchError::Status { .. } => None,
            other => Some(other.to_string()),
        }
    }

    /// Short machine code for transport failures.
    pub fn code(&self) -> Option<&'static str> {
        match self {
            FetchError::Http(e) if e.is_timeout() => Some("timeout"),
            FetchError::Http(e) if e.is_connect() => Some("connect"),
            FetchError::Http(e) if e.is_body() => Some("body"),
            FetchError::Http(e) if e.is_decode() => Some("decode"),
            FetchError::Http(e) if e.is_request() => Some("request"),
            FetchError::Cancelled(CancelAgent::User) => Some("cancelled"),
            FetchError::Cancelled(CancelAgent::Timer) => Some("timeout"),
            _ => None,
        }
    }

    /// Response status attached to the failure, if any.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            FetchError::Status { status } => Some(*status),
            FetchError::Http(e) => e.status(),
            _ => None,
        }
    }

    /// Text used when logging a failed download: the message, then the code,
    /// then the status text, then the raw status.
    pub fn reason(&self) -> String {
        self.message()
            .or_else(|| self.code().map(str::to_string))
            .or_else(|| {
                self.status()
                    .and_then(|s| s.canonical_reason())
                    .map(str::to_string)
            })
            .or_else(|| self.status().map(|s| s.as_u16().to_string()))
            .unwrap_or_else(|| format!("{:?}", self))
    }
}

pub type Result<T> = std::result::Result<T, FetchError>;
