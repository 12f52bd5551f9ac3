//! # resource-fetcher
//!
//! Fetches remote resources over HTTP for editor tooling, with retries,
//! cancellation and conditional (E-Tag) downloads.
//!
//! ## Architecture
//!
//! ```text
//! Timeout ─┐
//!          ├→ HttpResourceFetcher → wait_until(attempt) → reqwest
//! Config ──┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::time::Duration;
//! use resource_fetcher::fetcher::http_fetcher::{FetcherOptions, HttpResourceFetcher};
//! use resource_fetcher::timeout::Timeout;
//!
//! let options = FetcherOptions::new(true).with_timeout(Timeout::new(Duration::from_secs(5)));
//! let fetcher = HttpResourceFetcher::new("https://example.com/manifest.json", options)?;
//!
//! let fresh = fetcher.get_new_etag_content(Some("\"v1\"")).await?;
//! if let Some(content) = fresh.content {
//!     println!("{} ({})", content, fresh.etag);
//! }
//! ```
//!
//! ## Modules
//!
//! - [`app`]: Application context and error types
//! - [`cli`]: Command-line interface definitions
//! - [`config`]: Configuration file
//! - [`fetcher`]: HTTP and file fetchers, JSON property helper
//! - [`retry`]: Retrying waiter with exponential backoff
//! - [`timeout`]: Cancellable timeout tokens

/// Application context and error handling.
///
/// The [`AppContext`](app::AppContext) struct wires together config,
/// the HTTP client and the cancellation token.
pub mod app;

/// Command-line interface using clap.
///
/// - `get <url>` - Download and print a resource
/// - `etag <url> [--etag]` - Conditional download
/// - `property <url> <name>` - Print a JSON property
/// - `file <path>` - Print a local file
pub mod cli;

/// Configuration management.
///
/// Loads from `~/.config/resource-fetcher/config.toml`.
pub mod config;

/// Resource fetching.
///
/// - [`ResourceFetcher`](fetcher::ResourceFetcher): Async trait for fetchers
/// - [`HttpResourceFetcher`](fetcher::http_fetcher::HttpResourceFetcher): reqwest-based implementation
/// - [`FileResourceFetcher`](fetcher::file_fetcher::FileResourceFetcher): local files
/// - [`get_property_from_json_url`](fetcher::json::get_property_from_json_url): JSON property lookup
pub mod fetcher;

/// Retrying waiter.
pub mod retry;

/// Cancellable timeout tokens.
pub mod timeout;
