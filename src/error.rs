//! Error taxonomy for the crawler engine.
//!
//! Four classes are distinguished (transport, parse, configuration, and
//! callback failures); only `CallbackError` has no variant here because it
//! is caught and logged at the dispatch site rather than propagated — see
//! [`crate::callbacks`].

use thiserror::Error;

/// Errors that can occur while fetching and parsing a single request.
///
/// A `FetchError` always routes its `QueueItem` to `Errored`; it never
/// terminates the crawl.
#[derive(Debug, Error)]
pub enum FetchError {
  /// Connection refused, DNS failure, TLS failure, read timeout, or any
  /// other I/O-level failure reported by the HTTP client.
  #[error("transport error fetching {url}: {source}")]
  Transport {
    url: String,
    #[source]
    source: reqwest::Error,
  },

  /// The response body could not be decoded as HTML, or a discovered
  /// link/form action could not be resolved against the final URL.
  #[error("parse error for {url}: {message}")]
  Parse { url: String, message: String },
}

impl FetchError {
  /// Human-readable message passed to the `request_on_error` callback.
  pub fn message(&self) -> String {
    self.to_string()
  }
}

/// Top-level error raised synchronously by [`crate::scheduler::Crawler`]
/// before any crawling begins.
#[derive(Debug, Error)]
pub enum CrawlError {
  /// Invalid options supplied by the embedder — a malformed seed URL, an
  /// empty `request_methods` allow-list, and the like.
  #[error("configuration error: {0}")]
  Configuration(String),
}
