//! Crawl-wide configuration: identity, performance, and misc knobs, plus the
//! top-level `CrawlerOptions` that groups them with [`Callbacks`] and
//! [`ScopeOptions`] (spec.md §3, ambient "Configuration surface" section of
//! SPEC_FULL.md). Plain public structs with `Default` impls, consumed once
//! by `Crawler::new` and never mutated afterwards.

use std::sync::Arc;
use std::time::Duration;

use http::HeaderMap;
use reqwest::cookie::Jar;
use url::Url;

use crate::callbacks::Callbacks;
use crate::scope::ScopeOptions;

/// Credentials applied as an `Authorization` header on every request.
#[derive(Clone, Debug)]
pub enum Auth {
  Basic { user: String, pass: String },
  Bearer(String),
}

impl Auth {
  /// Renders the `Authorization` header value for this credential.
  pub fn header_value(&self) -> Option<http::HeaderValue> {
    let raw = match self {
      Auth::Basic { user, pass } => {
        use base64::Engine;
        let encoded =
          base64::engine::general_purpose::STANDARD.encode(format!("{user}:{pass}"));
        format!("Basic {encoded}")
      }
      Auth::Bearer(token) => format!("Bearer {token}"),
    };
    http::HeaderValue::from_str(&raw).ok()
  }
}

/// Identity presented to every server the crawl visits: default headers, a
/// shared cookie jar, optional auth, and an optional upstream proxy.
#[derive(Clone)]
pub struct IdentityOptions {
  pub headers: HeaderMap,
  pub cookie_jar: Arc<Jar>,
  pub auth: Option<Auth>,
  pub proxy: Option<Url>,
}

impl Default for IdentityOptions {
  fn default() -> Self {
    Self {
      headers: HeaderMap::new(),
      cookie_jar: Arc::new(Jar::default()),
      auth: None,
      proxy: None,
    }
  }
}

/// Concurrency and timeout budget for the crawl.
#[derive(Clone, Debug)]
pub struct PerformanceOptions {
  /// Maximum number of requests in flight at once (nyawc's documented default).
  pub max_threads: usize,
  pub request_timeout: Duration,
}

impl Default for PerformanceOptions {
  fn default() -> Self {
    Self {
      max_threads: 8,
      request_timeout: Duration::from_secs(30),
    }
  }
}

/// Everything else: currently just the debug logging toggle.
#[derive(Clone, Copy, Debug, Default)]
pub struct MiscOptions {
  pub debug: bool,
}

/// Top-level configuration consumed by [`crate::scheduler::Crawler::new`].
#[derive(Default)]
pub struct CrawlerOptions {
  pub callbacks: Callbacks,
  pub scope: ScopeOptions,
  pub identity: IdentityOptions,
  pub performance: PerformanceOptions,
  pub misc: MiscOptions,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn basic_auth_header_is_base64() {
    let auth = Auth::Basic {
      user: "alice".into(),
      pass: "secret".into(),
    };
    let value = auth.header_value().unwrap();
    assert_eq!(value.to_str().unwrap(), "Basic YWxpY2U6c2VjcmV0");
  }

  #[test]
  fn bearer_auth_header() {
    let auth = Auth::Bearer("tok123".into());
    let value = auth.header_value().unwrap();
    assert_eq!(value.to_str().unwrap(), "Bearer tok123");
  }

  #[test]
  fn default_performance_matches_nyawc() {
    let performance = PerformanceOptions::default();
    assert_eq!(performance.max_threads, 8);
    assert_eq!(performance.request_timeout, Duration::from_secs(30));
  }
}
