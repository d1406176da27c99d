//! HTTP request value type and identity construction.
//!
//! A [`Request`] describes one HTTP exchange to perform. Requests are
//! immutable once they enter the [`crate::queue::Queue`]; [`Request::patch`]
//! is the one mutation point, applied exactly once at construction time to
//! merge in the crawl-wide [`crate::options::IdentityOptions`].

use std::time::Duration;

use bytes::Bytes;
use http::{HeaderMap, HeaderValue, Method};
use serde::ser::{Serialize, SerializeStruct, Serializer};
use url::Url;

use crate::options::IdentityOptions;

/// Request body payload.
#[derive(Clone, Debug)]
pub enum Body {
  /// Form-encoded key/value pairs, sent as `application/x-www-form-urlencoded`.
  Form(Vec<(String, String)>),
  /// A JSON payload, sent as `application/json`. Used for API-shaped forms
  /// and requests built outside the HTML form-scraping path.
  Json(serde_json::Value),
  /// Raw bytes, sent as-is with whatever `content-type` header is set.
  Raw(Bytes),
}

impl Serialize for Body {
  fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
  where
    S: Serializer,
  {
    match self {
      Body::Form(pairs) => serializer.serialize_newtype_variant("Body", 0, "form", pairs),
      Body::Json(value) => serializer.serialize_newtype_variant("Body", 1, "json", value),
      Body::Raw(bytes) => {
        serializer.serialize_newtype_variant("Body", 2, "raw", bytes.as_ref())
      }
    }
  }
}

/// One HTTP request to be crawled.
///
/// `depth` is 0 for the seed request and `depth(parent) + 1` for every
/// request discovered while processing it.
#[derive(Clone, Debug)]
pub struct Request {
  pub method: Method,
  pub url: Url,
  pub body: Option<Body>,
  pub headers: HeaderMap,
  pub timeout: Duration,
  pub depth: u32,
}

/// `http::HeaderMap` has no `serde` impl of its own; both `Request` and
/// `Response` flatten their headers into a plain sorted pair list so crawl
/// results can be logged or snapshotted as JSON (spec's ambient data model).
pub(crate) fn serializable_headers(headers: &HeaderMap) -> Vec<(String, String)> {
  let mut pairs: Vec<(String, String)> = headers
    .iter()
    .map(|(name, value)| {
      (
        name.as_str().to_string(),
        value.to_str().unwrap_or_default().to_string(),
      )
    })
    .collect();
  pairs.sort();
  pairs
}

impl Serialize for Request {
  fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
  where
    S: Serializer,
  {
    let mut state = serializer.serialize_struct("Request", 6)?;
    state.serialize_field("method", self.method.as_str())?;
    state.serialize_field("url", self.url.as_str())?;
    state.serialize_field("headers", &serializable_headers(&self.headers))?;
    state.serialize_field("body", &self.body)?;
    state.serialize_field("timeout_secs", &self.timeout.as_secs())?;
    state.serialize_field("depth", &self.depth)?;
    state.end()
  }
}

impl Request {
  /// Creates a GET request for `url` at depth 0.
  pub fn get(url: Url) -> Self {
    Self::new(Method::GET, url)
  }

  /// Creates a request with the given method and url, depth 0, no body.
  pub fn new(method: Method, url: Url) -> Self {
    Self {
      method,
      url,
      body: None,
      headers: HeaderMap::new(),
      timeout: Duration::from_secs(30),
      depth: 0,
    }
  }

  /// Sets the request body.
  pub fn with_body(mut self, body: Body) -> Self {
    self.body = Some(body);
    self
  }

  /// Sets the request depth, normally used when enqueuing a discovered child.
  pub fn with_depth(mut self, depth: u32) -> Self {
    self.depth = depth;
    self
  }

  /// Merges the crawl-wide identity options into this request.
  ///
  /// Headers already present on the request win over the identity's
  /// defaults (last-write-wins is resolved in favor of the more specific
  /// setting); the identity's headers fill in everything else. Timeout is
  /// always taken from the identity unless the request already carries a
  /// non-default value.
  pub fn patch(&mut self, identity: &IdentityOptions, timeout: Duration) {
    for (name, value) in identity.headers.iter() {
      if !self.headers.contains_key(name) {
        self.headers.insert(name, value.clone());
      }
    }

    if let Some(auth) = &identity.auth {
      if let Some(header_value) = auth.header_value() {
        self.headers
          .entry(http::header::AUTHORIZATION)
          .or_insert(header_value);
      }
    }

    if self.timeout == Duration::from_secs(30) {
      self.timeout = timeout;
    }
  }

  /// Inserts or replaces a header, last-write-wins.
  pub fn set_header(&mut self, name: http::HeaderName, value: HeaderValue) {
    self.headers.insert(name, value);
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn depth_defaults_to_zero() {
    let req = Request::get(Url::parse("https://example.test/").unwrap());
    assert_eq!(req.depth, 0);
  }

  #[test]
  fn with_depth_overrides() {
    let req = Request::get(Url::parse("https://example.test/").unwrap()).with_depth(3);
    assert_eq!(req.depth, 3);
  }

  #[test]
  fn serializes_as_json() {
    let req = Request::get(Url::parse("https://example.test/a?b=1").unwrap());
    let value = serde_json::to_value(&req).unwrap();
    assert_eq!(value["method"], "GET");
    assert_eq!(value["url"], "https://example.test/a?b=1");
    assert_eq!(value["depth"], 0);
  }
}
