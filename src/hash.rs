//! Identity hashing for [`crate::queue::QueueItem`] deduplication.
//!
//! The hash is derived from `(method, normalized url, canonicalized body)`.
//! Normalization rule (spec.md §9 Open Question, resolved): lowercase the
//! host, strip the default port for the scheme, sort query parameters by
//! key then value, preserve path case and trailing slash exactly as given,
//! drop the fragment.

use std::hash::{Hash, Hasher};

use url::Url;

use crate::request::{Body, Request};

/// Computes the stable identity hash of a request.
pub fn request_hash(request: &Request) -> u64 {
  let mut hasher = std::collections::hash_map::DefaultHasher::new();
  request.method.as_str().hash(&mut hasher);
  normalize_url(&request.url).hash(&mut hasher);
  canonicalize_body(request.body.as_ref()).hash(&mut hasher);
  hasher.finish()
}

/// Normalizes a URL into the canonical string used for hashing and the
/// similarity classifier's host comparisons.
pub fn normalize_url(url: &Url) -> String {
  let mut normalized = url.clone();
  let _ = normalized.set_host(url.host_str().map(str::to_ascii_lowercase).as_deref());

  let default_port = match normalized.scheme() {
    "http" => Some(80),
    "https" => Some(443),
    _ => None,
  };
  if normalized.port() == default_port {
    let _ = normalized.set_port(None);
  }

  normalized.set_fragment(None);

  let mut pairs: Vec<(String, String)> = normalized
    .query_pairs()
    .map(|(k, v)| (k.into_owned(), v.into_owned()))
    .collect();
  pairs.sort();
  if pairs.is_empty() {
    normalized.set_query(None);
  } else {
    let query = pairs
      .iter()
      .map(|(k, v)| format!("{k}={v}"))
      .collect::<Vec<_>>()
      .join("&");
    normalized.set_query(Some(&query));
  }

  normalized.to_string()
}

fn canonicalize_body(body: Option<&Body>) -> String {
  match body {
    None => String::new(),
    Some(Body::Raw(bytes)) => format!("raw:{}", String::from_utf8_lossy(bytes)),
    Some(Body::Form(fields)) => {
      let mut sorted = fields.clone();
      sorted.sort();
      sorted
        .into_iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&")
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn default_port_is_stripped() {
    let a = Url::parse("https://Example.test:443/path").unwrap();
    let b = Url::parse("https://example.test/path").unwrap();
    assert_eq!(normalize_url(&a), normalize_url(&b));
  }

  #[test]
  fn query_params_are_order_independent() {
    let a = Url::parse("https://example.test/?b=2&a=1").unwrap();
    let b = Url::parse("https://example.test/?a=1&b=2").unwrap();
    assert_eq!(normalize_url(&a), normalize_url(&b));
  }

  #[test]
  fn fragment_is_ignored() {
    let a = Url::parse("https://example.test/path#section").unwrap();
    let b = Url::parse("https://example.test/path").unwrap();
    assert_eq!(normalize_url(&a), normalize_url(&b));
  }

  #[test]
  fn trailing_slash_is_significant() {
    let a = Url::parse("https://example.test/path").unwrap();
    let b = Url::parse("https://example.test/path/").unwrap();
    assert_ne!(normalize_url(&a), normalize_url(&b));
  }

  #[test]
  fn same_request_hashes_identically() {
    let a = Request::get(Url::parse("https://example.test/a?x=1").unwrap());
    let b = Request::get(Url::parse("https://example.test/a?x=1").unwrap());
    assert_eq!(request_hash(&a), request_hash(&b));
  }

  #[test]
  fn form_body_order_does_not_affect_hash() {
    let mut a = Request::get(Url::parse("https://example.test/submit").unwrap());
    a.method = http::Method::POST;
    a.body = Some(Body::Form(vec![
      ("b".into(), "2".into()),
      ("a".into(), "1".into()),
    ]));

    let mut b = Request::get(Url::parse("https://example.test/submit").unwrap());
    b.method = http::Method::POST;
    b.body = Some(Body::Form(vec![
      ("a".into(), "1".into()),
      ("b".into(), "2".into()),
    ]));

    assert_eq!(request_hash(&a), request_hash(&b));
  }
}
