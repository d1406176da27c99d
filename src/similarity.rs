//! Similarity classifier: collapses URLs that differ only in a
//! numeric/enum path segment or query value (spec.md §4.2.1).
//!
//! Tokenizes each request into a feature vector — method, path segments
//! with digit runs normalized to a placeholder, and sorted query parameter
//! names — and clusters by exact feature-vector equality. The first URL
//! mapping to a vector is admitted; later ones with the same vector are
//! silently dropped. This is deterministic bucketing, not machine learning
//! (spec.md §9 design note).

use std::collections::HashSet;
use std::hash::{Hash, Hasher};

use parking_lot::Mutex;

use crate::request::Request;

fn normalize_segment(segment: &str) -> String {
  let mut out = String::with_capacity(segment.len());
  let mut chars = segment.chars().peekable();
  while let Some(c) = chars.next() {
    if c.is_ascii_digit() {
      out.push('#');
      while matches!(chars.peek(), Some(d) if d.is_ascii_digit()) {
        chars.next();
      }
    } else {
      out.push(c);
    }
  }
  out
}

fn feature_vector(request: &Request) -> u64 {
  let mut hasher = std::collections::hash_map::DefaultHasher::new();
  request.method.as_str().hash(&mut hasher);

  for segment in request.url.path_segments().into_iter().flatten() {
    normalize_segment(segment).hash(&mut hasher);
  }

  let mut param_names: Vec<String> = request
    .url
    .query_pairs()
    .map(|(k, _)| k.into_owned())
    .collect();
  param_names.sort();
  param_names.hash(&mut hasher);

  hasher.finish()
}

/// Holds the set of feature vectors already admitted during this crawl.
#[derive(Default)]
pub struct SimilarityClassifier {
  seen: Mutex<HashSet<u64>>,
}

impl SimilarityClassifier {
  pub fn new() -> Self {
    Self::default()
  }

  /// Returns `true` and records the vector if `request` is the first of
  /// its similarity class; returns `false` if an equivalent request was
  /// already admitted.
  pub fn admit(&self, request: &Request) -> bool {
    self.seen.lock().insert(feature_vector(request))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use url::Url;

  fn req(url: &str) -> Request {
    Request::get(Url::parse(url).unwrap())
  }

  #[test]
  fn paginated_urls_collapse_to_one_class() {
    let classifier = SimilarityClassifier::new();
    assert!(classifier.admit(&req("https://example.test/page/1")));
    assert!(!classifier.admit(&req("https://example.test/page/2")));
    assert!(!classifier.admit(&req("https://example.test/page/3")));
  }

  #[test]
  fn different_path_shape_is_a_different_class() {
    let classifier = SimilarityClassifier::new();
    assert!(classifier.admit(&req("https://example.test/page/1")));
    assert!(classifier.admit(&req("https://example.test/item?id=5")));
  }

  #[test]
  fn query_value_digit_runs_do_not_distinguish_classes() {
    let classifier = SimilarityClassifier::new();
    assert!(classifier.admit(&req("https://example.test/item?id=5")));
    assert!(!classifier.admit(&req("https://example.test/item?id=6")));
  }

  #[test]
  fn first_representative_wins_in_any_order() {
    let classifier = SimilarityClassifier::new();
    assert!(classifier.admit(&req("https://example.test/page/9")));
    assert!(!classifier.admit(&req("https://example.test/page/1")));
  }
}
