//! Scope filter: composes the host/protocol/TLD/method/depth predicates and
//! the similarity classifier into a single admission decision (spec.md §4.2).

use std::collections::HashSet;

use http::Method;

use crate::queue::Queue;
use crate::request::Request;
use crate::similarity::SimilarityClassifier;
use crate::suffix;

/// Scope configuration, part of [`crate::options::CrawlerOptions`].
#[derive(Clone, Debug)]
pub struct ScopeOptions {
  pub protocol_must_match: bool,
  pub subdomain_must_match: bool,
  pub hostname_must_match: bool,
  pub tld_must_match: bool,
  pub max_depth: Option<u32>,
  pub ignore_similar_requests: bool,
  pub request_methods: HashSet<Method>,
}

impl Default for ScopeOptions {
  fn default() -> Self {
    Self {
      protocol_must_match: false,
      subdomain_must_match: true,
      hostname_must_match: true,
      tld_must_match: true,
      max_depth: None,
      ignore_similar_requests: false,
      request_methods: [
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::DELETE,
        Method::OPTIONS,
        Method::HEAD,
      ]
      .into_iter()
      .collect(),
    }
  }
}

/// Pure predicate deciding whether `candidate` (discovered from `seed`) may
/// be admitted to the queue. Has no side effects except recording the
/// candidate in `classifier`'s seen-set when every other predicate passes
/// and the candidate is the first of its similarity class.
pub fn is_in_scope(
  candidate: &Request,
  seed: &Request,
  options: &ScopeOptions,
  queue: &Queue,
  classifier: &SimilarityClassifier,
) -> bool {
  if !options.request_methods.contains(&candidate.method) {
    return false;
  }

  if options.protocol_must_match && candidate.url.scheme() != seed.url.scheme() {
    return false;
  }

  let Some(candidate_host) = candidate.url.host_str() else {
    return false;
  };
  let Some(seed_host) = seed.url.host_str() else {
    return false;
  };

  if options.subdomain_must_match {
    let candidate_sub = suffix::subdomain(candidate_host);
    let seed_sub = suffix::subdomain(seed_host);
    if candidate_sub != seed_sub {
      return false;
    }
  }

  if options.hostname_must_match
    && suffix::registrable_domain(candidate_host) != suffix::registrable_domain(seed_host)
  {
    return false;
  }

  if options.tld_must_match
    && suffix::public_suffix(candidate_host) != suffix::public_suffix(seed_host)
  {
    return false;
  }

  if let Some(max_depth) = options.max_depth {
    if candidate.depth > max_depth {
      return false;
    }
  }

  if queue.has_request(candidate) {
    return false;
  }

  if options.ignore_similar_requests && !classifier.admit(candidate) {
    return false;
  }

  true
}

#[cfg(test)]
mod tests {
  use super::*;
  use url::Url;

  fn req(url: &str, depth: u32) -> Request {
    Request::get(Url::parse(url).unwrap()).with_depth(depth)
  }

  #[test]
  fn rejects_disallowed_method() {
    let mut options = ScopeOptions::default();
    options.request_methods = [Method::GET].into_iter().collect();
    let mut candidate = req("https://example.test/a", 1);
    candidate.method = Method::POST;
    let seed = req("https://example.test/", 0);
    let queue = Queue::new();
    let classifier = SimilarityClassifier::new();
    assert!(!is_in_scope(&candidate, &seed, &options, &queue, &classifier));
  }

  #[test]
  fn rejects_different_host() {
    let options = ScopeOptions::default();
    let seed = req("https://example.test/", 0);
    let candidate = req("https://other.test/a", 1);
    let queue = Queue::new();
    let classifier = SimilarityClassifier::new();
    assert!(!is_in_scope(&candidate, &seed, &options, &queue, &classifier));
  }

  #[test]
  fn rejects_beyond_max_depth() {
    let mut options = ScopeOptions::default();
    options.max_depth = Some(1);
    let seed = req("https://example.test/", 0);
    let candidate = req("https://example.test/a", 2);
    let queue = Queue::new();
    let classifier = SimilarityClassifier::new();
    assert!(!is_in_scope(&candidate, &seed, &options, &queue, &classifier));
  }

  #[test]
  fn rejects_already_queued() {
    let options = ScopeOptions::default();
    let seed = req("https://example.test/", 0);
    let candidate = req("https://example.test/a", 1);
    let queue = Queue::new();
    queue.add_request(candidate.clone());
    let classifier = SimilarityClassifier::new();
    assert!(!is_in_scope(&candidate, &seed, &options, &queue, &classifier));
  }

  #[test]
  fn no_subdomain_seed_rejects_subdomained_candidate() {
    let options = ScopeOptions::default();
    let seed = req("https://example.test/", 0);
    let candidate = req("https://blog.example.test/a", 1);
    let queue = Queue::new();
    let classifier = SimilarityClassifier::new();
    assert!(!is_in_scope(&candidate, &seed, &options, &queue, &classifier));
  }

  #[test]
  fn accepts_in_scope_candidate() {
    let options = ScopeOptions::default();
    let seed = req("https://example.test/", 0);
    let candidate = req("https://example.test/a", 1);
    let queue = Queue::new();
    let classifier = SimilarityClassifier::new();
    assert!(is_in_scope(&candidate, &seed, &options, &queue, &classifier));
  }
}
