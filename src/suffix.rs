//! Minimal registrable-domain helpers used by the scope filter's hostname
//! and TLD predicates.
//!
//! This is deliberately not a full Public Suffix List implementation — it
//! covers the common single-label TLDs (`.com`, `.org`, ...) and a handful
//! of well-known two-label suffixes (`.co.uk`, `.com.au`, ...), which is
//! sufficient for the scope predicates this crate implements and keeps the
//! crate buildable with no bundled list data (see DESIGN.md).

const KNOWN_TWO_LABEL_SUFFIXES: &[&str] = &[
  "co.uk", "org.uk", "ac.uk", "gov.uk", "com.au", "net.au", "org.au", "co.jp", "co.nz", "co.in",
  "com.br", "com.cn", "co.za", "github.io",
];

/// The registrable domain (second-level label + suffix) of `host`.
pub fn registrable_domain(host: &str) -> String {
  let labels: Vec<&str> = host.split('.').collect();
  if labels.len() < 2 {
    return host.to_string();
  }
  if labels.len() >= 3 {
    let last_two = labels[labels.len() - 2..].join(".");
    if KNOWN_TWO_LABEL_SUFFIXES.contains(&last_two.as_str()) {
      return labels[labels.len() - 3..].join(".");
    }
  }
  labels[labels.len() - 2..].join(".")
}

/// The public suffix (TLD, possibly multi-label) of `host`.
pub fn public_suffix(host: &str) -> String {
  let labels: Vec<&str> = host.split('.').collect();
  if labels.len() >= 2 {
    let last_two = labels[labels.len() - 2..].join(".");
    if KNOWN_TWO_LABEL_SUFFIXES.contains(&last_two.as_str()) {
      return last_two;
    }
  }
  labels.last().copied().unwrap_or(host).to_string()
}

/// The subdomain labels of `host`, i.e. everything before the registrable
/// domain. Empty string if there is no subdomain.
pub fn subdomain(host: &str) -> String {
  let registrable = registrable_domain(host);
  host.strip_suffix(&registrable)
    .and_then(|rest| rest.strip_suffix('.'))
    .unwrap_or("")
    .to_string()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn simple_tld() {
    assert_eq!(registrable_domain("www.example.com"), "example.com");
    assert_eq!(public_suffix("www.example.com"), "com");
  }

  #[test]
  fn two_label_suffix() {
    assert_eq!(registrable_domain("www.example.co.uk"), "example.co.uk");
    assert_eq!(public_suffix("www.example.co.uk"), "co.uk");
  }

  #[test]
  fn subdomain_extraction() {
    assert_eq!(subdomain("blog.example.com"), "blog");
    assert_eq!(subdomain("example.com"), "");
    assert_eq!(subdomain("a.b.example.co.uk"), "a.b");
  }
}
