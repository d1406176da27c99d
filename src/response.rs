//! HTTP response value type.

use bytes::Bytes;
use http::{HeaderMap, StatusCode};
use serde::ser::{Serialize, SerializeStruct, Serializer};
use url::Url;

use crate::request::serializable_headers;

/// The result of one completed HTTP exchange.
///
/// Absent from a [`crate::queue::QueueItem`] until the fetch completes.
#[derive(Clone, Debug)]
pub struct Response {
  pub status: StatusCode,
  pub headers: HeaderMap,
  pub body: Bytes,
  /// The URL of the response after following redirects.
  pub final_url: Url,
}

impl Response {
  /// Decodes the body as UTF-8, lossily replacing invalid sequences.
  pub fn body_text(&self) -> std::borrow::Cow<'_, str> {
    String::from_utf8_lossy(&self.body)
  }
}

impl Serialize for Response {
  fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
  where
    S: Serializer,
  {
    let mut state = serializer.serialize_struct("Response", 4)?;
    state.serialize_field("status", &self.status.as_u16())?;
    state.serialize_field("headers", &serializable_headers(&self.headers))?;
    state.serialize_field("body", self.body_text().as_ref())?;
    state.serialize_field("final_url", self.final_url.as_str())?;
    state.end()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn serializes_as_json() {
    let response = Response {
      status: StatusCode::OK,
      headers: HeaderMap::new(),
      body: Bytes::from_static(b"hello"),
      final_url: Url::parse("https://example.test/").unwrap(),
    };
    let value = serde_json::to_value(&response).unwrap();
    assert_eq!(value["status"], 200);
    assert_eq!(value["body"], "hello");
    assert_eq!(value["final_url"], "https://example.test/");
  }
}
