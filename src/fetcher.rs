//! The worker: one HTTP round-trip plus HTML link/form extraction per
//! `IN_PROGRESS` item (spec.md §4.4).
//!
//! `reqwest` (ADDED) is the HTTP transport — grounded on
//! `PerkyZZ999-ContextBuilder`'s `engine.rs` and `monokrome-foiacquire`'s
//! manifest, both of which reach for `reqwest` with
//! `cookies`/`socks`/`rustls-tls` features for the same "opaque HTTP
//! client" role spec.md places outside the CORE's scope. `scraper` (ADDED)
//! extracts links and forms from the response body, grounded on the same
//! examples and `32Lwk-RustySearch`'s `mini-search-engine` crawler.

use std::time::Duration;

use bytes::Bytes;
use reqwest::Client;
use scraper::{Html, Selector};

use crate::autofill::{self, FormElement};
use crate::callbacks::{Callbacks, FormAction, dispatch};
use crate::error::FetchError;
use crate::options::IdentityOptions;
use crate::queue::QueueItem;
use crate::request::{Body, Request};
use crate::response::Response;

/// Builds the `reqwest::Client` shared by every fetch, configured from the
/// crawl's identity: cookie jar, proxy, and per-request timeout ceiling.
pub fn build_client(identity: &IdentityOptions, timeout: Duration) -> Result<Client, FetchError> {
  let mut builder = Client::builder()
    .cookie_provider(identity.cookie_jar.clone())
    .timeout(timeout);

  if let Some(proxy_url) = &identity.proxy {
    let proxy = reqwest::Proxy::all(proxy_url.clone()).map_err(|source| FetchError::Transport {
      url: proxy_url.to_string(),
      source,
    })?;
    builder = builder.proxy(proxy);
  }

  builder.build().map_err(|source| FetchError::Transport {
    url: "<client>".to_string(),
    source,
  })
}

/// Performs one fetch-and-extract pass for `item`, driving the
/// `request_in_thread_*` and form hooks. Returns the discovered children
/// unfiltered — the scope filter is applied by the scheduler after this
/// returns, under its lock.
pub async fn fetch(
  client: &Client,
  callbacks: &Callbacks,
  item: &QueueItem,
) -> Result<(Response, Vec<Request>), FetchError> {
  if let Some(hook) = &callbacks.request_in_thread_before_start {
    dispatch(
      hook(item.clone()),
      "request_in_thread_before_start",
      (),
    )
    .await;
  }

  let response = execute(client, &item.request).await?;
  let children = extract_children(&response, callbacks, item, &response.body_text()).await?;

  if let Some(hook) = &callbacks.request_in_thread_after_finish {
    dispatch(hook(item.clone()), "request_in_thread_after_finish", ()).await;
  }

  Ok((response, children))
}

async fn execute(client: &Client, request: &Request) -> Result<Response, FetchError> {
  let url_string = request.url.to_string();
  let mut builder = client.request(request.method.clone(), request.url.clone());

  for (name, value) in request.headers.iter() {
    builder = builder.header(name, value);
  }

  builder = match &request.body {
    Some(Body::Form(pairs)) => builder.form(pairs),
    Some(Body::Json(value)) => builder.json(value),
    Some(Body::Raw(bytes)) => builder.body(bytes.clone()),
    None => builder,
  };

  let sent = builder.send().await.map_err(|source| FetchError::Transport {
    url: url_string.clone(),
    source,
  })?;

  let final_url = sent.url().clone();
  let status = sent.status();
  let headers = sent.headers().clone();
  let body: Bytes = sent.bytes().await.map_err(|source| FetchError::Transport {
    url: url_string,
    source,
  })?;

  Ok(Response {
    status,
    headers,
    body,
    final_url,
  })
}

const LINK_SELECTORS: &[(&str, &str)] = &[
  ("a[href]", "href"),
  ("link[href]", "href"),
  ("script[src]", "src"),
  ("img[src]", "src"),
  ("iframe[src]", "src"),
];

async fn extract_children(
  response: &Response,
  callbacks: &Callbacks,
  item: &QueueItem,
  body: &str,
) -> Result<Vec<Request>, FetchError> {
  let document = Html::parse_document(body);
  let depth = item.request.depth + 1;
  let mut children = Vec::new();

  for (selector_str, attr) in LINK_SELECTORS {
    let Ok(selector) = Selector::parse(selector_str) else {
      continue;
    };
    for element in document.select(&selector) {
      let Some(raw) = element.value().attr(attr) else {
        continue;
      };
      if let Some(url) = resolve_http_url(&response.final_url, raw) {
        children.push(Request::get(url).with_depth(depth));
      }
    }
  }

  if let Ok(form_selector) = Selector::parse("form") {
    for form in document.select(&form_selector) {
      if let Some(request) = build_form_request(&form, response, callbacks, item, depth).await? {
        children.push(request);
      }
    }
  }

  Ok(children)
}

/// Resolves a link/src target against `base`. A non-HTTP(S) scheme (mailto,
/// javascript, tel, ...) is a deliberate non-admission, not a failure — it is
/// dropped silently rather than erroring the item.
fn resolve_http_url(base: &url::Url, raw: &str) -> Option<url::Url> {
  let resolved = base.join(raw).ok()?;
  matches!(resolved.scheme(), "http" | "https").then_some(resolved)
}

/// Resolves a `<form action="...">` target against `base`. Unlike
/// [`resolve_http_url`], a join failure here is a genuine parse error — the
/// form's `action` attribute is malformed markup, not a scheme this crate
/// chooses not to follow — so it is surfaced as `FetchError::Parse` and
/// errors the whole item (spec.md §7). An empty `action` defaults to the
/// current page, and a non-HTTP(S) scheme is still dropped silently.
fn resolve_form_action(base: &url::Url, action: &str) -> Result<Option<url::Url>, FetchError> {
  if action.is_empty() {
    return Ok(Some(base.clone()));
  }
  let joined = base.join(action).map_err(|source| FetchError::Parse {
    url: action.to_string(),
    message: source.to_string(),
  })?;
  Ok(matches!(joined.scheme(), "http" | "https").then_some(joined))
}

async fn build_form_request(
  form: &scraper::ElementRef<'_>,
  response: &Response,
  callbacks: &Callbacks,
  item: &QueueItem,
  depth: u32,
) -> Result<Option<Request>, FetchError> {
  let method = form
    .value()
    .attr("method")
    .map(|m| m.to_ascii_uppercase())
    .unwrap_or_else(|| "GET".to_string());
  let action = form.value().attr("action").unwrap_or("");
  let Some(url) = resolve_form_action(&response.final_url, action)? else {
    return Ok(None);
  };

  let elements = scrape_form_elements(form);
  let tentative = autofill::autofill(&elements);

  let form_data = if let Some(hook) = &callbacks.form_before_autofill {
    let verdict = dispatch(
      hook(item.clone(), elements.clone(), tentative.clone()),
      "form_before_autofill",
      Some(FormAction::Autofill),
    )
    .await;
    match verdict {
      Some(FormAction::DoNotAutofill) => Vec::new(),
      _ => tentative,
    }
  } else {
    tentative
  };

  if let Some(hook) = &callbacks.form_after_autofill {
    dispatch(
      hook(item.clone(), elements, form_data.clone()),
      "form_after_autofill",
      (),
    )
    .await;
  }

  let method = http::Method::from_bytes(method.as_bytes()).unwrap_or(http::Method::GET);
  let mut request = Request::new(method, url).with_depth(depth);
  if !form_data.is_empty() {
    request = request.with_body(Body::Form(form_data));
  }
  Ok(Some(request))
}

fn scrape_form_elements(form: &scraper::ElementRef<'_>) -> Vec<FormElement> {
  let mut elements = Vec::new();

  if let Ok(input_selector) = Selector::parse("input, textarea") {
    for input in form.select(&input_selector) {
      let Some(name) = input.value().attr("name") else {
        continue;
      };
      let input_type = input.value().attr("type").unwrap_or("text").to_string();
      let existing_value = match input_type.as_str() {
        "checkbox" | "radio" => input.value().attr("checked").map(|_| {
          input
            .value()
            .attr("value")
            .unwrap_or("on")
            .to_string()
        }),
        _ => input.value().attr("value").map(|v| v.to_string()),
      };
      elements.push(FormElement {
        name: name.to_string(),
        input_type,
        options: Vec::new(),
        existing_value,
      });
    }
  }

  if let Ok(select_selector) = Selector::parse("select") {
    for select in form.select(&select_selector) {
      let Some(name) = select.value().attr("name") else {
        continue;
      };
      let mut options = Vec::new();
      let mut existing_value = None;
      if let Ok(option_selector) = Selector::parse("option") {
        for option in select.select(&option_selector) {
          let value = option
            .value()
            .attr("value")
            .map(|v| v.to_string())
            .unwrap_or_else(|| option.text().collect());
          if option.value().attr("selected").is_some() {
            existing_value = Some(value.clone());
          }
          options.push(value);
        }
      }
      elements.push(FormElement {
        name: name.to_string(),
        input_type: "select".to_string(),
        options,
        existing_value,
      });
    }
  }

  elements
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn non_http_scheme_is_rejected() {
    let base = url::Url::parse("https://example.test/").unwrap();
    assert!(resolve_http_url(&base, "mailto:a@b.com").is_none());
    assert!(resolve_http_url(&base, "javascript:void(0)").is_none());
    assert!(resolve_http_url(&base, "tel:+15555550100").is_none());
  }

  #[test]
  fn relative_link_resolves_against_final_url() {
    let base = url::Url::parse("https://example.test/a/b").unwrap();
    let resolved = resolve_http_url(&base, "../c").unwrap();
    assert_eq!(resolved.as_str(), "https://example.test/c");
  }

  #[test]
  fn empty_form_action_defaults_to_current_page() {
    let base = url::Url::parse("https://example.test/a/b").unwrap();
    let resolved = resolve_form_action(&base, "").unwrap();
    assert_eq!(resolved.unwrap(), base);
  }

  #[test]
  fn non_http_form_action_is_dropped_not_errored() {
    let base = url::Url::parse("https://example.test/").unwrap();
    assert_eq!(resolve_form_action(&base, "mailto:a@b.com").unwrap(), None);
  }

  #[test]
  fn malformed_form_action_is_a_parse_error() {
    let base = url::Url::parse("https://example.test/").unwrap();
    let err = resolve_form_action(&base, "http://[bad").unwrap_err();
    assert!(matches!(err, FetchError::Parse { .. }));
  }

  #[test]
  fn form_elements_extract_names_and_types() {
    let html = Html::parse_document(
      r#"<form><input name="q" type="text" value="hi"><select name="lang"><option value="en">EN</option><option value="fr" selected>FR</option></select></form>"#,
    );
    let form_selector = Selector::parse("form").unwrap();
    let form = html.select(&form_selector).next().unwrap();
    let elements = scrape_form_elements(&form);
    assert_eq!(elements.len(), 2);
    assert_eq!(elements[0].name, "q");
    assert_eq!(elements[0].existing_value.as_deref(), Some("hi"));
    assert_eq!(elements[1].name, "lang");
    assert_eq!(elements[1].existing_value.as_deref(), Some("fr"));
  }
}
