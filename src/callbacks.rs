//! User-supplied lifecycle hooks and the actions they can return.
//!
//! Mirrors spec.md §6's callback contract table. Every hook is optional
//! (absent = no-op) and boxed the way the teacher framework boxes
//! middleware and signal handlers (`types::BoxMiddleware`,
//! `signals::SignalHandler`): `Arc<dyn Fn(...) -> BoxFuture<...> + Send +
//! Sync>`. A panicking callback is caught at the dispatch site, logged, and
//! treated as if it returned `None` — `CallbackError` is never fatal
//! (spec.md §7).

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::FutureExt;
use futures_util::future::BoxFuture;

use crate::autofill::FormElement;
use crate::queue::{Queue, QueueItem};

/// Action returned from `request_before_start`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RequestAction {
  Continue,
  SkipToNext,
  StopCrawling,
}

/// Action returned from `request_after_finish`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FinishAction {
  Continue,
  StopCrawling,
}

/// Action returned from `form_before_autofill`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FormAction {
  Autofill,
  DoNotAutofill,
}

type Hook0 = Arc<dyn Fn() -> BoxFuture<'static, ()> + Send + Sync>;
type HookAfterFinishCrawl = Arc<dyn Fn(Arc<Queue>) -> BoxFuture<'static, ()> + Send + Sync>;
type HookRequestBeforeStart =
  Arc<dyn Fn(Arc<Queue>, QueueItem) -> BoxFuture<'static, Option<RequestAction>> + Send + Sync>;
type HookRequestAfterFinish = Arc<
  dyn Fn(Arc<Queue>, QueueItem, Vec<QueueItem>) -> BoxFuture<'static, Option<FinishAction>>
    + Send
    + Sync,
>;
type HookThreadItem = Arc<dyn Fn(QueueItem) -> BoxFuture<'static, ()> + Send + Sync>;
type HookOnError = Arc<dyn Fn(QueueItem, String) -> BoxFuture<'static, ()> + Send + Sync>;
type HookFormBeforeAutofill = Arc<
  dyn Fn(QueueItem, Vec<FormElement>, Vec<(String, String)>) -> BoxFuture<'static, Option<FormAction>>
    + Send
    + Sync,
>;
type HookFormAfterAutofill = Arc<
  dyn Fn(QueueItem, Vec<FormElement>, Vec<(String, String)>) -> BoxFuture<'static, ()>
    + Send
    + Sync,
>;

/// The set of lifecycle hooks a crawl may be configured with. Every field
/// defaults to `None` (a null route, in nyawc's terminology).
#[derive(Default, Clone)]
pub struct Callbacks {
  pub crawler_before_start: Option<Hook0>,
  pub crawler_after_finish: Option<HookAfterFinishCrawl>,
  pub request_before_start: Option<HookRequestBeforeStart>,
  pub request_after_finish: Option<HookRequestAfterFinish>,
  pub request_in_thread_before_start: Option<HookThreadItem>,
  pub request_in_thread_after_finish: Option<HookThreadItem>,
  pub request_on_error: Option<HookOnError>,
  pub form_before_autofill: Option<HookFormBeforeAutofill>,
  pub form_after_autofill: Option<HookFormAfterAutofill>,
}

impl Callbacks {
  pub fn on_crawler_before_start<F, Fut>(&mut self, f: F)
  where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: std::future::Future<Output = ()> + Send + 'static,
  {
    self.crawler_before_start = Some(Arc::new(move || Box::pin(f())));
  }

  pub fn on_crawler_after_finish<F, Fut>(&mut self, f: F)
  where
    F: Fn(Arc<Queue>) -> Fut + Send + Sync + 'static,
    Fut: std::future::Future<Output = ()> + Send + 'static,
  {
    self.crawler_after_finish = Some(Arc::new(move |q| Box::pin(f(q))));
  }

  pub fn on_request_before_start<F, Fut>(&mut self, f: F)
  where
    F: Fn(Arc<Queue>, QueueItem) -> Fut + Send + Sync + 'static,
    Fut: std::future::Future<Output = Option<RequestAction>> + Send + 'static,
  {
    self.request_before_start = Some(Arc::new(move |q, item| Box::pin(f(q, item))));
  }

  pub fn on_request_after_finish<F, Fut>(&mut self, f: F)
  where
    F: Fn(Arc<Queue>, QueueItem, Vec<QueueItem>) -> Fut + Send + Sync + 'static,
    Fut: std::future::Future<Output = Option<FinishAction>> + Send + 'static,
  {
    self.request_after_finish = Some(Arc::new(move |q, item, children| {
      Box::pin(f(q, item, children))
    }));
  }

  pub fn on_request_on_error<F, Fut>(&mut self, f: F)
  where
    F: Fn(QueueItem, String) -> Fut + Send + Sync + 'static,
    Fut: std::future::Future<Output = ()> + Send + 'static,
  {
    self.request_on_error = Some(Arc::new(move |item, msg| Box::pin(f(item, msg))));
  }

  pub fn on_request_in_thread_before_start<F, Fut>(&mut self, f: F)
  where
    F: Fn(QueueItem) -> Fut + Send + Sync + 'static,
    Fut: std::future::Future<Output = ()> + Send + 'static,
  {
    self.request_in_thread_before_start = Some(Arc::new(move |item| Box::pin(f(item))));
  }

  pub fn on_request_in_thread_after_finish<F, Fut>(&mut self, f: F)
  where
    F: Fn(QueueItem) -> Fut + Send + Sync + 'static,
    Fut: std::future::Future<Output = ()> + Send + 'static,
  {
    self.request_in_thread_after_finish = Some(Arc::new(move |item| Box::pin(f(item))));
  }

  pub fn on_form_before_autofill<F, Fut>(&mut self, f: F)
  where
    F: Fn(QueueItem, Vec<FormElement>, Vec<(String, String)>) -> Fut + Send + Sync + 'static,
    Fut: std::future::Future<Output = Option<FormAction>> + Send + 'static,
  {
    self.form_before_autofill =
      Some(Arc::new(move |item, elements, tentative| Box::pin(f(item, elements, tentative))));
  }

  pub fn on_form_after_autofill<F, Fut>(&mut self, f: F)
  where
    F: Fn(QueueItem, Vec<FormElement>, Vec<(String, String)>) -> Fut + Send + Sync + 'static,
    Fut: std::future::Future<Output = ()> + Send + 'static,
  {
    self.form_after_autofill =
      Some(Arc::new(move |item, elements, data| Box::pin(f(item, elements, data))));
  }
}

/// Awaits `fut`, catching a panic and falling back to `default` while
/// logging the failure — the shared isolation point for every callback
/// dispatch site.
pub(crate) async fn dispatch<T>(fut: BoxFuture<'static, T>, hook: &'static str, default: T) -> T {
  match AssertUnwindSafe(fut).catch_unwind().await {
    Ok(value) => value,
    Err(_) => {
      tracing::error!(hook, "callback panicked; treating as no action");
      default
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use url::Url;

  use crate::request::Request;

  fn item() -> QueueItem {
    let queue = Queue::new();
    queue.add_request(Request::get(Url::parse("https://example.test/").unwrap()))
  }

  #[tokio::test]
  async fn panicking_hook_is_isolated() {
    let mut callbacks = Callbacks::default();
    callbacks.on_request_before_start(|_queue, _item| async { panic!("boom") });

    let hook = callbacks.request_before_start.clone().unwrap();
    let queue = Arc::new(Queue::new());
    let result = dispatch(hook(queue, item()), "request_before_start", None).await;
    assert_eq!(result, None);
  }

  #[tokio::test]
  async fn no_op_default_is_none() {
    let callbacks = Callbacks::default();
    assert!(callbacks.request_before_start.is_none());
  }
}
