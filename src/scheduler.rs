//! The scheduler: owns the queue, bounds concurrency, and drives the crawl
//! to completion or graceful stop (spec.md §4.5).
//!
//! Workers never call back into the scheduler directly — each sends a
//! `WorkerDone` message over an `mpsc` channel drained by the single task
//! running [`Crawler::start_with`]. That is the channel-based alternative
//! the §9 design note recommends in place of the source's cyclic
//! Crawler/CrawlerThread back-reference, and it doubles as the lock §5
//! requires around `request_before_start`/`request_after_finish`/
//! `request_on_error`: since all three are only ever dispatched from this
//! one task, they are serialized for free without an explicit mutex.
//! A [`tokio::sync::Notify`], signalled by the ctrl-c handler and by
//! `spawn_new_requests` whenever nothing is left in flight, replaces the
//! source's 1-second poll loop (§9 REDESIGN FLAG).

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use once_cell::sync::OnceCell;
use parking_lot::Mutex as SyncMutex;
use reqwest::Client;
use tokio::sync::{Notify, mpsc};
use tokio::task::JoinHandle;

use crate::callbacks::{FinishAction, RequestAction, dispatch};
use crate::error::CrawlError;
use crate::fetcher;
use crate::options::CrawlerOptions;
use crate::queue::{Queue, QueueItem, QueueStatus};
use crate::request::Request;
use crate::scope;
use crate::similarity::SimilarityClassifier;

enum WorkerDone {
  Finished { hash: u64, children: Vec<Request> },
  Failed { hash: u64, message: String },
}

/// Owns the queue, the similarity classifier, the worker table, and the
/// three termination flags (`should_stop`, `stopping`, `stopped`).
pub struct Crawler {
  pub queue: Arc<Queue>,
  classifier: SimilarityClassifier,
  options: CrawlerOptions,
  client: Client,
  workers: SyncMutex<HashMap<u64, JoinHandle<()>>>,
  should_stop: AtomicBool,
  stopping: AtomicBool,
  stopped: AtomicBool,
  notify: Notify,
  done_tx: OnceCell<mpsc::UnboundedSender<WorkerDone>>,
  seed: OnceCell<Request>,
}

impl Crawler {
  /// Builds a crawler from `options`, constructing the shared HTTP client
  /// up front. Fails only if the client itself cannot be built (bad proxy
  /// URL, TLS backend init failure).
  pub fn new(options: CrawlerOptions) -> Result<Arc<Self>, CrawlError> {
    let client = fetcher::build_client(&options.identity, options.performance.request_timeout)
      .map_err(|err| CrawlError::Configuration(err.message()))?;

    Ok(Arc::new(Self {
      queue: Arc::new(Queue::new()),
      classifier: SimilarityClassifier::new(),
      options,
      client,
      workers: SyncMutex::new(HashMap::new()),
      should_stop: AtomicBool::new(false),
      stopping: AtomicBool::new(false),
      stopped: AtomicBool::new(false),
      notify: Notify::new(),
      done_tx: OnceCell::new(),
      seed: OnceCell::new(),
    }))
  }

  /// Runs the crawl to completion: admits `seed`, then blocks until the
  /// queue drains or the crawl is stopped (spec.md §4.5, §6).
  pub async fn start_with(self: &Arc<Self>, mut seed: Request) -> Result<(), CrawlError> {
    if self.options.scope.request_methods.is_empty() {
      return Err(CrawlError::Configuration(
        "request_methods must not be empty".to_string(),
      ));
    }
    if !matches!(seed.url.scheme(), "http" | "https") {
      return Err(CrawlError::Configuration(format!(
        "seed url {} must use http or https",
        seed.url
      )));
    }

    seed.patch(
      &self.options.identity,
      self.options.performance.request_timeout,
    );
    let _ = self.seed.set(seed.clone());
    self.queue.add_request(seed);

    let (tx, mut rx) = mpsc::unbounded_channel();
    let _ = self.done_tx.set(tx);

    {
      let crawler = Arc::clone(self);
      tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
          crawler.should_stop.store(true, Ordering::SeqCst);
          crawler.notify.notify_one();
        }
      });
    }

    if let Some(hook) = &self.options.callbacks.crawler_before_start {
      dispatch(hook(), "crawler_before_start", ()).await;
    }

    self.spawn_new_requests().await;

    loop {
      if self.queue.len(QueueStatus::InProgress) == 0
        && self.queue.len(QueueStatus::Queued) == 0
      {
        break;
      }

      tokio::select! {
        Some(event) = rx.recv() => {
          self.on_worker_done(event).await;
          if self.should_stop.load(Ordering::SeqCst) {
            self.crawler_stop().await;
            return Ok(());
          }
        }
        _ = self.notify.notified() => {
          self.crawler_stop().await;
          return Ok(());
        }
      }
    }

    self.finish().await;
    Ok(())
  }

  /// While `|IN_PROGRESS| < max_threads`, promotes one `QUEUED` item at a
  /// time via `request_before_start` (spec.md §4.5).
  async fn spawn_new_requests(self: &Arc<Self>) {
    let tx = self
      .done_tx
      .get()
      .expect("start_with sets done_tx before spawning")
      .clone();

    loop {
      if self.queue.len(QueueStatus::InProgress) >= self.options.performance.max_threads {
        break;
      }
      let Some(item) = self.queue.get_first(QueueStatus::Queued) else {
        break;
      };

      let action = if let Some(hook) = &self.options.callbacks.request_before_start {
        dispatch(
          hook(self.queue.clone(), item.clone()),
          "request_before_start",
          None,
        )
        .await
      } else {
        None
      };

      match action {
        Some(RequestAction::StopCrawling) => {
          self.should_stop.store(true, Ordering::SeqCst);
          break;
        }
        Some(RequestAction::SkipToNext) => {
          self.queue.move_item(item.hash, QueueStatus::Finished);
          continue;
        }
        Some(RequestAction::Continue) | None => {
          self.queue.move_item(item.hash, QueueStatus::InProgress);
          self.spawn_worker(item, tx.clone());
        }
      }
    }

    if self.queue.len(QueueStatus::InProgress) == 0 {
      self.notify.notify_one();
    }
  }

  fn spawn_worker(self: &Arc<Self>, item: QueueItem, tx: mpsc::UnboundedSender<WorkerDone>) {
    let crawler = Arc::clone(self);
    tracing::debug!(url = %item.request.url, depth = item.depth, "request.started");
    let handle = tokio::spawn(async move {
      let hash = item.hash;
      match fetcher::fetch(&crawler.client, &crawler.options.callbacks, &item).await {
        Ok((response, children)) => {
          tracing::debug!(url = %item.request.url, status = %response.status, "request.finished");
          crawler.queue.attach_response(hash, response);
          let _ = tx.send(WorkerDone::Finished { hash, children });
        }
        Err(err) => {
          let message = err.message();
          tracing::warn!(url = %item.request.url, %message, "request.errored");
          let _ = tx.send(WorkerDone::Failed { hash, message });
        }
      }
    });
    self.workers.lock().insert(item.hash, handle);
  }

  /// Reconciles a completed worker with the queue and dispatches
  /// `request_on_error`/`request_after_finish` (spec.md §4.5).
  async fn on_worker_done(self: &Arc<Self>, event: WorkerDone) {
    if self.stopping.load(Ordering::SeqCst) {
      return;
    }

    let (hash, children, failure) = match event {
      WorkerDone::Finished { hash, children } => (hash, children, None),
      WorkerDone::Failed { hash, message } => (hash, Vec::new(), Some(message)),
    };

    self.workers.lock().remove(&hash);

    let Some(item) = self.queue.get(hash) else {
      return;
    };

    let admitted_children = if let Some(message) = failure {
      self.queue.move_item(hash, QueueStatus::Errored);
      if let Some(hook) = &self.options.callbacks.request_on_error {
        dispatch(hook(item.clone(), message), "request_on_error", ()).await;
      }
      Vec::new()
    } else {
      let seed = self
        .seed
        .get()
        .expect("seed is set before any worker is spawned")
        .clone();
      let admitted: Vec<QueueItem> = children
        .into_iter()
        .filter(|child| {
          scope::is_in_scope(
            child,
            &seed,
            &self.options.scope,
            &self.queue,
            &self.classifier,
          )
        })
        .map(|mut child| {
          child.patch(
            &self.options.identity,
            self.options.performance.request_timeout,
          );
          self.queue.add_request(child)
        })
        .collect();
      self.queue.move_item(hash, QueueStatus::Finished);
      admitted
    };

    let action = if let Some(hook) = &self.options.callbacks.request_after_finish {
      dispatch(
        hook(self.queue.clone(), item, admitted_children),
        "request_after_finish",
        None,
      )
      .await
    } else {
      None
    };

    match action {
      Some(FinishAction::StopCrawling) => {
        self.should_stop.store(true, Ordering::SeqCst);
        self.notify.notify_one();
      }
      _ => self.spawn_new_requests().await,
    }
  }

  /// Idempotent graceful stop: joins active workers, cancels whatever is
  /// left queued or in flight, and fires `crawler_after_finish` exactly
  /// once (spec.md §4.5, §8 "idempotent stop" law).
  async fn crawler_stop(self: &Arc<Self>) {
    if self.stopping.swap(true, Ordering::SeqCst) {
      return;
    }
    tracing::warn!("crawler.stopping");

    let handles: Vec<JoinHandle<()>> = self.workers.lock().drain().map(|(_, h)| h).collect();
    for handle in handles {
      let _ = handle.await;
    }

    self.queue.move_bulk(
      &[QueueStatus::Queued, QueueStatus::InProgress],
      QueueStatus::Cancelled,
    );

    self.finish().await;
  }

  async fn finish(self: &Arc<Self>) {
    if self.stopped.swap(true, Ordering::SeqCst) {
      return;
    }
    if let Some(hook) = &self.options.callbacks.crawler_after_finish {
      dispatch(hook(self.queue.clone()), "crawler_after_finish", ()).await;
    }
  }
}
