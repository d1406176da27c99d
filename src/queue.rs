//! Indexed multi-state store of [`QueueItem`]s.
//!
//! Five disjoint ordered buckets — one per [`QueueStatus`] — each keyed by
//! the item's identity hash and preserving insertion order for FIFO
//! dispatch, plus a `hash -> QueueStatus` index for O(1) membership tests.
//! All mutations are serialized under a single [`parking_lot::Mutex`],
//! shared with the scheduler, to avoid check-then-act races between
//! admission and dispatch (spec.md §4.1).

use indexmap::IndexMap;
use parking_lot::Mutex;

use crate::hash::request_hash;
use crate::request::Request;
use crate::response::Response;

/// Lifecycle state of a [`QueueItem`]. See spec.md §4.3 for the full state
/// machine; `Finished`, `Errored`, and `Cancelled` are terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum QueueStatus {
  Queued,
  InProgress,
  Finished,
  Errored,
  Cancelled,
}

impl QueueStatus {
  const ALL: [QueueStatus; 5] = [
    QueueStatus::Queued,
    QueueStatus::InProgress,
    QueueStatus::Finished,
    QueueStatus::Errored,
    QueueStatus::Cancelled,
  ];

  fn index(self) -> usize {
    match self {
      QueueStatus::Queued => 0,
      QueueStatus::InProgress => 1,
      QueueStatus::Finished => 2,
      QueueStatus::Errored => 3,
      QueueStatus::Cancelled => 4,
    }
  }
}

/// A request/response pair plus its lifecycle state and stable identity.
#[derive(Clone, Debug)]
pub struct QueueItem {
  pub request: Request,
  pub response: Option<Response>,
  pub status: QueueStatus,
  pub hash: u64,
  pub depth: u32,
}

impl QueueItem {
  fn new(request: Request) -> Self {
    let hash = request_hash(&request);
    let depth = request.depth;
    Self {
      request,
      response: None,
      status: QueueStatus::Queued,
      hash,
      depth,
    }
  }
}

struct Inner {
  buckets: [IndexMap<u64, QueueItem>; 5],
  index: std::collections::HashMap<u64, QueueStatus>,
  count_total: u64,
}

impl Default for Inner {
  fn default() -> Self {
    Self {
      buckets: std::array::from_fn(|_| IndexMap::new()),
      index: std::collections::HashMap::new(),
      count_total: 0,
    }
  }
}

/// The crawl's single source of truth for concurrency accounting.
pub struct Queue {
  inner: Mutex<Inner>,
}

impl Default for Queue {
  fn default() -> Self {
    Self::new()
  }
}

impl Queue {
  pub fn new() -> Self {
    Self {
      inner: Mutex::new(Inner::default()),
    }
  }

  /// Admits `request` to the queue in `Queued` state. Callers must check
  /// [`Queue::has_request`] first if admitting the same request twice
  /// would be unwanted — the queue itself does not deduplicate.
  pub fn add_request(&self, request: Request) -> QueueItem {
    let item = QueueItem::new(request);
    let mut inner = self.inner.lock();
    inner.buckets[QueueStatus::Queued.index()].insert(item.hash, item.clone());
    inner.index.insert(item.hash, QueueStatus::Queued);
    inner.count_total += 1;
    item
  }

  /// Membership by identity hash, across all five buckets.
  pub fn has_request(&self, request: &Request) -> bool {
    let hash = request_hash(request);
    self.inner.lock().index.contains_key(&hash)
  }

  /// Membership by identity hash, across all five buckets.
  pub fn has_hash(&self, hash: u64) -> bool {
    self.inner.lock().index.contains_key(&hash)
  }

  /// Looks up an item by hash regardless of which bucket holds it.
  pub fn get(&self, hash: u64) -> Option<QueueItem> {
    let inner = self.inner.lock();
    let status = *inner.index.get(&hash)?;
    inner.buckets[status.index()].get(&hash).cloned()
  }

  /// FIFO peek of the first item currently in `status`.
  pub fn get_first(&self, status: QueueStatus) -> Option<QueueItem> {
    let inner = self.inner.lock();
    inner.buckets[status.index()]
      .values()
      .next()
      .cloned()
  }

  /// All items currently in `status`, in FIFO order, keyed by hash.
  pub fn get_all(&self, status: QueueStatus) -> IndexMap<u64, QueueItem> {
    self.inner.lock().buckets[status.index()].clone()
  }

  /// Number of items currently in `status`.
  pub fn len(&self, status: QueueStatus) -> usize {
    self.inner.lock().buckets[status.index()].len()
  }

  /// Atomically moves `item` (by hash) into `new_status`.
  ///
  /// Returns `false` if the item is not present in any bucket.
  pub fn move_item(&self, hash: u64, new_status: QueueStatus) -> bool {
    let mut inner = self.inner.lock();
    let Some(&current) = inner.index.get(&hash) else {
      return false;
    };
    let Some(mut item) = inner.buckets[current.index()].shift_remove(&hash) else {
      return false;
    };
    item.status = new_status;
    inner.buckets[new_status.index()].insert(hash, item);
    inner.index.insert(hash, new_status);
    true
  }

  /// Attaches a response to an in-progress item without changing status.
  pub fn attach_response(&self, hash: u64, response: Response) {
    let mut inner = self.inner.lock();
    if let Some(&status) = inner.index.get(&hash) {
      if let Some(item) = inner.buckets[status.index()].get_mut(&hash) {
        item.response = Some(response);
      }
    }
  }

  /// Reclassifies every item currently in any of `statuses` into `new_status`.
  pub fn move_bulk(&self, statuses: &[QueueStatus], new_status: QueueStatus) {
    let mut inner = self.inner.lock();
    for &from in statuses {
      let hashes: Vec<u64> = inner.buckets[from.index()].keys().copied().collect();
      for hash in hashes {
        if let Some(mut item) = inner.buckets[from.index()].shift_remove(&hash) {
          item.status = new_status;
          inner.buckets[new_status.index()].insert(hash, item);
          inner.index.insert(hash, new_status);
        }
      }
    }
  }

  /// Percentage (0–100) of admitted items that have reached a terminal state.
  pub fn get_progress(&self) -> f64 {
    let inner = self.inner.lock();
    if inner.count_total == 0 {
      return 100.0;
    }
    let done = inner.buckets[QueueStatus::Finished.index()].len()
      + inner.buckets[QueueStatus::Errored.index()].len()
      + inner.buckets[QueueStatus::Cancelled.index()].len();
    (done as f64 / inner.count_total as f64) * 100.0
  }

  /// Monotonically increasing count of items ever admitted.
  pub fn count_total(&self) -> u64 {
    self.inner.lock().count_total
  }

  /// Sum of all bucket sizes — should always equal `count_total` (spec.md
  /// §8, invariant #1).
  pub fn total_enqueued(&self) -> usize {
    let inner = self.inner.lock();
    QueueStatus::ALL
      .iter()
      .map(|s| inner.buckets[s.index()].len())
      .sum()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use url::Url;

  fn req(path: &str) -> Request {
    Request::get(Url::parse(&format!("https://example.test{path}")).unwrap())
  }

  #[test]
  fn add_then_has_request() {
    let queue = Queue::new();
    let r = req("/a");
    assert!(!queue.has_request(&r));
    queue.add_request(r.clone());
    assert!(queue.has_request(&r));
  }

  #[test]
  fn move_item_crosses_buckets_atomically() {
    let queue = Queue::new();
    let item = queue.add_request(req("/a"));
    assert_eq!(queue.len(QueueStatus::Queued), 1);

    assert!(queue.move_item(item.hash, QueueStatus::InProgress));
    assert_eq!(queue.len(QueueStatus::Queued), 0);
    assert_eq!(queue.len(QueueStatus::InProgress), 1);
  }

  #[test]
  fn move_bulk_moves_every_matching_bucket() {
    let queue = Queue::new();
    let a = queue.add_request(req("/a"));
    let b = queue.add_request(req("/b"));
    queue.move_item(b.hash, QueueStatus::InProgress);

    queue.move_bulk(
      &[QueueStatus::Queued, QueueStatus::InProgress],
      QueueStatus::Cancelled,
    );

    assert_eq!(queue.len(QueueStatus::Cancelled), 2);
    assert_eq!(queue.len(QueueStatus::Queued), 0);
    assert_eq!(queue.len(QueueStatus::InProgress), 0);
    let _ = a;
  }

  #[test]
  fn progress_counts_terminal_states_only() {
    let queue = Queue::new();
    let a = queue.add_request(req("/a"));
    let _b = queue.add_request(req("/b"));
    assert_eq!(queue.get_progress(), 0.0);

    queue.move_item(a.hash, QueueStatus::InProgress);
    queue.move_item(a.hash, QueueStatus::Finished);
    assert_eq!(queue.get_progress(), 50.0);
  }

  #[test]
  fn total_enqueued_matches_count_total() {
    let queue = Queue::new();
    for i in 0..5 {
      queue.add_request(req(&format!("/{i}")));
    }
    assert_eq!(queue.total_enqueued() as u64, queue.count_total());
  }

  #[test]
  fn fifo_order_is_preserved() {
    let queue = Queue::new();
    queue.add_request(req("/a"));
    queue.add_request(req("/b"));
    let first = queue.get_first(QueueStatus::Queued).unwrap();
    assert_eq!(first.request.url.path(), "/a");
  }
}
