#![cfg_attr(docsrs, feature(doc_cfg))]

//! A concurrent, scope-aware web crawler engine.
//!
//! `scour` drives a crawl from a single seed [`Request`] to completion: it
//! owns a [`Queue`] of discovered requests, bounds concurrency at
//! `max_threads`, filters every discovered link through a configurable
//! [`scope`] predicate plus a similarity classifier, and reports progress
//! through a set of optional lifecycle [`callbacks`].
//!
//! # Quickstart
//!
//! ```rust,no_run
//! use scour::{Crawler, CrawlerOptions, QueueStatus, Request};
//! use url::Url;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let crawler = Crawler::new(CrawlerOptions::default())?;
//! let seed = Request::get(Url::parse("https://example.com/")?);
//! crawler.start_with(seed).await?;
//!
//! for (_, item) in crawler.queue.get_all(QueueStatus::Finished) {
//!     println!("{}", item.request.url);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Key concepts
//! - [queue::Queue] is the crawl's single source of truth: five FIFO
//!   buckets (`QUEUED`, `IN_PROGRESS`, `FINISHED`, `ERRORED`, `CANCELLED`)
//!   keyed by a normalized request identity hash.
//! - [scope] decides which discovered links are admitted (protocol,
//!   subdomain, hostname, TLD, depth, dedup, similarity).
//! - [fetcher] performs the HTTP round-trip and extracts child requests
//!   (links, forms) from HTML responses.
//! - [scheduler::Crawler] is the actor that ties the above together,
//!   bounding concurrency and driving termination.
//! - [callbacks] lets embedding code observe and steer the crawl without
//!   touching scour's internals.
//!
//! # Feature flags
//! - `scour-tracing` — installs a `tracing-subscriber` formatted layer via
//!   `scour::tracing::init_tracing`; omit it to wire up your own subscriber.

/// Built-in form auto-fill value table.
pub mod autofill;

/// User-supplied lifecycle hooks and the actions they can return.
pub mod callbacks;

/// Error types returned by the fetcher and the scheduler.
pub mod error;

/// HTTP fetch and HTML link/form extraction.
pub mod fetcher;

/// Request identity hashing and URL normalization.
pub mod hash;

/// Crawl-wide configuration (identity, performance, misc, scope, callbacks).
pub mod options;

/// Indexed multi-state store of queue items.
pub mod queue;

/// HTTP request value type.
pub mod request;

/// HTTP response value type.
pub mod response;

/// The scheduler actor (`Crawler`).
pub mod scheduler;

/// Scope filter: protocol/subdomain/hostname/TLD/depth/dedup predicates.
pub mod scope;

/// Feature-vector similarity classifier used by the scope filter.
pub mod similarity;

/// Minimal registrable-domain / public-suffix helpers.
pub mod suffix;

/// Structured logging setup, gated behind the `scour-tracing` feature.
#[cfg(feature = "scour-tracing")]
#[cfg_attr(docsrs, doc(cfg(feature = "scour-tracing")))]
pub mod tracing;

pub use callbacks::{Callbacks, FinishAction, FormAction, RequestAction};
pub use error::{CrawlError, FetchError};
pub use options::{Auth, CrawlerOptions, IdentityOptions, MiscOptions, PerformanceOptions};
pub use queue::{Queue, QueueItem, QueueStatus};
pub use request::{Body, Request};
pub use response::Response;
pub use scheduler::Crawler;
pub use scope::ScopeOptions;
pub use similarity::SimilarityClassifier;
