//! Structured logging for a crawl, gated behind the `scour-tracing` feature
//! so embedding binaries can install their own subscriber instead.
//!
//! Mirrors the teacher's `tako::tracing::init_tracing` shape (registry +
//! fmt layer + level filter) but picks the level from
//! [`crate::options::MiscOptions::debug`] rather than hardcoding `DEBUG`.

use tracing::level_filters::LevelFilter;
use tracing_subscriber::{
  Layer, fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt,
};

/// Initializes the global tracing subscriber with formatted output.
///
/// `debug` selects between `LevelFilter::DEBUG` and `LevelFilter::INFO`,
/// matching nyawc's `options.misc.debug` toggle.
pub fn init_tracing(debug: bool) {
  let level = if debug {
    LevelFilter::DEBUG
  } else {
    LevelFilter::INFO
  };

  tracing_subscriber::registry()
    .with(
      tracing_subscriber::fmt::layer()
        .with_span_events(FmtSpan::CLOSE)
        .with_file(true)
        .with_line_number(true)
        .with_level(true)
        .with_filter(level),
    )
    .init();
}
