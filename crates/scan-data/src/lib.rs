//! Ticker universe input and batch output.

mod sink;
mod universe;

pub use sink::{JsonBatchSink, SinkTarget};
pub use universe::{load_universe, parse_tickers};

use scan_core::error::UniverseError;
use scan_core::types::Ticker;
use std::path::Path;

/// Resolve the universe from an explicit list, falling back to a file.
pub fn resolve_universe(
    tickers: &[String],
    file: Option<&Path>,
) -> Result<Vec<Ticker>, UniverseError> {
    match file {
        Some(path) if tickers.is_empty() => load_universe(path),
        _ => parse_tickers(tickers),
    }
}
