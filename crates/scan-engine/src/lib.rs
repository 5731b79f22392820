//! Batch orchestration engine.
//!
//! Fans per-ticker aggregations out under one shared [`RateLimiter`],
//! retries transient service failures with a [`RetryPolicy`], and collects
//! every ticker into a single [`BatchResult`](scan_core::BatchResult).

mod aggregator;
mod config;
mod limiter;
mod orchestrator;
mod plan;
mod report;
mod retry;

pub use aggregator::{RequestDefaults, TickerAggregator};
pub use config::{EngineConfig, PreflightPolicy};
pub use limiter::{LimiterClosed, RateLimiter, Slot};
pub use orchestrator::BatchOrchestrator;
pub use plan::{CallPlan, CallStep};
pub use report::render_summary;
pub use retry::RetryPolicy;
