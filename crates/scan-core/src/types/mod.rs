//! Core data types for the orchestrator.

mod batch;
mod outcome;
mod payload;
mod record;
mod request;
mod service;
mod ticker;

pub use batch::{BatchResult, BatchSummary};
pub use outcome::{FailureKind, ServiceFailure, ServiceOutcome};
pub use payload::{DailyBar, IndicatorSet, MarketData, OptionsMetrics, Payload, TechnicalIndicators};
pub use record::{Field, TickerRecord, TickerStatus};
pub use request::{RequestParams, ServiceRequest};
pub use service::{ServiceHealth, ServiceKind};
pub use ticker::{Ticker, MAX_TICKER_LEN};
