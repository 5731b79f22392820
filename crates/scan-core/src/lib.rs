//! Core types and traits for the market scan orchestrator.
//!
//! This crate provides the foundational building blocks including:
//! - Tickers and the backend service catalogue
//! - Typed service requests, payloads and outcomes
//! - Per-ticker records and the batch result handed to synthesis
//! - Core traits for service clients and the synthesis stage

pub mod types;
pub mod traits;
pub mod error;

pub use error::{PlanError, ScanError, ScanResult, TickerError, UniverseError};
pub use types::*;
pub use traits::*;
