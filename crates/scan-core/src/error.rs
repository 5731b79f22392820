//! Error types for the orchestrator.
//!
//! Per-call failures never surface here: they are recorded inside a
//! [`TickerRecord`](crate::TickerRecord) as a [`FailureKind`](crate::FailureKind).
//! These errors only cover conditions that stop a batch from starting.

use thiserror::Error;

use crate::types::{ServiceKind, MAX_TICKER_LEN};

/// Top-level orchestrator error.
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Universe error: {0}")]
    Universe(#[from] UniverseError),

    #[error("Call plan error: {0}")]
    Plan(#[from] PlanError),

    #[error("Service {service} failed pre-flight check: {detail}")]
    Unhealthy { service: ServiceKind, detail: String },

    #[error("Synthesis error: {0}")]
    Synthesis(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// A single ticker symbol failed validation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TickerError {
    #[error("ticker is empty")]
    Empty,

    #[error("ticker '{0}' is longer than {max} characters", max = MAX_TICKER_LEN)]
    TooLong(String),

    #[error("ticker '{value}' contains invalid character '{ch}'")]
    InvalidCharacter { value: String, ch: char },

    #[error("ticker '{0}' must start with a letter")]
    LeadingNonLetter(String),
}

/// Ticker universe input errors. Raised before any scheduling happens.
#[derive(Error, Debug)]
pub enum UniverseError {
    #[error("Ticker universe is empty")]
    Empty,

    #[error("Malformed ticker at entry {entry}: {source}")]
    Malformed {
        entry: usize,
        #[source]
        source: TickerError,
    },

    #[error("Universe file has no ticker column (expected one of: ticker, symbol)")]
    MissingColumn,

    #[error("Universe parse error: {0}")]
    Parse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Invalid per-ticker call plan.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlanError {
    #[error("service {0} appears more than once in the call plan")]
    DuplicateStep(ServiceKind),

    #[error("service {0} is missing from the call plan")]
    MissingStep(ServiceKind),

    #[error("service {step} cannot depend on itself")]
    SelfDependency { step: ServiceKind },

    #[error("service {step} consumes {dependency} output but does not depend on it")]
    MissingDataDependency {
        step: ServiceKind,
        dependency: ServiceKind,
    },

    #[error("call plan contains a dependency cycle through {0:?}")]
    Cycle(Vec<ServiceKind>),
}

/// Result type alias for orchestrator operations.
pub type ScanResult<T> = Result<T, ScanError>;
