//! Batch results handed to the synthesis stage.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

use super::{FailureKind, Ticker, TickerRecord, TickerStatus};

/// Status counts over the distinct tickers of a batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub distinct: usize,
    pub complete: usize,
    pub partial: usize,
    pub failed: usize,
}

impl BatchSummary {
    fn tally<'a>(records: impl Iterator<Item = &'a TickerRecord>) -> Self {
        let mut seen: HashSet<&Ticker> = HashSet::new();
        let mut summary = BatchSummary::default();
        for record in records {
            if !seen.insert(record.ticker()) {
                continue;
            }
            summary.distinct += 1;
            match record.status() {
                TickerStatus::Complete => summary.complete += 1,
                TickerStatus::Partial => summary.partial += 1,
                TickerStatus::Failed => summary.failed += 1,
            }
        }
        summary
    }
}

/// Outcome of one batch run.
///
/// Holds one record per input position, in input order. Duplicate input
/// tickers share identical records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchResult {
    run_id: Uuid,
    started_at: DateTime<Utc>,
    finished_at: DateTime<Utc>,
    summary: BatchSummary,
    /// Highest number of service calls observed in flight at once
    peak_in_flight: usize,
    /// Set when the run was cut short by a deadline or cancellation
    interruption: Option<FailureKind>,
    records: Vec<TickerRecord>,
}

impl BatchResult {
    pub fn new(
        started_at: DateTime<Utc>,
        records: Vec<TickerRecord>,
        peak_in_flight: usize,
        interruption: Option<FailureKind>,
    ) -> Self {
        let summary = BatchSummary::tally(records.iter());
        Self {
            run_id: Uuid::new_v4(),
            started_at,
            finished_at: Utc::now(),
            summary,
            peak_in_flight,
            interruption,
            records,
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn finished_at(&self) -> DateTime<Utc> {
        self.finished_at
    }

    pub fn summary(&self) -> BatchSummary {
        self.summary
    }

    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight
    }

    pub fn interruption(&self) -> Option<FailureKind> {
        self.interruption
    }

    pub fn records(&self) -> &[TickerRecord] {
        &self.records
    }

    /// Number of input positions.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
