//! Batch orchestration.
//!
//! Fans a universe of tickers out across the backend services under one
//! shared concurrency ceiling, then collects the per-ticker records back
//! into input order. Cancellation and the batch deadline stop collection
//! early; tickers that have not settled by then are recorded as
//! interrupted rather than dropped.

use chrono::Utc;
use futures::future::join_all;
use futures::stream::{FuturesUnordered, StreamExt};
use scan_core::error::{ScanError, ScanResult, UniverseError};
use scan_core::traits::{ServiceSet, SynthesisStage};
use scan_core::types::{
    BatchResult, BatchSummary, FailureKind, ServiceHealth, ServiceKind, Ticker, TickerRecord,
};
use std::collections::{HashMap, HashSet};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::aggregator::{RequestDefaults, TickerAggregator};
use crate::config::{EngineConfig, PreflightPolicy};
use crate::limiter::RateLimiter;
use crate::plan::CallPlan;

pub struct BatchOrchestrator {
    services: ServiceSet,
    plan: CallPlan,
    config: EngineConfig,
}

impl BatchOrchestrator {
    pub fn new(services: ServiceSet, config: EngineConfig) -> Self {
        Self {
            services,
            plan: CallPlan::default(),
            config,
        }
    }

    /// Use a custom call plan instead of the default one.
    pub fn with_plan(mut self, plan: CallPlan) -> Self {
        self.plan = plan;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Liveness of every backend service, in service order.
    pub async fn check_health(&self) -> Vec<(ServiceKind, ServiceHealth)> {
        let checks = self.services.iter().map(|client| async move {
            let health = client.health().await;
            (client.kind(), health)
        });
        join_all(checks).await
    }

    /// Services to leave out of this run according to the pre-flight policy.
    async fn preflight(&self) -> ScanResult<HashSet<ServiceKind>> {
        let mut skipped = HashSet::new();
        if self.config.preflight == PreflightPolicy::Proceed {
            return Ok(skipped);
        }

        for (service, health) in self.check_health().await {
            let ServiceHealth::Unhealthy(detail) = health else {
                continue;
            };
            match self.config.preflight {
                PreflightPolicy::Abort => return Err(ScanError::Unhealthy { service, detail }),
                _ => {
                    warn!("Skipping {} for this run: {}", service, detail);
                    skipped.insert(service);
                }
            }
        }
        Ok(skipped)
    }

    /// Run a batch over `tickers`.
    ///
    /// The result holds one record per input position, in input order.
    /// Duplicate tickers are aggregated once and share a record. Returns an
    /// error only for an empty universe or a failed pre-flight abort;
    /// service failures are recorded per ticker. Cancellation and the batch
    /// deadline also cover the pre-flight check.
    pub async fn run(&self, tickers: &[Ticker], cancel: &CancellationToken) -> ScanResult<BatchResult> {
        if tickers.is_empty() {
            return Err(UniverseError::Empty.into());
        }
        let started_at = Utc::now();

        let deadline = async {
            match self.config.batch_timeout {
                Some(timeout) => tokio::time::sleep(timeout).await,
                None => std::future::pending::<()>().await,
            }
        };
        tokio::pin!(deadline);

        let mut skipped = HashSet::new();
        let stopped_early = tokio::select! {
            biased;
            _ = cancel.cancelled() => Some(FailureKind::Cancelled),
            _ = &mut deadline => Some(FailureKind::BatchTimeout),
            checked = self.preflight() => {
                skipped = checked?;
                None
            }
        };

        let mut positions = Vec::with_capacity(tickers.len());
        let mut index: HashMap<&Ticker, usize> = HashMap::new();
        let mut distinct: Vec<&Ticker> = Vec::new();
        for ticker in tickers {
            let next = distinct.len();
            let slot = *index.entry(ticker).or_insert(next);
            if slot == next {
                distinct.push(ticker);
            }
            positions.push(slot);
        }

        let limiter = RateLimiter::new(self.config.max_concurrency);
        let aggregator = TickerAggregator::new(
            self.services.clone(),
            self.plan.clone(),
            self.config.retry.clone(),
            RequestDefaults {
                lookback_days: self.config.lookback_days,
                as_of: self.config.as_of,
            },
        )
        .skipping(skipped);

        let mut settled: Vec<Option<TickerRecord>> = vec![None; distinct.len()];
        let interruption = if let Some(kind) = stopped_early {
            info!("Stopped during pre-flight check ({})", kind);
            Some(kind)
        } else {
            info!(
                "Starting batch: {} tickers ({} distinct), {} calls in flight max",
                tickers.len(),
                distinct.len(),
                limiter.ceiling()
            );

            let aggregator = &aggregator;
            let limiter = &limiter;
            let mut pending: FuturesUnordered<_> = distinct
                .iter()
                .copied()
                .enumerate()
                .map(move |(i, ticker)| async move { (i, aggregator.aggregate(ticker, limiter).await) })
                .collect();

            loop {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break Some(FailureKind::Cancelled),
                    _ = &mut deadline => break Some(FailureKind::BatchTimeout),
                    next = pending.next() => match next {
                        Some((i, record)) => settled[i] = Some(record),
                        None => break None,
                    },
                }
            }
        };

        if let Some(kind) = interruption {
            limiter.close();
            let unsettled = settled.iter().filter(|r| r.is_none()).count();
            warn!("Batch interrupted ({}): {} tickers unsettled", kind, unsettled);
        }

        let interrupted_as = interruption.unwrap_or(FailureKind::Cancelled);
        let by_ticker: Vec<TickerRecord> = distinct
            .iter()
            .zip(settled)
            .map(|(ticker, record)| {
                record.unwrap_or_else(|| TickerRecord::interrupted((*ticker).clone(), interrupted_as))
            })
            .collect();
        let records = positions.iter().map(|&i| by_ticker[i].clone()).collect();

        let batch = BatchResult::new(started_at, records, limiter.peak(), interruption);
        let summary = batch.summary();
        info!(
            "Batch {} finished: {} complete, {} partial, {} failed (peak {} in flight)",
            batch.run_id(),
            summary.complete,
            summary.partial,
            summary.failed,
            batch.peak_in_flight()
        );
        Ok(batch)
    }

    /// Run a batch and hand the result to the synthesis stage.
    pub async fn run_into(
        &self,
        tickers: &[Ticker],
        cancel: &CancellationToken,
        stage: &dyn SynthesisStage,
    ) -> ScanResult<BatchSummary> {
        let batch = self.run(tickers, cancel).await?;
        let summary = batch.summary();
        info!("Handing batch {} to {}", batch.run_id(), stage.name());
        stage.synthesize(batch).await?;
        Ok(summary)
    }
}
