//! Per-ticker aggregation.

use chrono::NaiveDate;
use futures::stream::{FuturesUnordered, StreamExt};
use scan_core::traits::ServiceSet;
use scan_core::types::{
    FailureKind, Payload, RequestParams, ServiceFailure, ServiceKind, ServiceOutcome,
    ServiceRequest, Ticker, TickerRecord,
};
use std::collections::{HashMap, HashSet};
use tracing::debug;

use crate::limiter::RateLimiter;
use crate::plan::{CallPlan, CallStep};
use crate::retry::RetryPolicy;

/// Request parameters shared by every ticker in a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestDefaults {
    pub lookback_days: u32,
    pub as_of: Option<NaiveDate>,
}

impl Default for RequestDefaults {
    fn default() -> Self {
        Self {
            lookback_days: 90,
            as_of: None,
        }
    }
}

/// Drives one ticker's service calls and merges them into a record.
///
/// Calls follow the [`CallPlan`]: a step starts once every step it depends
/// on has settled, and independent steps run concurrently. Each call goes
/// through the shared [`RateLimiter`] and the [`RetryPolicy`]. A failure in
/// one service never stops the others, except that a step whose dependency
/// failed is recorded without being called.
pub struct TickerAggregator {
    services: ServiceSet,
    plan: CallPlan,
    retry: RetryPolicy,
    defaults: RequestDefaults,
    skipped: HashSet<ServiceKind>,
}

impl TickerAggregator {
    pub fn new(
        services: ServiceSet,
        plan: CallPlan,
        retry: RetryPolicy,
        defaults: RequestDefaults,
    ) -> Self {
        Self {
            services,
            plan,
            retry,
            defaults,
            skipped: HashSet::new(),
        }
    }

    /// Never call these services; record them as skipped instead.
    pub fn skipping(mut self, skipped: HashSet<ServiceKind>) -> Self {
        self.skipped = skipped;
        self
    }

    /// Produce the record for one ticker. Never fails.
    pub async fn aggregate(&self, ticker: &Ticker, limiter: &RateLimiter) -> TickerRecord {
        let mut settled: HashMap<ServiceKind, ServiceOutcome> = HashMap::new();
        let mut started: HashSet<ServiceKind> = HashSet::new();
        let mut running = FuturesUnordered::new();

        loop {
            // Steps settled without a call can unlock further steps.
            loop {
                let done: HashSet<ServiceKind> = settled.keys().copied().collect();
                let ready: Vec<&CallStep> = self
                    .plan
                    .steps()
                    .iter()
                    .filter(|s| !started.contains(&s.service) && s.is_ready(&done))
                    .collect();
                if ready.is_empty() {
                    break;
                }

                for step in ready {
                    started.insert(step.service);
                    match self.prepare(ticker, step, &settled) {
                        Ok(request) => running.push(self.dispatch(request, limiter)),
                        Err(failure) => {
                            debug!("{} {} not called: {}", step.service, ticker, failure);
                            settled.insert(step.service, ServiceOutcome::Failure(failure));
                        }
                    }
                }
            }

            match running.next().await {
                Some((service, outcome)) => {
                    settled.insert(service, outcome);
                }
                None => break,
            }
        }

        let mut take = |kind: ServiceKind| {
            settled.remove(&kind).unwrap_or_else(|| {
                ServiceOutcome::failure(FailureKind::Skipped, "not scheduled by call plan")
            })
        };
        let market_data = take(ServiceKind::MarketData);
        let technical = take(ServiceKind::Technical);
        let options = take(ServiceKind::Options);

        let record = TickerRecord::assemble(ticker.clone(), market_data, technical, options);
        debug!("{} settled as {}", ticker, record.status());
        record
    }

    /// Build the request for a ready step, or the failure recorded in its place.
    fn prepare(
        &self,
        ticker: &Ticker,
        step: &CallStep,
        settled: &HashMap<ServiceKind, ServiceOutcome>,
    ) -> Result<ServiceRequest, ServiceFailure> {
        if self.skipped.contains(&step.service) {
            return Err(ServiceFailure::new(
                FailureKind::Skipped,
                format!("{} failed pre-flight health check", step.service),
            ));
        }

        for dependency in &step.depends_on {
            if let Some(ServiceOutcome::Failure(upstream)) = settled.get(dependency) {
                return Err(ServiceFailure::new(
                    FailureKind::DependencyFailed,
                    format!("{} did not succeed ({})", dependency, upstream.kind),
                ));
            }
        }

        let params = match step.service {
            ServiceKind::MarketData => RequestParams::MarketData {
                lookback_days: self.defaults.lookback_days,
            },
            ServiceKind::Technical => RequestParams::Technical {
                as_of: self.defaults.as_of,
            },
            ServiceKind::Options => {
                let technical = match settled.get(&ServiceKind::Technical) {
                    Some(ServiceOutcome::Success(Payload::Technical(t))) => t,
                    _ => {
                        return Err(ServiceFailure::new(
                            FailureKind::DependencyFailed,
                            "technical-analysis payload unavailable",
                        ))
                    }
                };
                let stock_price = match settled.get(&ServiceKind::MarketData) {
                    Some(ServiceOutcome::Success(Payload::MarketData(m))) => m.last_close(),
                    _ => None,
                };
                let Some(stock_price) = stock_price else {
                    return Err(ServiceFailure::new(
                        FailureKind::DependencyFailed,
                        "market-data returned no price bars",
                    ));
                };
                RequestParams::Options {
                    historical_volatility: technical.indicators.hv_30d_annualized,
                    stock_price,
                }
            }
        };

        Ok(ServiceRequest::new(ticker.clone(), params))
    }

    /// Issue one request under the limiter, with retries.
    async fn dispatch(
        &self,
        request: ServiceRequest,
        limiter: &RateLimiter,
    ) -> (ServiceKind, ServiceOutcome) {
        let service = request.kind();
        let client = self.services.get(service);
        let req = &request;

        let outcome = self
            .retry
            .run(service, &request.ticker, move || async move {
                match limiter.acquire().await {
                    Ok(slot) => {
                        let outcome = client.call(req).await;
                        drop(slot);
                        outcome
                    }
                    Err(closed) => ServiceOutcome::failure(FailureKind::Cancelled, closed.to_string()),
                }
            })
            .await;

        (service, check_payload(service, outcome))
    }
}

/// A success must carry the payload of the service that was called.
fn check_payload(service: ServiceKind, outcome: ServiceOutcome) -> ServiceOutcome {
    match outcome.payload().map(Payload::kind) {
        Some(kind) if kind != service => ServiceOutcome::Failure(
            ServiceFailure::new(
                FailureKind::BadResponse,
                format!("{} returned a {} payload", service, kind),
            )
            .with_attempts(1),
        ),
        _ => outcome,
    }
}
