//! Scripted in-memory service for dry runs and tests.

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, NaiveDate};
use scan_core::traits::ServiceClient;
use scan_core::types::{
    DailyBar, FailureKind, IndicatorSet, MarketData, OptionsMetrics, Payload, RequestParams,
    ServiceHealth, ServiceKind, ServiceOutcome, ServiceRequest, TechnicalIndicators,
};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Scripted reply for one call.
#[derive(Debug, Clone)]
pub enum Scripted {
    /// Reply with a synthetic payload for the requested ticker
    Succeed,
    /// Reply with this exact payload
    Payload(Payload),
    /// Reply with a failure
    Fail(FailureKind, String),
    /// Never reply; relies on the caller to abandon the call
    Hang,
}

/// Tracks how many calls are active at once across any number of services.
#[derive(Debug, Default)]
pub struct ConcurrencyGauge {
    current: AtomicUsize,
    peak: AtomicUsize,
}

impl ConcurrencyGauge {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Mark one call active until the guard drops.
    pub fn enter(self: &Arc<Self>) -> GaugeGuard {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        GaugeGuard {
            gauge: Arc::clone(self),
        }
    }

    pub fn current(&self) -> usize {
        self.current.load(Ordering::SeqCst)
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

/// Active-call marker returned by [`ConcurrencyGauge::enter`].
pub struct GaugeGuard {
    gauge: Arc<ConcurrencyGauge>,
}

impl Drop for GaugeGuard {
    fn drop(&mut self) {
        self.gauge.current.fetch_sub(1, Ordering::SeqCst);
    }
}

/// In-memory service that replies from a script.
///
/// Per-ticker sequences are consumed first, then per-ticker fixed replies,
/// then the default reply.
pub struct ScriptedService {
    kind: ServiceKind,
    latency: Duration,
    default: Scripted,
    fixed: HashMap<String, Scripted>,
    sequences: Mutex<HashMap<String, VecDeque<Scripted>>>,
    calls: Mutex<Vec<ServiceRequest>>,
    gauge: Option<Arc<ConcurrencyGauge>>,
    health: ServiceHealth,
    health_delay: Duration,
}

impl ScriptedService {
    /// A service that succeeds for every ticker.
    pub fn new(kind: ServiceKind) -> Self {
        Self {
            kind,
            latency: Duration::ZERO,
            default: Scripted::Succeed,
            fixed: HashMap::new(),
            sequences: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            gauge: None,
            health: ServiceHealth::Healthy,
            health_delay: Duration::ZERO,
        }
    }

    /// Delay every reply.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Reply used when nothing more specific is scripted.
    pub fn with_default(mut self, reply: Scripted) -> Self {
        self.default = reply;
        self
    }

    /// Always reply this way for the given ticker.
    pub fn with_reply(mut self, ticker: &str, reply: Scripted) -> Self {
        self.fixed.insert(ticker.to_ascii_uppercase(), reply);
        self
    }

    /// Reply with these, in order, before falling back.
    pub fn with_sequence(self, ticker: &str, replies: Vec<Scripted>) -> Self {
        lock(&self.sequences).insert(ticker.to_ascii_uppercase(), replies.into());
        self
    }

    /// Report calls to a shared concurrency gauge.
    pub fn with_gauge(mut self, gauge: Arc<ConcurrencyGauge>) -> Self {
        self.gauge = Some(gauge);
        self
    }

    /// Fail liveness checks.
    pub fn unhealthy(mut self, detail: &str) -> Self {
        self.health = ServiceHealth::Unhealthy(detail.to_string());
        self
    }

    /// Delay liveness check replies.
    pub fn with_health_delay(mut self, delay: Duration) -> Self {
        self.health_delay = delay;
        self
    }

    /// Number of calls received for a ticker.
    pub fn calls_for(&self, ticker: &str) -> usize {
        lock(&self.calls)
            .iter()
            .filter(|r| r.ticker.as_str().eq_ignore_ascii_case(ticker))
            .count()
    }

    /// Number of calls received in total.
    pub fn total_calls(&self) -> usize {
        lock(&self.calls).len()
    }

    /// Requests received, in arrival order.
    pub fn requests(&self) -> Vec<ServiceRequest> {
        lock(&self.calls).clone()
    }

    fn next_reply(&self, ticker: &str) -> Scripted {
        if let Some(reply) = lock(&self.sequences)
            .get_mut(ticker)
            .and_then(VecDeque::pop_front)
        {
            return reply;
        }
        self.fixed
            .get(ticker)
            .cloned()
            .unwrap_or_else(|| self.default.clone())
    }

    fn synthesize(&self, request: &ServiceRequest) -> Payload {
        let ticker = request.ticker.to_string();
        match &request.params {
            RequestParams::MarketData { lookback_days } => {
                Payload::MarketData(synthetic_bars(ticker, *lookback_days))
            }
            RequestParams::Technical { .. } => Payload::Technical(TechnicalIndicators {
                ticker,
                patterns: vec![],
                indicators: IndicatorSet {
                    rsi: 52.4,
                    macd: 0.85,
                    bb_high: 106.2,
                    bb_low: 97.8,
                    hv_30d_annualized: 24.0,
                },
            }),
            RequestParams::Options {
                historical_volatility,
                ..
            } => {
                let atm_iv_percent = 28.5;
                Payload::Options(OptionsMetrics {
                    ticker,
                    atm_iv_percent,
                    iv_hv_spread_percent: atm_iv_percent - historical_volatility,
                    skew_25_delta: 1.9,
                })
            }
        }
    }
}

#[async_trait]
impl ServiceClient for ScriptedService {
    fn kind(&self) -> ServiceKind {
        self.kind
    }

    async fn call(&self, request: &ServiceRequest) -> ServiceOutcome {
        let _active = self.gauge.as_ref().map(|p| p.enter());
        lock(&self.calls).push(request.clone());
        let reply = self.next_reply(request.ticker.as_str());

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        match reply {
            Scripted::Succeed => ServiceOutcome::Success(self.synthesize(request)),
            Scripted::Payload(payload) => ServiceOutcome::Success(payload),
            Scripted::Fail(kind, detail) => ServiceOutcome::failure(kind, detail),
            Scripted::Hang => std::future::pending().await,
        }
    }

    async fn health(&self) -> ServiceHealth {
        if !self.health_delay.is_zero() {
            tokio::time::sleep(self.health_delay).await;
        }
        self.health.clone()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn synthetic_bars(ticker: String, lookback_days: u32) -> MarketData {
    let start = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap_or(NaiveDate::MIN);
    let bars = (0..lookback_days.min(5))
        .map(|i| {
            let close = 100.0 + i as f64 * 0.5;
            DailyBar {
                date: start + ChronoDuration::days(i64::from(i)),
                open: close - 0.4,
                high: close + 1.0,
                low: close - 1.0,
                close,
                volume: 1_000_000.0,
            }
        })
        .collect();
    MarketData { ticker, bars }
}
