//! Merged per-ticker records.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{
    FailureKind, MarketData, OptionsMetrics, Payload, ServiceFailure, ServiceKind,
    ServiceOutcome, TechnicalIndicators, Ticker,
};

/// One service's contribution to a ticker record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", content = "value", rename_all = "snake_case")]
pub enum Field<T> {
    Present(T),
    Absent(ServiceFailure),
}

impl<T> Field<T> {
    pub fn is_present(&self) -> bool {
        matches!(self, Field::Present(_))
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Field::Present(v) => Some(v),
            Field::Absent(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&ServiceFailure> {
        match self {
            Field::Present(_) => None,
            Field::Absent(f) => Some(f),
        }
    }
}

/// Ticker-level status derived from the service fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TickerStatus {
    /// Every service succeeded
    Complete,
    /// At least one service succeeded and at least one failed
    Partial,
    /// No service succeeded
    Failed,
}

impl TickerStatus {
    fn derive(present: usize, total: usize) -> Self {
        if present == total {
            TickerStatus::Complete
        } else if present == 0 {
            TickerStatus::Failed
        } else {
            TickerStatus::Partial
        }
    }
}

impl fmt::Display for TickerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TickerStatus::Complete => "complete",
            TickerStatus::Partial => "partial",
            TickerStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// The merged result for one ticker.
///
/// Built once, from settled outcomes, and never modified afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickerRecord {
    ticker: Ticker,
    status: TickerStatus,
    market_data: Field<MarketData>,
    technical: Field<TechnicalIndicators>,
    options: Field<OptionsMetrics>,
}

impl TickerRecord {
    /// Merge one settled outcome per service into a record.
    ///
    /// A success carrying another service's payload is recorded as a bad
    /// response for the slot it arrived in.
    pub fn assemble(
        ticker: Ticker,
        market_data: ServiceOutcome,
        technical: ServiceOutcome,
        options: ServiceOutcome,
    ) -> Self {
        let market_data = into_field(ServiceKind::MarketData, market_data, |p| match p {
            Payload::MarketData(v) => Ok(v),
            other => Err(other),
        });
        let technical = into_field(ServiceKind::Technical, technical, |p| match p {
            Payload::Technical(v) => Ok(v),
            other => Err(other),
        });
        let options = into_field(ServiceKind::Options, options, |p| match p {
            Payload::Options(v) => Ok(v),
            other => Err(other),
        });

        let present = [
            market_data.is_present(),
            technical.is_present(),
            options.is_present(),
        ]
        .iter()
        .filter(|p| **p)
        .count();

        Self {
            ticker,
            status: TickerStatus::derive(present, ServiceKind::ALL.len()),
            market_data,
            technical,
            options,
        }
    }

    /// Record for a ticker that never settled because the batch was cut short.
    pub fn interrupted(ticker: Ticker, kind: FailureKind) -> Self {
        let detail = match kind {
            FailureKind::BatchTimeout => "batch deadline expired before ticker settled",
            FailureKind::Cancelled => "batch cancelled before ticker settled",
            _ => "ticker did not settle",
        };
        Self::assemble(
            ticker,
            ServiceOutcome::failure(kind, detail),
            ServiceOutcome::failure(kind, detail),
            ServiceOutcome::failure(kind, detail),
        )
    }

    pub fn ticker(&self) -> &Ticker {
        &self.ticker
    }

    pub fn status(&self) -> TickerStatus {
        self.status
    }

    pub fn market_data(&self) -> &Field<MarketData> {
        &self.market_data
    }

    pub fn technical(&self) -> &Field<TechnicalIndicators> {
        &self.technical
    }

    pub fn options(&self) -> &Field<OptionsMetrics> {
        &self.options
    }

    /// Whether the given service contributed a payload.
    pub fn is_present(&self, service: ServiceKind) -> bool {
        self.failure(service).is_none()
    }

    /// Failure recorded for the given service, if it did not contribute.
    pub fn failure(&self, service: ServiceKind) -> Option<&ServiceFailure> {
        match service {
            ServiceKind::MarketData => self.market_data.failure(),
            ServiceKind::Technical => self.technical.failure(),
            ServiceKind::Options => self.options.failure(),
        }
    }

    /// All recorded failures, in service order.
    pub fn failures(&self) -> Vec<(ServiceKind, &ServiceFailure)> {
        ServiceKind::ALL
            .iter()
            .filter_map(|kind| self.failure(*kind).map(|f| (*kind, f)))
            .collect()
    }
}

fn into_field<T>(
    service: ServiceKind,
    outcome: ServiceOutcome,
    extract: impl FnOnce(Payload) -> Result<T, Payload>,
) -> Field<T> {
    match outcome {
        ServiceOutcome::Success(payload) => match extract(payload) {
            Ok(value) => Field::Present(value),
            Err(other) => Field::Absent(ServiceFailure::new(
                FailureKind::BadResponse,
                format!("expected {} payload, got {}", service, other.kind()),
            )),
        },
        ServiceOutcome::Failure(failure) => Field::Absent(failure),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DailyBar, IndicatorSet};
    use chrono::NaiveDate;

    fn market(ticker: &str) -> ServiceOutcome {
        ServiceOutcome::Success(Payload::MarketData(MarketData {
            ticker: ticker.to_string(),
            bars: vec![DailyBar {
                date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
                open: 100.0,
                high: 102.0,
                low: 99.0,
                close: 101.0,
                volume: 1_000_000.0,
            }],
        }))
    }

    fn technical(ticker: &str) -> ServiceOutcome {
        ServiceOutcome::Success(Payload::Technical(TechnicalIndicators {
            ticker: ticker.to_string(),
            patterns: vec![],
            indicators: IndicatorSet {
                rsi: 55.0,
                macd: 0.4,
                bb_high: 105.0,
                bb_low: 95.0,
                hv_30d_annualized: 24.0,
            },
        }))
    }

    fn options(ticker: &str) -> ServiceOutcome {
        ServiceOutcome::Success(Payload::Options(OptionsMetrics {
            ticker: ticker.to_string(),
            atm_iv_percent: 30.0,
            iv_hv_spread_percent: 6.0,
            skew_25_delta: 1.5,
        }))
    }

    fn ticker() -> Ticker {
        Ticker::parse("AAPL").unwrap()
    }

    #[test]
    fn test_all_present_is_complete() {
        let record = TickerRecord::assemble(ticker(), market("AAPL"), technical("AAPL"), options("AAPL"));
        assert_eq!(record.status(), TickerStatus::Complete);
        assert!(record.failures().is_empty());
        assert_eq!(record.options().value().unwrap().atm_iv_percent, 30.0);
    }

    #[test]
    fn test_one_failure_is_partial() {
        let record = TickerRecord::assemble(
            ticker(),
            market("AAPL"),
            technical("AAPL"),
            ServiceOutcome::failure(FailureKind::ServiceError, "404: no options"),
        );
        assert_eq!(record.status(), TickerStatus::Partial);
        let failure = record.failure(ServiceKind::Options).unwrap();
        assert_eq!(failure.kind, FailureKind::ServiceError);
        assert!(record.is_present(ServiceKind::MarketData));
    }

    #[test]
    fn test_no_success_is_failed() {
        let record = TickerRecord::interrupted(ticker(), FailureKind::Cancelled);
        assert_eq!(record.status(), TickerStatus::Failed);
        assert_eq!(record.failures().len(), 3);
        assert!(record
            .failures()
            .iter()
            .all(|(_, f)| f.kind == FailureKind::Cancelled && f.attempts == 0));
    }

    #[test]
    fn test_mismatched_payload_is_bad_response() {
        let record = TickerRecord::assemble(ticker(), technical("AAPL"), technical("AAPL"), options("AAPL"));
        assert_eq!(record.status(), TickerStatus::Partial);
        let failure = record.failure(ServiceKind::MarketData).unwrap();
        assert_eq!(failure.kind, FailureKind::BadResponse);
        assert!(failure.detail.contains("technical-analysis"));
    }

    #[test]
    fn test_serializes_absence_explicitly() {
        let record = TickerRecord::interrupted(ticker(), FailureKind::BatchTimeout);
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["options"]["state"], "absent");
        assert_eq!(json["options"]["value"]["kind"], "batch_timeout");
    }
}
