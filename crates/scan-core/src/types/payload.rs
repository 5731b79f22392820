//! Typed backend payloads.
//!
//! Each backend returns a fixed record shape. Required fields are declared
//! here; a response that does not deserialize into its record is treated as
//! a bad response rather than passed through.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::ServiceKind;

/// One daily OHLCV bar as reported by the market-data service.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Price history for one ticker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketData {
    pub ticker: String,
    /// Bars ordered oldest to newest
    #[serde(rename = "data")]
    pub bars: Vec<DailyBar>,
}

impl MarketData {
    /// Most recent close, if any bars were returned.
    pub fn last_close(&self) -> Option<f64> {
        self.bars.last().map(|b| b.close)
    }

    /// Average daily volume over the returned window.
    pub fn average_volume(&self) -> Option<f64> {
        if self.bars.is_empty() {
            return None;
        }
        let total: f64 = self.bars.iter().map(|b| b.volume).sum();
        Some(total / self.bars.len() as f64)
    }
}

/// Indicator values from the technical-analysis service.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSet {
    #[serde(rename = "RSI")]
    pub rsi: f64,
    #[serde(rename = "MACD")]
    pub macd: f64,
    #[serde(rename = "BB_High")]
    pub bb_high: f64,
    #[serde(rename = "BB_Low")]
    pub bb_low: f64,
    /// 30-day historical volatility, annualized, in percent
    #[serde(rename = "HV_30D_Annualized")]
    pub hv_30d_annualized: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechnicalIndicators {
    pub ticker: String,
    #[serde(default)]
    pub patterns: Vec<String>,
    pub indicators: IndicatorSet,
}

/// Volatility metrics from the options-analysis service. All values in percent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionsMetrics {
    pub ticker: String,
    pub atm_iv_percent: f64,
    pub iv_hv_spread_percent: f64,
    /// Put IV minus call IV at 25 delta; positive means puts are bid
    pub skew_25_delta: f64,
}

/// A successful response from any backend service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "service", content = "payload")]
pub enum Payload {
    #[serde(rename = "market-data")]
    MarketData(MarketData),
    #[serde(rename = "technical-analysis")]
    Technical(TechnicalIndicators),
    #[serde(rename = "options-analysis")]
    Options(OptionsMetrics),
}

impl Payload {
    /// The service this payload belongs to.
    pub fn kind(&self) -> ServiceKind {
        match self {
            Payload::MarketData(_) => ServiceKind::MarketData,
            Payload::Technical(_) => ServiceKind::Technical,
            Payload::Options(_) => ServiceKind::Options,
        }
    }

    /// Ticker the service says it answered for.
    pub fn ticker(&self) -> &str {
        match self {
            Payload::MarketData(p) => &p.ticker,
            Payload::Technical(p) => &p.ticker,
            Payload::Options(p) => &p.ticker,
        }
    }
}
