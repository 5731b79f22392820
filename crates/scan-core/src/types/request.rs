//! Per-call service requests.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{ServiceKind, Ticker};

/// Service-specific request parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "service", rename_all = "snake_case")]
pub enum RequestParams {
    MarketData {
        /// Calendar days of history to fetch
        lookback_days: u32,
    },
    Technical {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        as_of: Option<NaiveDate>,
    },
    Options {
        /// 30-day annualized historical volatility in percent
        historical_volatility: f64,
        /// Latest close, used to locate the at-the-money strike
        stock_price: f64,
    },
}

/// One request to one backend service. Built per call and discarded after.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceRequest {
    pub ticker: Ticker,
    pub params: RequestParams,
}

impl ServiceRequest {
    pub fn new(ticker: Ticker, params: RequestParams) -> Self {
        Self { ticker, params }
    }

    /// The service this request is addressed to.
    pub fn kind(&self) -> ServiceKind {
        match self.params {
            RequestParams::MarketData { .. } => ServiceKind::MarketData,
            RequestParams::Technical { .. } => ServiceKind::Technical,
            RequestParams::Options { .. } => ServiceKind::Options,
        }
    }
}
