//! Backend service catalogue.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the independent backend analysis services.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ServiceKind {
    /// Daily price and volume history
    #[serde(rename = "market-data")]
    MarketData,
    /// Indicator values computed from the local price store
    #[serde(rename = "technical-analysis")]
    Technical,
    /// Options-chain volatility metrics
    #[serde(rename = "options-analysis")]
    Options,
}

impl ServiceKind {
    /// All services, in record field order.
    pub const ALL: [ServiceKind; 3] = [
        ServiceKind::MarketData,
        ServiceKind::Technical,
        ServiceKind::Options,
    ];

    /// Stable service name used in logs, config and output.
    pub fn name(&self) -> &'static str {
        match self {
            ServiceKind::MarketData => "market-data",
            ServiceKind::Technical => "technical-analysis",
            ServiceKind::Options => "options-analysis",
        }
    }

    /// Services whose payload this service's request is built from.
    ///
    /// Options analysis compares implied volatility against the historical
    /// volatility reported by technical analysis, at the strike nearest the
    /// latest close reported by market data.
    pub fn data_dependencies(&self) -> &'static [ServiceKind] {
        match self {
            ServiceKind::Options => &[ServiceKind::Technical, ServiceKind::MarketData],
            ServiceKind::MarketData | ServiceKind::Technical => &[],
        }
    }
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ServiceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "market-data" | "market" | "data" => Ok(ServiceKind::MarketData),
            "technical-analysis" | "technical" | "ta" => Ok(ServiceKind::Technical),
            "options-analysis" | "options" => Ok(ServiceKind::Options),
            _ => Err(format!("Unknown service: {}", s)),
        }
    }
}

/// Result of a liveness check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "detail", rename_all = "lowercase")]
pub enum ServiceHealth {
    Healthy,
    Unhealthy(String),
}

impl ServiceHealth {
    pub fn is_healthy(&self) -> bool {
        matches!(self, ServiceHealth::Healthy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_names_round_trip() {
        for kind in ServiceKind::ALL {
            assert_eq!(ServiceKind::from_str(kind.name()).unwrap(), kind);
        }
        assert!(ServiceKind::from_str("news").is_err());
    }

    #[test]
    fn test_options_depends_on_technical_and_market_data() {
        assert_eq!(
            ServiceKind::Options.data_dependencies(),
            &[ServiceKind::Technical, ServiceKind::MarketData]
        );
        assert!(ServiceKind::MarketData.data_dependencies().is_empty());
    }

    #[test]
    fn test_serde_uses_service_names() {
        let json = serde_json::to_string(&ServiceKind::Technical).unwrap();
        assert_eq!(json, "\"technical-analysis\"");
    }
}
