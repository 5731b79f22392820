//! HTTP clients for the backend analysis services.

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Client, RequestBuilder, StatusCode};
use scan_core::error::ScanError;
use scan_core::traits::ServiceClient;
use scan_core::types::{
    FailureKind, MarketData, OptionsMetrics, Payload, RequestParams, ServiceHealth, ServiceKind,
    ServiceOutcome, ServiceRequest, TechnicalIndicators,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// Longest slice of an unstructured error body kept in failure details.
const MAX_DETAIL_LEN: usize = 200;

#[derive(Debug, Serialize)]
struct TechnicalBody<'a> {
    ticker: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    as_of: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
struct OptionsBody<'a> {
    ticker: &'a str,
    historical_volatility: f64,
    stock_price: f64,
}

/// Error body shape shared by the backends: `{"message": ..}` or `{"error": ..}`.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct HealthBody {
    status: String,
}

/// HTTP client for one backend service.
pub struct HttpServiceClient {
    kind: ServiceKind,
    base_url: String,
    client: Client,
}

impl HttpServiceClient {
    /// Create a client with a per-call timeout covering connect, send and body.
    pub fn new(
        kind: ServiceKind,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ScanError> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(ScanError::Config(format!("{} endpoint is empty", kind)));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ScanError::Config(e.to_string()))?;

        Ok(Self {
            kind,
            base_url,
            client,
        })
    }

    fn request_for(&self, request: &ServiceRequest) -> RequestBuilder {
        let ticker = request.ticker.as_str();
        match &request.params {
            RequestParams::MarketData { lookback_days } => self
                .client
                .get(format!("{}/historical-data/{}", self.base_url, ticker))
                .query(&[("days", lookback_days)]),
            RequestParams::Technical { as_of } => self
                .client
                .post(format!("{}/analyze", self.base_url))
                .json(&TechnicalBody {
                    ticker,
                    as_of: *as_of,
                }),
            RequestParams::Options {
                historical_volatility,
                stock_price,
            } => self
                .client
                .post(format!("{}/analyze-volatility", self.base_url))
                .json(&OptionsBody {
                    ticker,
                    historical_volatility: *historical_volatility,
                    stock_price: *stock_price,
                }),
        }
    }

    fn decode(&self, request: &ServiceRequest, body: &[u8]) -> ServiceOutcome {
        let parsed = match self.kind {
            ServiceKind::MarketData => serde_json::from_slice::<MarketData>(body).map(Payload::MarketData),
            ServiceKind::Technical => {
                serde_json::from_slice::<TechnicalIndicators>(body).map(Payload::Technical)
            }
            ServiceKind::Options => serde_json::from_slice::<OptionsMetrics>(body).map(Payload::Options),
        };

        match parsed {
            Ok(payload) if payload.ticker().eq_ignore_ascii_case(request.ticker.as_str()) => {
                ServiceOutcome::Success(payload)
            }
            Ok(payload) => ServiceOutcome::failure(
                FailureKind::BadResponse,
                format!(
                    "response is for {}, requested {}",
                    payload.ticker(),
                    request.ticker
                ),
            ),
            Err(e) => ServiceOutcome::failure(
                FailureKind::BadResponse,
                format!("unexpected {} response shape: {}", self.kind, e),
            ),
        }
    }
}

#[async_trait]
impl ServiceClient for HttpServiceClient {
    fn kind(&self) -> ServiceKind {
        self.kind
    }

    async fn call(&self, request: &ServiceRequest) -> ServiceOutcome {
        if request.kind() != self.kind {
            return ServiceOutcome::failure(
                FailureKind::ServiceError,
                format!("{} request sent to {} client", request.kind(), self.kind),
            );
        }

        debug!("Calling {} at {} for {}", self.kind, self.base_url, request.ticker);

        let resp = match self.request_for(request).send().await {
            Ok(resp) => resp,
            Err(e) => return classify(self.kind, &e),
        };

        let status = resp.status();
        let body = match resp.bytes().await {
            Ok(body) => body,
            Err(e) => return classify(self.kind, &e),
        };

        if !status.is_success() {
            return ServiceOutcome::failure(
                status_failure(status),
                format!("{}: {}", status, error_detail(&body)),
            );
        }

        self.decode(request, &body)
    }

    async fn health(&self) -> ServiceHealth {
        let url = format!("{}/health", self.base_url);
        let resp = match self.client.get(&url).send().await {
            Ok(resp) => resp,
            Err(e) => return ServiceHealth::Unhealthy(e.to_string()),
        };

        if !resp.status().is_success() {
            return ServiceHealth::Unhealthy(format!("health endpoint returned {}", resp.status()));
        }

        match resp.json::<HealthBody>().await {
            Ok(body) if body.status.eq_ignore_ascii_case("healthy") => ServiceHealth::Healthy,
            Ok(body) => ServiceHealth::Unhealthy(format!("reported status '{}'", body.status)),
            Err(e) => ServiceHealth::Unhealthy(format!("unreadable health response: {}", e)),
        }
    }
}

fn classify(service: ServiceKind, err: &reqwest::Error) -> ServiceOutcome {
    let kind = if err.is_timeout() {
        FailureKind::Timeout
    } else if err.is_decode() {
        FailureKind::BadResponse
    } else {
        FailureKind::Unreachable
    };
    warn!("{} call failed ({}): {}", service, kind, err);
    ServiceOutcome::failure(kind, err.to_string())
}

/// Gateway statuses mean the service never handled the request.
fn status_failure(status: StatusCode) -> FailureKind {
    match status {
        StatusCode::BAD_GATEWAY | StatusCode::SERVICE_UNAVAILABLE | StatusCode::GATEWAY_TIMEOUT => {
            FailureKind::Unreachable
        }
        _ => FailureKind::ServiceError,
    }
}

fn error_detail(body: &[u8]) -> String {
    if let Ok(parsed) = serde_json::from_slice::<ErrorBody>(body) {
        if let Some(msg) = parsed.message.or(parsed.error) {
            return msg;
        }
    }
    String::from_utf8_lossy(body).chars().take(MAX_DETAIL_LEN).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use scan_core::types::Ticker;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request(kind: ServiceKind, symbol: &str) -> ServiceRequest {
        let params = match kind {
            ServiceKind::MarketData => RequestParams::MarketData { lookback_days: 90 },
            ServiceKind::Technical => RequestParams::Technical { as_of: None },
            ServiceKind::Options => RequestParams::Options {
                historical_volatility: 22.5,
                stock_price: 185.0,
            },
        };
        ServiceRequest::new(Ticker::parse(symbol).unwrap(), params)
    }

    fn client(kind: ServiceKind, server: &MockServer) -> HttpServiceClient {
        HttpServiceClient::new(kind, server.uri(), Duration::from_millis(300)).unwrap()
    }

    fn failure_kind(outcome: &ServiceOutcome) -> FailureKind {
        outcome.failure_kind().expect("expected a failure")
    }

    #[tokio::test]
    async fn test_market_data_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/historical-data/AAPL"))
            .and(query_param("days", "90"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ticker": "AAPL",
                "data": [{"date": "2024-01-02", "open": 187.1, "high": 188.4, "low": 183.9, "close": 185.6, "volume": 82488700}]
            })))
            .mount(&server)
            .await;

        let outcome = client(ServiceKind::MarketData, &server)
            .call(&request(ServiceKind::MarketData, "AAPL"))
            .await;

        match outcome {
            ServiceOutcome::Success(Payload::MarketData(data)) => {
                assert_eq!(data.last_close(), Some(185.6));
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_options_request_carries_volatility() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/analyze-volatility"))
            .and(body_partial_json(json!({
                "ticker": "AAPL",
                "historical_volatility": 22.5,
                "stock_price": 185.0
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ticker": "AAPL",
                "atm_iv_percent": 27.3,
                "iv_hv_spread_percent": 4.8,
                "skew_25_delta": 2.2
            })))
            .mount(&server)
            .await;

        let outcome = client(ServiceKind::Options, &server)
            .call(&request(ServiceKind::Options, "AAPL"))
            .await;
        assert!(outcome.is_success());
    }

    #[tokio::test]
    async fn test_not_found_is_service_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/analyze"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "message": "Not enough historical data for ZZZZ to perform meaningful analysis."
            })))
            .mount(&server)
            .await;

        let outcome = client(ServiceKind::Technical, &server)
            .call(&request(ServiceKind::Technical, "ZZZZ"))
            .await;

        assert_eq!(failure_kind(&outcome), FailureKind::ServiceError);
        if let ServiceOutcome::Failure(f) = outcome {
            assert!(f.detail.contains("404"));
            assert!(f.detail.contains("Not enough historical data"));
        }
    }

    #[tokio::test]
    async fn test_gateway_errors_are_unreachable() {
        for code in [502, 503, 504] {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .and(path("/historical-data/AAPL"))
                .respond_with(ResponseTemplate::new(code).set_body_string("upstream unavailable"))
                .mount(&server)
                .await;

            let outcome = client(ServiceKind::MarketData, &server)
                .call(&request(ServiceKind::MarketData, "AAPL"))
                .await;
            assert_eq!(failure_kind(&outcome), FailureKind::Unreachable, "status {}", code);
            assert!(outcome.failure_kind().is_some_and(|k| k.is_transient()));
        }
    }

    #[tokio::test]
    async fn test_internal_error_is_service_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/analyze-volatility"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({
                "error": "An internal error occurred: no expirations"
            })))
            .mount(&server)
            .await;

        let outcome = client(ServiceKind::Options, &server)
            .call(&request(ServiceKind::Options, "AAPL"))
            .await;
        assert_eq!(failure_kind(&outcome), FailureKind::ServiceError);
    }

    #[tokio::test]
    async fn test_wrong_shape_is_bad_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/analyze"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "message": "DEBUG: Showing last 5 rows of data found for ticker.",
                "ticker": "MSFT",
                "record_count": 900
            })))
            .mount(&server)
            .await;

        let outcome = client(ServiceKind::Technical, &server)
            .call(&request(ServiceKind::Technical, "MSFT"))
            .await;
        assert_eq!(failure_kind(&outcome), FailureKind::BadResponse);
    }

    #[tokio::test]
    async fn test_other_ticker_is_bad_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/analyze-volatility"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ticker": "MSFT",
                "atm_iv_percent": 27.3,
                "iv_hv_spread_percent": 4.8,
                "skew_25_delta": 2.2
            })))
            .mount(&server)
            .await;

        let outcome = client(ServiceKind::Options, &server)
            .call(&request(ServiceKind::Options, "AAPL"))
            .await;
        assert_eq!(failure_kind(&outcome), FailureKind::BadResponse);
    }

    #[tokio::test]
    async fn test_slow_response_is_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/historical-data/AAPL"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"ticker": "AAPL", "data": []}))
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        let outcome = client(ServiceKind::MarketData, &server)
            .call(&request(ServiceKind::MarketData, "AAPL"))
            .await;
        assert_eq!(failure_kind(&outcome), FailureKind::Timeout);
    }

    #[tokio::test]
    async fn test_closed_port_is_unreachable() {
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let client = HttpServiceClient::new(
            ServiceKind::MarketData,
            format!("http://127.0.0.1:{}", port),
            Duration::from_millis(500),
        )
        .unwrap();

        let outcome = client.call(&request(ServiceKind::MarketData, "AAPL")).await;
        assert_eq!(failure_kind(&outcome), FailureKind::Unreachable);
    }

    #[tokio::test]
    async fn test_health_check() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"status": "healthy", "service": "options-api"})),
            )
            .mount(&server)
            .await;

        let healthy = client(ServiceKind::Options, &server).health().await;
        assert!(healthy.is_healthy());

        let empty = MockServer::start().await;
        let unhealthy = client(ServiceKind::Options, &empty).health().await;
        assert!(!unhealthy.is_healthy());
    }

    #[test]
    fn test_rejects_empty_endpoint() {
        assert!(HttpServiceClient::new(ServiceKind::Technical, "/", Duration::from_secs(1)).is_err());
    }
}
