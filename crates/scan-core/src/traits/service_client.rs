//! Service client trait definition.

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::ScanError;
use crate::types::{ServiceHealth, ServiceKind, ServiceOutcome, ServiceRequest};

/// Trait for backend service clients.
///
/// A client issues exactly one outbound call per [`call`](Self::call) and
/// reports every failure through the returned outcome. Clients neither
/// retry nor cache.
#[async_trait]
pub trait ServiceClient: Send + Sync {
    /// The backend this client talks to.
    fn kind(&self) -> ServiceKind;

    /// Issue one request.
    ///
    /// # Arguments
    /// * `request` - Ticker plus service-specific parameters
    ///
    /// # Returns
    /// `Success` with a typed payload, or `Failure` with its kind and detail
    async fn call(&self, request: &ServiceRequest) -> ServiceOutcome;

    /// Query the service's liveness endpoint.
    ///
    /// Only used for pre-flight diagnostics, never by per-call logic.
    async fn health(&self) -> ServiceHealth;

    /// Get the client name.
    fn name(&self) -> &str {
        self.kind().name()
    }
}

/// One client per backend service.
#[derive(Clone)]
pub struct ServiceSet {
    market_data: Arc<dyn ServiceClient>,
    technical: Arc<dyn ServiceClient>,
    options: Arc<dyn ServiceClient>,
}

impl ServiceSet {
    /// Create a set, checking each client serves the slot it is placed in.
    pub fn new(
        market_data: Arc<dyn ServiceClient>,
        technical: Arc<dyn ServiceClient>,
        options: Arc<dyn ServiceClient>,
    ) -> Result<Self, ScanError> {
        for (expected, client) in [
            (ServiceKind::MarketData, &market_data),
            (ServiceKind::Technical, &technical),
            (ServiceKind::Options, &options),
        ] {
            if client.kind() != expected {
                return Err(ScanError::Config(format!(
                    "client for {} was given where {} was expected",
                    client.kind(),
                    expected
                )));
            }
        }

        Ok(Self {
            market_data,
            technical,
            options,
        })
    }

    pub fn get(&self, kind: ServiceKind) -> &Arc<dyn ServiceClient> {
        match kind {
            ServiceKind::MarketData => &self.market_data,
            ServiceKind::Technical => &self.technical,
            ServiceKind::Options => &self.options,
        }
    }

    /// Clients in service order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn ServiceClient>> {
        ServiceKind::ALL.into_iter().map(move |kind| self.get(kind))
    }
}
