//! CLI command implementations.

pub mod health;
pub mod run;
pub mod validate;

use anyhow::Result;
use scan_config::AppConfig;
use scan_core::traits::ServiceSet;
use scan_core::types::ServiceKind;
use scan_services::{HttpServiceClient, ScriptedService};
use std::sync::Arc;
use std::time::Duration;

/// Reply latency of the scripted services used by `--dry-run`.
const DRY_RUN_LATENCY: Duration = Duration::from_millis(40);

/// Build the service clients for a run.
pub(crate) fn build_services(config: &AppConfig, dry_run: bool) -> Result<ServiceSet> {
    if dry_run {
        let scripted = |kind| Arc::new(ScriptedService::new(kind).with_latency(DRY_RUN_LATENCY));
        return Ok(ServiceSet::new(
            scripted(ServiceKind::MarketData),
            scripted(ServiceKind::Technical),
            scripted(ServiceKind::Options),
        )?);
    }

    let timeout = config.services.call_timeout();
    let http = |kind| -> Result<Arc<HttpServiceClient>> {
        Ok(Arc::new(HttpServiceClient::new(kind, config.endpoint(kind), timeout)?))
    };
    Ok(ServiceSet::new(
        http(ServiceKind::MarketData)?,
        http(ServiceKind::Technical)?,
        http(ServiceKind::Options)?,
    )?)
}
