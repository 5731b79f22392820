//! Backend analysis service clients.

mod http;
mod scripted;

pub use http::HttpServiceClient;
pub use scripted::{ConcurrencyGauge, GaugeGuard, Scripted, ScriptedService};
