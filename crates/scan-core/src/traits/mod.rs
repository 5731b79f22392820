//! Core traits for the orchestrator.

mod service_client;
mod synthesis;

pub use service_client::{ServiceClient, ServiceSet};
pub use synthesis::SynthesisStage;
