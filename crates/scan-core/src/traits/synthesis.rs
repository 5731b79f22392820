//! Synthesis stage trait definition.

use async_trait::async_trait;

use crate::error::ScanError;
use crate::types::BatchResult;

/// Downstream consumer of a finished batch.
///
/// Receives the batch by value, exactly once per run. Nothing it returns
/// feeds back into orchestration.
#[async_trait]
pub trait SynthesisStage: Send + Sync {
    async fn synthesize(&self, batch: BatchResult) -> Result<(), ScanError>;

    fn name(&self) -> &str;
}
