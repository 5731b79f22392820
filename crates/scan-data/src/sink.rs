//! JSON output for finished batches.

use async_trait::async_trait;
use scan_core::error::ScanError;
use scan_core::traits::SynthesisStage;
use scan_core::types::BatchResult;
use std::path::PathBuf;
use tokio::io::AsyncWriteExt;
use tracing::info;

/// Where the batch document is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkTarget {
    Stdout,
    File(PathBuf),
}

/// Synthesis stage that writes the batch as a JSON document for the
/// downstream report generator.
#[derive(Debug, Clone)]
pub struct JsonBatchSink {
    target: SinkTarget,
    pretty: bool,
}

impl JsonBatchSink {
    pub fn stdout() -> Self {
        Self {
            target: SinkTarget::Stdout,
            pretty: true,
        }
    }

    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            target: SinkTarget::File(path.into()),
            pretty: true,
        }
    }

    /// Write single-line JSON.
    pub fn compact(mut self) -> Self {
        self.pretty = false;
        self
    }

    pub fn target(&self) -> &SinkTarget {
        &self.target
    }

    fn encode(&self, batch: &BatchResult) -> Result<String, ScanError> {
        let encoded = if self.pretty {
            serde_json::to_string_pretty(batch)
        } else {
            serde_json::to_string(batch)
        };
        encoded.map_err(|e| ScanError::Serialization(e.to_string()))
    }
}

#[async_trait]
impl SynthesisStage for JsonBatchSink {
    async fn synthesize(&self, batch: BatchResult) -> Result<(), ScanError> {
        let mut body = self.encode(&batch)?;
        body.push('\n');

        match &self.target {
            SinkTarget::Stdout => {
                let mut out = tokio::io::stdout();
                out.write_all(body.as_bytes()).await?;
                out.flush().await?;
            }
            SinkTarget::File(path) => {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    tokio::fs::create_dir_all(parent).await?;
                }
                tokio::fs::write(path, body).await?;
                info!(
                    "Wrote batch {} ({} records) to {}",
                    batch.run_id(),
                    batch.len(),
                    path.display()
                );
            }
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "json-sink"
    }
}
