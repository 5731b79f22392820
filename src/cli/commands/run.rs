//! Batch run command.

use anyhow::{Context, Result};
use async_trait::async_trait;
use scan_config::AppConfig;
use scan_core::error::ScanError;
use scan_core::traits::SynthesisStage;
use scan_core::types::BatchResult;
use scan_data::{resolve_universe, JsonBatchSink};
use scan_engine::{render_summary, BatchOrchestrator};
use std::path::PathBuf;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::build_services;
use crate::cli::RunArgs;

pub async fn run(args: RunArgs, config: &AppConfig) -> Result<()> {
    let tickers = resolve_universe(&args.tickers, args.universe.as_deref())
        .context("Failed to load ticker universe")?;

    let mut engine = config.engine.to_engine_config();
    if let Some(ceiling) = args.max_concurrency {
        anyhow::ensure!(ceiling > 0, "--max-concurrency must be at least 1");
        engine.max_concurrency = ceiling;
    }
    if let Some(secs) = args.batch_timeout {
        anyhow::ensure!(secs > 0, "--batch-timeout must be greater than 0");
        engine.batch_timeout = Some(Duration::from_secs(secs));
    }
    if let Some(preflight) = args.preflight {
        engine.preflight = preflight.into();
    }

    let services = build_services(config, args.dry_run)?;
    if args.dry_run {
        info!("Dry run: using scripted services");
    }
    let orchestrator = BatchOrchestrator::new(services, engine);

    let output = args
        .output
        .or_else(|| config.output.path.as_ref().map(PathBuf::from));
    let mut sink = match output {
        Some(path) => JsonBatchSink::file(path),
        None => JsonBatchSink::stdout(),
    };
    if !config.output.pretty {
        sink = sink.compact();
    }
    let stage = Reporting {
        sink,
        print_summary: args.summary,
    };

    let cancel = CancellationToken::new();
    let interrupt = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupt received, cancelling batch");
                cancel.cancel();
            }
        })
    };

    let result = orchestrator.run_into(&tickers, &cancel, &stage).await;
    interrupt.abort();
    let summary = result.context("Batch run failed")?;

    info!(
        "Scanned {} tickers: {} complete, {} partial, {} failed",
        summary.distinct, summary.complete, summary.partial, summary.failed
    );
    Ok(())
}

/// Prints the text summary before handing the batch to the JSON sink.
struct Reporting {
    sink: JsonBatchSink,
    print_summary: bool,
}

#[async_trait]
impl SynthesisStage for Reporting {
    async fn synthesize(&self, batch: BatchResult) -> Result<(), ScanError> {
        if self.print_summary {
            eprintln!("{}", render_summary(&batch));
        }
        self.sink.synthesize(batch).await
    }

    fn name(&self) -> &str {
        self.sink.name()
    }
}
