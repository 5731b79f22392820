//! Batch summary report.

use scan_core::types::{BatchResult, Field, ServiceKind, TickerRecord};
use std::collections::HashSet;

/// Generate a text summary of a finished batch.
pub fn render_summary(batch: &BatchResult) -> String {
    let mut s = String::new();
    let summary = batch.summary();
    let elapsed = batch.finished_at() - batch.started_at();

    s.push_str("═══════════════════════════════════════════════════════════\n");
    s.push_str("                    MARKET SCAN REPORT                      \n");
    s.push_str("═══════════════════════════════════════════════════════════\n\n");

    s.push_str("BATCH\n");
    s.push_str("───────────────────────────────────────────────────────────\n");
    s.push_str(&format!("  Run ID:              {}\n", batch.run_id()));
    s.push_str(&format!(
        "  Started:             {}\n",
        batch.started_at().format("%Y-%m-%d %H:%M:%S UTC")
    ));
    s.push_str(&format!(
        "  Elapsed:             {:.2}s\n",
        elapsed.num_milliseconds() as f64 / 1000.0
    ));
    s.push_str(&format!("  Peak In Flight:      {}\n", batch.peak_in_flight()));
    if let Some(kind) = batch.interruption() {
        s.push_str(&format!("  Interrupted:         {}\n", kind));
    }
    s.push('\n');

    s.push_str("TICKERS\n");
    s.push_str("───────────────────────────────────────────────────────────\n");
    s.push_str(&format!("  Input Positions:     {}\n", batch.len()));
    s.push_str(&format!("  Distinct:            {}\n", summary.distinct));
    s.push_str(&format!("  Complete:            {}\n", summary.complete));
    s.push_str(&format!("  Partial:             {}\n", summary.partial));
    s.push_str(&format!("  Failed:              {}\n", summary.failed));
    s.push('\n');

    s.push_str("RESULTS\n");
    s.push_str("───────────────────────────────────────────────────────────\n");
    let mut seen = HashSet::new();
    for record in batch.records() {
        if seen.insert(record.ticker()) {
            push_record(&mut s, record);
        }
    }
    s.push('\n');

    s.push_str("═══════════════════════════════════════════════════════════\n");

    s
}

fn push_record(s: &mut String, record: &TickerRecord) {
    s.push_str(&format!(
        "  {:<8} {:<9} {}\n",
        record.ticker().as_str(),
        record.status().to_string(),
        headline(record)
    ));
    let failures = record.failures();
    // An interrupted ticker fails every service the same way; show it once.
    let interrupted = failures.len() == ServiceKind::ALL.len()
        && failures.iter().all(|(_, f)| f.kind.is_batch_level());
    if interrupted {
        s.push_str(&format!("           {:<19} {}\n", "interrupted", failures[0].1.kind));
        return;
    }
    for (service, failure) in failures {
        s.push_str(&format!("           {:<19} {}\n", service.name(), failure));
    }
}

/// Key figures from whichever payloads arrived.
fn headline(record: &TickerRecord) -> String {
    let mut parts = Vec::new();
    if let Field::Present(market) = record.market_data() {
        if let Some(close) = market.last_close() {
            parts.push(format!("close {:.2}", close));
        }
        if let Some(volume) = market.average_volume() {
            parts.push(format!("avg vol {:.0}", volume));
        }
    }
    if let Field::Present(technical) = record.technical() {
        parts.push(format!("RSI {:.1}", technical.indicators.rsi));
        parts.push(format!("HV {:.1}%", technical.indicators.hv_30d_annualized));
    }
    if let Field::Present(options) = record.options() {
        parts.push(format!("IV {:.1}%", options.atm_iv_percent));
    }
    if parts.is_empty() {
        return format!("no data from {} services", ServiceKind::ALL.len());
    }
    parts.join("  ")
}
