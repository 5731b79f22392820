//! Service health command.

use anyhow::Result;
use scan_config::AppConfig;
use scan_core::types::ServiceHealth;
use scan_engine::BatchOrchestrator;

use super::build_services;
use crate::cli::HealthArgs;

pub async fn run(args: HealthArgs, config: &AppConfig) -> Result<()> {
    let services = build_services(config, args.dry_run)?;
    let orchestrator = BatchOrchestrator::new(services, config.engine.to_engine_config());

    println!("Service Health");
    println!("═══════════════════════════════════════════════════════════");

    let mut unhealthy = 0;
    for (kind, health) in orchestrator.check_health().await {
        let endpoint = if args.dry_run { "scripted" } else { config.endpoint(kind) };
        match health {
            ServiceHealth::Healthy => println!("  {:<20} healthy     {}", kind.name(), endpoint),
            ServiceHealth::Unhealthy(detail) => {
                unhealthy += 1;
                println!("  {:<20} UNHEALTHY   {}", kind.name(), endpoint);
                println!("  {:<20} {}", "", detail);
            }
        }
    }
    println!();

    if unhealthy > 0 {
        anyhow::bail!("{} service(s) unhealthy", unhealthy);
    }
    println!("All services healthy.");
    Ok(())
}
