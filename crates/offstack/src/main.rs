//! `offstack` binary: standalone entry to the orchestrator.
//!
//! `start` runs the full stack and blocks until a termination signal;
//! `config` prints the resolved settings tree without starting anything.
//! Exit code 0 on orderly shutdown, 1 on any failure.

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tracing::{error, info};

use offstack::cli::{Cli, Commands};
use offstack::{host, LifecycleController};
use offstack_config::{paths, resolve, RawOptions, ResolvedConfig};
use offstack_logging::{init_logging, LogConfig};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_config =
        LogConfig::new("offstack", paths::default_logs_dir()).verbose(cli.verbose);
    let _log_guard = match init_logging(&log_config) {
        Ok(guard) => Some(guard),
        Err(err) => {
            eprintln!("Warning: failed to initialize logging: {}", err);
            None
        }
    };

    match run(cli).await {
        Ok(code) => code,
        Err(err) => {
            error!("ERROR: {}", err);
            ExitCode::from(1)
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    match cli.command {
        Commands::Start(args) => {
            let controller =
                LifecycleController::new(args.service_path.clone(), args.to_raw_options());
            match controller.start_standalone().await {
                Ok(cause) => {
                    info!("exiting after {}", cause);
                    Ok(ExitCode::SUCCESS)
                }
                // Already logged with the ERROR: prefix at the lifecycle
                // boundary; a second line here would double-report.
                Err(_) => Ok(ExitCode::from(1)),
            }
        }
        Commands::Config { json, service_path } => {
            let declared = host::load_declared_options(&service_path)?;
            let resolved = resolve(&service_path, declared, RawOptions::default());
            if json {
                println!("{}", serde_json::to_string_pretty(&resolved)?);
            } else {
                print_resolved(&resolved);
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn print_resolved(config: &ResolvedConfig) {
    fn port_or_dynamic(port: Option<u16>) -> String {
        port.map_or_else(|| "(dynamic)".to_string(), |p| p.to_string())
    }

    println!("service path:  {}", config.service_path.display());
    println!("gateway port:  {}", port_or_dynamic(config.port));
    println!("schema path:   {}", config.schema_path.display());
    println!();
    println!("data store:");
    match config.client.endpoint.as_deref() {
        Some(endpoint) => println!("  endpoint:    {} (external)", endpoint),
        None => println!("  endpoint:    (embedded emulator)"),
    }
    println!("  region:      {}", config.client.region);
    println!("  credentials: {}", config.client.access_key_id);
    println!();
    println!("emulator:");
    println!("  port:        {}", port_or_dynamic(config.server.port));
    println!("  dbPath:      {}", config.server.db_path.display());
    println!("  inMemory:    {}", config.server.in_memory);
    println!("  sharedDb:    {}", config.server.shared_db);
    println!(
        "  delayTransientStatuses:    {}",
        config.server.delay_transient_statuses
    );
    println!(
        "  optimizeDbBeforeStartup:   {}",
        config.server.optimize_db_before_startup
    );
}
