//! Carbon Pulse — campus carbon forecasting service.

use std::path::PathBuf;
use std::sync::Arc;

use pulse_core::PulseConfig;
use pulse_forecast::time::format_timestamp;
use pulse_forecast::ForecastOrchestrator;
use pulse_insights::{LlmClient, LlmConfig};
use pulse_server::{build_router, AppState};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn resolve_data_dir() -> PathBuf {
    std::env::var("PULSE_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let exe_dir = std::env::current_exe()
                .ok()
                .and_then(|p| p.parent().map(|p| p.to_path_buf()));
            if let Some(dir) = exe_dir {
                let parent_data = dir.join("../data");
                if parent_data.exists() {
                    return parent_data;
                }
            }
            PathBuf::from("data")
        })
}

fn run_forecast(config: &PulseConfig) -> pulse_core::Result<()> {
    let run = ForecastOrchestrator::new(config).run()?;
    println!(
        "Forecast from {}: {} buildings written to {}",
        format_timestamp(run.boundary),
        run.produced(),
        config.data_paths.forecast_store.display()
    );
    for skipped in &run.skipped {
        println!("  skipped {}: {}", skipped.building, skipped.reason);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();

    // Handle CLI subcommands
    if args.len() > 1 {
        match args[1].as_str() {
            "--forecast" | "forecast" => {
                let data_dir = if args.len() > 2 {
                    PathBuf::from(&args[2])
                } else {
                    resolve_data_dir()
                };
                let config = PulseConfig::from_env(&data_dir)?;
                if let Err(e) = run_forecast(&config) {
                    eprintln!("Forecast failed: {}", e);
                    std::process::exit(1);
                }
                return Ok(());
            }
            "--help" | "-h" | "help" => {
                println!("Carbon Pulse — campus carbon emission forecasts");
                println!();
                println!("Usage: carbon-pulse [command]");
                println!();
                println!("Commands:");
                println!("  (none)                   Start the server");
                println!("  forecast [data-dir]      Run one 24h forecast and exit");
                println!("  help                     Show this help message");
                return Ok(());
            }
            _ => {
                eprintln!("Unknown command: {}. Use 'carbon-pulse help' for usage.", args[1]);
                std::process::exit(1);
            }
        }
    }

    // Normal server startup
    let data_dir = resolve_data_dir();
    info!("Data directory: {}", data_dir.display());

    let config = PulseConfig::from_env(&data_dir)?;
    let port = config.port;
    info!("CORS origins: {:?}", config.cors_origins);

    if config.forecast_on_start {
        let orchestrator = ForecastOrchestrator::new(&config);
        match tokio::task::spawn_blocking(move || orchestrator.run()).await? {
            Ok(run) => info!(
                "Startup forecast complete: {} buildings from {}",
                run.produced(),
                format_timestamp(run.boundary)
            ),
            Err(e) => warn!(
                "Startup forecast failed: {}. Serving the existing forecast file if available.",
                e
            ),
        }
    }

    let llm = LlmClient::new(LlmConfig::from_env())?;
    match llm.config().resolve_provider() {
        Some(resolved) => info!("Insights via {} ({})", resolved.provider, resolved.model),
        None => warn!("No LLM provider configured; /get-insights will fail"),
    }

    // Build application state
    let state = Arc::new(AppState::new(config, Arc::new(llm)));

    // Build router
    let app = build_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Carbon Pulse server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
