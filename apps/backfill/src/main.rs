use std::sync::Arc;

use clap::Parser;
use tracing::{info, warn};

use taskledger_core::{BackfillDriver, InstanceResolver, PlatformApi, TrackerConfig, UpsertEngine};
use taskledger_observe::{LoggerConfig, logger_init};
use taskledger_remote::{RemotePlatform, open_store};

#[derive(Parser)]
#[command(name = "taskledger-backfill")]
#[command(about = "Record every task currently running in a region", long_about = None)]
#[command(version)]
struct Cli {
    /// Region in which the orchestration platform is running
    #[arg(short, long)]
    region: String,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    logger_init(&LoggerConfig::for_verbosity(cli.verbose)?)?;

    let cfg = TrackerConfig::from_env(Some(cli.region))?;
    info!(
        region = %cfg.region,
        table = %cfg.table_name,
        store = ?cfg.store,
        "configuration loaded"
    );

    let platform: Arc<dyn PlatformApi> = Arc::new(RemotePlatform::from_config(&cfg)?);
    let store = open_store(&cfg)?;
    let resolver = InstanceResolver::with_memory_cache(Arc::clone(&platform));
    let engine = Arc::new(UpsertEngine::new(store, resolver));

    let driver = BackfillDriver::new(platform, engine, cfg.region.clone(), cfg.page_size);
    let report = driver.backfill().await?;

    if !report.is_clean() {
        warn!(
            failed = report.failed,
            failed_clusters = report.failed_clusters,
            "some tasks could not be recorded"
        );
    }
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
