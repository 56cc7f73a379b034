use std::{path::PathBuf, sync::Arc};

use clap::Parser;
use serde_json::Value;
use tokio::io::AsyncReadExt;
use tracing::{debug, info};

use taskledger_core::{EventHandler, InstanceResolver, PlatformApi, TrackerConfig, UpsertEngine};
use taskledger_observe::{LoggerConfig, logger_init};
use taskledger_remote::{RemotePlatform, open_store};

mod runtime;

#[derive(Parser)]
#[command(name = "taskledger-handler")]
#[command(about = "Record a task state-change notification", long_about = None)]
#[command(version)]
struct Cli {
    /// Notification JSON file; reads stdin when omitted
    #[arg(short, long)]
    event: Option<PathBuf>,

    /// Region of the record store and platform API (defaults to the notification's region, then AWS_REGION)
    #[arg(short, long)]
    region: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    logger_init(&LoggerConfig::for_verbosity(cli.verbose)?)?;

    if let Ok(api) = std::env::var(runtime::ENV_RUNTIME_API) {
        let handler = build_handler(&TrackerConfig::from_env(cli.region)?)?;
        info!(%api, "serving function runtime invocations");
        return runtime::serve(&api, &handler).await;
    }

    let raw = match &cli.event {
        Some(path) => tokio::fs::read_to_string(path).await?,
        None => {
            let mut buf = String::new();
            tokio::io::stdin().read_to_string(&mut buf).await?;
            buf
        }
    };

    let region = cli.region.or_else(|| notification_region(&raw));
    let cfg = TrackerConfig::from_env(region)?;
    debug!(region = %cfg.region, "configuration loaded");

    let decision = build_handler(&cfg)?.handle_json(&raw).await?;
    println!("{}", serde_json::to_string(&decision)?);
    Ok(())
}

fn build_handler(cfg: &TrackerConfig) -> anyhow::Result<EventHandler> {
    let platform: Arc<dyn PlatformApi> = Arc::new(RemotePlatform::from_config(cfg)?);
    let store = open_store(cfg)?;
    let resolver = InstanceResolver::with_memory_cache(platform);
    Ok(EventHandler::new(Arc::new(UpsertEngine::new(store, resolver))))
}

/// Top-level `region` of a notification, if it parses and carries one.
fn notification_region(raw: &str) -> Option<String> {
    let value: Value = serde_json::from_str(raw).ok()?;
    value
        .get("region")?
        .as_str()
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(str::to_string)
}
