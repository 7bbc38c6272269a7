use std::path::PathBuf;

use anyhow::{anyhow, Result};
use clap::Parser;
use serde_json::json;

use edupal_roster::api::ApiClient;
use edupal_roster::config;
use edupal_roster::session::StudentsScreen;

#[derive(Parser, Debug)]
#[command(about = "Dump the aggregated student roster as JSON")]
struct Args {
    /// Path to YAML config
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,

    /// Only include entries matching this search text
    #[arg(long, default_value = "")]
    search: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let cfg = config::load(Some(&args.config))?;
    let api = ApiClient::from_config(&cfg)?;

    let mut screen = StudentsScreen::new(cfg.roster.concurrent_fetch);
    if let Err(err) = screen.refresh(&api).await {
        return Err(anyhow!(err).context(screen.alert().unwrap_or_default().to_string()));
    }
    screen.set_query(args.search);

    let out = json!({
        "stats": screen.stats(),
        "skipped_classes": screen.skipped_classes(),
        "roster": screen.visible(),
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}
