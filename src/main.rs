use anyhow::{Context, Result};
use chrono::Utc;
use std::env;
use tracing_subscriber::EnvFilter;

use daycare_sync::{
    sync, AppConfig, BabyProfile, Credentials, SinkClient, SourceClient, DEFAULT_SINK_URL,
    DEFAULT_SOURCE_URL,
};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Optional single argument: the report date. Defaults to today (UTC).
    let args: Vec<String> = env::args().collect();
    let date = match args.get(1) {
        Some(date) => date.clone(),
        None => Utc::now().format("%Y-%m-%d").to_string(),
    };

    println!("🍼 Daycare Sync — mirroring report for {}", date);
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    // 1. Static configuration
    let config = AppConfig::from_file("config/config.json")?;
    let baby = BabyProfile::from_file("config/baby_data.json")?;
    let credentials = Credentials::from_env()?;

    // Source session cookie is captured outside this tool (browser session)
    let source_cookie =
        env::var("SOURCE_COOKIE").context("SOURCE_COOKIE must be set in the environment")?;

    // 2. Clients — the only authentication that can abort the run
    let source = SourceClient::new(DEFAULT_SOURCE_URL, source_cookie)?;
    let sink = SinkClient::login(DEFAULT_SINK_URL, &config.application_id, &credentials)?;

    // 3. Fetch → normalize → reconcile → submit
    let outcome = sync::run(&source, &sink, &baby, &date)?;

    println!("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("✓ {}", outcome.summary());

    if outcome.failed > 0 {
        println!("⚠ some submissions failed; rerun to retry (duplicates are filtered)");
    }

    Ok(())
}
