//! Command-line front end - query, snapshot and freshness-check HHS data

use anyhow::{bail, Context, Result};
use chrono::Local;
use hosp_surveillance::surveillance::parse::load_snapshot;
use hosp_surveillance::surveillance::write::DEFAULT_OUTPUT_DIR;
use hosp_surveillance::surveillance::{
    Disease, DiseaseQuery, FetchOutput, HttpTransport, SurveillanceClient, CHUNK_LIMIT,
    DEFAULT_API, DEFAULT_ORDER,
};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

const USAGE: &str = "usage:
  hosp-fetch query <disease> <state> <season> [--save]
  hosp-fetch all
  hosp-fetch last-modified
  hosp-fetch check <snapshot.csv>
  hosp-fetch refresh <snapshot.csv> <disease> <state> <season>
  hosp-fetch show <snapshot.csv>";

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(env::var(EnvFilter::DEFAULT_ENV).ok()))
        .with_target(false)
        .init();

    dotenvy::dotenv().ok();
    let config = Config::from_env()?;
    info!("Configuration loaded: {:?}", config);

    let transport = HttpTransport::new(Duration::from_secs(config.timeout_secs))?;
    let client = SurveillanceClient::new(transport).with_endpoint(config.api_url.clone());

    let args: Vec<String> = env::args().skip(1).collect();
    let args: Vec<&str> = args.iter().map(String::as_str).collect();
    let today = Local::now().date_naive();

    match args.as_slice() {
        ["query", disease, state, season, rest @ ..] => {
            let disease: Disease = disease.parse()?;
            let season = parse_season(season)?;
            let save = rest.contains(&"--save");
            let query = DiseaseQuery::new(disease, state, season).limit(config.row_limit);

            let output_dir = save.then_some(config.output_dir.as_path());
            let output = client.fetch_by_query(&query, today, output_dir).await?;
            report(&output);
        }
        ["all"] => {
            let output = client
                .fetch_all(DEFAULT_ORDER, config.row_limit, Some(config.output_dir.as_path()))
                .await?;
            report(&output);
        }
        ["last-modified"] => match client.fetch_last_modified().await? {
            Some(value) => println!("{}", value),
            None => println!("(no Last-Modified header)"),
        },
        ["check", path] => {
            let current = client.is_snapshot_current(Path::new(path)).await?;
            println!("{}", if current { "current" } else { "stale" });
        }
        ["refresh", path, disease, state, season] => {
            let disease: Disease = disease.parse()?;
            let season = parse_season(season)?;
            let query = DiseaseQuery::new(disease, state, season).limit(config.row_limit);

            let path = client
                .refresh_snapshot(Path::new(path), &query, today, &config.output_dir)
                .await?;
            println!("{}", path.display());
        }
        ["show", path] => {
            let table = load_snapshot(Path::new(path))?;
            println!("{}", table.headers.join(","));
            for row in table.rows.iter().take(10) {
                println!("{}", row.join(","));
            }
            println!("({} rows)", table.len());
        }
        _ => bail!("{}", USAGE),
    }

    Ok(())
}

/// RUST_LOG when it parses, info otherwise
fn log_filter(directives: Option<String>) -> EnvFilter {
    directives
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}

fn parse_season(value: &str) -> Result<i32> {
    value
        .parse()
        .with_context(|| format!("Season must be a year, got '{}'", value))
}

fn report(output: &FetchOutput) {
    info!(
        "Fetched {} rows, Last-Modified: {}",
        output.table.len(),
        output.last_modified.as_deref().unwrap_or("(none)")
    );
    if let Some(ref path) = output.snapshot {
        println!("{}", path.display());
    }
}

/// Configuration loaded from environment variables
#[derive(Debug, Clone)]
struct Config {
    api_url: String,
    output_dir: PathBuf,
    row_limit: u64,
    timeout_secs: u64,
}

impl Config {
    fn from_env() -> Result<Self> {
        Ok(Config {
            api_url: env::var("HHS_API_URL").unwrap_or_else(|_| DEFAULT_API.to_string()),

            output_dir: env::var("HHS_OUTPUT_DIR")
                .unwrap_or_else(|_| DEFAULT_OUTPUT_DIR.to_string())
                .into(),

            row_limit: env::var("HHS_ROW_LIMIT")
                .unwrap_or_else(|_| CHUNK_LIMIT.to_string())
                .parse()
                .context("HHS_ROW_LIMIT must be a valid number")?,

            timeout_secs: env::var("HHS_TIMEOUT_SECS")
                .unwrap_or_else(|_| "300".to_string())
                .parse()
                .context("HHS_TIMEOUT_SECS must be a valid number")?,
        })
    }
}
