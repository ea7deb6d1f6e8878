//! `banner-preview` -- render a saved banner configuration.
//!
//! Reads a `BannerConfig` JSON document from a file (or `-` for stdin) and
//! prints its render tree as JSON. With `--export <png|jpg|svg>` the tree is
//! sent to the backend export endpoint and the download URL is printed.
//!
//! # Environment variables
//!
//! | Variable                  | Required | Default                     |
//! |---------------------------|----------|-----------------------------|
//! | `API_BASE_URL`            | no       | `http://localhost:3000/api` |
//! | `AI_REQUEST_TIMEOUT_SECS` | no       | `30`                        |
//! | `RUST_LOG`                | no       | `banner_editor=info`        |

use std::io::Read;

use anyhow::Context;
use banner_ai::{AiClientConfig, BannerApiClient};
use banner_core::config::{validate_columns, BannerConfig};
use banner_core::export::{ExportFormat, ExportRequest, ExportService};
use banner_core::preview;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Render a banner configuration, optionally exporting it
#[derive(Parser, Debug)]
#[command(name = "banner-preview")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to a banner configuration JSON file, or `-` for stdin
    source: String,

    /// Send the render tree to the export endpoint (png, jpg, svg)
    #[arg(long, value_name = "FORMAT", value_parser = parse_format)]
    export: Option<ExportFormat>,
}

fn parse_format(value: &str) -> Result<ExportFormat, String> {
    ExportFormat::from_str_value(value).map_err(|e| e.to_string())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "banner_editor=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let raw = read_source(&cli.source)?;
    let config = decode_config(&raw).with_context(|| format!("{} is not a banner configuration", cli.source))?;

    let tree = preview::render(&config);
    tracing::info!(
        banner_id = %config.id,
        columns = config.columns,
        items = tree.item_count,
        hidden = tree.hidden_count,
        "Banner rendered",
    );

    let Some(format) = cli.export else {
        println!("{}", serde_json::to_string_pretty(&tree)?);
        return Ok(());
    };

    let client = BannerApiClient::from_config(&AiClientConfig::from_env()?)?;
    let request = ExportRequest {
        banner_id: config.id.clone(),
        format,
        tree,
    };
    let result = client.export(&request).await?;
    println!("{}", result.download_url);
    Ok(())
}

fn decode_config(raw: &str) -> anyhow::Result<BannerConfig> {
    let config: BannerConfig = serde_json::from_str(raw)?;
    validate_columns(config.columns)?;
    Ok(config)
}

fn read_source(source: &str) -> anyhow::Result<String> {
    if source == "-" {
        let mut raw = String::new();
        std::io::stdin()
            .read_to_string(&mut raw)
            .context("Failed to read stdin")?;
        return Ok(raw);
    }
    std::fs::read_to_string(source).with_context(|| format!("Failed to read {source}"))
}
