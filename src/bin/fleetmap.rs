use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use serde_json::json;

use fleetmap::config::PipelineConfig;
use fleetmap::logging::init_logging;
use fleetmap::pipeline::Session;

/// Turn facility/shipment CSV uploads into map markers and summary counts.
#[derive(Parser, Debug)]
#[command(name = "fleetmap", version)]
struct Cli {
    /// CSV files, ingested in order through one session
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// TOML pipeline configuration
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Pretty-print JSON output
    #[arg(long)]
    pretty: bool,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, default_value = "fleetmap=info")]
    log_level: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    let config = match &cli.config {
        Some(path) => PipelineConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => PipelineConfig::default(),
    };
    let mut session = Session::new(&config)?;

    for input in &cli.inputs {
        let output = session
            .ingest_file(input)
            .with_context(|| format!("ingesting {}", input.display()))?;

        let legend: Vec<_> = session
            .registry()
            .legend()
            .into_iter()
            .map(|(id, color)| json!({ "facilityId": id, "color": color }))
            .collect();
        let doc = json!({
            "source": input.display().to_string(),
            "batchId": output.batch_id,
            "droppedRows": output.dropped_rows,
            "descriptors": output.descriptors,
            "analytics": output.analytics,
            "legend": legend,
        });

        let text = if cli.pretty {
            serde_json::to_string_pretty(&doc)?
        } else {
            serde_json::to_string(&doc)?
        };
        println!("{text}");
    }
    Ok(())
}
