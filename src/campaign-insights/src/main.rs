//! Campaign Insights: batch analytics over marketing-campaign records.
//!
//! Loads a campaign CSV, runs the analytics engine, and exports the result
//! bundle for the report renderer.

mod loader;

use std::path::{Path, PathBuf};

use anyhow::Context;
use campaign_analytics::AnalyticsEngine;
use campaign_core::config::{AppConfig, OutputFormat};
use campaign_reporting::{export_bundle, ReportHighlights};
use clap::{Parser, ValueEnum};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatArg {
    Json,
    Csv,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Json => OutputFormat::Json,
            FormatArg::Csv => OutputFormat::Csv,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "campaign-insights")]
#[command(about = "KPI, cross-channel and cohort analytics for marketing campaigns")]
#[command(version)]
struct Cli {
    /// TOML config file (environment variables still take precedence)
    #[arg(long, env = "CAMPAIGN_INSIGHTS_CONFIG")]
    config: Option<PathBuf>,

    /// Campaign CSV file (overrides config)
    #[arg(long, env = "CAMPAIGN_INSIGHTS__INPUT__PATH")]
    input: Option<PathBuf>,

    /// Directory for the exported report data (overrides config)
    #[arg(long, env = "CAMPAIGN_INSIGHTS__OUTPUT__DIR")]
    output_dir: Option<PathBuf>,

    /// Export format (overrides config)
    #[arg(long, value_enum)]
    format: Option<FormatArg>,

    /// Run the analyzers one after another instead of concurrently
    #[arg(long, default_value_t = false)]
    sequential: bool,

    /// Human-readable logs instead of JSON
    #[arg(long, default_value_t = false)]
    pretty_logs: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "campaign_insights=info,campaign_analytics=info,campaign_reporting=info".into());
    if cli.pretty_logs {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    }

    info!("Campaign Insights starting up");

    // Load configuration
    let mut config = match cli.config.as_deref() {
        Some(path) => AppConfig::load(Some(path))
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => AppConfig::load(None).unwrap_or_else(|e| {
            warn!(error = %e, "Failed to load config, using defaults");
            AppConfig::default()
        }),
    };

    // Apply CLI overrides
    if let Some(input) = cli.input {
        config.input.path = input.display().to_string();
    }
    if let Some(dir) = cli.output_dir {
        config.output.dir = dir.display().to_string();
    }
    if let Some(format) = cli.format {
        config.output.format = format.into();
    }
    if cli.sequential {
        config.analysis.parallel = false;
    }

    info!(
        input = %config.input.path,
        output_dir = %config.output.dir,
        format = ?config.output.format,
        parallel = config.analysis.parallel,
        "Configuration loaded"
    );

    let raw = loader::load_csv(Path::new(&config.input.path), config.input.delimiter)?;

    let engine = AnalyticsEngine::new(&config);
    let bundle = engine.run(&raw).context("analytics run failed")?;

    let written = export_bundle(&bundle, Path::new(&config.output.dir), config.output.format)?;

    let highlights = ReportHighlights::from_bundle(
        &bundle,
        config.analysis.top_n,
        config.analysis.cross_min_campaigns,
    );
    for line in highlights.lines() {
        info!(run_id = %bundle.run_id, "{line}");
    }

    info!(
        run_id = %bundle.run_id,
        files = written.len(),
        dir = %config.output.dir,
        "Analysis complete"
    );
    Ok(())
}
