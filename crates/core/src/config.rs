use serde::Deserialize;
use std::path::Path;

use crate::error::{CampaignError, CampaignResult};

/// Root application configuration. Loaded from an optional TOML file, then
/// environment variables with the prefix `CAMPAIGN_INSIGHTS__`.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InputConfig {
    #[serde(default = "default_input_path")]
    pub path: String,
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
    #[serde(default = "default_date_format")]
    pub date_format: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisConfig {
    /// Evaluate the independent analyzers concurrently.
    #[serde(default = "default_parallel")]
    pub parallel: bool,
    /// Minimum observations for a cell to appear in the ranked cross view.
    /// The sparse matrix itself is never filtered.
    #[serde(default = "default_cross_min_campaigns")]
    pub cross_min_campaigns: usize,
    #[serde(default = "default_moving_average_windows")]
    pub moving_average_windows: Vec<usize>,
    #[serde(default = "default_top_n")]
    pub top_n: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Json,
    Csv,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub dir: String,
    #[serde(default = "default_output_format")]
    pub format: OutputFormat,
}

// Default functions
fn default_input_path() -> String {
    "data/raw/marketing_campaign_dataset.csv".to_string()
}
fn default_delimiter() -> char {
    ','
}
fn default_date_format() -> String {
    "%Y-%m-%d".to_string()
}
fn default_parallel() -> bool {
    true
}
fn default_cross_min_campaigns() -> usize {
    10
}
fn default_moving_average_windows() -> Vec<usize> {
    vec![7, 30]
}
fn default_top_n() -> usize {
    3
}
fn default_output_dir() -> String {
    "reports".to_string()
}
fn default_output_format() -> OutputFormat {
    OutputFormat::Json
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            path: default_input_path(),
            delimiter: default_delimiter(),
            date_format: default_date_format(),
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            parallel: default_parallel(),
            cross_min_campaigns: default_cross_min_campaigns(),
            moving_average_windows: default_moving_average_windows(),
            top_n: default_top_n(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            format: default_output_format(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            input: InputConfig::default(),
            analysis: AnalysisConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from an optional config file and environment variables.
    /// Environment variables take precedence over the file.
    pub fn load(file: Option<&Path>) -> CampaignResult<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = file {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        let builder = builder.add_source(
            config::Environment::with_prefix("CAMPAIGN_INSIGHTS")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("analysis.moving_average_windows"),
        );

        builder
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| CampaignError::Config(e.to_string()))
    }
}
