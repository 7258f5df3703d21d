//! Tabular export of a result bundle: one table per bundle section,
//! written as CSV files or a single JSON document.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use campaign_analytics::kpi::GroupPerformance;
use campaign_analytics::ResultBundle;
use campaign_core::config::OutputFormat;
use campaign_core::{CampaignError, CampaignResult};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info};

// ─── Types ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportTable {
    pub name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl ReportTable {
    fn new(name: &str, columns: &[&str], rows: Vec<Vec<Value>>) -> Self {
        Self {
            name: name.to_string(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows,
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    // ─── Builders ───────────────────────────────────────────────────────────

    pub fn overall(bundle: &ResultBundle) -> Self {
        let o = &bundle.overall;
        Self::new(
            "overall",
            &[
                "avg_roi",
                "avg_conversion_rate",
                "total_spend",
                "avg_ctr",
                "avg_engagement",
                "campaign_count",
            ],
            vec![vec![
                json!(o.avg_roi),
                json!(o.avg_conversion_rate),
                json!(o.total_spend),
                json!(o.avg_ctr),
                json!(o.avg_engagement),
                json!(o.campaign_count),
            ]],
        )
    }

    pub fn channels(bundle: &ResultBundle) -> Self {
        Self::group_table("channels", "channel", &bundle.channels)
    }

    pub fn segments(bundle: &ResultBundle) -> Self {
        Self::group_table("segments", "segment", &bundle.segments)
    }

    fn group_table(name: &str, key_column: &str, groups: &[GroupPerformance]) -> Self {
        let rows = groups
            .iter()
            .map(|g| {
                vec![
                    json!(g.key),
                    json!(g.avg_roi),
                    json!(g.avg_conversion),
                    json!(g.campaign_count),
                    json!(g.avg_engagement),
                    json!(g.total_cost),
                ]
            })
            .collect();
        Self::new(
            name,
            &[
                key_column,
                "avg_roi",
                "avg_conversion",
                "campaign_count",
                "avg_engagement",
                "total_cost",
            ],
            rows,
        )
    }

    pub fn temporal(bundle: &ResultBundle) -> Self {
        let rows = bundle
            .temporal
            .iter()
            .map(|p| {
                vec![
                    json!(p.date.to_string()),
                    json!(p.avg_roi),
                    json!(p.avg_conversion),
                    count_cell(p.total_clicks),
                    json!(p.daily_spend),
                    json!(p.campaign_count),
                ]
            })
            .collect();
        Self::new(
            "temporal",
            &[
                "date",
                "avg_roi",
                "avg_conversion",
                "total_clicks",
                "daily_spend",
                "campaign_count",
            ],
            rows,
        )
    }

    /// Long format: one row per observed pair. Unobserved pairs are absent.
    pub fn segment_channel(bundle: &ResultBundle) -> Self {
        let rows = bundle
            .matrix
            .entries()
            .map(|e| {
                vec![
                    json!(e.segment),
                    json!(e.channel),
                    json!(e.cell.avg_roi),
                    json!(e.cell.avg_conversion),
                    json!(e.cell.campaign_count),
                    json!(e.cell.total_cost),
                ]
            })
            .collect();
        Self::new(
            "segment_channel",
            &[
                "segment",
                "channel",
                "avg_roi",
                "avg_conversion",
                "campaign_count",
                "total_cost",
            ],
            rows,
        )
    }

    pub fn cohorts(bundle: &ResultBundle) -> Self {
        let rows = bundle
            .cohorts
            .iter()
            .map(|c| {
                vec![
                    json!(c.cohort_month.to_string()),
                    json!(c.segment),
                    json!(c.avg_roi),
                    json!(c.avg_conversion),
                    json!(c.campaigns),
                ]
            })
            .collect();
        Self::new(
            "cohorts",
            &["cohort_month", "segment", "avg_roi", "avg_conversion", "campaigns"],
            rows,
        )
    }

    pub fn campaigns(bundle: &ResultBundle) -> Self {
        let rows = bundle
            .campaigns
            .iter()
            .map(|c| {
                let m = &c.metrics;
                vec![
                    json!(c.campaign_id),
                    json!(c.channel),
                    json!(c.segment),
                    json!(m.ctr),
                    json!(m.cpc),
                    json!(m.cpm),
                    json!(m.total_conversions),
                    json!(m.cpa),
                    json!(m.cost_efficiency),
                    json!(m.efficiency_score),
                    json!(c.categories.roi),
                    json!(c.categories.engagement),
                    json!(c.categories.conversion),
                ]
            })
            .collect();
        Self::new(
            "campaigns",
            &[
                "campaign_id",
                "channel",
                "segment",
                "ctr",
                "cpc",
                "cpm",
                "total_conversions",
                "cpa",
                "cost_efficiency",
                "efficiency_score",
                "roi_category",
                "engagement_category",
                "conversion_category",
            ],
            rows,
        )
    }

    pub fn all(bundle: &ResultBundle) -> Vec<Self> {
        vec![
            Self::overall(bundle),
            Self::channels(bundle),
            Self::segments(bundle),
            Self::temporal(bundle),
            Self::segment_channel(bundle),
            Self::cohorts(bundle),
            Self::campaigns(bundle),
        ]
    }

    // ─── Encoders ───────────────────────────────────────────────────────────

    /// Header row, then one record per row. Nulls become empty fields.
    pub fn write_csv<W: Write>(&self, writer: W) -> CampaignResult<()> {
        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record(&self.columns).map_err(|e| self.csv_error(e))?;
        for row in &self.rows {
            wtr.write_record(row.iter().map(cell_text))
                .map_err(|e| self.csv_error(e))?;
        }
        wtr.flush()
            .map_err(|e| CampaignError::Export(format!("{}: {e}", self.name)))
    }

    pub fn to_csv(&self) -> CampaignResult<String> {
        let mut buf = Vec::new();
        self.write_csv(&mut buf)?;
        String::from_utf8(buf).map_err(|e| CampaignError::Export(format!("{}: {e}", self.name)))
    }

    fn csv_error(&self, e: csv::Error) -> CampaignError {
        CampaignError::Export(format!("{}: {e}", self.name))
    }

    /// Array of `{column: value}` objects.
    pub fn to_json(&self) -> CampaignResult<String> {
        let records: Vec<serde_json::Map<String, Value>> = self
            .rows
            .iter()
            .map(|row| {
                self.columns
                    .iter()
                    .cloned()
                    .zip(row.iter().cloned())
                    .collect()
            })
            .collect();
        Ok(serde_json::to_string_pretty(&records)?)
    }
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Totals that no longer fit a JSON integer are carried as decimal strings.
fn count_cell(n: u128) -> Value {
    u64::try_from(n)
        .map(Value::from)
        .unwrap_or_else(|_| Value::String(n.to_string()))
}

fn export_error(path: &Path, e: impl std::fmt::Display) -> CampaignError {
    CampaignError::Export(format!("{}: {e}", path.display()))
}

// ─── Export ─────────────────────────────────────────────────────────────────

/// Write the bundle under `dir`, creating it if needed. Returns the files written.
pub fn export_bundle(
    bundle: &ResultBundle,
    dir: &Path,
    format: OutputFormat,
) -> CampaignResult<Vec<PathBuf>> {
    fs::create_dir_all(dir).map_err(|e| export_error(dir, e))?;

    let written = match format {
        OutputFormat::Json => {
            let path = dir.join("bundle.json");
            fs::write(&path, serde_json::to_string_pretty(bundle)?)
                .map_err(|e| export_error(&path, e))?;
            vec![path]
        }
        OutputFormat::Csv => {
            let mut paths = Vec::new();
            for table in ReportTable::all(bundle) {
                let path = dir.join(format!("{}.csv", table.name));
                let file = File::create(&path).map_err(|e| export_error(&path, e))?;
                table.write_csv(file)?;
                debug!(table = %table.name, rows = table.row_count(), "Wrote CSV table");
                paths.push(path);
            }
            paths
        }
    };

    info!(
        run_id = %bundle.run_id,
        files = written.len(),
        dir = %dir.display(),
        "Report exported"
    );
    Ok(written)
}

// ─── Tests ──────────────────────────────────────────────────────────────────
