//! Cohort analysis: monthly ROI trend per customer segment.

use std::collections::{BTreeMap, HashSet};

use campaign_core::CampaignResult;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::accumulator::MetricAccumulator;
use crate::cleaner::CleanedTable;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CohortRow {
    /// First day of the month the campaigns ran in.
    pub cohort_month: NaiveDate,
    pub segment: String,
    pub avg_roi: f64,
    pub avg_conversion: f64,
    /// Distinct campaign ids in the cohort.
    pub campaigns: usize,
}

pub type CohortTable = Vec<CohortRow>;

/// Truncates a date to the first day of its month.
pub fn cohort_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

pub struct CohortAnalyzer;

impl CohortAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// One row per (month, segment), ordered by month then segment name.
    pub fn analyze(&self, table: &CleanedTable) -> CampaignResult<CohortTable> {
        table.ensure_non_empty()?;

        let mut cohorts: BTreeMap<(NaiveDate, &str), (MetricAccumulator, HashSet<&str>)> =
            BTreeMap::new();
        for record in table {
            let (acc, ids) = cohorts
                .entry((cohort_month(record.date), record.customer_segment.as_str()))
                .or_default();
            acc.push(record);
            ids.insert(record.campaign_id.as_str());
        }

        let rows: CohortTable = cohorts
            .into_iter()
            .map(|((month, segment), (acc, ids))| CohortRow {
                cohort_month: month,
                segment: segment.to_string(),
                avg_roi: acc.avg_roi(),
                avg_conversion: acc.avg_conversion(),
                campaigns: ids.len(),
            })
            .collect();

        debug!(cohorts = rows.len(), "Cohort table built");
        Ok(rows)
    }
}

impl Default for CohortAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}
