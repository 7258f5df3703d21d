//! KPI aggregation: overall metrics, per-channel and per-segment
//! performance rankings, and the daily temporal series.

use std::collections::BTreeMap;

use campaign_core::{CampaignRecord, CampaignResult};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::accumulator::MetricAccumulator;
use crate::cleaner::CleanedTable;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverallMetrics {
    pub avg_roi: f64,
    pub avg_conversion_rate: f64,
    pub total_spend: f64,
    /// Impression-weighted: sum(clicks) / sum(impressions).
    pub avg_ctr: f64,
    pub avg_engagement: f64,
    pub campaign_count: usize,
    pub total_clicks: u128,
    pub total_impressions: u128,
}

/// One row of a channel or segment ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupPerformance {
    pub key: String,
    pub avg_roi: f64,
    pub avg_conversion: f64,
    pub campaign_count: usize,
    pub avg_engagement: f64,
    pub total_cost: f64,
}

pub type ChannelPerformance = Vec<GroupPerformance>;
pub type SegmentPerformance = Vec<GroupPerformance>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemporalPoint {
    pub date: NaiveDate,
    pub avg_roi: f64,
    pub avg_conversion: f64,
    pub total_clicks: u128,
    pub daily_spend: f64,
    pub campaign_count: usize,
}

pub type TemporalSeries = Vec<TemporalPoint>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KpiReport {
    pub overall: OverallMetrics,
    pub channels: ChannelPerformance,
    pub segments: SegmentPerformance,
    pub temporal: TemporalSeries,
}

pub struct KpiAggregator;

impl KpiAggregator {
    pub fn new() -> Self {
        Self
    }

    pub fn aggregate(&self, table: &CleanedTable) -> CampaignResult<KpiReport> {
        let report = KpiReport {
            overall: self.overall(table)?,
            channels: self.channel_performance(table)?,
            segments: self.segment_performance(table)?,
            temporal: self.temporal_series(table)?,
        };
        debug!(
            channels = report.channels.len(),
            segments = report.segments.len(),
            days = report.temporal.len(),
            "KPIs aggregated"
        );
        Ok(report)
    }

    pub fn overall(&self, table: &CleanedTable) -> CampaignResult<OverallMetrics> {
        table.ensure_non_empty()?;
        let mut acc = MetricAccumulator::default();
        for record in table {
            acc.push(record);
        }
        Ok(OverallMetrics {
            avg_roi: acc.avg_roi(),
            avg_conversion_rate: acc.avg_conversion(),
            total_spend: acc.total_cost(),
            avg_ctr: acc.weighted_ctr(),
            avg_engagement: acc.avg_engagement(),
            campaign_count: acc.count(),
            total_clicks: acc.total_clicks(),
            total_impressions: acc.total_impressions(),
        })
    }

    pub fn channel_performance(&self, table: &CleanedTable) -> CampaignResult<ChannelPerformance> {
        table.ensure_non_empty()?;
        Ok(rank_groups(table, |r| r.channel_used.as_str()))
    }

    pub fn segment_performance(&self, table: &CleanedTable) -> CampaignResult<SegmentPerformance> {
        table.ensure_non_empty()?;
        Ok(rank_groups(table, |r| r.customer_segment.as_str()))
    }

    /// Day-granularity series in ascending date order. Days without
    /// campaigns are absent, not zero-filled.
    pub fn temporal_series(&self, table: &CleanedTable) -> CampaignResult<TemporalSeries> {
        table.ensure_non_empty()?;
        let mut days: BTreeMap<NaiveDate, MetricAccumulator> = BTreeMap::new();
        for record in table {
            days.entry(record.date).or_default().push(record);
        }
        Ok(days
            .into_iter()
            .map(|(date, acc)| TemporalPoint {
                date,
                avg_roi: acc.avg_roi(),
                avg_conversion: acc.avg_conversion(),
                total_clicks: acc.total_clicks(),
                daily_spend: acc.total_cost(),
                campaign_count: acc.count(),
            })
            .collect())
    }
}

impl Default for KpiAggregator {
    fn default() -> Self {
        Self::new()
    }
}

/// Groups by `key`, then sorts by avg_roi desc, campaign_count desc, key asc.
fn rank_groups<'a, F>(table: &'a CleanedTable, key: F) -> Vec<GroupPerformance>
where
    F: Fn(&'a CampaignRecord) -> &'a str,
{
    let mut groups: BTreeMap<&str, MetricAccumulator> = BTreeMap::new();
    for record in table {
        groups.entry(key(record)).or_default().push(record);
    }

    let mut ranked: Vec<GroupPerformance> = groups
        .into_iter()
        .map(|(key, acc)| GroupPerformance {
            key: key.to_string(),
            avg_roi: acc.avg_roi(),
            avg_conversion: acc.avg_conversion(),
            campaign_count: acc.count(),
            avg_engagement: acc.avg_engagement(),
            total_cost: acc.total_cost(),
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.avg_roi
            .total_cmp(&a.avg_roi)
            .then_with(|| b.campaign_count.cmp(&a.campaign_count))
            .then_with(|| a.key.cmp(&b.key))
    });
    ranked
}

// ─── Tests ──────────────────────────────────────────────────────────────────
