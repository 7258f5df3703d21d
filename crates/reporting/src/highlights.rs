//! Headline view of a run: formatted overall KPIs and the top channels,
//! segments and segment/channel pairs, as shown at the top of a report.

use campaign_analytics::kpi::GroupPerformance;
use campaign_analytics::{CrossEntry, ResultBundle};
use serde::{Deserialize, Serialize};

use crate::format::{format_currency, format_number, format_percentage};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeadlineMetrics {
    pub avg_roi: String,
    pub avg_conversion_rate: String,
    pub total_spend: String,
    pub avg_ctr: String,
    pub avg_engagement: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedGroup {
    pub key: String,
    pub avg_roi: String,
    pub avg_conversion: String,
    pub campaign_count: usize,
}

impl From<&GroupPerformance> for RankedGroup {
    fn from(g: &GroupPerformance) -> Self {
        Self {
            key: g.key.clone(),
            avg_roi: format_percentage(g.avg_roi),
            avg_conversion: format_percentage(g.avg_conversion),
            campaign_count: g.campaign_count,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportHighlights {
    pub headline: HeadlineMetrics,
    pub top_channels: Vec<RankedGroup>,
    pub top_segments: Vec<RankedGroup>,
    /// Best segment/channel pairs with enough observations to be trusted.
    pub top_pairs: Vec<CrossEntry>,
    pub rows_dropped: usize,
}

impl ReportHighlights {
    pub fn from_bundle(bundle: &ResultBundle, top_n: usize, min_pair_campaigns: usize) -> Self {
        let o = &bundle.overall;
        Self {
            headline: HeadlineMetrics {
                avg_roi: format_percentage(o.avg_roi),
                avg_conversion_rate: format_percentage(o.avg_conversion_rate),
                total_spend: format_currency(o.total_spend),
                avg_ctr: format_percentage(o.avg_ctr),
                avg_engagement: format_number(o.avg_engagement),
            },
            top_channels: bundle.channels.iter().take(top_n).map(RankedGroup::from).collect(),
            top_segments: bundle.segments.iter().take(top_n).map(RankedGroup::from).collect(),
            top_pairs: bundle
                .matrix
                .ranked(min_pair_campaigns)
                .into_iter()
                .take(top_n)
                .collect(),
            rows_dropped: bundle.cleaning.total_dropped(),
        }
    }

    /// Plain-text lines, one per fact, for logs and terminals.
    pub fn lines(&self) -> Vec<String> {
        let h = &self.headline;
        let mut lines = vec![
            format!("Average ROI: {}", h.avg_roi),
            format!("Average conversion rate: {}", h.avg_conversion_rate),
            format!("Total spend: {}", h.total_spend),
            format!("Click-through rate: {}", h.avg_ctr),
            format!("Average engagement: {}", h.avg_engagement),
        ];
        for (i, c) in self.top_channels.iter().enumerate() {
            lines.push(format!(
                "Top channel #{}: {} (ROI {}, {} campaigns)",
                i + 1,
                c.key,
                c.avg_roi,
                c.campaign_count
            ));
        }
        for (i, s) in self.top_segments.iter().enumerate() {
            lines.push(format!(
                "Top segment #{}: {} (ROI {}, {} campaigns)",
                i + 1,
                s.key,
                s.avg_roi,
                s.campaign_count
            ));
        }
        for p in &self.top_pairs {
            lines.push(format!(
                "Top pair: {} × {} (ROI {}, {} campaigns)",
                p.segment,
                p.channel,
                format_percentage(p.cell.avg_roi),
                p.cell.campaign_count
            ));
        }
        if self.rows_dropped > 0 {
            lines.push(format!("Rows dropped during cleaning: {}", self.rows_dropped));
        }
        lines
    }
}
