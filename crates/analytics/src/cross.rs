//! Segment × channel cross analysis. The matrix is sparse: only pairs that
//! occur in the cleaned table have a cell, and absence means "no data".

use std::collections::{BTreeMap, BTreeSet};

use campaign_core::CampaignResult;
use serde::{Deserialize, Serialize, Serializer};
use tracing::debug;

use crate::accumulator::MetricAccumulator;
use crate::cleaner::CleanedTable;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CrossCell {
    pub avg_roi: f64,
    pub avg_conversion: f64,
    pub campaign_count: usize,
    pub total_cost: f64,
}

/// A matrix cell together with its key, as exported and ranked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossEntry {
    pub segment: String,
    pub channel: String,
    #[serde(flatten)]
    pub cell: CrossCell,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SegmentChannelMatrix {
    cells: BTreeMap<(String, String), CrossCell>,
}

impl SegmentChannelMatrix {
    /// Mean ROI for the pair, or `None` when the pair was never observed.
    pub fn get(&self, segment: &str, channel: &str) -> Option<f64> {
        self.cell(segment, channel).map(|c| c.avg_roi)
    }

    pub fn cell(&self, segment: &str, channel: &str) -> Option<&CrossCell> {
        self.cells.get(&(segment.to_string(), channel.to_string()))
    }

    pub fn contains(&self, segment: &str, channel: &str) -> bool {
        self.cell(segment, channel).is_some()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn segments(&self) -> BTreeSet<&str> {
        self.cells.keys().map(|(s, _)| s.as_str()).collect()
    }

    pub fn channels(&self) -> BTreeSet<&str> {
        self.cells.keys().map(|(_, c)| c.as_str()).collect()
    }

    /// Cells in (segment, channel) order.
    pub fn entries(&self) -> impl Iterator<Item = CrossEntry> + '_ {
        self.cells.iter().map(|((segment, channel), cell)| CrossEntry {
            segment: segment.clone(),
            channel: channel.clone(),
            cell: *cell,
        })
    }

    /// Cells observed at least `min_campaigns` times, best ROI first.
    /// Ties: campaign_count desc, then segment, then channel.
    pub fn ranked(&self, min_campaigns: usize) -> Vec<CrossEntry> {
        let mut ranked: Vec<CrossEntry> = self
            .entries()
            .filter(|e| e.cell.campaign_count >= min_campaigns)
            .collect();
        ranked.sort_by(|a, b| {
            b.cell
                .avg_roi
                .total_cmp(&a.cell.avg_roi)
                .then_with(|| b.cell.campaign_count.cmp(&a.cell.campaign_count))
                .then_with(|| a.segment.cmp(&b.segment))
                .then_with(|| a.channel.cmp(&b.channel))
        });
        ranked
    }
}

// Tuple keys have no JSON map form, so the matrix serializes as a list of entries.
impl Serialize for SegmentChannelMatrix {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.entries())
    }
}

pub struct CrossAnalyzer;

impl CrossAnalyzer {
    pub fn new() -> Self {
        Self
    }

    pub fn analyze(&self, table: &CleanedTable) -> CampaignResult<SegmentChannelMatrix> {
        table.ensure_non_empty()?;
        let mut groups: BTreeMap<(&str, &str), MetricAccumulator> = BTreeMap::new();
        for record in table {
            groups
                .entry((record.customer_segment.as_str(), record.channel_used.as_str()))
                .or_default()
                .push(record);
        }

        let cells = groups
            .into_iter()
            .map(|((segment, channel), acc)| {
                (
                    (segment.to_string(), channel.to_string()),
                    CrossCell {
                        avg_roi: acc.avg_roi(),
                        avg_conversion: acc.avg_conversion(),
                        campaign_count: acc.count(),
                        total_cost: acc.total_cost(),
                    },
                )
            })
            .collect::<BTreeMap<_, _>>();

        debug!(cells = cells.len(), "Segment/channel matrix built");
        Ok(SegmentChannelMatrix { cells })
    }
}

impl Default for CrossAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────
