//! Per-campaign derived metrics and performance categories.

use std::collections::BTreeMap;

use campaign_core::CampaignRecord;
use serde::{Deserialize, Serialize};

use crate::cleaner::CleanedTable;

// ─── Derived Metrics ────────────────────────────────────────────────────────

/// Cost and efficiency ratios for a single campaign. Ratios whose
/// denominator is zero are `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedMetrics {
    pub ctr: f64,
    /// Cost per click.
    pub cpc: Option<f64>,
    /// Cost per thousand impressions.
    pub cpm: Option<f64>,
    pub total_conversions: f64,
    /// Cost per acquisition.
    pub cpa: Option<f64>,
    /// Conversions per unit of spend.
    pub cost_efficiency: Option<f64>,
    pub efficiency_score: f64,
}

impl DerivedMetrics {
    pub fn for_record(record: &CampaignRecord) -> Self {
        let ctr = record.ctr();
        let cost = record.acquisition_cost;
        let total_conversions = record.conversion_rate * record.clicks as f64;

        Self {
            ctr,
            cpc: ratio(cost, record.clicks as f64),
            cpm: ratio(cost, record.impressions as f64).map(|v| v * 1000.0),
            total_conversions,
            cpa: ratio(cost, total_conversions),
            cost_efficiency: ratio(total_conversions, cost),
            efficiency_score: record.roi * 0.4
                + record.conversion_rate * 0.3
                + ctr * 0.2
                + (record.engagement_score / 10.0) * 0.1,
        }
    }
}

fn ratio(numerator: f64, denominator: f64) -> Option<f64> {
    if denominator > 0.0 {
        Some(numerator / denominator)
    } else {
        None
    }
}

// ─── Performance Categories ─────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoiCategory {
    High,
    Medium,
    Low,
}

impl RoiCategory {
    pub fn from_roi(roi: f64) -> Self {
        if roi >= 7.0 {
            Self::High
        } else if roi >= 5.0 {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngagementCategory {
    VeryEngaging,
    Engaging,
    LowEngagement,
}

impl EngagementCategory {
    pub fn from_score(score: f64) -> Self {
        if score >= 8.0 {
            Self::VeryEngaging
        } else if score >= 6.0 {
            Self::Engaging
        } else {
            Self::LowEngagement
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversionCategory {
    High,
    Medium,
    Low,
}

impl ConversionCategory {
    pub fn from_rate(rate: f64) -> Self {
        if rate >= 0.1 {
            Self::High
        } else if rate >= 0.05 {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerformanceCategories {
    pub roi: RoiCategory,
    pub engagement: EngagementCategory,
    pub conversion: ConversionCategory,
}

impl PerformanceCategories {
    pub fn for_record(record: &CampaignRecord) -> Self {
        Self {
            roi: RoiCategory::from_roi(record.roi),
            engagement: EngagementCategory::from_score(record.engagement_score),
            conversion: ConversionCategory::from_rate(record.conversion_rate),
        }
    }
}

/// Derived metrics and categories for one campaign, keyed back to its row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignInsight {
    pub campaign_id: String,
    pub channel: String,
    pub segment: String,
    #[serde(flatten)]
    pub metrics: DerivedMetrics,
    pub categories: PerformanceCategories,
}

impl CampaignInsight {
    pub fn for_record(record: &CampaignRecord) -> Self {
        Self {
            campaign_id: record.campaign_id.clone(),
            channel: record.channel_used.clone(),
            segment: record.customer_segment.clone(),
            metrics: DerivedMetrics::for_record(record),
            categories: PerformanceCategories::for_record(record),
        }
    }
}

/// One insight per cleaned record, in table order.
pub fn campaign_insights(table: &CleanedTable) -> Vec<CampaignInsight> {
    table.iter().map(CampaignInsight::for_record).collect()
}

/// How many campaigns fall into each category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryBreakdown {
    pub roi: BTreeMap<RoiCategory, usize>,
    pub engagement: BTreeMap<EngagementCategory, usize>,
    pub conversion: BTreeMap<ConversionCategory, usize>,
}

impl CategoryBreakdown {
    pub fn from_insights(insights: &[CampaignInsight]) -> Self {
        let mut breakdown = Self::default();
        for categories in insights.iter().map(|i| i.categories) {
            *breakdown.roi.entry(categories.roi).or_insert(0) += 1;
            *breakdown.engagement.entry(categories.engagement).or_insert(0) += 1;
            *breakdown.conversion.entry(categories.conversion).or_insert(0) += 1;
        }
        breakdown
    }
}
