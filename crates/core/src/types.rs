use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ─── Input Columns ──────────────────────────────────────────────────────────

pub const COL_CAMPAIGN_ID: &str = "Campaign_ID";
pub const COL_CAMPAIGN_TYPE: &str = "Campaign_Type";
pub const COL_CHANNEL_USED: &str = "Channel_Used";
pub const COL_TARGET_AUDIENCE: &str = "Target_Audience";
pub const COL_CONVERSION_RATE: &str = "Conversion_Rate";
pub const COL_ACQUISITION_COST: &str = "Acquisition_Cost";
pub const COL_ROI: &str = "ROI";
pub const COL_CLICKS: &str = "Clicks";
pub const COL_IMPRESSIONS: &str = "Impressions";
pub const COL_ENGAGEMENT_SCORE: &str = "Engagement_Score";
pub const COL_CUSTOMER_SEGMENT: &str = "Customer_Segment";
pub const COL_DATE: &str = "Date";

/// Column names every input table must carry (case-sensitive), in canonical order.
pub const REQUIRED_COLUMNS: [&str; 12] = [
    COL_CAMPAIGN_ID,
    COL_CAMPAIGN_TYPE,
    COL_CHANNEL_USED,
    COL_TARGET_AUDIENCE,
    COL_CONVERSION_RATE,
    COL_ACQUISITION_COST,
    COL_ROI,
    COL_CLICKS,
    COL_IMPRESSIONS,
    COL_ENGAGEMENT_SCORE,
    COL_CUSTOMER_SEGMENT,
    COL_DATE,
];

// ─── Raw Input ──────────────────────────────────────────────────────────────

/// String-typed rows exactly as an external loader read them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn new(headers: Vec<String>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Renders typed records back into the canonical raw layout.
    pub fn from_records(records: &[CampaignRecord], date_format: &str) -> Self {
        let headers = REQUIRED_COLUMNS.iter().map(|c| c.to_string()).collect();
        let rows = records
            .iter()
            .map(|r| {
                vec![
                    r.campaign_id.clone(),
                    r.campaign_type.clone(),
                    r.channel_used.clone(),
                    r.target_audience.clone(),
                    r.conversion_rate.to_string(),
                    r.acquisition_cost.to_string(),
                    r.roi.to_string(),
                    r.clicks.to_string(),
                    r.impressions.to_string(),
                    r.engagement_score.to_string(),
                    r.customer_segment.clone(),
                    r.date.format(date_format).to_string(),
                ]
            })
            .collect();
        Self { headers, rows }
    }
}

// ─── Typed Record ───────────────────────────────────────────────────────────

/// One validated campaign row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignRecord {
    pub campaign_id: String,
    pub campaign_type: String,
    pub channel_used: String,
    pub target_audience: String,
    /// Fraction in [0, 1].
    pub conversion_rate: f64,
    pub acquisition_cost: f64,
    pub roi: f64,
    pub clicks: u64,
    pub impressions: u64,
    /// Score in [0, 10].
    pub engagement_score: f64,
    pub customer_segment: String,
    pub date: NaiveDate,
}

impl CampaignRecord {
    /// Click-through rate; zero when there were no impressions.
    pub fn ctr(&self) -> f64 {
        if self.impressions > 0 {
            self.clicks as f64 / self.impressions as f64
        } else {
            0.0
        }
    }

    /// Returns the first constraint this record breaks, if any.
    pub fn constraint_violation(&self) -> Option<String> {
        if self.campaign_id.is_empty() {
            return Some("campaign_id is empty".into());
        }
        if self.channel_used.is_empty() {
            return Some("channel_used is empty".into());
        }
        if self.customer_segment.is_empty() {
            return Some("customer_segment is empty".into());
        }
        if !(0.0..=1.0).contains(&self.conversion_rate) {
            return Some(format!(
                "conversion_rate {} outside [0, 1]",
                self.conversion_rate
            ));
        }
        if self.acquisition_cost.is_nan() || self.acquisition_cost < 0.0 {
            return Some(format!(
                "acquisition_cost {} is negative",
                self.acquisition_cost
            ));
        }
        if !self.roi.is_finite() {
            return Some("roi is not finite".into());
        }
        if self.impressions < self.clicks {
            return Some(format!(
                "impressions {} below clicks {}",
                self.impressions, self.clicks
            ));
        }
        if !(0.0..=10.0).contains(&self.engagement_score) {
            return Some(format!(
                "engagement_score {} outside [0, 10]",
                self.engagement_score
            ));
        }
        None
    }
}
