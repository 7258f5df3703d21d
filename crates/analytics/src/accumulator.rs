use campaign_core::CampaignRecord;

/// Running sums for one group of records. Every analyzer folds rows into
/// one of these per key, so means and totals are computed the same way
/// everywhere.
#[derive(Debug, Clone, Default)]
pub(crate) struct MetricAccumulator {
    count: usize,
    roi_sum: f64,
    conversion_sum: f64,
    engagement_sum: f64,
    cost_sum: f64,
    clicks: u128,
    impressions: u128,
}

impl MetricAccumulator {
    pub fn push(&mut self, record: &CampaignRecord) {
        self.count += 1;
        self.roi_sum += record.roi;
        self.conversion_sum += record.conversion_rate;
        self.engagement_sum += record.engagement_score;
        self.cost_sum += record.acquisition_cost;
        self.clicks += u128::from(record.clicks);
        self.impressions += u128::from(record.impressions);
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn avg_roi(&self) -> f64 {
        self.mean(self.roi_sum)
    }

    pub fn avg_conversion(&self) -> f64 {
        self.mean(self.conversion_sum)
    }

    pub fn avg_engagement(&self) -> f64 {
        self.mean(self.engagement_sum)
    }

    pub fn total_cost(&self) -> f64 {
        self.cost_sum
    }

    pub fn total_clicks(&self) -> u128 {
        self.clicks
    }

    pub fn total_impressions(&self) -> u128 {
        self.impressions
    }

    /// sum(clicks) / sum(impressions); zero without impressions.
    pub fn weighted_ctr(&self) -> f64 {
        if self.impressions > 0 {
            self.clicks as f64 / self.impressions as f64
        } else {
            0.0
        }
    }

    fn mean(&self, sum: f64) -> f64 {
        if self.count > 0 {
            sum / self.count as f64
        } else {
            0.0
        }
    }
}
