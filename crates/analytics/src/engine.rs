//! Pipeline orchestration: clean once, then run the independent analyzers
//! over the same immutable table and collect their outputs into a bundle.

use campaign_core::config::{AnalysisConfig, AppConfig};
use campaign_core::{CampaignResult, RawTable};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::cleaner::{Cleaner, CleanedTable, CleaningReport};
use crate::cohort::{CohortAnalyzer, CohortTable};
use crate::cross::{CrossAnalyzer, SegmentChannelMatrix};
use crate::derived::{self, CampaignInsight, CategoryBreakdown};
use crate::kpi::{
    ChannelPerformance, KpiAggregator, KpiReport, OverallMetrics, SegmentPerformance,
    TemporalSeries,
};
use crate::trends::{self, GrowthMetrics, MovingAverage};

/// Everything one run produces, handed to the report renderer.
#[derive(Debug, Clone, Serialize)]
pub struct ResultBundle {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub cleaning: CleaningReport,
    pub overall: OverallMetrics,
    pub channels: ChannelPerformance,
    pub segments: SegmentPerformance,
    pub temporal: TemporalSeries,
    pub matrix: SegmentChannelMatrix,
    pub cohorts: CohortTable,
    pub growth: GrowthMetrics,
    pub moving_averages: Vec<MovingAverage>,
    pub categories: CategoryBreakdown,
    pub campaigns: Vec<CampaignInsight>,
}

pub struct AnalyticsEngine {
    cleaner: Cleaner,
    config: AnalysisConfig,
    kpi: KpiAggregator,
    cross: CrossAnalyzer,
    cohort: CohortAnalyzer,
}

impl AnalyticsEngine {
    pub fn new(config: &AppConfig) -> Self {
        Self::with_settings(config.analysis.clone(), &config.input.date_format)
    }

    pub fn with_settings(config: AnalysisConfig, date_format: &str) -> Self {
        Self {
            cleaner: Cleaner::new(date_format),
            config,
            kpi: KpiAggregator::new(),
            cross: CrossAnalyzer::new(),
            cohort: CohortAnalyzer::new(),
        }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Clean the raw rows and analyze the result. Fails on a missing
    /// column or when no valid rows survive cleaning.
    pub fn run(&self, raw: &RawTable) -> CampaignResult<ResultBundle> {
        let run_id = Uuid::new_v4();
        info!(%run_id, rows = raw.len(), "Starting analytics run");

        let (table, cleaning) = self.cleaner.clean(raw)?;
        let bundle = self.analyze(&table, cleaning, run_id)?;

        info!(
            %run_id,
            campaigns = bundle.overall.campaign_count,
            channels = bundle.channels.len(),
            segments = bundle.segments.len(),
            matrix_cells = bundle.matrix.len(),
            cohorts = bundle.cohorts.len(),
            "Analytics run complete"
        );
        Ok(bundle)
    }

    /// Run every analyzer over an already cleaned table.
    pub fn analyze(
        &self,
        table: &CleanedTable,
        cleaning: CleaningReport,
        run_id: Uuid,
    ) -> CampaignResult<ResultBundle> {
        let (kpis, matrix, cohorts, campaigns) = if self.config.parallel {
            let ((kpis, matrix), (cohorts, campaigns)) = rayon::join(
                || rayon::join(|| self.kpi.aggregate(table), || self.cross.analyze(table)),
                || {
                    rayon::join(
                        || self.cohort.analyze(table),
                        || derived::campaign_insights(table),
                    )
                },
            );
            (kpis?, matrix?, cohorts?, campaigns)
        } else {
            (
                self.kpi.aggregate(table)?,
                self.cross.analyze(table)?,
                self.cohort.analyze(table)?,
                derived::campaign_insights(table),
            )
        };
        let categories = CategoryBreakdown::from_insights(&campaigns);

        let KpiReport {
            overall,
            channels,
            segments,
            temporal,
        } = kpis;
        let growth = trends::growth_metrics(&temporal);
        let moving_averages = trends::moving_averages(&temporal, &self.config.moving_average_windows);

        Ok(ResultBundle {
            run_id,
            generated_at: Utc::now(),
            cleaning,
            overall,
            channels,
            segments,
            temporal,
            matrix,
            cohorts,
            growth,
            moving_averages,
            categories,
            campaigns,
        })
    }
}
