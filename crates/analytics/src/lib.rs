//! Campaign analytics engine: cleaning, KPI aggregation, segment×channel
//! cross analysis, monthly cohorts, and trend analysis over one in-memory
//! batch of campaign records.

mod accumulator;
pub mod cleaner;
pub mod cohort;
pub mod cross;
pub mod derived;
pub mod engine;
pub mod kpi;
pub mod trends;

pub use cleaner::{CleanedTable, Cleaner, CleaningReport, DropReason};
pub use cohort::{CohortAnalyzer, CohortRow, CohortTable};
pub use cross::{CrossAnalyzer, CrossCell, CrossEntry, SegmentChannelMatrix};
pub use derived::{CampaignInsight, CategoryBreakdown, DerivedMetrics, PerformanceCategories};
pub use engine::{AnalyticsEngine, ResultBundle};
pub use kpi::{GroupPerformance, KpiAggregator, KpiReport, OverallMetrics, TemporalPoint};
pub use trends::{GrowthMetrics, MovingAverage};
