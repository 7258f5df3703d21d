//! Trend analysis over the temporal series: period growth and rolling means.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::kpi::TemporalPoint;

/// Percentage change from the first to the last point of the series.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GrowthMetrics {
    pub roi_growth: f64,
    pub conversion_growth: f64,
    pub spend_growth: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovingAveragePoint {
    pub date: NaiveDate,
    /// `None` until the window has filled.
    pub avg_roi: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovingAverage {
    pub window: usize,
    pub points: Vec<MovingAveragePoint>,
}

/// `(last - first) / first * 100`; zero with fewer than two values or a zero start.
pub fn percentage_change(values: &[f64]) -> f64 {
    match (values.first(), values.last()) {
        (Some(&start), Some(&end)) if values.len() >= 2 && start != 0.0 => {
            (end - start) / start * 100.0
        }
        _ => 0.0,
    }
}

pub fn growth_metrics(series: &[TemporalPoint]) -> GrowthMetrics {
    let column = |f: fn(&TemporalPoint) -> f64| series.iter().map(f).collect::<Vec<_>>();
    GrowthMetrics {
        roi_growth: percentage_change(&column(|p| p.avg_roi)),
        conversion_growth: percentage_change(&column(|p| p.avg_conversion)),
        spend_growth: percentage_change(&column(|p| p.daily_spend)),
    }
}

/// Trailing rolling mean of the daily average ROI, one series per window.
/// The series is assumed sorted by date; zero-sized windows are skipped.
pub fn moving_averages(series: &[TemporalPoint], windows: &[usize]) -> Vec<MovingAverage> {
    windows
        .iter()
        .filter(|w| **w > 0)
        .map(|&window| {
            let mut sum = 0.0;
            let points = series
                .iter()
                .enumerate()
                .map(|(i, point)| {
                    sum += point.avg_roi;
                    if i >= window {
                        sum -= series[i - window].avg_roi;
                    }
                    MovingAveragePoint {
                        date: point.date,
                        avg_roi: (i + 1 >= window).then(|| sum / window as f64),
                    }
                })
                .collect();
            MovingAverage { window, points }
        })
        .collect()
}
