//! End-to-end checks of the analytics pipeline, from raw string rows to the
//! result bundle.

#[cfg(test)]
mod tests {
    use campaign_analytics::{AnalyticsEngine, Cleaner, DropReason};
    use campaign_core::config::AppConfig;
    use campaign_core::{CampaignError, RawTable, REQUIRED_COLUMNS};
    use chrono::NaiveDate;
    use std::collections::HashSet;

    const CHANNELS: [&str; 5] = ["Email", "Facebook", "Google Ads", "Instagram", "YouTube"];
    const SEGMENTS: [&str; 4] = ["Fashionistas", "Foodies", "Health & Wellness", "Tech Enthusiasts"];

    fn headers() -> Vec<String> {
        REQUIRED_COLUMNS.iter().map(|c| c.to_string()).collect()
    }

    #[allow(clippy::too_many_arguments)]
    fn row(
        id: &str,
        channel: &str,
        segment: &str,
        conversion: &str,
        cost: &str,
        roi: &str,
        clicks: &str,
        impressions: &str,
        engagement: &str,
        date: &str,
    ) -> Vec<String> {
        [
            id, "Email", channel, "Men 18-24", conversion, cost, roi, clicks, impressions,
            engagement, segment, date,
        ]
        .iter()
        .map(|s| s.to_string())
        .collect()
    }

    /// A deterministic, moderately sized dataset covering many
    /// channel/segment/month combinations.
    fn synthetic_table(n: usize) -> RawTable {
        let mut raw = RawTable::new(headers());
        for i in 0..n {
            let channel = CHANNELS[i % CHANNELS.len()];
            let segment = SEGMENTS[(i / 3) % SEGMENTS.len()];
            let month = (i % 12) as u32 + 1;
            let day = (i % 28) as u32 + 1;
            let clicks = (i * 7) % 400;
            let impressions = clicks + (i * 13) % 2000;
            raw.push_row(row(
                &format!("{}", i + 1),
                channel,
                segment,
                &format!("{:.2}", (i % 15) as f64 / 100.0),
                &format!("${},{:03}.00", 1 + i % 20, (i * 37) % 1000),
                &format!("{:.2}", ((i * 31) % 800) as f64 / 100.0),
                &clicks.to_string(),
                &impressions.to_string(),
                &((i % 10) + 1).to_string(),
                &format!("2021-{month:02}-{day:02}"),
            ));
        }
        raw
    }

    #[test]
    fn test_spec_example_end_to_end() {
        let mut raw = RawTable::new(headers());
        raw.push_row(row("1", "Email", "A", "0.1", "100", "0.5", "10", "100", "5", "2024-01-15"));
        raw.push_row(row("2", "Email", "A", "0.2", "200", "0.7", "30", "150", "7", "2024-02-10"));

        let bundle = AnalyticsEngine::new(&AppConfig::default()).run(&raw).unwrap();

        assert!((bundle.overall.avg_roi - 0.6).abs() < 1e-9);
        assert!((bundle.overall.total_spend - 300.0).abs() < 1e-9);
        assert!((bundle.overall.avg_ctr - 40.0 / 250.0).abs() < 1e-12);

        assert_eq!(bundle.channels.len(), 1);
        assert_eq!(bundle.channels[0].key, "Email");
        assert_eq!(bundle.channels[0].campaign_count, 2);
        assert!((bundle.channels[0].avg_roi - 0.6).abs() < 1e-9);

        assert_eq!(bundle.cohorts.len(), 2);
        assert_eq!(bundle.cohorts[0].cohort_month, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(bundle.cohorts[0].segment, "A");
        assert!((bundle.cohorts[0].avg_roi - 0.5).abs() < 1e-9);
        assert_eq!(bundle.cohorts[1].cohort_month, NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
        assert!((bundle.cohorts[1].avg_roi - 0.7).abs() < 1e-9);
    }

    #[test]
    fn test_group_counts_match_row_count() {
        let raw = synthetic_table(500);
        let bundle = AnalyticsEngine::new(&AppConfig::default()).run(&raw).unwrap();
        let kept = bundle.cleaning.rows_kept;
        assert_eq!(bundle.channels.iter().map(|c| c.campaign_count).sum::<usize>(), kept);
        assert_eq!(bundle.segments.iter().map(|s| s.campaign_count).sum::<usize>(), kept);
        assert_eq!(bundle.temporal.iter().map(|t| t.campaign_count).sum::<usize>(), kept);
        assert_eq!(
            bundle.matrix.entries().map(|e| e.cell.campaign_count).sum::<usize>(),
            kept
        );
    }

    #[test]
    fn test_avg_ctr_is_weighted_over_cleaned_rows() {
        let raw = synthetic_table(300);
        let (table, _) = Cleaner::new("%Y-%m-%d").clean(&raw).unwrap();
        let clicks: u64 = table.iter().map(|r| r.clicks).sum();
        let impressions: u64 = table.iter().map(|r| r.impressions).sum();

        let bundle = AnalyticsEngine::new(&AppConfig::default()).run(&raw).unwrap();
        assert!((bundle.overall.avg_ctr - clicks as f64 / impressions as f64).abs() < 1e-12);
    }

    #[test]
    fn test_matrix_keys_match_observed_pairs() {
        let raw = synthetic_table(200);
        let (table, _) = Cleaner::new("%Y-%m-%d").clean(&raw).unwrap();
        let observed: HashSet<(String, String)> = table
            .iter()
            .map(|r| (r.customer_segment.clone(), r.channel_used.clone()))
            .collect();

        let bundle = AnalyticsEngine::new(&AppConfig::default()).run(&raw).unwrap();
        let keys: Vec<(String, String)> = bundle
            .matrix
            .entries()
            .map(|e| (e.segment, e.channel))
            .collect();
        let unique: HashSet<_> = keys.iter().cloned().collect();
        assert_eq!(keys.len(), unique.len());
        assert_eq!(unique, observed);
    }

    #[test]
    fn test_cohort_table_totally_ordered() {
        let bundle = AnalyticsEngine::new(&AppConfig::default())
            .run(&synthetic_table(400))
            .unwrap();
        for pair in bundle.cohorts.windows(2) {
            let a = (pair[0].cohort_month, pair[0].segment.as_str());
            let b = (pair[1].cohort_month, pair[1].segment.as_str());
            assert!(a < b, "cohorts out of order: {a:?} then {b:?}");
        }
        assert!(bundle.cohorts.iter().all(|c| c.cohort_month.format("%d").to_string() == "01"));
    }

    #[test]
    fn test_rankings_are_sorted() {
        let bundle = AnalyticsEngine::new(&AppConfig::default())
            .run(&synthetic_table(250))
            .unwrap();
        for pair in bundle.channels.windows(2) {
            assert!(pair[0].avg_roi >= pair[1].avg_roi);
        }
        for pair in bundle.temporal.windows(2) {
            assert!(pair[0].date < pair[1].date);
        }
    }

    #[test]
    fn test_mixed_bad_rows_are_tallied() {
        let mut raw = synthetic_table(20);
        raw.push_row(row("900", "Email", "A", "0.1", "100", "n/a", "1", "10", "5", "2024-01-01"));
        raw.push_row(row("901", "Email", "A", "0.1", "100", "1.0", "1", "10", "5", "01/02/2024"));
        raw.push_row(row("5", "Email", "A", "0.1", "100", "1.0", "1", "10", "5", "2024-01-01"));
        raw.push_row(row("902", "Email", "A", "0.1", "100", "1.0", "11", "10", "5", "2024-01-01"));

        let bundle = AnalyticsEngine::new(&AppConfig::default()).run(&raw).unwrap();
        assert_eq!(bundle.cleaning.count(DropReason::ParseError), 2);
        assert_eq!(bundle.cleaning.count(DropReason::DuplicateKey), 1);
        assert_eq!(bundle.cleaning.count(DropReason::ConstraintViolation), 1);
        assert_eq!(bundle.cleaning.rows_kept, 20);
    }

    #[test]
    fn test_only_malformed_rows_fails() {
        let mut raw = RawTable::new(headers());
        raw.push_row(row("1", "Email", "A", "x", "100", "0.5", "10", "100", "5", "2024-01-15"));
        raw.push_row(row("2", "Email", "A", "0.1", "100", "0.5", "10", "100", "5", "never"));
        let err = AnalyticsEngine::new(&AppConfig::default()).run(&raw).unwrap_err();
        assert!(matches!(err, CampaignError::EmptyDataset { dropped: 2 }));
    }

    #[test]
    fn test_bundle_serializes_to_json() {
        let bundle = AnalyticsEngine::new(&AppConfig::default())
            .run(&synthetic_table(50))
            .unwrap();
        let json = serde_json::to_value(&bundle).unwrap();
        assert!(json["overall"]["avg_ctr"].is_number());
        assert!(json["matrix"].is_array());
        assert_eq!(json["cleaning"]["rows_in"], 50);
        assert!(json["cohorts"][0]["cohort_month"].is_string());
    }

    #[test]
    fn test_click_totals_beyond_u64() {
        let max = u64::MAX.to_string();
        let mut raw = RawTable::new(headers());
        raw.push_row(row("1", "Email", "A", "0.1", "100", "0.5", &max, &max, "5", "2024-01-15"));
        raw.push_row(row("2", "Email", "A", "0.1", "100", "0.5", &max, &max, "5", "2024-01-15"));

        let bundle = AnalyticsEngine::new(&AppConfig::default()).run(&raw).unwrap();
        assert_eq!(bundle.overall.total_clicks, 2 * u128::from(u64::MAX));
        assert!((bundle.overall.avg_ctr - 1.0).abs() < 1e-12);
        assert_eq!(bundle.temporal[0].total_clicks, 2 * u128::from(u64::MAX));
        assert!((bundle.matrix.cell("A", "Email").unwrap().avg_roi - 0.5).abs() < 1e-12);
        let json = serde_json::to_string(&bundle).unwrap();
        assert!(json.contains("36893488147419103230"));
    }
}
