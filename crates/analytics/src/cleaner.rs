//! Schema validation and row cleaning: turns raw string rows into the
//! typed, deduplicated `CleanedTable` every analyzer consumes.

use std::collections::{BTreeMap, HashSet};

use campaign_core::types::*;
use campaign_core::{CampaignError, CampaignResult};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

// ─── Types ──────────────────────────────────────────────────────────────────

/// Why a raw row did not make it into the cleaned table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DropReason {
    /// A numeric, currency or date field did not parse, or the row was short.
    ParseError,
    /// Parsed, but a field is outside its allowed range.
    ConstraintViolation,
    /// A later row repeating an already-seen `campaign_id`.
    DuplicateKey,
}

impl DropReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ParseError => "parse_error",
            Self::ConstraintViolation => "constraint_violation",
            Self::DuplicateKey => "duplicate_key",
        }
    }
}

/// Row accounting for one cleaning pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleaningReport {
    pub rows_in: usize,
    pub rows_kept: usize,
    pub dropped: BTreeMap<DropReason, usize>,
}

impl CleaningReport {
    pub fn count(&self, reason: DropReason) -> usize {
        self.dropped.get(&reason).copied().unwrap_or(0)
    }

    pub fn total_dropped(&self) -> usize {
        self.dropped.values().sum()
    }

    fn record_drop(&mut self, reason: DropReason) {
        *self.dropped.entry(reason).or_insert(0) += 1;
    }
}

/// Validated campaign rows in input order. Never empty, no duplicate
/// `campaign_id`, every field within range.
#[derive(Debug, Clone, PartialEq)]
pub struct CleanedTable {
    records: Vec<CampaignRecord>,
}

impl CleanedTable {
    /// Builds a table from already-typed records, checking every invariant
    /// the cleaner would otherwise guarantee.
    pub fn from_records(records: Vec<CampaignRecord>) -> CampaignResult<Self> {
        if records.is_empty() {
            return Err(CampaignError::EmptyDataset { dropped: 0 });
        }
        let mut seen = HashSet::with_capacity(records.len());
        for record in &records {
            if let Some(violation) = record.constraint_violation() {
                return Err(CampaignError::Invariant(format!(
                    "campaign {}: {violation}",
                    record.campaign_id
                )));
            }
            if !seen.insert(record.campaign_id.as_str()) {
                return Err(CampaignError::Invariant(format!(
                    "duplicate campaign_id {}",
                    record.campaign_id
                )));
            }
        }
        Ok(Self { records })
    }

    pub fn records(&self) -> &[CampaignRecord] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CampaignRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Analyzers assume a non-empty table; only reachable if that was bypassed.
    pub(crate) fn ensure_non_empty(&self) -> CampaignResult<()> {
        if self.records.is_empty() {
            return Err(CampaignError::Invariant(
                "analyzer received an empty cleaned table".into(),
            ));
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a CleanedTable {
    type Item = &'a CampaignRecord;
    type IntoIter = std::slice::Iter<'a, CampaignRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

// ─── Column Resolution ──────────────────────────────────────────────────────

/// Position of each required column within the raw header row.
#[derive(Debug, Clone, Copy)]
struct ColumnIndex {
    campaign_id: usize,
    campaign_type: usize,
    channel_used: usize,
    target_audience: usize,
    conversion_rate: usize,
    acquisition_cost: usize,
    roi: usize,
    clicks: usize,
    impressions: usize,
    engagement_score: usize,
    customer_segment: usize,
    date: usize,
}

impl ColumnIndex {
    fn resolve(raw: &RawTable) -> CampaignResult<Self> {
        let missing: Vec<String> = REQUIRED_COLUMNS
            .iter()
            .filter(|c| raw.column_index(c).is_none())
            .map(|c| c.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(CampaignError::Schema { missing });
        }

        let idx = |name: &str| raw.column_index(name).unwrap_or_default();
        Ok(Self {
            campaign_id: idx(COL_CAMPAIGN_ID),
            campaign_type: idx(COL_CAMPAIGN_TYPE),
            channel_used: idx(COL_CHANNEL_USED),
            target_audience: idx(COL_TARGET_AUDIENCE),
            conversion_rate: idx(COL_CONVERSION_RATE),
            acquisition_cost: idx(COL_ACQUISITION_COST),
            roi: idx(COL_ROI),
            clicks: idx(COL_CLICKS),
            impressions: idx(COL_IMPRESSIONS),
            engagement_score: idx(COL_ENGAGEMENT_SCORE),
            customer_segment: idx(COL_CUSTOMER_SEGMENT),
            date: idx(COL_DATE),
        })
    }
}

// ─── Cleaner ────────────────────────────────────────────────────────────────

pub struct Cleaner {
    date_format: String,
}

impl Cleaner {
    pub fn new(date_format: impl Into<String>) -> Self {
        Self {
            date_format: date_format.into(),
        }
    }

    /// Validate the schema, parse every row, drop bad rows and later
    /// duplicates. Fails only on a missing column or an empty result.
    pub fn clean(&self, raw: &RawTable) -> CampaignResult<(CleanedTable, CleaningReport)> {
        let columns = ColumnIndex::resolve(raw)?;

        let mut report = CleaningReport {
            rows_in: raw.len(),
            ..Default::default()
        };
        let mut seen: HashSet<String> = HashSet::with_capacity(raw.len());
        let mut records = Vec::with_capacity(raw.len());

        for (line, row) in raw.rows.iter().enumerate() {
            let record = match self.parse_row(row, &columns) {
                Ok(record) => record,
                Err((reason, detail)) => {
                    debug!(row = line, reason = reason.as_str(), %detail, "Dropping row");
                    report.record_drop(reason);
                    continue;
                }
            };

            if !seen.insert(record.campaign_id.clone()) {
                debug!(row = line, campaign_id = %record.campaign_id, "Dropping duplicate campaign");
                report.record_drop(DropReason::DuplicateKey);
                continue;
            }
            records.push(record);
        }

        report.rows_kept = records.len();
        metrics::counter!("cleaner.rows_kept").increment(report.rows_kept as u64);
        for (reason, count) in &report.dropped {
            metrics::counter!("cleaner.rows_dropped", "reason" => reason.as_str())
                .increment(*count as u64);
        }

        if records.is_empty() {
            warn!(rows_in = report.rows_in, "No valid rows after cleaning");
            return Err(CampaignError::EmptyDataset {
                dropped: report.total_dropped(),
            });
        }

        info!(
            rows_in = report.rows_in,
            rows_kept = report.rows_kept,
            parse_errors = report.count(DropReason::ParseError),
            constraint_violations = report.count(DropReason::ConstraintViolation),
            duplicates = report.count(DropReason::DuplicateKey),
            "Cleaning complete"
        );

        Ok((CleanedTable { records }, report))
    }

    fn parse_row(&self, row: &[String], cols: &ColumnIndex) -> Result<CampaignRecord, RowError> {
        let conversion_raw = cell(row, cols.conversion_rate, COL_CONVERSION_RATE)?;
        let cost_raw = cell(row, cols.acquisition_cost, COL_ACQUISITION_COST)?;
        let roi_raw = cell(row, cols.roi, COL_ROI)?;
        let clicks_raw = cell(row, cols.clicks, COL_CLICKS)?;
        let impressions_raw = cell(row, cols.impressions, COL_IMPRESSIONS)?;
        let engagement_raw = cell(row, cols.engagement_score, COL_ENGAGEMENT_SCORE)?;
        let date_raw = cell(row, cols.date, COL_DATE)?;

        let record = CampaignRecord {
            campaign_id: text(row, cols.campaign_id, COL_CAMPAIGN_ID)?,
            campaign_type: text(row, cols.campaign_type, COL_CAMPAIGN_TYPE)?,
            channel_used: text(row, cols.channel_used, COL_CHANNEL_USED)?,
            target_audience: text(row, cols.target_audience, COL_TARGET_AUDIENCE)?,
            conversion_rate: require(parse_float(conversion_raw), COL_CONVERSION_RATE, conversion_raw)?,
            acquisition_cost: require(parse_currency(cost_raw), COL_ACQUISITION_COST, cost_raw)?,
            roi: require(parse_float(roi_raw), COL_ROI, roi_raw)?,
            clicks: require(parse_count(clicks_raw), COL_CLICKS, clicks_raw)?,
            impressions: require(parse_count(impressions_raw), COL_IMPRESSIONS, impressions_raw)?,
            engagement_score: require(parse_float(engagement_raw), COL_ENGAGEMENT_SCORE, engagement_raw)?,
            customer_segment: text(row, cols.customer_segment, COL_CUSTOMER_SEGMENT)?,
            date: require(parse_date(date_raw, &self.date_format), COL_DATE, date_raw)?,
        };

        match record.constraint_violation() {
            Some(violation) => Err((DropReason::ConstraintViolation, violation)),
            None => Ok(record),
        }
    }
}

/// Drop reason plus a human-readable detail for the debug log.
type RowError = (DropReason, String);

fn cell<'r>(row: &'r [String], index: usize, name: &str) -> Result<&'r str, RowError> {
    row.get(index)
        .map(String::as_str)
        .ok_or_else(|| (DropReason::ParseError, format!("missing cell for {name}")))
}

fn text(row: &[String], index: usize, name: &str) -> Result<String, RowError> {
    cell(row, index, name).map(|v| v.trim().to_string())
}

fn require<T>(value: Option<T>, name: &str, raw: &str) -> Result<T, RowError> {
    value.ok_or_else(|| (DropReason::ParseError, format!("{name}: cannot parse {raw:?}")))
}

// ─── Field Parsers ──────────────────────────────────────────────────────────

fn parse_float(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Accepts `1234`, `1234.50`, `$1,234.50` and surrounding whitespace.
pub fn parse_currency(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| *c != '$' && *c != ',')
        .collect();
    parse_float(&cleaned)
}

fn parse_count(raw: &str) -> Option<u64> {
    raw.trim().parse::<u64>().ok()
}

fn parse_date(raw: &str, format: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), format).ok()
}

// ─── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn headers() -> Vec<String> {
        REQUIRED_COLUMNS.iter().map(|c| c.to_string()).collect()
    }

    fn row(id: &str, roi: &str, cost: &str, date: &str) -> Vec<String> {
        vec![
            id, "Email", "Email", "Men 18-24", "0.1", cost, roi, "10", "100", "5", "A", date,
        ]
        .into_iter()
        .map(String::from)
        .collect()
    }

    fn table(rows: Vec<Vec<String>>) -> RawTable {
        RawTable {
            headers: headers(),
            rows,
        }
    }

    #[test]
    fn test_missing_columns_is_schema_error() {
        let mut raw = table(vec![row("1", "0.5", "100", "2024-01-15")]);
        raw.headers.retain(|h| h != COL_ROI && h != COL_DATE);

        let err = Cleaner::new("%Y-%m-%d").clean(&raw).unwrap_err();
        match err {
            CampaignError::Schema { missing } => {
                assert_eq!(missing, vec!["ROI".to_string(), "Date".to_string()]);
            }
            other => panic!("expected schema error, got {other:?}"),
        }
    }

    #[test]
    fn test_column_names_are_case_sensitive() {
        let mut raw = table(vec![row("1", "0.5", "100", "2024-01-15")]);
        raw.headers[6] = "roi".into();
        let err = Cleaner::new("%Y-%m-%d").clean(&raw).unwrap_err();
        assert!(err.is_schema());
    }

    #[test]
    fn test_columns_may_appear_in_any_order() {
        let mut raw = table(vec![row("1", "0.5", "100", "2024-01-15")]);
        raw.headers.reverse();
        for r in &mut raw.rows {
            r.reverse();
        }
        let (cleaned, _) = Cleaner::new("%Y-%m-%d").clean(&raw).unwrap();
        assert!((cleaned.records()[0].roi - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_malformed_row_is_dropped_not_fatal() {
        let raw = table(vec![
            row("1", "0.5", "100", "2024-01-15"),
            row("2", "not-a-number", "100", "2024-01-16"),
        ]);
        let (cleaned, report) = Cleaner::new("%Y-%m-%d").clean(&raw).unwrap();
        assert_eq!(cleaned.len(), 1);
        assert_eq!(report.count(DropReason::ParseError), 1);
        assert_eq!(report.total_dropped(), 1);
        assert_eq!(report.rows_in, 2);
        assert_eq!(report.rows_kept, 1);
    }

    #[test]
    fn test_bad_date_and_short_row_are_parse_errors() {
        let mut short = row("3", "0.5", "100", "2024-01-15");
        short.truncate(5);
        let raw = table(vec![
            row("1", "0.5", "100", "2024-02-30"),
            row("2", "0.5", "100", "2024-01-15"),
            short,
        ]);
        let (cleaned, report) = Cleaner::new("%Y-%m-%d").clean(&raw).unwrap();
        assert_eq!(cleaned.len(), 1);
        assert_eq!(report.count(DropReason::ParseError), 2);
    }

    #[test]
    fn test_duplicates_keep_first_occurrence() {
        let raw = table(vec![
            row("1", "0.5", "100", "2024-01-15"),
            row("1", "0.9", "100", "2024-01-16"),
            row("2", "0.7", "100", "2024-01-17"),
        ]);
        let (cleaned, report) = Cleaner::new("%Y-%m-%d").clean(&raw).unwrap();
        assert_eq!(cleaned.len(), 2);
        assert!((cleaned.records()[0].roi - 0.5).abs() < f64::EPSILON);
        assert_eq!(report.count(DropReason::DuplicateKey), 1);
        assert_eq!(report.count(DropReason::ParseError), 0);
    }

    #[test]
    fn test_duplicate_of_dropped_row_is_kept() {
        // The first "1" never enters the table, so the second is not a duplicate.
        let raw = table(vec![
            row("1", "oops", "100", "2024-01-15"),
            row("1", "0.9", "100", "2024-01-16"),
        ]);
        let (cleaned, report) = Cleaner::new("%Y-%m-%d").clean(&raw).unwrap();
        assert_eq!(cleaned.len(), 1);
        assert_eq!(report.count(DropReason::DuplicateKey), 0);
    }

    #[test]
    fn test_out_of_range_values_are_constraint_violations() {
        let mut high_conversion = row("1", "0.5", "100", "2024-01-15");
        high_conversion[4] = "1.2".into();
        let mut clicks_over_impressions = row("2", "0.5", "100", "2024-01-15");
        clicks_over_impressions[7] = "500".into();
        let mut empty_segment = row("3", "0.5", "100", "2024-01-15");
        empty_segment[10] = "  ".into();
        let negative_cost = row("4", "0.5", "-5", "2024-01-15");

        let raw = table(vec![
            high_conversion,
            clicks_over_impressions,
            empty_segment,
            negative_cost,
            row("5", "-0.3", "100", "2024-01-15"),
        ]);
        let (cleaned, report) = Cleaner::new("%Y-%m-%d").clean(&raw).unwrap();
        assert_eq!(cleaned.len(), 1);
        assert!((cleaned.records()[0].roi + 0.3).abs() < f64::EPSILON);
        assert_eq!(report.count(DropReason::ConstraintViolation), 4);
    }

    #[test]
    fn test_currency_values_are_normalised() {
        assert_eq!(parse_currency("$16,174.00"), Some(16174.0));
        assert_eq!(parse_currency(" $500 "), Some(500.0));
        assert_eq!(parse_currency("1234.5"), Some(1234.5));
        assert_eq!(parse_currency("$"), None);
        assert_eq!(parse_currency("NaN"), None);

        let raw = table(vec![row("1", "0.5", "$1,250.75", "2024-01-15")]);
        let (cleaned, _) = Cleaner::new("%Y-%m-%d").clean(&raw).unwrap();
        assert!((cleaned.records()[0].acquisition_cost - 1250.75).abs() < 1e-9);
    }

    #[test]
    fn test_only_malformed_rows_is_empty_dataset() {
        let raw = table(vec![
            row("1", "bad", "100", "2024-01-15"),
            row("2", "0.5", "100", "yesterday"),
        ]);
        let err = Cleaner::new("%Y-%m-%d").clean(&raw).unwrap_err();
        match err {
            CampaignError::EmptyDataset { dropped } => assert_eq!(dropped, 2),
            other => panic!("expected empty dataset, got {other:?}"),
        }
    }

    #[test]
    fn test_no_rows_is_empty_dataset() {
        let err = Cleaner::new("%Y-%m-%d").clean(&table(vec![])).unwrap_err();
        assert!(err.is_empty_dataset());
    }

    #[test]
    fn test_cleaning_clean_input_is_idempotent() {
        let raw = table(vec![
            row("1", "0.5", "100", "2024-01-15"),
            row("2", "0.7", "200.5", "2024-02-10"),
        ]);
        let cleaner = Cleaner::new("%Y-%m-%d");
        let (first, _) = cleaner.clean(&raw).unwrap();

        let rendered = RawTable::from_records(first.records(), "%Y-%m-%d");
        let (second, report) = cleaner.clean(&rendered).unwrap();
        assert_eq!(first, second);
        assert_eq!(report.total_dropped(), 0);
        assert_eq!(report.rows_kept, 2);
    }

    #[test]
    fn test_from_records_checks_invariants() {
        let raw = table(vec![row("1", "0.5", "100", "2024-01-15")]);
        let (cleaned, _) = Cleaner::new("%Y-%m-%d").clean(&raw).unwrap();
        let record = cleaned.records()[0].clone();

        assert!(CleanedTable::from_records(vec![record.clone()]).is_ok());
        assert!(CleanedTable::from_records(vec![]).is_err());
        assert!(matches!(
            CleanedTable::from_records(vec![record.clone(), record.clone()]),
            Err(CampaignError::Invariant(_))
        ));

        let mut bad = record;
        bad.engagement_score = 11.0;
        assert!(matches!(
            CleanedTable::from_records(vec![bad]),
            Err(CampaignError::Invariant(_))
        ));
    }

    #[test]
    fn test_custom_date_format() {
        let raw = table(vec![row("1", "0.5", "100", "15/01/2024")]);
        let (cleaned, _) = Cleaner::new("%d/%m/%Y").clean(&raw).unwrap();
        assert_eq!(
            cleaned.records()[0].date,
            NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
        );
    }
}
