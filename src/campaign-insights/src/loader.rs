//! CSV loading: reads a delimited file into a string-typed `RawTable`.
//! No typing or validation happens here; that is the cleaner's job.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use campaign_core::{CampaignError, CampaignResult, RawTable};
use csv::ReaderBuilder;
use tracing::{debug, info, warn};

pub fn load_csv(path: &Path, delimiter: char) -> CampaignResult<RawTable> {
    let file = File::open(path)
        .map_err(|e| CampaignError::Load(format!("opening {}: {e}", path.display())))?;
    let table = read_csv(file, delimiter).map_err(|e| match e {
        CampaignError::Load(msg) => CampaignError::Load(format!("{}: {msg}", path.display())),
        other => other,
    })?;
    if table.is_empty() {
        warn!(path = %path.display(), "Input has a header row but no records");
    }
    info!(
        path = %path.display(),
        rows = table.len(),
        columns = table.headers.len(),
        "Data loaded"
    );
    Ok(table)
}

pub fn read_csv<R: Read>(reader: R, delimiter: char) -> CampaignResult<RawTable> {
    let delimiter = u8::try_from(delimiter)
        .ok()
        .filter(u8::is_ascii)
        .ok_or_else(|| {
            CampaignError::Load(format!("delimiter {delimiter:?} must be a single ASCII character"))
        })?;

    let mut rdr = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers = rdr
        .headers()
        .map_err(|e| CampaignError::Load(format!("parsing CSV header row: {e}")))?
        .iter()
        .map(|h| h.trim().trim_start_matches('\u{feff}').to_string())
        .collect();

    let mut table = RawTable::new(headers);
    for (line, result) in rdr.records().enumerate() {
        let record = result
            .map_err(|e| CampaignError::Load(format!("parsing CSV record {}: {e}", line + 1)))?;
        table.push_row(record.iter().map(|s| s.to_string()).collect());
    }
    debug!(rows = table.len(), "CSV parsed");
    Ok(table)
}
