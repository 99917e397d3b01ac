//! Loading entity records and saving selections

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::{ExplorerError, Result};
use crate::plot::EntityRecord;

/// Either a bare array of records or an analysis response that wraps them.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RecordFile {
    Rows(Vec<EntityRecord>),
    Analysis { volcano_data: Vec<EntityRecord> },
}

impl RecordFile {
    fn into_records(self) -> Vec<EntityRecord> {
        match self {
            RecordFile::Rows(rows) => rows,
            RecordFile::Analysis { volcano_data } => volcano_data,
        }
    }
}

pub fn parse_entities(text: &str) -> Result<Vec<EntityRecord>> {
    let file: RecordFile = serde_json::from_str(text)?;
    Ok(file.into_records())
}

/// Read records from a JSON file. A file where no record carries a finite
/// fold change is rejected.
pub fn load_entities(path: &Path) -> Result<Vec<EntityRecord>> {
    let text = fs::read_to_string(path)?;
    let records = parse_entities(&text)?;
    let plottable = records
        .iter()
        .filter(|r| r.fold_change.is_some_and(f64::is_finite))
        .count();
    if plottable == 0 {
        return Err(ExplorerError::EmptyDataset(path.to_path_buf()));
    }
    tracing::info!(
        path = %path.display(),
        records = records.len(),
        plottable,
        "entity records loaded"
    );
    Ok(records)
}

pub fn save_selection(path: &Path, identifiers: &[String]) -> Result<()> {
    let json = serde_json::to_string_pretty(identifiers)?;
    fs::write(path, json)?;
    tracing::info!(path = %path.display(), count = identifiers.len(), "selection saved");
    Ok(())
}
