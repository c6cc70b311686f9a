use std::io::Read;
use std::path::Path;

use anyhow::Context;
use tracing::info;

use crate::classifier::ClassifierHandle;
use crate::error::ValidationError;
use crate::models::RawInputs;
use crate::pipeline::{self, PredictionOutcome};

#[derive(Debug)]
pub struct BatchRow {
    /// 1-based data row, header excluded.
    pub row: usize,
    pub outcome: Result<PredictionOutcome, ValidationError>,
}

/// One independent prediction per CSV row. Rows that fail validation are
/// reported in place; unparseable rows stop the batch.
pub fn run_csv(handle: &ClassifierHandle, csv_path: &Path) -> anyhow::Result<Vec<BatchRow>> {
    let file = std::fs::File::open(csv_path)
        .with_context(|| format!("failed to open {}", csv_path.display()))?;
    run_reader(handle, file)
}

pub fn run_reader<R: Read>(handle: &ClassifierHandle, source: R) -> anyhow::Result<Vec<BatchRow>> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(source);
    let mut rows = Vec::new();

    for (index, record) in reader.deserialize::<RawInputs>().enumerate() {
        let row = index + 1;
        let raw = record.with_context(|| format!("row {row} is not a valid measurement record"))?;
        rows.push(BatchRow {
            row,
            outcome: pipeline::run(handle, &raw),
        });
    }

    let rejected = rows.iter().filter(|row| row.outcome.is_err()).count();
    info!(rows = rows.len(), rejected, "batch complete");
    Ok(rows)
}
