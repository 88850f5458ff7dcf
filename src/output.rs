//! Output formatting and persistence for the phylum summary.
//!
//! Supports pretty-printing, JSON serialization, and CSV write/read.

use std::fs::File;
use std::path::Path;

use anyhow::Result;
use csv::WriterBuilder;
use serde::Serialize;
use tracing::{debug, info};

use crate::error::PipelineError;
use crate::types::PhylumSummary;

/// Logs the summary using Rust's debug pretty-print format.
pub fn print_pretty(summary: &[PhylumSummary]) {
    debug!("{:#?}", summary);
}

/// Renders a summary, or a whole run outcome, as pretty-printed JSON.
pub fn to_json(value: &impl Serialize) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

/// Writes the summary table to `path` with a header row, replacing any
/// existing file.
///
/// # Errors
///
/// [`PipelineError::SinkWrite`] if the file cannot be created or written.
#[tracing::instrument(skip_all, fields(path = %path.as_ref().display()))]
pub fn write_summary(path: impl AsRef<Path>, summary: &[PhylumSummary]) -> Result<(), PipelineError> {
    let path = path.as_ref();
    let sink_err = |e: csv::Error| PipelineError::sink(path, e);

    let file = File::create(path).map_err(|e| PipelineError::sink(path, e))?;
    let mut writer = WriterBuilder::new().has_headers(true).from_writer(file);

    if summary.is_empty() {
        // serialize() emits the header with the first row only
        writer
            .write_record(["phylum", "total_species_count", "average_species_count"])
            .map_err(sink_err)?;
    }
    for row in summary {
        writer.serialize(row).map_err(sink_err)?;
    }
    writer.flush().map_err(|e| PipelineError::sink(path, e))?;

    info!(rows = summary.len(), "Results saved to {}", path.display());
    Ok(())
}

/// Reads a summary table previously written by [`write_summary`].
pub fn read_summary(path: impl AsRef<Path>) -> Result<Vec<PhylumSummary>> {
    let mut rdr = csv::Reader::from_path(path)?;
    let mut rows = Vec::new();

    for result in rdr.deserialize() {
        let record: PhylumSummary = result?;
        rows.push(record);
    }

    Ok(rows)
}
