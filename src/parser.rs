//! Loading and cleaning of the raw observation table.
//!
//! The input is delimited text with a header row. Only the `species`,
//! `phylum` and `count` columns are read; any other column is ignored.
//! Rows with a missing value or a count that does not coerce to a number
//! are dropped, everything else becomes an [`Observation`].

use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord};
use tracing::{debug, info};

use crate::error::{PipelineError, RowRejection};
use crate::types::{CleanTable, LoadReport, Observation};

pub const REQUIRED_COLUMNS: [&str; 3] = ["species", "phylum", "count"];

/// Cell values read as null, in addition to empty and whitespace-only cells.
const NA_TOKENS: &[&str] = &[
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Reads and cleans the table stored at `path`.
///
/// # Errors
///
/// [`PipelineError::SourceNotFound`] if nothing exists at `path`, before any
/// parsing. Otherwise the same errors as [`load_reader`].
#[tracing::instrument(skip_all, fields(path = %path.as_ref().display()))]
pub fn load_path(path: impl AsRef<Path>) -> Result<CleanTable, PipelineError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(PipelineError::SourceNotFound {
            path: path.to_path_buf(),
        });
    }

    let file = File::open(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => PipelineError::SourceNotFound {
            path: path.to_path_buf(),
        },
        _ => PipelineError::Parse(e.into()),
    })?;

    load_reader(file)
}

/// Reads and cleans a table from an already open stream.
///
/// # Errors
///
/// - [`PipelineError::Parse`] on malformed or non UTF-8 input
/// - [`PipelineError::TooManyFields`] when a row is wider than the header
/// - [`PipelineError::Schema`] when a required column is absent
pub fn load_reader<R: Read>(reader: R) -> Result<CleanTable, PipelineError> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers = rdr.headers().map_err(PipelineError::Parse)?.clone();
    let columns = ColumnIndex::resolve(&headers)?;

    let mut report = LoadReport::default();
    let mut observations = Vec::new();

    for result in rdr.records() {
        let record = result.map_err(PipelineError::Parse)?;
        let line = record.position().map(|p| p.line()).unwrap_or_default();

        if record.len() > headers.len() {
            return Err(PipelineError::TooManyFields {
                line,
                expected: headers.len(),
                found: record.len(),
            });
        }

        report.rows_read += 1;

        match columns.clean(&record) {
            Ok(observation) => observations.push(observation),
            Err(rejection) => {
                debug!(line, reason = %rejection, "Dropping invalid row");
                match rejection {
                    RowRejection::MissingField(_) => report.dropped_missing += 1,
                    RowRejection::NonNumericCount(_) => report.dropped_non_numeric += 1,
                }
            }
        }
    }

    report.rows_kept = observations.len();

    info!(
        rows_read = report.rows_read,
        rows_kept = report.rows_kept,
        rows_dropped = report.rows_dropped(),
        "Data successfully loaded and cleaned"
    );

    Ok(CleanTable {
        observations,
        report,
    })
}

/// Positions of the required columns within the header row.
struct ColumnIndex {
    species: usize,
    phylum: usize,
    count: usize,
}

impl ColumnIndex {
    fn resolve(headers: &StringRecord) -> Result<Self, PipelineError> {
        let position = |name: &str| headers.iter().position(|h| h.trim() == name);

        match (position("species"), position("phylum"), position("count")) {
            (Some(species), Some(phylum), Some(count)) => Ok(Self {
                species,
                phylum,
                count,
            }),
            _ => {
                let mut missing: Vec<String> = REQUIRED_COLUMNS
                    .iter()
                    .filter(|name| position(*name).is_none())
                    .map(|name| name.to_string())
                    .collect();
                missing.sort();
                Err(PipelineError::Schema { missing })
            }
        }
    }

    /// Applies the row rules in order: presence of all three fields first,
    /// then count coercion.
    fn clean(&self, record: &StringRecord) -> Result<Observation, RowRejection> {
        let species = present(record, self.species, "species")?;
        let phylum = present(record, self.phylum, "phylum")?;
        let raw_count = present(record, self.count, "count")?;

        let count = coerce_count(raw_count)
            .ok_or_else(|| RowRejection::NonNumericCount(raw_count.to_string()))?;

        Ok(Observation {
            species: species.to_string(),
            phylum: phylum.to_string(),
            count,
        })
    }
}

/// Returns the cell verbatim. Surrounding whitespace only matters for
/// deciding whether the cell is missing.
fn present<'r>(
    record: &'r StringRecord,
    index: usize,
    column: &'static str,
) -> Result<&'r str, RowRejection> {
    record
        .get(index)
        .filter(|value| !is_missing(value.trim()))
        .ok_or(RowRejection::MissingField(column))
}

fn is_missing(value: &str) -> bool {
    value.is_empty() || NA_TOKENS.contains(&value)
}

/// Coerces a count cell to an integer, truncating any fractional part.
///
/// Returns `None` for text that is not a finite number or does not fit in
/// an `i64`.
pub fn coerce_count(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if let Ok(value) = raw.parse::<i64>() {
        return Some(value);
    }

    let value: f64 = raw.parse().ok()?;
    if !value.is_finite() {
        return None;
    }

    let truncated = value.trunc();
    // 2^63 is exactly representable, i64::MAX is not.
    if truncated < i64::MIN as f64 || truncated >= 9_223_372_036_854_775_808.0 {
        return None;
    }
    Some(truncated as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    const VALID: &str = "species,phylum,count
SpeciesA,Firmicutes,120
SpeciesB,Firmicutes,80
SpeciesC,Bacteroidetes,200
SpeciesD,Bacteroidetes,50
SpeciesE,Proteobacteria,300
";

    fn load(text: &str) -> Result<CleanTable, PipelineError> {
        load_reader(text.as_bytes())
    }

    #[test]
    fn test_load_valid_keeps_every_row() {
        let table = load(VALID).unwrap();
        assert_eq!(table.len(), 5);
        assert_eq!(table.report.rows_read, 5);
        assert_eq!(table.report.rows_dropped(), 0);
        assert_eq!(table.observations[2].count, 200);
        assert_eq!(table.observations[0].species, "SpeciesA");
    }

    #[test]
    fn test_missing_column_is_schema_error() {
        let err = load("species,count\nSpeciesA,120\nSpeciesB,80\n").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Schema);
        match err {
            PipelineError::Schema { missing } => assert_eq!(missing, vec!["phylum"]),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_empty_input_reports_all_columns_missing() {
        match load("").unwrap_err() {
            PipelineError::Schema { missing } => {
                assert_eq!(missing, vec!["count", "phylum", "species"])
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_values_are_dropped() {
        let table = load(
            "species,phylum,count\nSpeciesA,Firmicutes,\nSpeciesB,,80\nSpeciesC,Bacteroidetes,200\n",
        )
        .unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.observations[0].phylum, "Bacteroidetes");
        assert_eq!(table.report.dropped_missing, 2);
    }

    #[test]
    fn test_non_numeric_count_is_dropped() {
        let table = load(
            "species,phylum,count\nSpeciesA,Firmicutes,not_numeric\nSpeciesB,Proteobacteria,80\nSpeciesC,Bacteroidetes,200\n",
        )
        .unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.report.dropped_non_numeric, 1);
        assert_eq!(table.observations[0].species, "SpeciesB");
    }

    #[test]
    fn test_na_tokens_count_as_missing() {
        let table = load("species,phylum,count\nA,NA,1\nB,Firmicutes,null\nC,Firmicutes,3\n")
            .unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.report.dropped_missing, 2);
    }

    #[test]
    fn test_key_columns_keep_surrounding_whitespace() {
        let table = load("species,phylum,count\nA, Firmicutes,1\nB,Firmicutes, 2 \nC,   ,3\n").unwrap();
        let phyla: Vec<_> = table.observations.iter().map(|o| o.phylum.as_str()).collect();
        assert_eq!(phyla, vec![" Firmicutes", "Firmicutes"]);
        assert_eq!(table.observations[1].count, 2);
        assert_eq!(table.report.dropped_missing, 1);

        let summary = crate::stats::summarize(&table.observations).unwrap();
        assert_eq!(summary.len(), 2);
    }

    #[test]
    fn test_extra_columns_are_ignored() {
        let table = load("site,count,species,phylum\nX,7,A,Chordata\n").unwrap();
        assert_eq!(
            table.observations,
            vec![Observation {
                species: "A".into(),
                phylum: "Chordata".into(),
                count: 7,
            }]
        );
    }

    #[test]
    fn test_short_row_is_dropped_not_fatal() {
        let table = load("species,phylum,count\nA,Firmicutes\nB,Firmicutes,2\n").unwrap();
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_wide_row_is_parse_error() {
        let err = load("species,phylum,count\nA,Firmicutes,1,extra\n").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
    }

    #[test]
    fn test_invalid_utf8_is_parse_error() {
        let bytes: &[u8] = b"species,phylum,count\nA,\xff\xfe,1\n";
        let err = load_reader(bytes).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
    }

    #[test]
    fn test_header_only_yields_empty_table() {
        let table = load("species,phylum,count\n").unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn test_missing_file_is_source_not_found() {
        let err = load_path("definitely/not/here.csv").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SourceNotFound);
    }

    #[test]
    fn test_coerce_count() {
        assert_eq!(coerce_count("42"), Some(42));
        assert_eq!(coerce_count(" 200 "), Some(200));
        assert_eq!(coerce_count("12.9"), Some(12));
        assert_eq!(coerce_count("-3.5"), Some(-3));
        assert_eq!(coerce_count("1e3"), Some(1000));
        assert_eq!(coerce_count("not_numeric"), None);
        assert_eq!(coerce_count("inf"), None);
        assert_eq!(coerce_count("1e300"), None);
    }
}
