//! Data types passed between pipeline stages.

use serde::{Deserialize, Serialize, Serializer};

/// One validated row of the input table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Observation {
    pub species: String,
    pub phylum: String,
    pub count: i64,
}

/// Aggregate totals for a single phylum.
///
/// Field names on disk follow the summary table header
/// `phylum,total_species_count,average_species_count`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhylumSummary {
    pub phylum: String,
    #[serde(rename = "total_species_count")]
    pub total_count: i64,
    #[serde(rename = "average_species_count", serialize_with = "two_decimals")]
    pub average_count: f64,
}

fn two_decimals<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format!("{value:.2}"))
}

/// Row accounting for a single load.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    pub rows_read: usize,
    pub rows_kept: usize,
    pub dropped_missing: usize,
    pub dropped_non_numeric: usize,
}

impl LoadReport {
    pub fn rows_dropped(&self) -> usize {
        self.dropped_missing + self.dropped_non_numeric
    }
}

/// The cleaned table plus how it was obtained. Input order is preserved.
#[derive(Debug, Default, Clone)]
pub struct CleanTable {
    pub observations: Vec<Observation>,
    pub report: LoadReport,
}

impl CleanTable {
    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }
}
