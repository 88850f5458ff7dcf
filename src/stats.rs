//! Per-phylum aggregation of cleaned observations.

use std::collections::BTreeMap;

use tracing::info;

use crate::error::PipelineError;
use crate::types::{Observation, PhylumSummary};
use crate::utility::{from_hundredths, mean_hundredths};

#[derive(Default)]
struct Group {
    total: i64,
    observations: usize,
}

/// Groups observations by phylum and computes the total and mean count of each.
///
/// Phyla are compared case-sensitively and emitted in lexicographic order.
/// An empty input yields an empty summary.
///
/// # Errors
///
/// [`PipelineError::Aggregation`] if a phylum total overflows an `i64`.
#[tracing::instrument(skip_all, fields(observations = observations.len()))]
pub fn summarize(observations: &[Observation]) -> Result<Vec<PhylumSummary>, PipelineError> {
    let mut groups: BTreeMap<&str, Group> = BTreeMap::new();

    for observation in observations {
        let group = groups.entry(observation.phylum.as_str()).or_default();
        group.total = group.total.checked_add(observation.count).ok_or_else(|| {
            PipelineError::Aggregation(format!(
                "total count for phylum '{}' overflows",
                observation.phylum
            ))
        })?;
        group.observations += 1;
    }

    let summary = groups
        .into_iter()
        .map(|(phylum, group)| {
            let average = mean_hundredths(group.total, group.observations).ok_or_else(|| {
                PipelineError::Aggregation(format!("cannot average counts for phylum '{phylum}'"))
            })?;
            Ok(PhylumSummary {
                phylum: phylum.to_string(),
                total_count: group.total,
                average_count: from_hundredths(average),
            })
        })
        .collect::<Result<Vec<_>, PipelineError>>()?;

    info!(phyla = summary.len(), "Summary statistics successfully calculated");
    Ok(summary)
}
