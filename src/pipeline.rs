//! The full load → summarize → save → render run.

use std::path::PathBuf;

use serde::Serialize;
use tracing::info;

use crate::chart::{ChartStyle, render_bar_chart};
use crate::error::PipelineError;
use crate::output::write_summary;
use crate::parser::load_path;
use crate::stats::summarize;
use crate::types::{LoadReport, PhylumSummary};

/// Where a run reads from and writes to.
#[derive(Debug, Clone)]
pub struct Paths {
    pub input: PathBuf,
    pub output: PathBuf,
    pub plot: PathBuf,
}

impl Default for Paths {
    fn default() -> Self {
        Self {
            input: PathBuf::from("taxonomic_data.csv"),
            output: PathBuf::from("phylum_summary.csv"),
            plot: PathBuf::from("phylum_species_count.png"),
        }
    }
}

/// What a successful run produced.
#[derive(Debug, Clone, Serialize)]
pub struct RunOutcome {
    pub report: LoadReport,
    pub summary: Vec<PhylumSummary>,
}

/// Runs every stage in order, stopping at the first fatal error.
///
/// The summary table is written before the chart is rendered, so a chart
/// failure can leave a fresh summary file behind.
#[tracing::instrument(skip_all, fields(input = %paths.input.display()))]
pub fn run(paths: &Paths, style: &ChartStyle) -> Result<RunOutcome, PipelineError> {
    let table = load_path(&paths.input)?;
    let summary = summarize(&table.observations)?;
    write_summary(&paths.output, &summary)?;
    render_bar_chart(&paths.plot, &summary, style)?;

    info!("Task completed successfully!");
    Ok(RunOutcome {
        report: table.report,
        summary,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::fs;

    fn paths_in(dir: &std::path::Path) -> Paths {
        Paths {
            input: dir.join("taxonomic_data.csv"),
            output: dir.join("phylum_summary.csv"),
            plot: dir.join("phylum_species_count.png"),
        }
    }

    #[test]
    fn test_default_paths() {
        let paths = Paths::default();
        assert_eq!(paths.input, PathBuf::from("taxonomic_data.csv"));
        assert_eq!(paths.output, PathBuf::from("phylum_summary.csv"));
        assert_eq!(paths.plot, PathBuf::from("phylum_species_count.png"));
    }

    #[test]
    fn test_run_writes_both_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let paths = paths_in(dir.path());
        fs::write(
            &paths.input,
            "species,phylum,count\nA,Firmicutes,120\nB,Firmicutes,80\nC,Chordata,x\n",
        )
        .unwrap();

        let outcome = run(&paths, &ChartStyle::default()).unwrap();

        assert_eq!(outcome.report.rows_kept, 2);
        assert_eq!(outcome.summary.len(), 1);
        assert!(paths.output.exists());
        assert!(paths.plot.exists());
    }

    #[test]
    fn test_outcome_json_includes_load_report() {
        let dir = tempfile::tempdir().unwrap();
        let paths = paths_in(dir.path());
        fs::write(&paths.input, "species,phylum,count\nA,Firmicutes,3\nB,,4\n").unwrap();

        let outcome = run(&paths, &ChartStyle::default()).unwrap();
        let json: serde_json::Value =
            serde_json::from_str(&crate::output::to_json(&outcome).unwrap()).unwrap();

        assert_eq!(json["report"]["rows_read"], 2);
        assert_eq!(json["report"]["rows_kept"], 1);
        assert_eq!(json["report"]["dropped_missing"], 1);
        assert_eq!(json["summary"][0]["phylum"], "Firmicutes");
        assert_eq!(json["summary"][0]["average_species_count"], "3.00");
    }

    #[test]
    fn test_missing_input_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let paths = paths_in(dir.path());

        let err = run(&paths, &ChartStyle::default()).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::SourceNotFound);
        assert!(!paths.output.exists());
        assert!(!paths.plot.exists());
    }

    #[test]
    fn test_chart_failure_keeps_summary() {
        let dir = tempfile::tempdir().unwrap();
        let mut paths = paths_in(dir.path());
        paths.plot = dir.path().join("missing").join("chart.png");
        fs::write(&paths.input, "species,phylum,count\nA,Firmicutes,1\n").unwrap();

        let err = run(&paths, &ChartStyle::default()).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::SinkWrite);
        assert!(paths.output.exists());
    }
}
