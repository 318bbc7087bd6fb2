//! High-level pipeline API: load, enrich, summarize.
//!
//! This module combines the whole flow into one call, the way the CLI
//! consumes it: parse the CSV, prepare the dataset, derive metrics, then
//! summarize the chosen metric at each requested group level.
//!
//! # Example
//!
//! ```rust,ignore
//! use propsum::pipeline::{run_report, ReportOptions};
//!
//! let report = run_report("melb_data.csv", &ReportOptions::default())?;
//! for section in &report.sections {
//!     println!("== by {} ==", section.group_level);
//! }
//! ```

use serde::Serialize;
use std::path::Path;

use crate::enrich::enrich_all;
use crate::error::PipelineResult;
use crate::loader::load_dataset;
use crate::summary::{summarize_market, GroupStats, ALLOWED_GROUP_LEVELS};
use crate::table::Table;

/// Options for [`run_report`].
#[derive(Debug, Clone)]
pub struct ReportOptions {
    /// Metric column to aggregate.
    pub metric: String,
    /// Cap on groups per section; `None` means unlimited.
    pub top_n: Option<usize>,
    /// Group levels to summarize, in output order.
    pub group_levels: Vec<String>,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            metric: "PricePerM2".to_string(),
            top_n: None,
            group_levels: ALLOWED_GROUP_LEVELS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// One summarized group level.
#[derive(Debug, Clone, Serialize)]
pub struct ReportSection {
    /// Group key column.
    pub group_level: String,
    /// Aggregates, sorted descending by median.
    pub groups: Vec<GroupStats>,
}

/// CSV source information, for reporting.
#[derive(Debug, Clone, Serialize)]
pub struct CsvInfo {
    pub encoding: String,
    pub delimiter: char,
    pub headers: Vec<String>,
    pub row_count: usize,
}

/// Result of a complete report run.
#[derive(Debug, Clone, Serialize)]
pub struct MarketReport {
    /// CSV parsing metadata.
    pub csv_info: CsvInfo,
    /// Rows surviving preparation.
    pub prepared_rows: usize,
    /// One section per requested group level.
    pub sections: Vec<ReportSection>,
}

/// Run the full pipeline over a CSV file.
///
/// 1. Parses the CSV with auto-detection
/// 2. Prepares the dataset (dedup, coercion, area backfill)
/// 3. Applies every enricher
/// 4. Summarizes the metric at each requested group level
pub fn run_report<P: AsRef<Path>>(
    path: P,
    options: &ReportOptions,
) -> PipelineResult<MarketReport> {
    let (dataset, parsed) = load_dataset(path)?;

    let csv_info = CsvInfo {
        encoding: parsed.encoding,
        delimiter: parsed.delimiter,
        headers: parsed.table.headers().to_vec(),
        row_count: parsed.table.row_count(),
    };

    let enriched = enrich_all(&dataset.all)?;
    let sections = summarize_levels(&enriched, options)?;

    Ok(MarketReport {
        csv_info,
        prepared_rows: enriched.row_count(),
        sections,
    })
}

/// Summarize an already-enriched table at each requested group level.
pub fn summarize_levels(
    table: &Table,
    options: &ReportOptions,
) -> PipelineResult<Vec<ReportSection>> {
    let mut sections = Vec::with_capacity(options.group_levels.len());
    for level in &options.group_levels {
        let groups = summarize_market(table, level, &options.metric, options.top_n)?;
        sections.push(ReportSection {
            group_level: level.clone(),
            groups,
        });
    }
    Ok(sections)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE_CSV: &str = "\
Suburb,Regionname,CouncilArea,Price,BuildingArea,Landsize,Type
Richmond,Northern,Yarra,600000,120,300,h
Richmond,Northern,Yarra,900000,150,350,h
Carlton,Southern,Melbourne,500000,,250,u
";

    fn sample_file() -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", SAMPLE_CSV).unwrap();
        file
    }

    #[test]
    fn test_run_report_end_to_end() {
        let file = sample_file();
        let report = run_report(file.path(), &ReportOptions::default()).unwrap();

        assert_eq!(report.csv_info.delimiter, ',');
        assert_eq!(report.csv_info.row_count, 3);
        assert_eq!(report.prepared_rows, 3);
        assert_eq!(report.sections.len(), 3);

        let by_region = &report.sections[0];
        assert_eq!(by_region.group_level, "Regionname");
        assert_eq!(by_region.groups.len(), 2);

        // Carlton has no BuildingArea: 500000 / 250 (Landsize fallback)
        let southern = by_region
            .groups
            .iter()
            .find(|g| g.key == "Southern")
            .unwrap();
        assert_eq!(southern.median, 2000.0);
    }

    #[test]
    fn test_run_report_top_n() {
        let file = sample_file();
        let options = ReportOptions {
            top_n: Some(1),
            group_levels: vec!["Suburb".to_string()],
            ..ReportOptions::default()
        };
        let report = run_report(file.path(), &options).unwrap();
        assert_eq!(report.sections[0].groups.len(), 1);
    }

    #[test]
    fn test_run_report_invalid_level() {
        let file = sample_file();
        let options = ReportOptions {
            group_levels: vec!["Street".to_string()],
            ..ReportOptions::default()
        };
        assert!(run_report(file.path(), &options).is_err());
    }

    #[test]
    fn test_run_report_missing_file() {
        let result = run_report("/no/such/file.csv", &ReportOptions::default());
        assert!(result.is_err());
    }
}
