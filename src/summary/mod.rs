//! Market summarization by grouping key.
//!
//! [`summarize_market`] groups a table by one of the allowed categorical
//! keys (region, council area, suburb), aggregates a numeric metric per
//! group, then sorts groups by descending median. Groups with equal
//! medians are ordered by ascending group key, so output order is fully
//! deterministic.

use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::error::{SummaryError, SummaryResult};
use crate::table::{Cell, Table};

/// Group keys accepted by [`summarize_market`].
pub const ALLOWED_GROUP_LEVELS: [&str; 3] = ["Regionname", "CouncilArea", "Suburb"];

/// Aggregate statistics for one group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupStats {
    /// Group key value (region, council area, or suburb name).
    pub key: String,
    /// Number of rows with a usable metric value.
    pub count: usize,
    /// Arithmetic mean of the metric.
    pub mean: f64,
    /// Median of the metric (midpoint average for even counts).
    pub median: f64,
    /// Smallest metric value.
    pub min: f64,
    /// Largest metric value.
    pub max: f64,
}

/// Summarize a metric column per group.
///
/// Rows with a missing group key or a missing/non-numeric metric are
/// dropped before aggregation. `top_n` caps the number of returned
/// groups; `None` means unlimited.
///
/// # Errors
///
/// - [`SummaryError::InvalidGroupLevel`] when `group_level` is outside
///   [`ALLOWED_GROUP_LEVELS`]
/// - [`SummaryError::UnknownMetric`] when `metric` is not a table column
/// - [`SummaryError::MissingColumn`] when the group column is absent
///
/// # Example
/// ```ignore
/// let stats = summarize_market(&table, "Regionname", "PricePerM2", Some(15))?;
/// for group in &stats {
///     println!("{}: median {:.0}", group.key, group.median);
/// }
/// ```
pub fn summarize_market(
    table: &Table,
    group_level: &str,
    metric: &str,
    top_n: Option<usize>,
) -> SummaryResult<Vec<GroupStats>> {
    if !ALLOWED_GROUP_LEVELS.contains(&group_level) {
        return Err(SummaryError::InvalidGroupLevel {
            given: group_level.to_string(),
            allowed: ALLOWED_GROUP_LEVELS.iter().map(|s| s.to_string()).collect(),
        });
    }
    if !table.has_column(metric) {
        return Err(SummaryError::UnknownMetric(metric.to_string()));
    }

    let keys = table.require_column(group_level)?;
    let values = table.require_column(metric)?;

    let mut groups: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for (key, value) in keys.iter().zip(values) {
        if let (Some(key), Some(value)) = (key.as_text(), value.as_number()) {
            groups.entry(key).or_default().push(value);
        }
    }

    let mut stats: Vec<GroupStats> = groups
        .into_iter()
        .map(|(key, values)| aggregate(key, values))
        .collect();

    // Descending by median; equal medians fall back to ascending key.
    // BTreeMap iteration already yields keys in order, and the sort is
    // stable, so the explicit comparison only documents the intent.
    stats.sort_by(|a, b| {
        b.median
            .partial_cmp(&a.median)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.key.cmp(&b.key))
    });

    if let Some(n) = top_n {
        stats.truncate(n);
    }

    Ok(stats)
}

/// Render summary rows as a table, with the group key as a plain column.
pub fn stats_to_table(group_level: &str, stats: &[GroupStats]) -> Table {
    let columns = vec![
        (
            group_level.to_string(),
            stats.iter().map(|s| Cell::Text(s.key.clone())).collect(),
        ),
        (
            "count".to_string(),
            stats.iter().map(|s| Cell::Number(s.count as f64)).collect(),
        ),
        (
            "mean".to_string(),
            stats.iter().map(|s| Cell::Number(s.mean)).collect(),
        ),
        (
            "median".to_string(),
            stats.iter().map(|s| Cell::Number(s.median)).collect(),
        ),
        (
            "min".to_string(),
            stats.iter().map(|s| Cell::Number(s.min)).collect(),
        ),
        (
            "max".to_string(),
            stats.iter().map(|s| Cell::Number(s.max)).collect(),
        ),
    ];

    // Columns are built row-aligned from the same slice; length mismatch
    // cannot occur.
    Table::from_columns(columns).unwrap_or_default()
}

fn aggregate(key: &str, mut values: Vec<f64>) -> GroupStats {
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));

    let count = values.len();
    let sum: f64 = values.iter().sum();
    let min = values.first().copied().unwrap_or(f64::NAN);
    let max = values.last().copied().unwrap_or(f64::NAN);

    GroupStats {
        key: key.to_string(),
        count,
        mean: sum / count as f64,
        median: median_of_sorted(&values),
        min,
        max,
    }
}

/// Median of an already-sorted slice.
fn median_of_sorted(values: &[f64]) -> f64 {
    let n = values.len();
    if n == 0 {
        return f64::NAN;
    }
    if n % 2 == 1 {
        values[n / 2]
    } else {
        (values[n / 2 - 1] + values[n / 2]) / 2.0
    }
}
