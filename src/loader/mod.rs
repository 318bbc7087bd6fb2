//! Dataset loading and preparation.
//!
//! Turns a freshly parsed property-sales table into something the enrichers
//! and summarizer can trust:
//!
//! 1. Drop exact duplicate rows
//! 2. Coerce Price to numeric and drop rows without a price
//! 3. Guarantee Landsize and BuildingArea columns exist and are numeric,
//!    backfilling BuildingArea gaps from Landsize
//! 4. Coerce secondary numeric columns, filling gaps with the column mean
//! 5. Normalize the sale Date to ISO format
//! 6. Split by property Type into houses / units / townhouses

use chrono::NaiveDate;

use crate::error::{PipelineError, PipelineResult, TableResult};
use crate::parser::{parse_file_auto, ParseResult};
use crate::table::{Cell, Table};
use std::path::Path;

/// Secondary numeric columns. Gaps are filled with the column mean so
/// downstream ratios never hit a hole in these.
const NUMERIC_COLUMNS: [&str; 8] = [
    "Rooms",
    "Bedroom2",
    "Bathroom",
    "Car",
    "YearBuilt",
    "Lattitude",
    "Longtitude",
    "Propertycount",
];

/// Date formats seen in the wild for this dataset.
const DATE_FORMATS: [&str; 2] = ["%d/%m/%Y", "%Y-%m-%d"];

/// A prepared dataset, split by property type.
#[derive(Debug, Clone)]
pub struct Dataset {
    /// Every record.
    pub all: Table,
    /// Records with Type == "h".
    pub houses: Table,
    /// Records with Type == "u".
    pub units: Table,
    /// Records with Type == "t".
    pub townhouses: Table,
}

/// Load a CSV file and prepare it for analysis.
///
/// Combines [`parse_file_auto`] and [`prepare`]; the [`ParseResult`]
/// metadata (encoding, delimiter) is returned alongside for reporting.
pub fn load_dataset<P: AsRef<Path>>(path: P) -> PipelineResult<(Dataset, ParseResult)> {
    let parsed = parse_file_auto(path)?;
    let dataset = prepare(&parsed.table)?;
    Ok((dataset, parsed))
}

/// Prepare a raw table for analysis.
///
/// Guarantees the output tables carry numeric Price, Landsize, and
/// BuildingArea columns, with BuildingArea backfilled from Landsize.
/// Errors with [`PipelineError::EmptyInput`] when no row survives the
/// price filter.
pub fn prepare(raw: &Table) -> PipelineResult<Dataset> {
    let table = raw.drop_duplicates();

    // Price is mandatory: coerce, then drop rows without one.
    let table = coerce_numeric(&table, "Price")?;
    let price = table.require_column("Price")?.to_vec();
    let table = table.filter_rows(|i| price[i].as_number().is_some());

    if table.is_empty() {
        return Err(PipelineError::EmptyInput);
    }

    // Area columns must exist even when the source omits them.
    let table = ensure_column(&table, "Landsize")?;
    let table = coerce_numeric(&table, "Landsize")?;
    let table = if table.has_column("BuildingArea") {
        coerce_numeric(&table, "BuildingArea")?
    } else {
        // No BuildingArea at all: mirror Landsize so the enricher's
        // primary column always resolves.
        let landsize = table.require_column("Landsize")?.to_vec();
        table.with_column("BuildingArea", landsize)?
    };
    let table = backfill(&table, "BuildingArea", "Landsize")?;

    // Secondary numeric columns: coerce and mean-fill when present.
    let mut table = table;
    for col in NUMERIC_COLUMNS {
        if table.has_column(col) {
            table = coerce_numeric(&table, col)?;
            table = fill_with_mean(&table, col)?;
        }
    }
    if table.has_column("Postcode") {
        table = coerce_numeric(&table, "Postcode")?;
    }
    if table.has_column("Date") {
        table = normalize_dates(&table, "Date")?;
    }

    let houses = split_by_type(&table, "h");
    let units = split_by_type(&table, "u");
    let townhouses = split_by_type(&table, "t");

    Ok(Dataset {
        all: table,
        houses,
        units,
        townhouses,
    })
}

/// New table with the named column coerced to numeric cells.
///
/// Text that does not parse as a number becomes null.
pub fn coerce_numeric(table: &Table, name: &str) -> TableResult<Table> {
    let cells = table
        .require_column(name)?
        .iter()
        .map(Cell::to_number)
        .collect();
    table.with_column(name, cells)
}

/// New table where nulls in `name` are replaced by the value in `source`.
fn backfill(table: &Table, name: &str, source: &str) -> TableResult<Table> {
    let target = table.require_column(name)?;
    let fallback = table.require_column(source)?;

    let cells = target
        .iter()
        .zip(fallback)
        .map(|(t, s)| if t.is_null() { s.clone() } else { t.clone() })
        .collect();
    table.with_column(name, cells)
}

/// New table where nulls in a numeric column are replaced by its mean.
///
/// A column with no numeric values at all is left as-is.
fn fill_with_mean(table: &Table, name: &str) -> TableResult<Table> {
    let col = table.require_column(name)?;
    let values: Vec<f64> = col.iter().filter_map(Cell::as_number).collect();
    if values.is_empty() {
        return Ok(table.clone());
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;

    let cells = col
        .iter()
        .map(|c| match c.as_number() {
            Some(n) => Cell::Number(n),
            None => Cell::Number(mean),
        })
        .collect();
    table.with_column(name, cells)
}

/// New table with an all-null column added when absent.
fn ensure_column(table: &Table, name: &str) -> TableResult<Table> {
    if table.has_column(name) {
        Ok(table.clone())
    } else {
        table.with_column(name, vec![Cell::Null; table.row_count()])
    }
}

/// New table with the date column rewritten as ISO `YYYY-MM-DD` text.
///
/// Unparseable dates become null rather than failing the load.
fn normalize_dates(table: &Table, name: &str) -> TableResult<Table> {
    let cells = table
        .require_column(name)?
        .iter()
        .map(|c| match c.as_text().and_then(parse_date) {
            Some(d) => Cell::Text(d.format("%Y-%m-%d").to_string()),
            None => Cell::Null,
        })
        .collect();
    table.with_column(name, cells)
}

/// Parse a date string against the known dataset formats.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s.trim(), fmt).ok())
}

/// Rows whose Type column equals `type_code`; empty table when Type is absent.
fn split_by_type(table: &Table, type_code: &str) -> Table {
    match table.column("Type") {
        Some(types) => {
            let types = types.to_vec();
            table.filter_rows(|i| types[i].as_text() == Some(type_code))
        }
        None => table.head(0),
    }
}
