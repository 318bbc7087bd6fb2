//! Derived-column enrichers.
//!
//! Every enricher takes a table and returns a NEW table with appended
//! columns; the input is never modified and the row count never changes.
//!
//! The core enricher is [`add_price_per_m2`]: price divided by building
//! area, falling back to land size, null when neither area is usable.
//! Division is masked, never attempted against a non-positive or missing
//! divisor.

use chrono::{Datelike, Utc};

use crate::error::TableResult;
use crate::loader::parse_date;
use crate::table::{Cell, Table};

/// A house older than this many years gets the IsOldHouse flag.
const OLD_HOUSE_YEARS: f64 = 50.0;

// =============================================================================
// Price per square metre
// =============================================================================

/// Column names for [`add_price_per_m2`].
#[derive(Debug, Clone)]
pub struct PricePerM2Options {
    /// Primary area column used as divisor when strictly positive.
    pub area_col: String,
    /// Fallback area column used when the primary is unusable.
    pub fallback_col: String,
    /// Name of the appended column.
    pub out_col: String,
}

impl Default for PricePerM2Options {
    fn default() -> Self {
        Self {
            area_col: "BuildingArea".to_string(),
            fallback_col: "Landsize".to_string(),
            out_col: "PricePerM2".to_string(),
        }
    }
}

/// New table with a price-per-square-metre column appended.
///
/// Per row, the divisor is the primary area when strictly positive,
/// otherwise the fallback area when strictly positive, otherwise there is
/// no divisor and the derived value is null.
///
/// Errors when the table lacks Price, the primary, or the fallback column.
pub fn add_price_per_m2(table: &Table, options: &PricePerM2Options) -> TableResult<Table> {
    let price = table.require_column("Price")?;
    let area = table.require_column(&options.area_col)?;
    let fallback = table.require_column(&options.fallback_col)?;

    let cells = price
        .iter()
        .zip(area.iter().zip(fallback))
        .map(|(p, (a, f))| {
            let divisor = a.as_positive().or_else(|| f.as_positive());
            match (p.as_number(), divisor) {
                (Some(p), Some(d)) => Cell::Number(p / d),
                _ => Cell::Null,
            }
        })
        .collect();

    table.with_column(options.out_col.clone(), cells)
}

// =============================================================================
// Additional derived features
// =============================================================================

/// New table with Price / Rooms appended as PricePerRoom.
///
/// Left unchanged when the Rooms column is absent.
pub fn add_price_per_room(table: &Table) -> TableResult<Table> {
    if !table.has_column("Rooms") {
        return Ok(table.clone());
    }
    let price = table.require_column("Price")?;
    let rooms = table.require_column("Rooms")?;

    let cells = price
        .iter()
        .zip(rooms)
        .map(|(p, r)| match (p.as_number(), r.as_positive()) {
            (Some(p), Some(r)) => Cell::Number(p / r),
            _ => Cell::Null,
        })
        .collect();
    table.with_column("PricePerRoom", cells)
}

/// New table with BuildingArea / Landsize appended as BuildRatio.
///
/// Left unchanged when either area column is absent.
pub fn add_build_ratio(table: &Table) -> TableResult<Table> {
    if !table.has_column("BuildingArea") || !table.has_column("Landsize") {
        return Ok(table.clone());
    }
    let building = table.require_column("BuildingArea")?;
    let land = table.require_column("Landsize")?;

    let cells = building
        .iter()
        .zip(land)
        .map(|(b, l)| match (b.as_number(), l.as_positive()) {
            (Some(b), Some(l)) => Cell::Number(b / l),
            _ => Cell::Null,
        })
        .collect();
    table.with_column("BuildRatio", cells)
}

/// New table with HouseAge and IsOldHouse appended from YearBuilt.
///
/// Age is measured against the current year. Left unchanged when
/// YearBuilt is absent.
pub fn add_house_age(table: &Table) -> TableResult<Table> {
    add_house_age_at(table, Utc::now().year())
}

/// [`add_house_age`] with an explicit reference year.
pub fn add_house_age_at(table: &Table, reference_year: i32) -> TableResult<Table> {
    if !table.has_column("YearBuilt") {
        return Ok(table.clone());
    }
    let year_built = table.require_column("YearBuilt")?;

    let ages: Vec<Cell> = year_built
        .iter()
        .map(|y| match y.as_number() {
            Some(y) => Cell::Number(f64::from(reference_year) - y),
            None => Cell::Null,
        })
        .collect();
    let old_flags = ages
        .iter()
        .map(|a| match a.as_number() {
            Some(age) => Cell::Number(if age > OLD_HOUSE_YEARS { 1.0 } else { 0.0 }),
            None => Cell::Null,
        })
        .collect();

    let table = table.with_column("HouseAge", ages)?;
    table.with_column("IsOldHouse", old_flags)
}

/// New table with SaleYear and SaleMonth appended from the Date column.
///
/// Accepts the loader's ISO dates as well as raw `d/m/Y` input. Left
/// unchanged when Date is absent.
pub fn add_sale_period(table: &Table) -> TableResult<Table> {
    if !table.has_column("Date") {
        return Ok(table.clone());
    }
    let dates = table.require_column("Date")?;

    let mut years = Vec::with_capacity(dates.len());
    let mut months = Vec::with_capacity(dates.len());
    for cell in dates {
        match cell.as_text().and_then(parse_date) {
            Some(d) => {
                years.push(Cell::Number(f64::from(d.year())));
                months.push(Cell::Number(f64::from(d.month())));
            }
            None => {
                years.push(Cell::Null);
                months.push(Cell::Null);
            }
        }
    }

    let table = table.with_column("SaleYear", years)?;
    table.with_column("SaleMonth", months)
}

/// New table with Propertycount / Landsize appended as Density.
///
/// Measures how built-up a plot's surroundings are. Left unchanged when
/// either column is absent.
pub fn add_density(table: &Table) -> TableResult<Table> {
    if !table.has_column("Propertycount") || !table.has_column("Landsize") {
        return Ok(table.clone());
    }
    let count = table.require_column("Propertycount")?;
    let land = table.require_column("Landsize")?;

    let cells = count
        .iter()
        .zip(land)
        .map(|(c, l)| match (c.as_number(), l.as_positive()) {
            (Some(c), Some(l)) => Cell::Number(c / l),
            _ => Cell::Null,
        })
        .collect();
    table.with_column("Density", cells)
}

/// Apply every enricher in sequence.
///
/// Used by the CLI after dataset preparation; column-specific enrichers
/// skip themselves when their source columns are absent.
pub fn enrich_all(table: &Table) -> TableResult<Table> {
    let table = add_price_per_m2(table, &PricePerM2Options::default())?;
    let table = add_price_per_room(&table)?;
    let table = add_build_ratio(&table)?;
    let table = add_house_age(&table)?;
    let table = add_density(&table)?;
    add_sale_period(&table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TableError;

    fn sample() -> Table {
        Table::from_columns(vec![
            (
                "Price",
                vec![600_000.0.into(), 500_000.0.into(), 400_000.0.into()],
            ),
            ("BuildingArea", vec![120.0.into(), 0.0.into(), Cell::Null]),
            ("Landsize", vec![300.0.into(), 250.0.into(), Cell::Null]),
        ])
        .unwrap()
    }

    #[test]
    fn test_primary_area_used_when_positive() {
        let enriched = add_price_per_m2(&sample(), &PricePerM2Options::default()).unwrap();
        let ppm2 = enriched.column("PricePerM2").unwrap();
        assert_eq!(ppm2[0], Cell::Number(600_000.0 / 120.0));
    }

    #[test]
    fn test_fallback_area_used_when_primary_unusable() {
        let enriched = add_price_per_m2(&sample(), &PricePerM2Options::default()).unwrap();
        let ppm2 = enriched.column("PricePerM2").unwrap();
        // BuildingArea == 0 is not a valid divisor
        assert_eq!(ppm2[1], Cell::Number(500_000.0 / 250.0));
    }

    #[test]
    fn test_null_when_both_areas_unusable() {
        let enriched = add_price_per_m2(&sample(), &PricePerM2Options::default()).unwrap();
        assert!(enriched.column("PricePerM2").unwrap()[2].is_null());
    }

    #[test]
    fn test_negative_areas_are_not_divisors() {
        let table = Table::from_columns(vec![
            ("Price", vec![100.0.into()]),
            ("BuildingArea", vec![(-50.0).into()]),
            ("Landsize", vec![(-10.0).into()]),
        ])
        .unwrap();

        let enriched = add_price_per_m2(&table, &PricePerM2Options::default()).unwrap();
        assert!(enriched.column("PricePerM2").unwrap()[0].is_null());
    }

    #[test]
    fn test_row_count_preserved_and_one_column_added() {
        let table = sample();
        let enriched = add_price_per_m2(&table, &PricePerM2Options::default()).unwrap();

        assert_eq!(enriched.row_count(), table.row_count());
        assert_eq!(enriched.column_count(), table.column_count() + 1);
        // Input table untouched
        assert!(!table.has_column("PricePerM2"));
    }

    #[test]
    fn test_missing_price_column_errors() {
        let table = Table::from_columns(vec![
            ("BuildingArea", vec![120.0.into()]),
            ("Landsize", vec![300.0.into()]),
        ])
        .unwrap();

        let result = add_price_per_m2(&table, &PricePerM2Options::default());
        assert!(matches!(
            result,
            Err(TableError::MissingColumn(ref c)) if c == "Price"
        ));
    }

    #[test]
    fn test_missing_area_column_errors() {
        let table = Table::from_columns(vec![("Price", vec![100.0.into()])]).unwrap();
        let result = add_price_per_m2(&table, &PricePerM2Options::default());
        assert!(matches!(
            result,
            Err(TableError::MissingColumn(ref c)) if c == "BuildingArea"
        ));
    }

    #[test]
    fn test_custom_column_names() {
        let table = Table::from_columns(vec![
            ("Price", vec![100.0.into()]),
            ("Area", vec![10.0.into()]),
            ("Plot", vec![20.0.into()]),
        ])
        .unwrap();

        let options = PricePerM2Options {
            area_col: "Area".into(),
            fallback_col: "Plot".into(),
            out_col: "Ppm2".into(),
        };
        let enriched = add_price_per_m2(&table, &options).unwrap();
        assert_eq!(enriched.column("Ppm2").unwrap()[0], Cell::Number(10.0));
    }

    #[test]
    fn test_price_per_room() {
        let table = Table::from_columns(vec![
            ("Price", vec![600_000.0.into(), 300_000.0.into()]),
            ("Rooms", vec![3.0.into(), 0.0.into()]),
        ])
        .unwrap();

        let enriched = add_price_per_room(&table).unwrap();
        let col = enriched.column("PricePerRoom").unwrap();
        assert_eq!(col[0], Cell::Number(200_000.0));
        assert!(col[1].is_null());
    }

    #[test]
    fn test_price_per_room_skips_without_rooms() {
        let table = Table::from_columns(vec![("Price", vec![100.0.into()])]).unwrap();
        let enriched = add_price_per_room(&table).unwrap();
        assert!(!enriched.has_column("PricePerRoom"));
    }

    #[test]
    fn test_build_ratio() {
        let table = Table::from_columns(vec![
            ("BuildingArea", vec![150.0.into()]),
            ("Landsize", vec![300.0.into()]),
        ])
        .unwrap();

        let enriched = add_build_ratio(&table).unwrap();
        assert_eq!(enriched.column("BuildRatio").unwrap()[0], Cell::Number(0.5));
    }

    #[test]
    fn test_density() {
        let table = Table::from_columns(vec![
            (
                "Propertycount",
                vec![4000.0.into(), 2500.0.into(), Cell::Null],
            ),
            ("Landsize", vec![200.0.into(), 0.0.into(), 300.0.into()]),
        ])
        .unwrap();

        let enriched = add_density(&table).unwrap();
        let density = enriched.column("Density").unwrap();
        assert_eq!(density[0], Cell::Number(20.0));
        // Landsize == 0 is not a valid divisor
        assert!(density[1].is_null());
        assert!(density[2].is_null());
    }

    #[test]
    fn test_density_skips_without_propertycount() {
        let table = Table::from_columns(vec![("Landsize", vec![300.0.into()])]).unwrap();
        let enriched = add_density(&table).unwrap();
        assert!(!enriched.has_column("Density"));
    }

    #[test]
    fn test_house_age_and_flag() {
        let table = Table::from_columns(vec![(
            "YearBuilt",
            vec![1950.0.into(), 2010.0.into(), Cell::Null],
        )])
        .unwrap();

        let enriched = add_house_age_at(&table, 2026).unwrap();
        let age = enriched.column("HouseAge").unwrap();
        let old = enriched.column("IsOldHouse").unwrap();

        assert_eq!(age[0], Cell::Number(76.0));
        assert_eq!(old[0], Cell::Number(1.0));
        assert_eq!(old[1], Cell::Number(0.0));
        assert!(age[2].is_null());
        assert!(old[2].is_null());
    }

    #[test]
    fn test_sale_period() {
        let table = Table::from_columns(vec![(
            "Date",
            vec!["2016-12-03".into(), "4/02/2017".into(), Cell::Null],
        )])
        .unwrap();

        let enriched = add_sale_period(&table).unwrap();
        let year = enriched.column("SaleYear").unwrap();
        let month = enriched.column("SaleMonth").unwrap();

        assert_eq!(year[0], Cell::Number(2016.0));
        assert_eq!(month[0], Cell::Number(12.0));
        assert_eq!(year[1], Cell::Number(2017.0));
        assert_eq!(month[1], Cell::Number(2.0));
        assert!(year[2].is_null());
    }

    #[test]
    fn test_enrich_all() {
        let table = Table::from_columns(vec![
            ("Price", vec![600_000.0.into()]),
            ("BuildingArea", vec![120.0.into()]),
            ("Landsize", vec![300.0.into()]),
            ("Rooms", vec![3.0.into()]),
            ("Propertycount", vec![4000.0.into()]),
        ])
        .unwrap();

        let enriched = enrich_all(&table).unwrap();
        assert!(enriched.has_column("PricePerM2"));
        assert!(enriched.has_column("PricePerRoom"));
        assert!(enriched.has_column("BuildRatio"));
        assert!(enriched.has_column("Density"));
        // No YearBuilt or Date: those enrichers skip
        assert!(!enriched.has_column("HouseAge"));
        assert!(!enriched.has_column("SaleYear"));
        assert_eq!(enriched.row_count(), 1);
    }
}
