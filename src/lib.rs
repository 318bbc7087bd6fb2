//! # Propsum - property sales enrichment and market summarization
//!
//! Propsum loads property-sales CSV datasets (Melbourne housing data
//! shape), derives per-row metrics such as price per square metre, and
//! summarizes a metric by region, council area, or suburb.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │   CSV File  │────▶│   Parser    │────▶│   Enrich    │────▶│   Summary   │
//! │  (any enc)  │     │  (auto-enc) │     │  (derived)  │     │ (per group) │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use propsum::{run_report, ReportOptions};
//!
//! fn main() {
//!     let report = run_report("melb_data.csv", &ReportOptions::default()).unwrap();
//!     println!("Summarized {} group levels", report.sections.len());
//! }
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`table`] - In-memory record table (Table, Cell)
//! - [`parser`] - CSV parsing with auto-detection
//! - [`loader`] - Dataset cleaning and preparation
//! - [`enrich`] - Derived-column enrichers
//! - [`summary`] - Per-group aggregation
//! - [`pipeline`] - One-call load/enrich/summarize

// Core modules
pub mod error;
pub mod table;

// Parsing
pub mod parser;

// Preparation
pub mod loader;

// Derived metrics
pub mod enrich;

// Aggregation
pub mod summary;

// Orchestration
pub mod pipeline;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    CsvError, CsvResult, PipelineError, PipelineResult, SummaryError, SummaryResult,
    TableError, TableResult,
};

// =============================================================================
// Re-exports - Table
// =============================================================================

pub use table::{Cell, Table};

// =============================================================================
// Re-exports - CSV Parsing
// =============================================================================

pub use parser::{
    decode_content, detect_delimiter, detect_encoding, parse_bytes_auto, parse_file_auto,
    parse_str, ParseResult,
};

// =============================================================================
// Re-exports - Loader
// =============================================================================

pub use loader::{coerce_numeric, load_dataset, parse_date, prepare, Dataset};

// =============================================================================
// Re-exports - Enrichers
// =============================================================================

pub use enrich::{
    add_build_ratio, add_density, add_house_age, add_price_per_m2, add_price_per_room,
    add_sale_period, enrich_all, PricePerM2Options,
};

// =============================================================================
// Re-exports - Summary
// =============================================================================

pub use summary::{
    stats_to_table, summarize_market, GroupStats, ALLOWED_GROUP_LEVELS,
};

// =============================================================================
// Re-exports - Pipeline
// =============================================================================

pub use pipeline::{
    run_report, summarize_levels, CsvInfo, MarketReport, ReportOptions, ReportSection,
};
