//! Propsum CLI - Summarize property sales CSV datasets
//!
//! # Main Commands
//!
//! ```bash
//! propsum report melb_data.csv                 # Summaries at every group level
//! propsum summarize melb_data.csv --by Suburb  # One group level
//! ```
//!
//! # Debug Commands (for development)
//!
//! ```bash
//! propsum parse melb_data.csv        # Just parse CSV to JSON
//! propsum enrich melb_data.csv       # Prepared + enriched table as JSON
//! ```

use clap::{Parser, Subcommand};
use propsum::{
    enrich_all, load_dataset, parse_file_auto, run_report, stats_to_table, summarize_market,
    ReportOptions,
};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "propsum")]
#[command(about = "Enrich and summarize property sale datasets", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a CSV file and output its records as JSON
    Parse {
        /// Input CSV file
        input: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Prepare and enrich a dataset, outputting the table as JSON
    Enrich {
        /// Input CSV file
        input: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print the first N rows as a text table instead of JSON
        #[arg(long)]
        head: Option<usize>,
    },

    /// Summarize a metric at one group level
    Summarize {
        /// Input CSV file
        input: PathBuf,

        /// Group level: Regionname, CouncilArea, or Suburb
        #[arg(short, long, default_value = "Regionname")]
        by: String,

        /// Metric column to aggregate
        #[arg(short, long, default_value = "PricePerM2")]
        metric: String,

        /// Keep only the top N groups by median
        #[arg(short, long)]
        top: Option<usize>,

        /// Output file for JSON (default: text table on stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Full report: summaries at every allowed group level
    Report {
        /// Input CSV file
        input: PathBuf,

        /// Metric column to aggregate
        #[arg(short, long, default_value = "PricePerM2")]
        metric: String,

        /// Keep only the top N groups per level
        #[arg(short, long)]
        top: Option<usize>,

        /// Output file for JSON (default: text tables on stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Parse { input, output } => cmd_parse(&input, output.as_deref()),

        Commands::Enrich {
            input,
            output,
            head,
        } => cmd_enrich(&input, output.as_deref(), head),

        Commands::Summarize {
            input,
            by,
            metric,
            top,
            output,
        } => cmd_summarize(&input, &by, &metric, top, output.as_deref()),

        Commands::Report {
            input,
            metric,
            top,
            output,
        } => cmd_report(&input, &metric, top, output.as_deref()),
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

fn cmd_parse(input: &Path, output: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Parsing CSV: {}", input.display());

    let result = parse_file_auto(input)?;
    eprintln!("   Encoding: {}", result.encoding);
    eprintln!("   Delimiter: '{}'", format_delimiter(result.delimiter));
    eprintln!("   Columns: {}", result.table.headers().join(", "));
    eprintln!("✅ Parsed {} records", result.table.row_count());

    let json = serde_json::to_string_pretty(&result.table.to_rows_json())?;
    write_output(&json, output)?;

    Ok(())
}

fn cmd_enrich(
    input: &Path,
    output: Option<&Path>,
    head: Option<usize>,
) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Processing: {}", input.display());

    let (dataset, parsed) = load_dataset(input)?;
    eprintln!("   Encoding: {}", parsed.encoding);
    eprintln!("   Rows: {} ({} after preparation)",
        parsed.table.row_count(), dataset.all.row_count());
    eprintln!(
        "   By type: {} houses, {} units, {} townhouses",
        dataset.houses.row_count(),
        dataset.units.row_count(),
        dataset.townhouses.row_count()
    );

    let enriched = enrich_all(&dataset.all)?;
    eprintln!("⚙️  Enriched: {} columns", enriched.column_count());

    if let Some(n) = head {
        println!("{}", enriched.head(n));
        return Ok(());
    }

    let json = serde_json::to_string_pretty(&enriched.to_rows_json())?;
    write_output(&json, output)?;

    Ok(())
}

fn cmd_summarize(
    input: &Path,
    by: &str,
    metric: &str,
    top: Option<usize>,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Processing: {}", input.display());

    let (dataset, _) = load_dataset(input)?;
    let enriched = enrich_all(&dataset.all)?;

    eprintln!("📊 Summarizing {} by {}...", metric, by);
    let stats = summarize_market(&enriched, by, metric, top)?;
    eprintln!("✅ {} groups", stats.len());

    match output {
        Some(path) => {
            let json = serde_json::to_string_pretty(&stats)?;
            write_output(&json, Some(path))?;
        }
        None => {
            println!("{}", stats_to_table(by, &stats));
        }
    }

    Ok(())
}

fn cmd_report(
    input: &Path,
    metric: &str,
    top: Option<usize>,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Processing: {}", input.display());

    let options = ReportOptions {
        metric: metric.to_string(),
        top_n: top,
        ..ReportOptions::default()
    };
    let report = run_report(input, &options)?;

    eprintln!("   Encoding: {}", report.csv_info.encoding);
    eprintln!("   Delimiter: '{}'", format_delimiter(report.csv_info.delimiter));
    eprintln!("   Rows: {} ({} after preparation)",
        report.csv_info.row_count, report.prepared_rows);

    if let Some(path) = output {
        let json = serde_json::to_string_pretty(&report)?;
        write_output(&json, Some(path))?;
        return Ok(());
    }

    for section in &report.sections {
        println!("\n📊 {} by {}", metric, section.group_level);
        println!("{}", stats_to_table(&section.group_level, &section.groups));
    }

    eprintln!("\n✨ Done!");
    Ok(())
}

fn format_delimiter(d: char) -> String {
    match d {
        '\t' => "\\t".to_string(),
        c => c.to_string(),
    }
}

fn write_output(content: &str, path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    match path {
        Some(p) => {
            fs::write(p, content)?;
            eprintln!("💾 Output written to: {}", p.display());
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
