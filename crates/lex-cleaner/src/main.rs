//! CLI entry point for the data cleaning pipeline.

use anyhow::{Result, anyhow};
use clap::{Parser, ValueEnum};
use dotenv::dotenv;
use lex_cleaner::quality::{DEFAULT_REMOVAL_THRESHOLD, DEFAULT_REPORT_THRESHOLD};
use lex_cleaner::{
    CleaningReport, CorrelationAnalyzer, InputFormat, MissingnessReport, Pipeline, PipelineConfig,
    PipelineResult, ReportGenerator, StageReport, Table, detect_mixed_types, ingest,
};
use std::path::Path;
use tracing::{error, info};

/// CLI-compatible input format enum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliInputFormat {
    /// Comma-separated values
    Csv,
    /// Tab-separated values
    Tsv,
    /// Excel or OpenDocument workbook (first sheet)
    Spreadsheet,
    /// Array of JSON records
    Json,
}

impl From<CliInputFormat> for InputFormat {
    fn from(cli: CliInputFormat) -> Self {
        match cli {
            CliInputFormat::Csv => InputFormat::Csv,
            CliInputFormat::Tsv => InputFormat::Tsv,
            CliInputFormat::Spreadsheet => InputFormat::Spreadsheet,
            CliInputFormat::Json => InputFormat::Json,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    author = "Lex Machina Team",
    version,
    about = "Automatic data-quality inference and repair",
    long_about = "Detects mixed column types, hidden missing values, sparse data and outliers \
                  in tabular datasets, and repairs what it can.\n\n\
                  EXAMPLES:\n  \
                  # Clean a CSV and print a summary\n  \
                  lex-cleaner -i data.csv\n\n  \
                  # Save the cleaned table and a JSON report\n  \
                  lex-cleaner -i data.xlsx -o results/ --emit-report\n\n  \
                  # Preview mixed types and missingness only\n  \
                  lex-cleaner -i data.csv --dry-run\n\n  \
                  # Also drop near-duplicate numeric features\n  \
                  lex-cleaner -i data.csv --drop-correlated 0.95"
)]
struct Args {
    /// Path to the dataset (.csv, .tsv, .txt, .xlsx, .xls, .ods, .json)
    #[arg(short, long)]
    input: String,

    /// Output directory for the cleaned table and report
    #[arg(short, long, default_value = "./outputs")]
    output: String,

    /// Input format; detected from the file extension when omitted
    #[arg(long, value_enum)]
    format: Option<CliInputFormat>,

    /// Missing fraction (0.0 - 1.0) at which a column or row is dropped
    #[arg(long, default_value = "0.9")]
    sparsity_threshold: f64,

    /// Number of neighbors for KNN imputation
    #[arg(long, default_value = "5")]
    knn_neighbors: usize,

    /// Drop one column of every numeric pair correlated above this value
    /// (0.95 when given without a value)
    #[arg(long, value_name = "THRESHOLD", num_args = 0..=1)]
    drop_correlated: Option<Option<f64>>,

    /// Keep column names exactly as they appear in the input
    #[arg(long)]
    keep_column_names: bool,

    /// Output JSON to stdout instead of human-readable summary
    ///
    /// Disables all logs; only the final JSON report is written.
    #[arg(long)]
    json: bool,

    /// Write the cleaned table and a JSON report to the output directory
    ///
    /// Files are named <input_name>_cleaned.csv and <input_name>_report.json
    #[arg(short = 'r', long)]
    emit_report: bool,

    /// Show mixed types and missingness without repairing anything
    #[arg(long)]
    dry_run: bool,

    /// Suppress progress output (only show errors and final result)
    #[arg(short, long)]
    quiet: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is disabled so stdout holds only JSON.
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level, args.quiet, args.json);

    dotenv().ok();

    let input = Path::new(&args.input);
    if !input.exists() {
        return Err(anyhow!("Input file not found: {}", args.input));
    }

    let table = match args.format {
        Some(format) => ingest::read_path_as(input, format.into())?,
        None => ingest::read_path(input)?,
    };
    info!("Dataset loaded: {} rows x {} columns", table.height(), table.width());

    if args.dry_run {
        run_dry_run(&args, &table);
        return Ok(());
    }

    let mut config_builder = PipelineConfig::builder()
        .output_dir(&args.output)
        .sparsity_threshold(args.sparsity_threshold)
        .knn_neighbors(args.knn_neighbors)
        .standardize_column_names(!args.keep_column_names)
        .save_to_disk(args.emit_report);

    if let Some(threshold) = args.drop_correlated {
        config_builder =
            config_builder.correlation_threshold(threshold.unwrap_or(DEFAULT_REMOVAL_THRESHOLD));
    }

    let config = config_builder.build()?;
    let pipeline = build_pipeline(&args, config)?;

    run_pipeline(&pipeline, &args, table)
}

fn build_pipeline(args: &Args, config: PipelineConfig) -> Result<Pipeline> {
    let mut builder = Pipeline::builder().config(config);

    if !args.quiet && !args.json {
        builder = builder.on_stage(|table, report| {
            let stage = report.stage();
            info!(
                "[{}/6] {}: {} rows x {} columns",
                stage.step(),
                stage.display_name(),
                table.height(),
                table.width()
            );
        });
    }

    Ok(builder.build()?)
}

fn run_pipeline(pipeline: &Pipeline, args: &Args, table: Table) -> Result<()> {
    info!("{}", "=".repeat(80));
    info!("Starting data cleaning pipeline...");
    info!("{}", "=".repeat(80));

    let result = pipeline.process(table).map_err(|e| {
        error!("Pipeline failed: {}", e);
        anyhow!("Pipeline failed: {}", e)
    })?;

    handle_pipeline_output(pipeline, &result, args)
}

/// Handle pipeline output based on CLI flags.
///
/// - Default: human-readable summary on stdout
/// - `--json`: JSON report on stdout only
/// - `--emit-report`: cleaned CSV and JSON report in the output directory
fn handle_pipeline_output(pipeline: &Pipeline, result: &PipelineResult, args: &Args) -> Result<()> {
    let input_stem = extract_file_stem(&args.input);
    let generator = ReportGenerator::new(&pipeline.config().output_dir);

    let output_file = if pipeline.config().save_to_disk {
        let path = generator.write_cleaned_table(result, &input_stem)?;
        Some(path.display().to_string())
    } else {
        None
    };

    let report = ReportGenerator::build_report(&args.input, output_file.as_deref(), result);

    if pipeline.config().save_to_disk {
        let report_path = generator.write_report_to_file(&report, &input_stem)?;
        info!("Report written to: {}", report_path.display());
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    print_human_readable_summary(&report);
    Ok(())
}

/// Extract the file stem (name without extension) from a path.
fn extract_file_stem(path: &str) -> String {
    Path::new(path)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output")
        .to_string()
}

/// Preview mode: report what is wrong with the data, change nothing.
///
/// Uses `println!` because this output is the purpose of `--dry-run`.
fn run_dry_run(args: &Args, table: &Table) {
    println!("\n{}", "=".repeat(80));
    println!("DRY RUN - Data quality preview");
    println!("{}\n", "=".repeat(80));

    println!("DATASET OVERVIEW");
    println!("{}", "-".repeat(40));
    println!("  File: {}", args.input);
    println!("  Rows: {}", table.height());
    println!("  Columns: {}", table.width());
    println!();

    println!("COLUMNS");
    println!("{}", "-".repeat(40));
    println!("{:<24} {:<12} {:<10}", "Column", "Type", "Missing %");
    println!("{}", "-".repeat(50));

    let missingness = MissingnessReport::compute(table);
    for (column, missing) in table.columns().iter().zip(&missingness.columns) {
        println!(
            "{:<24} {:<12} {:<10.1}",
            truncate_str(column.name(), 23),
            column.declared_type(),
            missing.missing_percent
        );
    }
    println!();

    println!("MIXED TYPES");
    println!("{}", "-".repeat(40));
    let mixed = detect_mixed_types(table);
    if mixed.is_empty() {
        println!("  No columns with mixed cell types");
    } else {
        for entry in &mixed.columns {
            let counts: Vec<String> = entry
                .histogram
                .counts()
                .iter()
                .map(|(label, count)| format!("{label}: {count}"))
                .collect();
            println!("  - {}: {}", entry.column, counts.join(", "));
        }
    }
    println!();

    println!("CORRELATED NUMERIC PAIRS (|r| > {DEFAULT_REPORT_THRESHOLD})");
    println!("{}", "-".repeat(40));
    let pairs = CorrelationAnalyzer::new().find_correlated_pairs(table, DEFAULT_REPORT_THRESHOLD);
    if pairs.is_empty() {
        println!("  None among columns already read as numbers");
    } else {
        for pair in &pairs {
            println!("  - {} / {}: {:.3}", pair.first, pair.second, pair.correlation);
        }
    }
    println!();

    println!("OUTPUT FILES (with --emit-report)");
    println!("{}", "-".repeat(40));
    let input_stem = extract_file_stem(&args.input);
    println!("  - {}/{}_cleaned.csv", args.output, input_stem);
    println!("  - {}/{}_report.json", args.output, input_stem);
    println!();

    println!("{}", "=".repeat(80));
    println!("To clean the dataset, run without --dry-run");
    println!("{}", "=".repeat(80));
}

/// Truncate a string to max length with ellipsis
fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len - 3).collect();
        format!("{head}...")
    }
}

/// Print a human-readable summary of the cleaning results.
fn print_human_readable_summary(report: &CleaningReport) {
    let summary = &report.summary;

    println!();
    println!("{}", "=".repeat(80));
    println!("CLEANING COMPLETE");
    println!("{}", "=".repeat(80));
    println!();

    println!(
        "Input:  {} ({} rows x {} columns)",
        report.input_file, summary.rows_before, summary.columns_before
    );
    if let Some(ref output_file) = report.output_file {
        println!(
            "Output: {} ({} rows x {} columns)",
            output_file, summary.rows_after, summary.columns_after
        );
    }
    println!();

    println!("Processing Summary:");
    println!("  Duration: {}ms", summary.duration_ms);
    println!(
        "  Rows: {} -> {} ({} removed)",
        summary.rows_before,
        summary.rows_after,
        summary.rows_removed()
    );
    println!(
        "  Columns: {} -> {} ({} removed)",
        summary.columns_before,
        summary.columns_after,
        summary.columns_removed()
    );
    println!(
        "  Missing: {:.1}% -> {:.1}%",
        summary.missing_percent_before, summary.missing_percent_after
    );
    println!();

    println!("Stages:");
    for stage in &report.stages {
        println!("  {}. {}: {}", stage.stage().step(), stage.stage().display_name(), describe_stage(stage));
    }
    println!();

    if !report.warnings.is_empty() {
        println!("Warnings:");
        for warning in &report.warnings {
            println!("  ! {}", warning);
        }
        println!();
    }

    println!("Use --json for machine-readable output");
    println!("Use --emit-report to save the cleaned data and a JSON report");
    println!("{}", "=".repeat(80));
}

/// One-line outcome of a stage.
fn describe_stage(report: &StageReport) -> String {
    match report {
        StageReport::TypeInference(r) => format!(
            "{} mixed columns, {} columns retyped, {} placeholders cleared, {:.2}% total loss",
            r.mixed_types.len(),
            r.changed_columns().count(),
            r.total_hidden_missing(),
            r.total_loss_percent
        ),
        StageReport::Normalization(r) => format!(
            "{} hidden missing values in {} columns",
            r.total_replaced,
            r.replacements.len()
        ),
        StageReport::Pruning(r) => format!(
            "{} columns and {} rows dropped",
            r.dropped_columns.len(),
            r.dropped_rows.len()
        ),
        StageReport::Imputation(r) => format!(
            "{} values imputed ({:.1}% of cells), {} still missing",
            r.summary.values_imputed, r.summary.imputation_percent, r.summary.total_missing_after
        ),
        StageReport::OutlierDetection(r) => {
            let top: Vec<String> = r
                .summary
                .numeric
                .iter()
                .chain(&r.summary.categorical)
                .filter(|c| c.count > 0)
                .take(3)
                .map(|c| format!("{} ({})", c.column, c.count))
                .collect();
            if top.is_empty() {
                "no outliers flagged".to_string()
            } else {
                format!("{} cells flagged; {}", r.total_flagged(), top.join(", "))
            }
        }
        StageReport::Correlation(r) => format!(
            "{} pairs above {:.2}, dropped: {}",
            r.pairs.len(),
            r.threshold,
            if r.dropped_columns.is_empty() {
                "none".to_string()
            } else {
                r.dropped_columns.join(", ")
            }
        ),
    }
}
