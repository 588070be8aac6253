//! Report generation module.
//!
//! [`CleaningReport`] collects the stage reports of a run together with
//! shapes, timing and warnings. It backs both JSON output to stdout
//! (`--json`) and the report file (`--emit-report`).
//!
//! # Example
//!
//! ```rust,ignore
//! use lex_cleaner::reporting::ReportGenerator;
//!
//! let report = ReportGenerator::build_report("data/train.csv", None, &result);
//! println!("{}", serde_json::to_string_pretty(&report)?);
//!
//! let generator = ReportGenerator::new("outputs");
//! generator.write_report_to_file(&report, "train")?;
//! ```

mod generator;

pub use generator::{CleaningReport, ProcessingSummary, ReportGenerator};
