use std::io::{self, Write};

use serde::Serialize;

use crate::depot::DepositSummary;
use crate::validator::ValidationReport;

pub struct JsonOutput;

impl JsonOutput {
    pub fn print_report(report: &ValidationReport) -> io::Result<()> {
        Self::print_json(report)
    }

    pub fn print_summaries(summaries: &[DepositSummary]) -> io::Result<()> {
        Self::print_json(&summaries)
    }

    fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}

/// Plain formatter for interactive use: one error per line, then a verdict.
pub fn print_report_text(report: &ValidationReport) {
    for error in &report.errors {
        println!("{error}");
    }
    if report.corrected_rows > 0 {
        println!(
            "Corrected scientific names in {} sample rows",
            report.corrected_rows
        );
    }
    if report.is_valid() {
        println!("Metadata is valid");
    } else {
        println!("Metadata failed validation with {} errors", report.errors.len());
    }
}

pub fn print_summaries_text(summaries: &[DepositSummary]) {
    for summary in summaries {
        println!("#############################");
        println!("deposit box: {}", summary.box_path);
        match &summary.last_modified {
            Some(modified) => println!("last modified: {modified}"),
            None => println!("last modified: NA"),
        }
        println!("size: {} bytes", summary.total_size);
        println!("number of vcf files: {}", summary.vcf_count);
        println!("number of metadata workbooks: {}", summary.metadata_count);
        match &summary.metadata {
            Some(digest) => {
                println!(
                    "Project title: {}",
                    digest.project_title.as_deref().unwrap_or("NA")
                );
                println!("Number of analysis: {}", digest.analysis_count);
                if digest.references.is_empty() {
                    println!("Reference genome: NA");
                } else {
                    println!("Reference genome: {}", digest.references.join(", "));
                }
                println!("Number of samples: {}", digest.sample_count);
            }
            None => {
                println!("Project title: NA");
                println!("Number of analysis: NA");
                println!("Number of samples: NA");
            }
        }
        println!("#############################");
    }
}
