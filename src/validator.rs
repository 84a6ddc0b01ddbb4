use serde::Serialize;
use tracing::info;

use crate::assembly::AssemblyClient;
use crate::corrector;
use crate::crossref;
use crate::error::SubmissionError;
use crate::schema::Schema;
use crate::semantic::{self, CorrectionMap};
use crate::structural;
use crate::taxonomy::TaxonomyClient;
use crate::workbook::{ANALYSIS_SHEET, FILES_SHEET, PROJECT_SHEET, SAMPLE_SHEET, Workbook};

#[derive(Debug, Clone, Copy)]
pub struct ValidateOptions {
    /// Apply and persist case-only scientific-name corrections.
    pub correct: bool,
}

impl Default for ValidateOptions {
    fn default() -> Self {
        Self { correct: true }
    }
}

/// Accumulated outcome of one validation run. The error list is ordered the
/// way the pipeline discovered the errors: structural, then
/// cross-reference, then semantic. An empty list means the document is
/// valid.
#[derive(Debug, Default, Serialize)]
pub struct ValidationReport {
    pub errors: Vec<String>,
    pub corrections: CorrectionMap,
    pub corrected_rows: usize,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Runs the validation stages in sequence over one metadata workbook and,
/// when semantic validation finds correctable discrepancies, applies them
/// and persists the document.
pub struct SubmissionValidator<A: AssemblyClient, T: TaxonomyClient> {
    assembly: A,
    taxonomy: T,
}

impl<A: AssemblyClient, T: TaxonomyClient> SubmissionValidator<A, T> {
    pub fn new(assembly: A, taxonomy: T) -> Self {
        Self { assembly, taxonomy }
    }

    pub fn validate(
        &self,
        workbook: &mut Workbook,
        schema: &Schema,
        options: ValidateOptions,
    ) -> Result<ValidationReport, SubmissionError> {
        workbook.require_sheets(&[PROJECT_SHEET, ANALYSIS_SHEET, SAMPLE_SHEET, FILES_SHEET])?;

        let mut report = ValidationReport::default();

        info!("running structural validation");
        report.errors.extend(structural::validate(workbook, schema));

        info!("running cross-reference validation");
        report.errors.extend(crossref::validate(workbook));

        info!("running semantic validation");
        let semantic = semantic::validate(workbook, &self.assembly, &self.taxonomy);
        report.errors.extend(semantic.errors);
        report.corrections = semantic.corrections;

        if options.correct && !report.corrections.is_empty() {
            let corrected = corrector::apply(workbook, &report.corrections);
            report.corrected_rows = corrected.len();
            if report.corrected_rows > 0 {
                workbook.save()?;
            }
        }

        info!(
            "validation finished with {} errors, {} corrected rows",
            report.errors.len(),
            report.corrected_rows
        );
        Ok(report)
    }
}
