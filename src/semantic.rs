use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, error, warn};

use crate::assembly::{AssemblyClient, unique_accession};
use crate::error::LookupError;
use crate::taxonomy::TaxonomyClient;
use crate::workbook::{
    ANALYSIS_SHEET, REFERENCE_FIELD, SAMPLE_SHEET, SCIENTIFIC_NAME_FIELD, TAX_ID_FIELD, Workbook,
};

/// Corrections keyed by the taxonomy id as it is stored in the workbook;
/// the value is the authoritative scientific name. Built here, consumed by
/// the corrector, then discarded.
pub type CorrectionMap = BTreeMap<String, String>;

#[derive(Debug, Default)]
pub struct SemanticReport {
    pub errors: Vec<String>,
    pub corrections: CorrectionMap,
}

/// Checks that rely on external reference services: assembly accession
/// resolution for every distinct `Reference`, and taxonomy/scientific-name
/// consistency for every distinct (`Tax Id`, `Scientific Name`) pair.
///
/// A failed individual lookup is recorded and never aborts the remaining
/// lookups; the run always covers every distinct value.
pub fn validate<A, T>(workbook: &Workbook, assembly: &A, taxonomy: &T) -> SemanticReport
where
    A: AssemblyClient + ?Sized,
    T: TaxonomyClient + ?Sized,
{
    let mut report = SemanticReport::default();
    check_references(workbook, assembly, &mut report);
    check_taxonomy_names(workbook, taxonomy, &mut report);
    report
}

fn check_references<A: AssemblyClient + ?Sized>(
    workbook: &Workbook,
    assembly: &A,
    report: &mut SemanticReport,
) {
    let references: BTreeSet<String> = workbook
        .rows(ANALYSIS_SHEET)
        .iter()
        .filter_map(|row| row.text(REFERENCE_FIELD))
        .filter(|reference| !reference.trim().is_empty())
        .collect();

    for reference in references {
        let resolved = assembly
            .resolve_accessions(&reference)
            .and_then(|accessions| unique_accession(&reference, accessions));
        match resolved {
            Ok(accession) => {
                debug!("reference {reference} resolved to {accession}");
            }
            Err(LookupError::NotFound(_)) => {
                report.errors.push(format!(
                    "In Analysis, Reference {reference} did not resolve to any accession"
                ));
            }
            Err(LookupError::Ambiguous { candidates, .. }) => {
                report.errors.push(format!(
                    "In Analysis, Reference {reference} resolved to more than one accession: {}",
                    candidates.join(", ")
                ));
            }
            Err(err) => {
                error!("{err}");
                report.errors.push(err.to_string());
            }
        }
    }
}

fn check_taxonomy_names<T: TaxonomyClient + ?Sized>(
    workbook: &Workbook,
    taxonomy: &T,
    report: &mut SemanticReport,
) {
    let pairs: BTreeSet<(String, String)> = workbook
        .rows(SAMPLE_SHEET)
        .iter()
        .filter_map(|row| {
            let taxid = row.text(TAX_ID_FIELD)?;
            if taxid.trim().is_empty() {
                return None;
            }
            Some((taxid, row.text(SCIENTIFIC_NAME_FIELD).unwrap_or_default()))
        })
        .collect();

    for (taxid, species) in pairs {
        let resolved = parse_taxid(&taxid).and_then(|id| taxonomy.scientific_name(id));
        match resolved {
            Ok(name) if name == species => {}
            Ok(name) if name.eq_ignore_ascii_case(&species) => {
                report.corrections.insert(taxid, name);
            }
            Ok(_) => {
                report.errors.push(format!(
                    "In Samples, Taxonomy {taxid} and scientific name {species} are inconsistent"
                ));
            }
            Err(err) => {
                error!("{err}");
                report.errors.push(err.to_string());
            }
        }
    }

    if !report.corrections.is_empty() {
        warn!(
            "In some Samples, Taxonomy and scientific names are inconsistent. Tax Ids: {}",
            report
                .corrections
                .keys()
                .cloned()
                .collect::<Vec<_>>()
                .join(", ")
        );
    }
}

fn parse_taxid(taxid: &str) -> Result<u32, LookupError> {
    taxid
        .trim()
        .parse::<u32>()
        .map_err(|_| LookupError::MalformedInput {
            input: taxid.to_string(),
            reason: "taxonomy id must be a positive integer".to_string(),
        })
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn taxid_parsing() {
        assert_eq!(parse_taxid(" 9606 ").unwrap(), 9606);
        assert_matches!(parse_taxid("96o6"), Err(LookupError::MalformedInput { .. }));
        assert_matches!(parse_taxid("-1"), Err(LookupError::MalformedInput { .. }));
    }
}
