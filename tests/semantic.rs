use std::collections::{BTreeMap, BTreeSet};

use serde_json::json;

use submeta_validator::assembly::AssemblyClient;
use submeta_validator::error::LookupError;
use submeta_validator::semantic;
use submeta_validator::taxonomy::TaxonomyClient;
use submeta_validator::workbook::Workbook;

#[derive(Default)]
struct MockAssembly {
    accessions: BTreeMap<String, Vec<String>>,
}

impl AssemblyClient for MockAssembly {
    fn resolve_accessions(&self, reference: &str) -> Result<BTreeSet<String>, LookupError> {
        match self.accessions.get(reference) {
            Some(list) => Ok(list.iter().cloned().collect()),
            None => Err(LookupError::ServiceUnavailable {
                service: "NCBI assembly".to_string(),
                query: reference.to_string(),
                reason: "connection refused".to_string(),
            }),
        }
    }
}

#[derive(Default)]
struct MockTaxonomy {
    names: BTreeMap<u32, String>,
}

impl TaxonomyClient for MockTaxonomy {
    fn scientific_name(&self, taxid: u32) -> Result<String, LookupError> {
        self.names
            .get(&taxid)
            .cloned()
            .ok_or_else(|| LookupError::NotFound(format!("taxonomy id {taxid}")))
    }
}

fn workbook_from(value: serde_json::Value) -> Workbook {
    Workbook::from_sheets(serde_json::from_value(value).unwrap())
}

fn analyses_with_references(references: &[&str]) -> serde_json::Value {
    let rows: Vec<serde_json::Value> = references
        .iter()
        .map(|reference| json!({ "Analysis Alias": "A1", "Reference": reference }))
        .collect();
    json!({
        "Analysis": { "rows": rows },
        "Sample": { "rows": [] }
    })
}

fn samples_with_taxonomy(pairs: &[(i64, &str)]) -> serde_json::Value {
    let rows: Vec<serde_json::Value> = pairs
        .iter()
        .map(|(taxid, name)| json!({ "Tax Id": taxid, "Scientific Name": name }))
        .collect();
    json!({
        "Analysis": { "rows": [] },
        "Sample": { "rows": rows }
    })
}

#[test]
fn uniquely_resolving_reference_is_accepted() {
    let assembly = MockAssembly {
        accessions: BTreeMap::from([(
            "GRCh38".to_string(),
            vec!["GCA_000001405.29".to_string()],
        )]),
    };
    let workbook = workbook_from(analyses_with_references(&["GRCh38"]));

    let report = semantic::validate(&workbook, &assembly, &MockTaxonomy::default());
    assert!(report.errors.is_empty());
    assert!(report.corrections.is_empty());
}

#[test]
fn unresolved_reference_is_an_error() {
    let assembly = MockAssembly {
        accessions: BTreeMap::from([("made-up genome".to_string(), vec![])]),
    };
    let workbook = workbook_from(analyses_with_references(&["made-up genome"]));

    let report = semantic::validate(&workbook, &assembly, &MockTaxonomy::default());
    assert_eq!(
        report.errors,
        vec!["In Analysis, Reference made-up genome did not resolve to any accession"]
    );
}

#[test]
fn ambiguous_reference_yields_one_error_listing_every_accession() {
    let assembly = MockAssembly {
        accessions: BTreeMap::from([(
            "GRCh38".to_string(),
            vec![
                "GCA_000001405.29".to_string(),
                "GCA_000001405.28".to_string(),
            ],
        )]),
    };
    // The same reference on two rows still counts once.
    let workbook = workbook_from(analyses_with_references(&["GRCh38", "GRCh38"]));

    let report = semantic::validate(&workbook, &assembly, &MockTaxonomy::default());
    assert_eq!(
        report.errors,
        vec![
            "In Analysis, Reference GRCh38 resolved to more than one accession: GCA_000001405.28, GCA_000001405.29"
        ]
    );
}

#[test]
fn assembly_service_failure_is_recorded_not_propagated() {
    let assembly = MockAssembly::default();
    let workbook = workbook_from(analyses_with_references(&["GRCh38"]));

    let report = semantic::validate(&workbook, &assembly, &MockTaxonomy::default());
    assert_eq!(
        report.errors,
        vec!["NCBI assembly request for GRCh38 failed: connection refused"]
    );
}

#[test]
fn matching_taxonomy_name_is_accepted() {
    let taxonomy = MockTaxonomy {
        names: BTreeMap::from([(9606, "Homo sapiens".to_string())]),
    };
    let workbook = workbook_from(samples_with_taxonomy(&[(9606, "Homo sapiens")]));

    let report = semantic::validate(&workbook, &MockAssembly::default(), &taxonomy);
    assert!(report.errors.is_empty());
    assert!(report.corrections.is_empty());
}

#[test]
fn case_only_mismatch_becomes_a_correction_not_an_error() {
    let taxonomy = MockTaxonomy {
        names: BTreeMap::from([(9606, "Homo sapiens".to_string())]),
    };
    let workbook = workbook_from(samples_with_taxonomy(&[(9606, "homo sapiens")]));

    let report = semantic::validate(&workbook, &MockAssembly::default(), &taxonomy);
    assert!(report.errors.is_empty());
    assert_eq!(
        report.corrections,
        BTreeMap::from([("9606".to_string(), "Homo sapiens".to_string())])
    );
}

#[test]
fn substantively_different_name_is_a_hard_error() {
    let taxonomy = MockTaxonomy {
        names: BTreeMap::from([(9606, "Homo sapiens".to_string())]),
    };
    let workbook = workbook_from(samples_with_taxonomy(&[(9606, "Mus musculus")]));

    let report = semantic::validate(&workbook, &MockAssembly::default(), &taxonomy);
    assert_eq!(
        report.errors,
        vec!["In Samples, Taxonomy 9606 and scientific name Mus musculus are inconsistent"]
    );
    assert!(report.corrections.is_empty());
}

#[test]
fn unknown_taxonomy_id_is_recorded_verbatim() {
    let workbook = workbook_from(samples_with_taxonomy(&[(999999999, "Imaginary species")]));

    let report = semantic::validate(&workbook, &MockAssembly::default(), &MockTaxonomy::default());
    assert_eq!(
        report.errors,
        vec!["no record found for taxonomy id 999999999"]
    );
}

#[test]
fn malformed_taxonomy_id_is_recorded_verbatim() {
    let workbook = workbook_from(json!({
        "Analysis": { "rows": [] },
        "Sample": {
            "rows": [ { "Tax Id": "96o6", "Scientific Name": "Homo sapiens" } ]
        }
    }));

    let report = semantic::validate(&workbook, &MockAssembly::default(), &MockTaxonomy::default());
    assert_eq!(
        report.errors,
        vec!["malformed lookup input 96o6: taxonomy id must be a positive integer"]
    );
}

#[test]
fn one_bad_lookup_does_not_abort_the_others() {
    let taxonomy = MockTaxonomy {
        names: BTreeMap::from([(9606, "Homo sapiens".to_string())]),
    };
    let workbook = workbook_from(samples_with_taxonomy(&[
        (1234, "Unknown species"),
        (9606, "Mus musculus"),
    ]));

    let report = semantic::validate(&workbook, &MockAssembly::default(), &taxonomy);
    assert_eq!(
        report.errors,
        vec![
            "no record found for taxonomy id 1234",
            "In Samples, Taxonomy 9606 and scientific name Mus musculus are inconsistent"
        ]
    );
}

#[test]
fn empty_taxonomy_ids_are_skipped() {
    let workbook = workbook_from(json!({
        "Analysis": { "rows": [] },
        "Sample": {
            "rows": [ { "Tax Id": "", "Scientific Name": "Homo sapiens" } ]
        }
    }));

    let report = semantic::validate(&workbook, &MockAssembly::default(), &MockTaxonomy::default());
    assert!(report.errors.is_empty());
}
