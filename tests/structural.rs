use std::collections::BTreeMap;

use serde_json::json;

use submeta_validator::schema::Schema;
use submeta_validator::structural;
use submeta_validator::workbook::{Row, Sheet, Value, Workbook};

fn schema_from(value: serde_json::Value) -> Schema {
    serde_json::from_value(value).unwrap()
}

fn text_row(pairs: &[(&str, &str)]) -> Row {
    Row {
        row_num: 0,
        values: pairs
            .iter()
            .map(|(field, value)| (field.to_string(), Value::Text(value.to_string())))
            .collect(),
    }
}

fn single_sheet(name: &str, header_rows: usize, rows: Vec<Row>) -> Workbook {
    Workbook::from_sheets(BTreeMap::from([(
        name.to_string(),
        Sheet { header_rows, rows },
    )]))
}

#[test]
fn reports_missing_required_field_with_sheet_row_and_field() {
    let schema = schema_from(json!({
        "Analysis": {
            "Analysis Alias": { "required": true, "type": "text" }
        }
    }));
    let workbook = single_sheet(
        "Analysis",
        1,
        vec![
            text_row(&[("Analysis Alias", "A1")]),
            text_row(&[("Description", "no alias here")]),
        ],
    );

    let errors = structural::validate(&workbook, &schema);
    assert_eq!(
        errors,
        vec!["In Sheet Analysis, Row 3, field Analysis Alias: required field"]
    );
}

#[test]
fn row_numbers_honour_the_header_offset() {
    let schema = schema_from(json!({
        "Project": {
            "Project Title": { "required": true }
        }
    }));
    let workbook = single_sheet("Project", 4, vec![text_row(&[("Center", "EBI")])]);

    let errors = structural::validate(&workbook, &schema);
    assert_eq!(
        errors,
        vec!["In Sheet Project, Row 5, field Project Title: required field"]
    );
}

#[test]
fn reports_unallowed_values() {
    let schema = schema_from(json!({
        "Files": {
            "File Type": { "allowed": ["vcf", "tabix"] }
        }
    }));
    let workbook = single_sheet("Files", 1, vec![text_row(&[("File Type", "bam")])]);

    let errors = structural::validate(&workbook, &schema);
    assert_eq!(
        errors,
        vec!["In Sheet Files, Row 2, field File Type: unallowed value bam"]
    );
}

#[test]
fn unknown_fields_are_ignored() {
    let schema = schema_from(json!({
        "Project": {
            "Project Title": { "required": true }
        }
    }));
    let workbook = single_sheet(
        "Project",
        1,
        vec![text_row(&[
            ("Project Title", "My project"),
            ("Completely Undeclared", "anything"),
        ])],
    );

    assert!(structural::validate(&workbook, &schema).is_empty());
}

#[test]
fn sheets_not_in_the_workbook_are_skipped() {
    let schema = schema_from(json!({
        "Files": {
            "File Name": { "required": true }
        }
    }));
    let workbook = single_sheet("Project", 1, vec![text_row(&[("Project Title", "T")])]);

    assert!(structural::validate(&workbook, &schema).is_empty());
}

#[test]
fn list_elements_are_checked_individually() {
    let schema = schema_from(json!({
        "Files": {
            "File Type": {
                "type": "list",
                "each": { "allowed": ["vcf", "tabix"] }
            }
        }
    }));
    let workbook = single_sheet(
        "Files",
        1,
        vec![Row {
            row_num: 0,
            values: BTreeMap::from([(
                "File Type".to_string(),
                Value::List(vec!["vcf".to_string(), "cram".to_string()]),
            )]),
        }],
    );

    let errors = structural::validate(&workbook, &schema);
    assert_eq!(
        errors,
        vec!["In Sheet Files, Row 2, field File Type: unallowed value cram"]
    );
}

#[test]
fn validation_is_pure_and_idempotent() {
    let schema = schema_from(json!({
        "Analysis": {
            "Analysis Alias": { "required": true },
            "Experiment Type": { "allowed": ["Curation"] }
        }
    }));
    let workbook = single_sheet(
        "Analysis",
        1,
        vec![text_row(&[("Experiment Type", "Sequencing")])],
    );

    let first = structural::validate(&workbook, &schema);
    let second = structural::validate(&workbook, &schema);
    assert_eq!(first, second);
    assert_eq!(first.len(), 2);
}
