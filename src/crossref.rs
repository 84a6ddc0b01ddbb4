use std::collections::BTreeSet;

use chrono::NaiveDate;

use crate::workbook::{
    ANALYSIS_ALIAS_FIELD, ANALYSIS_SHEET, COLLECTION_DATE_FIELD, FILES_SHEET, PROJECT_SHEET,
    PROJECT_TITLE_FIELD, Row, SAMPLE_SHEET, Value, Workbook,
};

const NOT_PROVIDED: &str = "not provided";

/// Alternative identity groups for a sample row: either the accession-based
/// identity or the full descriptive identity must be completely filled.
const SAMPLE_FIELD_GROUPS: &[&[&str]] = &[
    &["Analysis Alias", "Sample Accession", "Sample ID"],
    &[
        "Analysis Alias",
        "Sample Name",
        "Title",
        "Tax Id",
        "Scientific Name",
        "collection_date",
        "geographic location (country and/or sea)",
    ],
];

/// Referential-integrity checks across sheets. Each check is independent
/// and contributes errors in a fixed order: alias sets, project titles,
/// then per-row sample constraints.
pub fn validate(workbook: &Workbook) -> Vec<String> {
    let mut errors = Vec::new();

    let analysis_aliases: Vec<String> = workbook
        .rows(ANALYSIS_SHEET)
        .iter()
        .filter_map(|row| row.text(ANALYSIS_ALIAS_FIELD))
        .collect();

    let sample_references: Vec<String> = workbook
        .rows(SAMPLE_SHEET)
        .iter()
        .flat_map(referenced_aliases)
        .collect();
    same_set(
        &analysis_aliases,
        &sample_references,
        "Analysis",
        "Samples",
        &mut errors,
    );

    let file_references: Vec<String> = workbook
        .rows(FILES_SHEET)
        .iter()
        .filter_map(|row| row.text(ANALYSIS_ALIAS_FIELD))
        .collect();
    same_set(
        &analysis_aliases,
        &file_references,
        "Analysis",
        "Files",
        &mut errors,
    );

    let project_titles: Vec<String> = workbook
        .rows(PROJECT_SHEET)
        .iter()
        .filter_map(|row| row.text(PROJECT_TITLE_FIELD))
        .collect();
    let analysis_titles: Vec<String> = workbook
        .rows(ANALYSIS_SHEET)
        .iter()
        .filter_map(|row| row.text(PROJECT_TITLE_FIELD))
        .collect();
    same_set(
        &project_titles,
        &analysis_titles,
        "Project",
        "Analysis",
        &mut errors,
    );

    for row in workbook.rows(SAMPLE_SHEET) {
        group_of_fields_required(SAMPLE_SHEET, row, SAMPLE_FIELD_GROUPS, &mut errors);
        check_date(row, COLLECTION_DATE_FIELD, true, &mut errors);
    }

    errors
}

/// A sample may reference several analyses through a delimited list; every
/// entry counts as a separate reference.
fn referenced_aliases(row: &Row) -> Vec<String> {
    match row.get(ANALYSIS_ALIAS_FIELD) {
        Some(Value::List(items)) => items.iter().map(|item| item.trim().to_string()).collect(),
        Some(value) => value
            .as_text()
            .split(',')
            .map(|item| item.trim().to_string())
            .filter(|item| !item.is_empty())
            .collect(),
        None => Vec::new(),
    }
}

fn same_set(
    left: &[String],
    right: &[String],
    left_desc: &str,
    right_desc: &str,
    errors: &mut Vec<String>,
) {
    let left_set: BTreeSet<&str> = left.iter().map(String::as_str).collect();
    let right_set: BTreeSet<&str> = right.iter().map(String::as_str).collect();
    if left_set == right_set {
        return;
    }
    let only_left: Vec<&str> = left_set.difference(&right_set).copied().collect();
    let only_right: Vec<&str> = right_set.difference(&left_set).copied().collect();
    let mut parts = Vec::new();
    if !only_left.is_empty() {
        parts.push(format!(
            "{} present in {left_desc} not in {right_desc}",
            only_left.join(",")
        ));
    }
    if !only_right.is_empty() {
        parts.push(format!(
            "{} present in {right_desc} not in {left_desc}",
            only_right.join(",")
        ));
    }
    errors.push(format!(
        "Check {left_desc} vs {right_desc}: {}",
        parts.join(" -- ")
    ));
}

fn group_of_fields_required(
    sheet_name: &str,
    row: &Row,
    groups: &[&[&str]],
    errors: &mut Vec<String>,
) {
    let satisfied = groups
        .iter()
        .any(|group| group.iter().all(|field| row.has_content(field)));
    if satisfied {
        return;
    }
    let names = groups
        .iter()
        .map(|group| group.join(", "))
        .collect::<Vec<_>>()
        .join(" or ");
    let values = groups
        .iter()
        .map(|group| {
            group
                .iter()
                .map(|field| format!("{field}:{}", row.text(field).unwrap_or_default()))
                .collect::<Vec<_>>()
                .join(", ")
        })
        .collect::<Vec<_>>()
        .join(" -- ");
    errors.push(format!(
        "In {sheet_name}, row {}, one of this group of fields must be filled: {names} -- {values}",
        row.row_num
    ));
}

fn check_date(row: &Row, field: &str, required: bool, errors: &mut Vec<String>) {
    let Some(value) = row.get(field) else {
        if required {
            errors.push(format!(
                "In row {}, {field} is required and missing",
                row.row_num
            ));
        }
        return;
    };
    if is_valid_date(value) {
        return;
    }
    errors.push(format!(
        "In row {}, {field} is not a date or \"not provided\": it is set to \"{}\"",
        row.row_num,
        value.as_text()
    ));
}

fn is_valid_date(value: &Value) -> bool {
    match value {
        Value::Date(_) => true,
        Value::Text(text) => {
            NaiveDate::parse_from_str(text, "%Y-%m-%d").is_ok()
                || text.eq_ignore_ascii_case(NOT_PROVIDED)
        }
        Value::Integer(_) | Value::List(_) => false,
    }
}
