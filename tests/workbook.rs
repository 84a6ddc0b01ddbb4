use std::fs;
use std::path::Path;

use assert_matches::assert_matches;
use camino::Utf8PathBuf;
use serde_json::json;

use submeta_validator::error::SubmissionError;
use submeta_validator::workbook::{SAMPLE_SHEET, SCIENTIFIC_NAME_FIELD, Value, Workbook};

fn write_workbook(dir: &Path, content: serde_json::Value) -> Utf8PathBuf {
    let path = Utf8PathBuf::from_path_buf(dir.join("metadata.json")).unwrap();
    fs::write(
        path.as_std_path(),
        serde_json::to_vec_pretty(&content).unwrap(),
    )
    .unwrap();
    path
}

#[test]
fn load_assigns_row_numbers_from_header_offset() {
    let temp = tempfile::tempdir().unwrap();
    let path = write_workbook(
        temp.path(),
        json!({
            "Sample": {
                "header_rows": 3,
                "rows": [
                    { "Sample ID": "S1" },
                    { "Sample ID": "S2" }
                ]
            }
        }),
    );

    let workbook = Workbook::load(&path).unwrap();
    assert_eq!(workbook.header_offset(SAMPLE_SHEET), 3);
    let rows = workbook.rows(SAMPLE_SHEET);
    assert_eq!(rows[0].row_num, 4);
    assert_eq!(rows[1].row_num, 5);
}

#[test]
fn update_rows_then_save_rewrites_only_matched_rows() {
    let temp = tempfile::tempdir().unwrap();
    let path = write_workbook(
        temp.path(),
        json!({
            "Sample": {
                "header_rows": 1,
                "rows": [
                    { "Sample ID": "S1", "Scientific Name": "homo sapiens" },
                    { "Sample ID": "S2", "Scientific Name": "Mus musculus" }
                ]
            }
        }),
    );

    let mut workbook = Workbook::load(&path).unwrap();
    let mut corrected = workbook.rows(SAMPLE_SHEET)[0].clone();
    corrected.set(
        SCIENTIFIC_NAME_FIELD,
        Value::Text("Homo sapiens".to_string()),
    );
    assert_eq!(workbook.update_rows(SAMPLE_SHEET, &[corrected]), 1);
    workbook.save().unwrap();

    let reloaded = Workbook::load(&path).unwrap();
    let rows = reloaded.rows(SAMPLE_SHEET);
    assert_eq!(rows[0].text(SCIENTIFIC_NAME_FIELD).unwrap(), "Homo sapiens");
    assert_eq!(rows[1].text(SCIENTIFIC_NAME_FIELD).unwrap(), "Mus musculus");
    assert_eq!(rows[0].text("Sample ID").unwrap(), "S1");
}

#[test]
fn require_sheets_reports_the_missing_sheet() {
    let temp = tempfile::tempdir().unwrap();
    let path = write_workbook(
        temp.path(),
        json!({
            "Project": { "rows": [] }
        }),
    );

    let workbook = Workbook::load(&path).unwrap();
    let err = workbook
        .require_sheets(&["Project", "Analysis"])
        .unwrap_err();
    assert_matches!(err, SubmissionError::MissingSheet(sheet) if sheet == "Analysis");
}

#[test]
fn load_reports_missing_file() {
    let path = Utf8PathBuf::from("/nonexistent/metadata.json");
    let err = Workbook::load(&path).unwrap_err();
    assert_matches!(err, SubmissionError::WorkbookRead(_));
}

#[test]
fn load_reports_malformed_document() {
    let temp = tempfile::tempdir().unwrap();
    let path = Utf8PathBuf::from_path_buf(temp.path().join("broken.json")).unwrap();
    fs::write(path.as_std_path(), b"{ not json").unwrap();
    let err = Workbook::load(&path).unwrap_err();
    assert_matches!(err, SubmissionError::WorkbookParse(_));
}
