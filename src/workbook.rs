use std::collections::BTreeMap;
use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::SubmissionError;

pub const PROJECT_SHEET: &str = "Project";
pub const ANALYSIS_SHEET: &str = "Analysis";
pub const SAMPLE_SHEET: &str = "Sample";
pub const FILES_SHEET: &str = "Files";

pub const ANALYSIS_ALIAS_FIELD: &str = "Analysis Alias";
pub const PROJECT_TITLE_FIELD: &str = "Project Title";
pub const REFERENCE_FIELD: &str = "Reference";
pub const TAX_ID_FIELD: &str = "Tax Id";
pub const SCIENTIFIC_NAME_FIELD: &str = "Scientific Name";
pub const COLLECTION_DATE_FIELD: &str = "collection_date";

/// A single cell as it comes out of the tabular source.
///
/// Deserialization is untagged, so a JSON array becomes a list, a
/// `YYYY-MM-DD` string becomes a date (matching typed date cells in the
/// original spreadsheet) and everything else stays text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    List(Vec<String>),
    Date(NaiveDate),
    Integer(i64),
    Text(String),
}

impl Value {
    /// Render the value the way it would appear in a cell.
    pub fn as_text(&self) -> String {
        match self {
            Value::List(items) => items.join(","),
            Value::Date(date) => date.format("%Y-%m-%d").to_string(),
            Value::Integer(number) => number.to_string(),
            Value::Text(text) => text.clone(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Value::List(items) => items.iter().all(|item| item.trim().is_empty()),
            Value::Date(_) | Value::Integer(_) => false,
            Value::Text(text) => text.trim().is_empty(),
        }
    }
}

/// One row of a sheet. `row_num` is not part of the stored document; the
/// loader derives it from the row position and the sheet's header offset so
/// error messages point at the original spreadsheet layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    #[serde(skip)]
    pub row_num: usize,
    #[serde(flatten)]
    pub values: BTreeMap<String, Value>,
}

impl Row {
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.values.get(field)
    }

    pub fn text(&self, field: &str) -> Option<String> {
        self.values.get(field).map(Value::as_text)
    }

    /// True when the field is present and carries a non-blank value.
    pub fn has_content(&self, field: &str) -> bool {
        self.values
            .get(field)
            .map(|value| !value.is_empty())
            .unwrap_or(false)
    }

    pub fn set(&mut self, field: &str, value: Value) {
        self.values.insert(field.to_string(), value);
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sheet {
    #[serde(default = "default_header_rows")]
    pub header_rows: usize,
    pub rows: Vec<Row>,
}

fn default_header_rows() -> usize {
    1
}

/// The full metadata document: sheet name mapped to its ordered rows.
///
/// Owned by the validator for the duration of a run; only the corrector
/// mutates it, after which `save` writes the document back in one scoped
/// read-modify-write.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workbook {
    #[serde(skip)]
    path: Option<Utf8PathBuf>,
    #[serde(flatten)]
    sheets: BTreeMap<String, Sheet>,
}

impl Workbook {
    pub fn load(path: &Utf8Path) -> Result<Self, SubmissionError> {
        let content = fs::read_to_string(path.as_std_path())
            .map_err(|_| SubmissionError::WorkbookRead(path.to_owned()))?;
        let mut workbook: Workbook = serde_json::from_str(&content)
            .map_err(|err| SubmissionError::WorkbookParse(err.to_string()))?;
        workbook.path = Some(path.to_owned());
        workbook.assign_row_numbers();
        Ok(workbook)
    }

    /// Build a workbook that has no backing file. Used by callers that
    /// assemble documents programmatically; `save` will refuse to run.
    pub fn from_sheets(sheets: BTreeMap<String, Sheet>) -> Self {
        let mut workbook = Workbook { path: None, sheets };
        workbook.assign_row_numbers();
        workbook
    }

    fn assign_row_numbers(&mut self) {
        for sheet in self.sheets.values_mut() {
            for (position, row) in sheet.rows.iter_mut().enumerate() {
                row.row_num = position + sheet.header_rows + 1;
            }
        }
    }

    pub fn path(&self) -> Option<&Utf8Path> {
        self.path.as_deref()
    }

    pub fn contains_sheet(&self, sheet: &str) -> bool {
        self.sheets.contains_key(sheet)
    }

    pub fn require_sheets(&self, sheets: &[&str]) -> Result<(), SubmissionError> {
        for sheet in sheets {
            if !self.contains_sheet(sheet) {
                return Err(SubmissionError::MissingSheet(sheet.to_string()));
            }
        }
        Ok(())
    }

    /// Rows of a sheet, empty when the sheet is absent.
    pub fn rows(&self, sheet: &str) -> &[Row] {
        self.sheets
            .get(sheet)
            .map(|sheet| sheet.rows.as_slice())
            .unwrap_or(&[])
    }

    /// Number of header rows preceding the data rows of a sheet.
    pub fn header_offset(&self, sheet: &str) -> usize {
        self.sheets
            .get(sheet)
            .map(|sheet| sheet.header_rows)
            .unwrap_or_else(default_header_rows)
    }

    /// Replace rows of a sheet with corrected versions, matched by row
    /// number. Rows without a replacement are left untouched. Returns how
    /// many rows were replaced.
    pub fn update_rows(&mut self, sheet: &str, corrected: &[Row]) -> usize {
        let Some(sheet) = self.sheets.get_mut(sheet) else {
            return 0;
        };
        let mut replaced = 0;
        for row in sheet.rows.iter_mut() {
            if let Some(update) = corrected
                .iter()
                .find(|candidate| candidate.row_num == row.row_num)
            {
                *row = update.clone();
                replaced += 1;
            }
        }
        replaced
    }

    /// Persist the document back to its source file. The write is atomic:
    /// content goes to a temporary file in the same directory which is then
    /// renamed over the original.
    pub fn save(&self) -> Result<(), SubmissionError> {
        let path = self.path.as_ref().ok_or_else(|| {
            SubmissionError::Filesystem("workbook has no backing file to save to".to_string())
        })?;
        let parent = path
            .parent()
            .ok_or_else(|| SubmissionError::Filesystem("invalid workbook path".to_string()))?;
        let content = serde_json::to_vec_pretty(self)
            .map_err(|err| SubmissionError::WorkbookWrite(path.clone(), err.to_string()))?;
        let temp = tempfile::Builder::new()
            .prefix("submeta-workbook")
            .tempfile_in(parent.as_std_path())
            .map_err(|err| SubmissionError::WorkbookWrite(path.clone(), err.to_string()))?;
        fs::write(temp.path(), &content)
            .map_err(|err| SubmissionError::WorkbookWrite(path.clone(), err.to_string()))?;
        temp.persist(path.as_std_path())
            .map_err(|err| SubmissionError::WorkbookWrite(path.clone(), err.to_string()))?;
        Ok(())
    }
}
