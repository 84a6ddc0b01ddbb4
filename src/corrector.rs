use tracing::info;

use crate::semantic::CorrectionMap;
use crate::workbook::{Row, SAMPLE_SHEET, SCIENTIFIC_NAME_FIELD, TAX_ID_FIELD, Value, Workbook};

/// Rewrite case-only scientific-name discrepancies in the sample sheet.
///
/// A row is corrected only when its taxonomy id has a correction, its
/// stored name differs from the authoritative one, and the difference is
/// case-only. Rows with a substantively different name are left untouched;
/// those are the hard-error path's concern. Returns the rows that changed,
/// already applied to the workbook and ready to be persisted.
pub fn apply(workbook: &mut Workbook, corrections: &CorrectionMap) -> Vec<Row> {
    let mut corrected = Vec::new();
    for row in workbook.rows(SAMPLE_SHEET) {
        let Some(taxid) = row.text(TAX_ID_FIELD) else {
            continue;
        };
        let Some(authoritative) = corrections.get(&taxid) else {
            continue;
        };
        let Some(current) = row.text(SCIENTIFIC_NAME_FIELD) else {
            continue;
        };
        if current != *authoritative && current.eq_ignore_ascii_case(authoritative) {
            let mut updated = row.clone();
            updated.set(SCIENTIFIC_NAME_FIELD, Value::Text(authoritative.clone()));
            corrected.push(updated);
        }
    }
    if !corrected.is_empty() {
        let replaced = workbook.update_rows(SAMPLE_SHEET, &corrected);
        info!("corrected scientific name in {replaced} sample rows");
    }
    corrected
}
