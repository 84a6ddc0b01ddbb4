use crate::schema::{FieldKind, FieldRule, Schema};
use crate::workbook::{Value, Workbook};

/// Apply the declarative schema sheet-by-sheet, row-by-row.
///
/// Pure function of (workbook, schema): one error per violated
/// (sheet, row, field) combination, with row numbers translated through the
/// sheet's header offset so they match the original spreadsheet layout.
/// Fields the schema does not declare are ignored, as are schema sheets the
/// workbook does not carry.
pub fn validate(workbook: &Workbook, schema: &Schema) -> Vec<String> {
    let mut errors = Vec::new();
    for (sheet_name, rules) in &schema.sheets {
        let offset = workbook.header_offset(sheet_name);
        for (position, row) in workbook.rows(sheet_name).iter().enumerate() {
            let row_num = position + offset + 1;
            for (field, rule) in &rules.fields {
                for message in check_field(row.get(field), rule) {
                    errors.push(format!(
                        "In Sheet {sheet_name}, Row {row_num}, field {field}: {message}"
                    ));
                }
            }
        }
    }
    errors
}

fn check_field(value: Option<&Value>, rule: &FieldRule) -> Vec<String> {
    let mut messages = Vec::new();
    let Some(value) = value else {
        if rule.required {
            messages.push("required field".to_string());
        }
        return messages;
    };

    if rule.required && value.is_empty() {
        messages.push("empty values not allowed".to_string());
    }

    if let Some(kind) = rule.kind {
        if !kind_matches(value, kind) {
            messages.push(format!("must be of {kind} type"));
            return messages;
        }
    }

    match value {
        Value::List(items) => {
            let element_rule = rule.each.as_deref();
            for item in items {
                if let Some(element_rule) = element_rule {
                    for message in check_element(item, element_rule) {
                        messages.push(message);
                    }
                }
                if let Some(allowed) = &rule.allowed {
                    if !allowed.iter().any(|candidate| candidate == item) {
                        messages.push(format!("unallowed value {item}"));
                    }
                }
            }
        }
        other => {
            if let Some(allowed) = &rule.allowed {
                let text = other.as_text();
                if !allowed.iter().any(|candidate| *candidate == text) {
                    messages.push(format!("unallowed value {text}"));
                }
            }
        }
    }

    messages
}

fn check_element(item: &str, rule: &FieldRule) -> Vec<String> {
    let mut messages = Vec::new();
    if rule.required && item.trim().is_empty() {
        messages.push("empty values not allowed".to_string());
    }
    if let Some(allowed) = &rule.allowed {
        if !allowed.iter().any(|candidate| candidate == item) {
            messages.push(format!("unallowed value {item}"));
        }
    }
    messages
}

fn kind_matches(value: &Value, kind: FieldKind) -> bool {
    matches!(
        (value, kind),
        (Value::Text(_), FieldKind::Text)
            | (Value::Date(_), FieldKind::Date)
            | (Value::Integer(_), FieldKind::Integer)
            | (Value::List(_), FieldKind::List)
    )
}
