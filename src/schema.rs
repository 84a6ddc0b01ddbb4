use std::collections::BTreeMap;
use std::fmt;
use std::fs;

use camino::Utf8Path;
use serde::{Deserialize, Serialize};

use crate::error::SubmissionError;

/// Declarative validation schema: sheet name mapped to per-field rules.
/// Loaded once per validation run and treated as read-only configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Schema {
    #[serde(flatten)]
    pub sheets: BTreeMap<String, SheetRules>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SheetRules {
    #[serde(flatten)]
    pub fields: BTreeMap<String, FieldRule>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FieldRule {
    #[serde(default)]
    pub required: bool,
    #[serde(rename = "type", default)]
    pub kind: Option<FieldKind>,
    #[serde(default)]
    pub allowed: Option<Vec<String>>,
    /// Rule applied to every element of a list field.
    #[serde(default)]
    pub each: Option<Box<FieldRule>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Text,
    Date,
    Integer,
    List,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKind::Text => write!(f, "text"),
            FieldKind::Date => write!(f, "date"),
            FieldKind::Integer => write!(f, "integer"),
            FieldKind::List => write!(f, "list"),
        }
    }
}

impl Schema {
    pub fn load(path: &Utf8Path) -> Result<Self, SubmissionError> {
        let content = fs::read_to_string(path.as_std_path())
            .map_err(|_| SubmissionError::SchemaRead(path.to_owned()))?;
        serde_json::from_str(&content).map_err(|err| SubmissionError::SchemaParse(err.to_string()))
    }

    /// The schema shipped with the tool, used when no schema file is given.
    pub fn embedded() -> Result<Self, SubmissionError> {
        serde_json::from_str(include_str!("../etc/submission_schema.json"))
            .map_err(|err| SubmissionError::SchemaParse(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_field_rule() {
        let rule: FieldRule = serde_json::from_str(
            r#"{"required": true, "type": "list", "each": {"allowed": ["a", "b"]}}"#,
        )
        .unwrap();
        assert!(rule.required);
        assert_eq!(rule.kind, Some(FieldKind::List));
        let each = rule.each.unwrap();
        assert_eq!(each.allowed.unwrap(), vec!["a", "b"]);
    }

    #[test]
    fn embedded_schema_loads() {
        let schema = Schema::embedded().unwrap();
        assert!(schema.sheets.contains_key("Project"));
        assert!(schema.sheets.contains_key("Analysis"));
        assert!(schema.sheets.contains_key("Sample"));
        assert!(schema.sheets.contains_key("Files"));
    }
}
