use camino::Utf8PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum SubmissionError {
    #[error("failed to read metadata workbook at {0}")]
    WorkbookRead(Utf8PathBuf),

    #[error("failed to parse metadata workbook: {0}")]
    WorkbookParse(String),

    #[error("failed to write metadata workbook at {0}: {1}")]
    WorkbookWrite(Utf8PathBuf, String),

    #[error("sheet missing from metadata workbook: {0}")]
    MissingSheet(String),

    #[error("failed to read validation schema at {0}")]
    SchemaRead(Utf8PathBuf),

    #[error("failed to parse validation schema: {0}")]
    SchemaParse(String),

    #[error("assembly service client setup failed: {0}")]
    AssemblyHttp(String),

    #[error("taxonomy service client setup failed: {0}")]
    TaxonomyHttp(String),

    #[error("filesystem error: {0}")]
    Filesystem(String),
}

/// Failure of a single external reference lookup.
///
/// The set of kinds is closed on purpose: callers must be able to tell
/// "no match" apart from "service down" when deciding whether a value is
/// wrong or merely unverifiable.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("no record found for {0}")]
    NotFound(String),

    #[error("more than one record found for {query}: {}", candidates.join(", "))]
    Ambiguous {
        query: String,
        candidates: Vec<String>,
    },

    #[error("malformed lookup input {input}: {reason}")]
    MalformedInput { input: String, reason: String },

    #[error("{service} request for {query} failed: {reason}")]
    ServiceUnavailable {
        service: String,
        query: String,
        reason: String,
    },
}
