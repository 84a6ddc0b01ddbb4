use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::warn;

use crate::error::SubmissionError;
use crate::workbook::{
    ANALYSIS_SHEET, PROJECT_SHEET, PROJECT_TITLE_FIELD, REFERENCE_FIELD, SAMPLE_SHEET, Workbook,
};

#[derive(Debug, Clone, Serialize)]
pub struct FileEntry {
    pub path: Utf8PathBuf,
    pub size: u64,
    pub modified: DateTime<Utc>,
}

/// One user's deposit directory, with its files classified into variant
/// call files, metadata workbooks and everything else.
#[derive(Debug, Serialize)]
pub struct DepositBox {
    pub root: Utf8PathBuf,
    pub username: String,
    pub vcf_files: Vec<FileEntry>,
    pub metadata_files: Vec<FileEntry>,
    pub other_files: Vec<FileEntry>,
}

#[derive(Debug, Serialize)]
pub struct DepositSummary {
    pub box_path: Utf8PathBuf,
    pub username: String,
    pub total_size: u64,
    pub last_modified: Option<DateTime<Utc>>,
    pub vcf_count: usize,
    pub metadata_count: usize,
    pub metadata: Option<MetadataDigest>,
}

/// What the most recent metadata workbook in a box says about itself.
#[derive(Debug, Serialize)]
pub struct MetadataDigest {
    pub project_title: Option<String>,
    pub analysis_count: usize,
    pub references: Vec<String>,
    pub sample_count: usize,
}

impl DepositBox {
    /// Walk one user's deposit directory under `root/upload/<username>`.
    pub fn explore(root: &Utf8Path, username: &str) -> Result<Self, SubmissionError> {
        let deposit_dir = root.join("upload").join(username);
        let mut box_ = DepositBox {
            root: deposit_dir.clone(),
            username: username.to_string(),
            vcf_files: Vec::new(),
            metadata_files: Vec::new(),
            other_files: Vec::new(),
        };

        let mut stack = vec![deposit_dir];
        while let Some(dir) = stack.pop() {
            let entries = fs::read_dir(dir.as_std_path())
                .map_err(|err| SubmissionError::Filesystem(err.to_string()))?;
            for entry in entries {
                let entry = entry.map_err(|err| SubmissionError::Filesystem(err.to_string()))?;
                let path = Utf8PathBuf::from_path_buf(entry.path())
                    .map_err(|_| SubmissionError::Filesystem("non-utf8 path".to_string()))?;
                if path.is_dir() {
                    stack.push(path);
                    continue;
                }
                let metadata = entry
                    .metadata()
                    .map_err(|err| SubmissionError::Filesystem(err.to_string()))?;
                let modified = metadata
                    .modified()
                    .map(DateTime::<Utc>::from)
                    .map_err(|err| SubmissionError::Filesystem(err.to_string()))?;
                let name = path.file_name().unwrap_or_default().to_string();
                let file = FileEntry {
                    size: metadata.len(),
                    modified,
                    path,
                };
                if name.ends_with(".vcf") || name.ends_with(".vcf.gz") {
                    box_.vcf_files.push(file);
                } else if name.ends_with(".json") {
                    box_.metadata_files.push(file);
                } else {
                    box_.other_files.push(file);
                }
            }
        }
        Ok(box_)
    }

    pub fn total_size(&self) -> u64 {
        self.all_files().map(|file| file.size).sum()
    }

    pub fn last_modified(&self) -> Option<DateTime<Utc>> {
        self.all_files().map(|file| file.modified).max()
    }

    pub fn most_recent_metadata(&self) -> Option<&FileEntry> {
        self.metadata_files.iter().max_by_key(|file| file.modified)
    }

    fn all_files(&self) -> impl Iterator<Item = &FileEntry> {
        self.vcf_files
            .iter()
            .chain(self.metadata_files.iter())
            .chain(self.other_files.iter())
    }

    pub fn summary(&self) -> DepositSummary {
        let metadata = self.most_recent_metadata().and_then(|entry| {
            match Workbook::load(&entry.path) {
                Ok(workbook) => Some(digest(&workbook)),
                Err(err) => {
                    warn!("skipping unreadable metadata workbook {}: {err}", entry.path);
                    None
                }
            }
        });
        DepositSummary {
            box_path: self.root.clone(),
            username: self.username.clone(),
            total_size: self.total_size(),
            last_modified: self.last_modified(),
            vcf_count: self.vcf_files.len(),
            metadata_count: self.metadata_files.len(),
            metadata,
        }
    }
}

fn digest(workbook: &Workbook) -> MetadataDigest {
    let references: Vec<String> = workbook
        .rows(ANALYSIS_SHEET)
        .iter()
        .filter_map(|row| row.text(REFERENCE_FIELD))
        .filter(|reference| !reference.is_empty())
        .collect();
    MetadataDigest {
        project_title: workbook
            .rows(PROJECT_SHEET)
            .first()
            .and_then(|row| row.text(PROJECT_TITLE_FIELD)),
        analysis_count: workbook.rows(ANALYSIS_SHEET).len(),
        references,
        sample_count: workbook.rows(SAMPLE_SHEET).len(),
    }
}

/// Summarize every user box under the deposit root.
pub fn inspect_all_users(root: &Utf8Path) -> Result<Vec<DepositSummary>, SubmissionError> {
    let upload_dir = root.join("upload");
    let mut summaries = Vec::new();
    let entries = fs::read_dir(upload_dir.as_std_path())
        .map_err(|err| SubmissionError::Filesystem(err.to_string()))?;
    let mut usernames = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|err| SubmissionError::Filesystem(err.to_string()))?;
        if entry.path().is_dir() {
            if let Some(name) = entry.file_name().to_str() {
                usernames.push(name.to_string());
            }
        }
    }
    usernames.sort();
    for username in usernames {
        let box_ = DepositBox::explore(root, &username)?;
        summaries.push(box_.summary());
    }
    Ok(summaries)
}
