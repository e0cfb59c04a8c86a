use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;

use crate::models::{IdentitySignals, MatchResult, RosterRecord};
use crate::resolver::clean_name;

/// One row of the transcript-to-roster link report
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LinkRow {
    pub filename: String,
    pub filepath: String,
    /// Extracted emails joined with ';'
    pub extracted_email: String,
    pub extracted_name: String,
    /// Empty when nothing matched
    pub match_method: String,
    pub matched_name: String,
    pub matched_email: String,
    pub matched_student_id: String,
}

impl LinkRow {
    pub fn new(path: &Path, signals: &IdentitySignals, result: &MatchResult) -> Self {
        let record = result.record.as_ref();
        Self {
            filename: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            filepath: path.display().to_string(),
            extracted_email: signals.joined_emails(),
            extracted_name: signals.name.clone().unwrap_or_default(),
            match_method: result.method.report_value().to_string(),
            matched_name: record.map(|r| r.name.clone()).unwrap_or_default(),
            matched_email: record.map(|r| r.email.clone()).unwrap_or_default(),
            matched_student_id: record.map(|r| r.id.clone()).unwrap_or_default(),
        }
    }

    pub fn is_matched(&self) -> bool {
        !self.match_method.is_empty()
    }
}

/// Write the link report as CSV with a header row
pub fn write_link_csv(path: &Path, rows: &[LinkRow]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create file: {:?}", path))?;
    if rows.is_empty() {
        writer.write_record([
            "filename",
            "filepath",
            "extracted_email",
            "extracted_name",
            "match_method",
            "matched_name",
            "matched_email",
            "matched_student_id",
        ])?;
    }
    for row in rows {
        writer.serialize(row).context("Failed to write CSV row")?;
    }
    writer.flush().context("Failed to flush CSV")?;
    Ok(())
}

/// Write human-only text as `{stem}_user.txt` under `out_dir`
pub fn write_user_text(out_dir: &Path, stem: &str, text: &str) -> Result<PathBuf> {
    let path = out_dir.join(format!("{}_user.txt", stem));
    std::fs::write(&path, text).with_context(|| format!("Failed to write file: {:?}", path))?;
    Ok(path)
}

/// File name for a copy named after the matched roster record
///
/// `{id}_{FirstLast}_user.txt` when an id is known, `{FirstLast}_user.txt`
/// otherwise, falling back to `fallback_stem` when the name is empty. Only
/// ASCII letters, digits, `_` and `-` survive.
pub fn renamed_file_name(record: &RosterRecord, fallback_stem: &str) -> String {
    format!("{}_user.txt", renamed_stem(record, fallback_stem))
}

fn renamed_stem(record: &RosterRecord, fallback_stem: &str) -> String {
    let first_last = clean_name(&record.name);
    let id = record.id.trim();

    let stem = if !id.is_empty() && !id.eq_ignore_ascii_case("nan") {
        format!("{}_{}", id, first_last)
            .trim_matches('_')
            .to_string()
    } else if !first_last.is_empty() {
        first_last
    } else {
        fallback_stem.to_string()
    };

    stem.chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-'))
        .collect()
}

/// Writes copies named after matched records into one directory
///
/// Several transcripts can belong to the same person; later copies get a
/// numeric suffix (`{id}_{FirstLast}_2_user.txt`) instead of replacing the
/// earlier one. Source files are left untouched.
#[derive(Debug)]
pub struct RenamedCopies {
    out_dir: PathBuf,
    used: HashSet<String>,
    written: usize,
}

impl RenamedCopies {
    pub fn new(out_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(out_dir)
            .with_context(|| format!("Failed to create directory: {:?}", out_dir))?;
        Ok(Self {
            out_dir: out_dir.to_path_buf(),
            used: HashSet::new(),
            written: 0,
        })
    }

    /// Next unused file name for this record
    pub fn file_name(&mut self, record: &RosterRecord, fallback_stem: &str) -> String {
        let stem = renamed_stem(record, fallback_stem);
        let mut name = format!("{}_user.txt", stem);
        let mut n = 2;
        while self.used.contains(&name) {
            name = format!("{}_{}_user.txt", stem, n);
            n += 1;
        }
        self.used.insert(name.clone());
        name
    }

    pub fn write(&mut self, record: &RosterRecord, fallback_stem: &str, text: &str) -> Result<PathBuf> {
        let name = self.file_name(record, fallback_stem);
        let path = self.out_dir.join(name);
        std::fs::write(&path, text).with_context(|| format!("Failed to write file: {:?}", path))?;
        self.written += 1;
        Ok(path)
    }

    /// Copies successfully written so far
    pub fn written(&self) -> usize {
        self.written
    }
}
