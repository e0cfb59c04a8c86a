use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{ensure, Context, Result};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::io::{file_stem, list_text_files, read_transcript, LinkRow, RenamedCopies};
use crate::models::{MatchMethod, Roster, RosterRecord};
use crate::resolver::{Resolver, ResolverConfig};

/// Configuration for the link stage
#[derive(Debug, Clone)]
pub struct LinkConfig {
    pub resolver: ResolverConfig,
    /// Write copies named after the matched record into this directory
    pub rename_dir: Option<PathBuf>,
    /// Extension of user-only transcript files
    pub extension: String,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            resolver: ResolverConfig::default(),
            rename_dir: None,
            extension: "txt".to_string(),
        }
    }
}

/// Result of the link stage
#[derive(Debug, Default)]
pub struct LinkResult {
    /// Report rows, sorted by filename
    pub rows: Vec<LinkRow>,
    pub matched: usize,
    pub unmatched: usize,
    /// Files that could not be read
    pub skipped: usize,
    /// Renamed copies written
    pub renamed: usize,
}

impl LinkResult {
    /// Number of rows resolved by the given method
    pub fn count_by_method(&self, method: MatchMethod) -> usize {
        self.rows
            .iter()
            .filter(|row| row.match_method == method.report_value())
            .count()
    }
}

/// Execute the link stage
///
/// For every transcript in `txt_dir`, extract identity signals and resolve
/// them against the shared roster snapshot. Files are independent, so they
/// are processed concurrently; rows come back sorted by filename.
pub async fn execute_link(txt_dir: &Path, roster: Arc<Roster>, config: &LinkConfig) -> Result<LinkResult> {
    ensure!(txt_dir.is_dir(), "Transcript folder not found: {:?}", txt_dir);
    config.resolver.validate()?;

    let resolver = Arc::new(Resolver::new(&config.resolver));
    let files = list_text_files(txt_dir, &config.extension)?;
    info!(
        "Link: resolving {} transcripts against {} roster records",
        files.len(),
        roster.len()
    );

    let mut tasks = JoinSet::new();
    for path in files {
        let resolver = Arc::clone(&resolver);
        let roster = Arc::clone(&roster);
        tasks.spawn_blocking(move || {
            let outcome = link_file(&resolver, &roster, &path);
            (path, outcome)
        });
    }

    let mut result = LinkResult::default();
    let mut linked = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        let (path, outcome) = joined.context("Link task panicked")?;
        match outcome {
            Ok(file) => {
                debug!(
                    "{}: method={} emails={:?} name={:?}",
                    file.row.filename, file.row.match_method, file.row.extracted_email, file.row.extracted_name
                );
                if file.row.is_matched() {
                    result.matched += 1;
                } else {
                    result.unmatched += 1;
                }
                linked.push(file);
            }
            Err(e) => {
                warn!("Skipping {:?}: {:#}", path, e);
                result.skipped += 1;
            }
        }
    }

    // Sorted before renaming so copy names do not depend on task timing
    linked.sort_by(|a, b| a.row.filename.cmp(&b.row.filename));
    if let Some(dir) = &config.rename_dir {
        result.renamed = write_copies(dir, &linked)?;
    }

    result.rows = linked.into_iter().map(|file| file.row).collect();
    info!(
        "Link: {} matched, {} unmatched, {} skipped",
        result.matched, result.unmatched, result.skipped
    );

    Ok(result)
}

/// One transcript after resolution
struct LinkedFile {
    path: PathBuf,
    text: String,
    record: Option<RosterRecord>,
    row: LinkRow,
}

fn link_file(resolver: &Resolver, roster: &Roster, path: &Path) -> Result<LinkedFile> {
    let text = read_transcript(path)?;
    let (signals, result) = resolver.link_text(&text, roster);
    let row = LinkRow::new(path, &signals, &result);

    Ok(LinkedFile {
        path: path.to_path_buf(),
        text,
        record: result.record,
        row,
    })
}

/// Write renamed copies in file order; returns how many were written
fn write_copies(dir: &Path, linked: &[LinkedFile]) -> Result<usize> {
    let mut copies = RenamedCopies::new(dir)?;
    for file in linked {
        let Some(record) = &file.record else {
            continue;
        };
        // A failed copy should not drop the report row
        if let Err(e) = copies.write(record, &file_stem(&file.path), &file.text) {
            warn!("{:#}", e);
        }
    }
    Ok(copies.written())
}
