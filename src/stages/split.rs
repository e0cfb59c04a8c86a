use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{ensure, Context, Result};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::io::{file_stem, list_text_files, read_transcript, transcript_lines, write_user_text};
use crate::segmenter::{SegmentStats, Segmenter, SegmenterConfig};

/// Configuration for the split stage
#[derive(Debug, Clone)]
pub struct SplitConfig {
    /// Marker dialects recognised by the segmenter
    pub segmenter: SegmenterConfig,
    /// Extension of raw transcript files
    pub extension: String,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            segmenter: SegmenterConfig::default(),
            extension: "txt".to_string(),
        }
    }
}

/// Outcome for one raw transcript
#[derive(Debug, Clone)]
pub struct SplitOutcome {
    pub source: PathBuf,
    pub output: PathBuf,
    pub stats: SegmentStats,
}

/// Result of the split stage
#[derive(Debug, Default)]
pub struct SplitResult {
    /// Transcripts found in the source directory
    pub total: usize,
    /// User-only files written
    pub written: usize,
    /// Transcripts that could not be read or written
    pub skipped: usize,
    /// Written files with no human text (no recognised markers)
    pub empty: usize,
    /// Per-file outcomes, sorted by source path
    pub outcomes: Vec<SplitOutcome>,
}

/// Execute the split stage
///
/// Reads every raw transcript in `src_dir`, keeps only the human side, and
/// writes `{stem}_user.txt` into `out_dir`. A file that fails is skipped
/// with a warning; the rest of the batch continues.
pub async fn execute_split(src_dir: &Path, out_dir: &Path, config: &SplitConfig) -> Result<SplitResult> {
    ensure!(src_dir.is_dir(), "Source folder not found: {:?}", src_dir);
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create directory: {:?}", out_dir))?;

    let segmenter = Arc::new(Segmenter::new(&config.segmenter).context("Invalid marker configuration")?);
    let files = list_text_files(src_dir, &config.extension)?;
    if files.is_empty() {
        warn!("No .{} files found in {:?}", config.extension, src_dir);
    }
    info!("Split: segmenting {} transcripts", files.len());

    let mut tasks = JoinSet::new();
    for path in files.iter().cloned() {
        let segmenter = Arc::clone(&segmenter);
        let out_dir = out_dir.to_path_buf();
        tasks.spawn_blocking(move || {
            let outcome = split_file(&segmenter, &path, &out_dir);
            (path, outcome)
        });
    }

    let mut result = SplitResult {
        total: files.len(),
        ..Default::default()
    };

    while let Some(joined) = tasks.join_next().await {
        let (path, outcome) = joined.context("Split task panicked")?;
        match outcome {
            Ok(outcome) => {
                debug!(
                    "{:?}: {} human lines, {} markers",
                    path, outcome.stats.human_lines, outcome.stats.marker_lines
                );
                if outcome.stats.human_lines == 0 {
                    result.empty += 1;
                }
                result.written += 1;
                result.outcomes.push(outcome);
            }
            Err(e) => {
                warn!("Skipping {:?}: {:#}", path, e);
                result.skipped += 1;
            }
        }
    }

    result.outcomes.sort_by(|a, b| a.source.cmp(&b.source));
    info!(
        "Split: processed {} file(s); wrote {} user-only file(s) to {:?}",
        result.total, result.written, out_dir
    );
    if result.empty > 0 {
        warn!("{} transcript(s) had no recognised human turns", result.empty);
    }

    Ok(result)
}

fn split_file(segmenter: &Segmenter, path: &Path, out_dir: &Path) -> Result<SplitOutcome> {
    let text = read_transcript(path)?;
    let segmentation = segmenter.segment_with_stats(transcript_lines(&text));
    let output = write_user_text(out_dir, &file_stem(path), &segmentation.text)?;

    Ok(SplitOutcome {
        source: path.to_path_buf(),
        output,
        stats: segmentation.stats,
    })
}
