use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Collapse CRLF/CR line endings to LF and drop a leading byte-order mark
pub fn normalize_text(raw: &str) -> String {
    let text = raw.strip_prefix('\u{feff}').unwrap_or(raw);
    text.replace("\r\n", "\n").replace('\r', "\n")
}

/// Read a transcript file as normalized text
///
/// Invalid UTF-8 sequences are dropped rather than rejected; exported page
/// dumps frequently contain stray bytes.
pub fn read_transcript(path: &Path) -> Result<String> {
    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read file: {:?}", path))?;
    Ok(normalize_text(&decode_ignoring_invalid(&bytes)))
}

fn decode_ignoring_invalid(bytes: &[u8]) -> String {
    let mut text = String::with_capacity(bytes.len());
    for chunk in bytes.utf8_chunks() {
        text.push_str(chunk.valid());
    }
    text
}

/// Split normalized transcript text into lines
pub fn transcript_lines(text: &str) -> Vec<&str> {
    text.split('\n').collect()
}

/// Files in `dir` (not recursive) with the given extension, sorted by path
pub fn list_text_files(dir: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read directory: {:?}", dir))?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry?.path();
        let matches_ext = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(extension));
        if path.is_file() && matches_ext {
            files.push(path);
        }
    }

    files.sort();
    Ok(files)
}

/// File name without its final extension, or "transcript" when unavailable
pub fn file_stem(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("transcript")
        .to_string()
}
