//! Report file discovery.

use std::path::{Path, PathBuf};

use regex::Regex;
use tracing::debug;

use crate::error::{IngestError, Result};

/// File name pattern of the per-applet report files in an export directory.
pub const DEFAULT_REPORT_PATTERN: &str = "report*.csv";

/// Compiles a file name glob (`*` and `?` wildcards) into an anchored regex.
pub fn pattern_regex(pattern: &str) -> Result<Regex> {
    let mut source = String::from("^");
    for ch in pattern.chars() {
        match ch {
            '*' => source.push_str(".*"),
            '?' => source.push('.'),
            other => source.push_str(&regex::escape(other.encode_utf8(&mut [0; 4]))),
        }
    }
    source.push('$');
    Regex::new(&source).map_err(|source| IngestError::InvalidPattern {
        pattern: pattern.to_string(),
        source,
    })
}

/// Lists files in `dir` whose file name matches `pattern`.
///
/// Returns files sorted by filename.
pub fn list_report_files(dir: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    let matcher = pattern_regex(pattern)?;
    let entries = std::fs::read_dir(dir).map_err(|e| IngestError::DirectoryRead {
        path: dir.to_path_buf(),
        source: e,
    })?;

    let mut files = Vec::new();
    for entry_result in entries {
        let entry = entry_result.map_err(|e| IngestError::DirectoryRead {
            path: dir.to_path_buf(),
            source: e,
        })?;

        let path = entry.path();
        if !path.is_file() {
            continue;
        }

        let matches = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| matcher.is_match(name));
        if matches {
            files.push(path);
        }
    }

    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

/// Resolves the report files to load for an input path.
///
/// A regular file is used as-is; a directory is searched for files matching
/// `pattern`.
///
/// # Errors
///
/// Fails when the path does not exist, is not a directory, or the directory
/// holds no matching file.
pub fn discover_report_files(input: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    if !input.exists() {
        return Err(IngestError::InputNotFound {
            path: input.to_path_buf(),
        });
    }
    if input.is_file() {
        debug!(path = %input.display(), "using explicit report file");
        return Ok(vec![input.to_path_buf()]);
    }
    if !input.is_dir() {
        return Err(IngestError::NotADirectory {
            path: input.to_path_buf(),
        });
    }

    let files = list_report_files(input, pattern)?;
    if files.is_empty() {
        return Err(IngestError::NoMatchingFiles {
            path: input.to_path_buf(),
            pattern: pattern.to_string(),
        });
    }
    debug!(dir = %input.display(), count = files.len(), "discovered report files");
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn glob_wildcards() {
        let matcher = pattern_regex("report*.csv").unwrap();
        assert!(matcher.is_match("report.csv"));
        assert!(matcher.is_match("report-2024-01.csv"));
        assert!(!matcher.is_match("report.csv.bak"));
        assert!(!matcher.is_match("flow-items.csv"));
        assert!(!matcher.is_match("reportXcsv"));

        let single = pattern_regex("report_?.csv").unwrap();
        assert!(single.is_match("report_1.csv"));
        assert!(!single.is_match("report_12.csv"));
    }
}
