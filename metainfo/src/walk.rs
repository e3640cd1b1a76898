//! Enumerates a source path into a deterministic, offset-assigned file list,
//! applying include/exclude glob rules against each file's base name.

use std::fs;
use std::path::{Path, PathBuf};

use glob::{MatchOptions, Pattern};
use log::debug;
use walkdir::WalkDir;

use crate::error::{ConfigError, WalkError, WalkResult};

/// Case-insensitive suffixes that are always skipped, regardless of any
/// include/exclude pattern.
const ALWAYS_IGNORED_SUFFIXES: &[&str] = &[".torrent", ".ds_store", "thumbs.db", "desktop.ini"];

/// One file discovered by [`walk`], with its byte offset into the
/// concatenated stream the hasher operates over.
#[derive(Debug, Clone)]
pub struct FileEntry {
    pub path: PathBuf,
    pub length: u64,
    pub offset: u64,
}

#[derive(Debug, Clone)]
pub struct WalkedFiles {
    pub entries: Vec<FileEntry>,
    pub total: u64,
    pub base_dir: PathBuf,
    /// Whether the source path itself was a directory. A directory source
    /// always produces a multi-file torrent, even with a single file inside.
    pub is_directory: bool,
}

pub fn walk(source: &Path, include: &[String], exclude: &[String]) -> WalkResult<WalkedFiles> {
    debug!("walk: starting at {source:?} ({} include, {} exclude patterns)", include.len(), exclude.len());
    if !source.exists() {
        return Err(WalkError::NotFound(source.to_path_buf()));
    }

    let include_patterns = compile_patterns(include)?;
    let exclude_patterns = compile_patterns(exclude)?;

    let is_directory = source.is_dir();
    let base_dir = if is_directory {
        source.to_path_buf()
    } else {
        source.parent().map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from("."))
    };

    let mut candidates = Vec::new();
    if is_directory {
        for entry in WalkDir::new(source) {
            let entry = entry.map_err(|err| WalkError::Io {
                path: source.to_path_buf(),
                source: err
                    .into_io_error()
                    .unwrap_or_else(|| std::io::Error::new(std::io::ErrorKind::Other, "directory walk failed")),
            })?;
            if entry.file_type().is_file() {
                candidates.push(entry.path().to_path_buf());
            }
        }
    } else {
        candidates.push(source.to_path_buf());
    }

    candidates.sort();

    let mut entries = Vec::with_capacity(candidates.len());
    let mut offset = 0u64;
    for path in candidates {
        let base_name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
        if is_always_ignored(base_name) {
            continue;
        }
        if !keep(base_name, &include_patterns, &exclude_patterns) {
            continue;
        }

        let length = fs::metadata(&path).map_err(|err| WalkError::Io { path: path.clone(), source: err })?.len();
        entries.push(FileEntry { path, length, offset });
        offset += length;
    }

    if entries.is_empty() {
        return Err(WalkError::Empty(source.to_path_buf()));
    }

    debug!("walk: finished at {source:?}, {} files, {offset} bytes", entries.len());
    Ok(WalkedFiles { total: offset, entries, base_dir, is_directory })
}

fn compile_patterns(patterns: &[String]) -> Result<Vec<Pattern>, ConfigError> {
    patterns
        .iter()
        .map(|pattern| Pattern::new(pattern).map_err(|source| ConfigError::BadPattern { pattern: pattern.clone(), source }))
        .collect()
}

fn is_always_ignored(base_name: &str) -> bool {
    let lower = base_name.to_ascii_lowercase();
    ALWAYS_IGNORED_SUFFIXES.iter().any(|suffix| lower.ends_with(suffix))
}

/// Include patterns, when present, take exclusive precedence: a name must
/// match one of them and excludes are not consulted.
fn keep(base_name: &str, include: &[Pattern], exclude: &[Pattern]) -> bool {
    let options = MatchOptions {
        case_sensitive: false,
        require_literal_separator: false,
        require_literal_leading_dot: false,
    };

    if !include.is_empty() {
        return include.iter().any(|pattern| pattern.matches_with(base_name, options));
    }
    if !exclude.is_empty() {
        return !exclude.iter().any(|pattern| pattern.matches_with(base_name, options));
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;

    use tempfile::tempdir;

    #[test]
    fn walks_a_single_file() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("lonely.bin");
        File::create(&file_path).unwrap().write_all(b"hello").unwrap();

        let walked = walk(&file_path, &[], &[]).unwrap();

        assert!(!walked.is_directory);
        assert_eq!(walked.entries.len(), 1);
        assert_eq!(walked.total, 5);
    }

    #[test]
    fn walks_a_directory_in_sorted_order() {
        let dir = tempdir().unwrap();
        File::create(dir.path().join("b.bin")).unwrap().write_all(b"22").unwrap();
        File::create(dir.path().join("a.bin")).unwrap().write_all(b"1").unwrap();

        let walked = walk(dir.path(), &[], &[]).unwrap();

        assert!(walked.is_directory);
        let names: Vec<_> = walked.entries.iter().map(|e| e.path.file_name().unwrap().to_str().unwrap()).collect();
        assert_eq!(names, vec!["a.bin", "b.bin"]);
        assert_eq!(walked.entries[0].offset, 0);
        assert_eq!(walked.entries[1].offset, 1);
        assert_eq!(walked.total, 3);
    }

    #[test]
    fn always_ignored_names_are_skipped() {
        let dir = tempdir().unwrap();
        File::create(dir.path().join("keep.bin")).unwrap().write_all(b"x").unwrap();
        File::create(dir.path().join("Thumbs.db")).unwrap().write_all(b"x").unwrap();

        let walked = walk(dir.path(), &[], &[]).unwrap();

        assert_eq!(walked.entries.len(), 1);
    }

    #[test]
    fn include_patterns_take_precedence_over_exclude() {
        let dir = tempdir().unwrap();
        File::create(dir.path().join("a.nfo")).unwrap().write_all(b"x").unwrap();
        File::create(dir.path().join("b.bin")).unwrap().write_all(b"x").unwrap();

        let walked = walk(dir.path(), &["*.nfo".to_string()], &["*.nfo".to_string()]).unwrap();

        assert_eq!(walked.entries.len(), 1);
        assert_eq!(walked.entries[0].path.file_name().unwrap(), "a.nfo");
    }

    #[test]
    fn empty_directory_after_filtering_is_an_error() {
        let dir = tempdir().unwrap();
        File::create(dir.path().join("a.bin")).unwrap().write_all(b"x").unwrap();

        let result = walk(dir.path(), &[], &["*.bin".to_string()]);

        assert!(matches!(result, Err(WalkError::Empty(_))));
    }
}
