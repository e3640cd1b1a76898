//! The read-only `verify` operation: reconstructs the file-entry list a
//! loaded metainfo describes against a content path on disk, then hands it
//! to [`crate::hasher::verify`]. Never mutates the metainfo.

use std::path::{Path, PathBuf};

use crate::error::{ConfigError, VerifyError};
use crate::hasher::{self, CancelToken, ProgressSink, VerificationResult};
use crate::metainfo::{Info, Layout, Metainfo};
use crate::walk::FileEntry;

/// Re-hashes the data under `content_path` against `metainfo`'s stored
/// digests. `content_path` is the same root a caller would have pointed
/// `create` at: the file itself for a single-file torrent, or the directory
/// that directly holds the listed files for a multi-file torrent.
pub fn verify(
    metainfo: &Metainfo,
    content_path: &Path,
    workers: Option<usize>,
    sink: &dyn ProgressSink,
    cancel: &CancelToken,
) -> Result<VerificationResult, VerifyError> {
    let entries = entries_for_content(metainfo.info(), content_path)?;
    let total = metainfo.info().total_size();
    let piece_exp = metainfo.info().piece_length_exp();

    Ok(hasher::verify(&entries, total, piece_exp, metainfo.info().pieces(), workers, sink, cancel)?)
}

/// Rebuilds the [`FileEntry`] list `create` would have produced for this
/// info dictionary, rooted at `content_path`. Files that do not exist are
/// still included (with their recorded length) so [`hasher::verify`] can
/// report them as missing rather than silently shrinking the piece range.
fn entries_for_content(info: &Info, content_path: &Path) -> Result<Vec<FileEntry>, ConfigError> {
    match info.layout() {
        Layout::Single { length, .. } => {
            let path = if content_path.is_dir() { content_path.join(info.name()) } else { content_path.to_path_buf() };
            Ok(vec![FileEntry { path, length: *length, offset: 0 }])
        }
        Layout::Multi { files } => {
            if !content_path.is_dir() {
                return Err(ConfigError::Contradictory(format!(
                    "{content_path:?} is not a directory, but {:?} is a multi-file torrent",
                    info.name()
                )));
            }
            let mut offset = 0u64;
            let mut entries = Vec::with_capacity(files.len());
            for file in files {
                let path = join_relative(content_path, &file.path);
                entries.push(FileEntry { path, length: file.length, offset });
                offset += file.length;
            }
            Ok(entries)
        }
    }
}

fn join_relative(base: &Path, components: &[String]) -> PathBuf {
    let mut path = base.to_path_buf();
    for component in components {
        path.push(component);
    }
    path
}
