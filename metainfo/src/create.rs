//! Composes the walker, the piece-length policy, the hasher, and the
//! metainfo model into the `create` operation: turn a file or directory on
//! disk into a `.torrent` file.

use std::path::{Path, PathBuf};

use log::debug;
use rand::Rng;

use crate::atomic::write_atomic;
use crate::error::{ConfigError, CreateError};
use crate::hasher::{self, CancelToken, ProgressSink};
use crate::metainfo::{Info, InfoFile, Layout, Metainfo};
use crate::piece_length::{self, PieceLengthOptions};
use crate::preset::PresetOptions;
use crate::tracker;
use crate::walk;

/// Everything `create` needs beyond the merged preset options: the source
/// path, a worker-count override, and how to name the output file.
#[derive(Debug, Clone)]
pub struct CreateRequest {
    pub source: PathBuf,
    pub options: PresetOptions,
    pub workers: Option<usize>,
    pub output: Option<PathBuf>,
    pub suppress_tracker_prefix: bool,
}

/// Builds a `Metainfo` from `request.source`, writes it atomically to its
/// resolved output path, and returns both.
pub fn create(request: &CreateRequest, sink: &dyn ProgressSink, cancel: &CancelToken) -> Result<(Metainfo, PathBuf), CreateError> {
    let metainfo = build(request, sink, cancel)?;
    let output_path = request.output.clone().unwrap_or_else(|| {
        default_output_path(&request.source, primary_tracker_label(&request.options), request.suppress_tracker_prefix)
    });

    let bytes = metainfo.to_bytes();
    write_atomic(&output_path, &bytes).map_err(|source| CreateError::Io { path: output_path.clone(), source })?;
    debug!("create: wrote {} bytes to {output_path:?}", bytes.len());

    Ok((metainfo, output_path))
}

/// The same construction `create` does, without touching the filesystem for
/// output — useful for a batch runner that wants to inspect a result before
/// deciding where (or whether) to write it.
pub fn build(request: &CreateRequest, sink: &dyn ProgressSink, cancel: &CancelToken) -> Result<Metainfo, CreateError> {
    let include = request.options.include_patterns.clone().unwrap_or_default();
    let exclude = request.options.exclude_patterns.clone().unwrap_or_default();
    let walked = walk::walk(&request.source, &include, &exclude)?;

    let tracker_url = request.options.trackers.as_ref().and_then(|t| t.first()).cloned();
    let piece_options = PieceLengthOptions {
        user_exp: request.options.piece_length,
        user_max_exp: request.options.max_piece_length,
        tracker_url,
    };
    let piece_exp = piece_length::choose(walked.total, &piece_options)?;

    let digests = hasher::create(&walked.entries, walked.total, piece_exp, request.workers, sink, cancel)?;

    let layout = if walked.is_directory {
        let mut files = Vec::with_capacity(walked.entries.len());
        for entry in &walked.entries {
            let relative = entry.path.strip_prefix(&walked.base_dir).unwrap_or(&entry.path);
            let path = relative
                .components()
                .map(|c| c.as_os_str().to_str().map(str::to_owned))
                .collect::<Option<Vec<_>>>()
                .ok_or_else(|| ConfigError::NonUtf8Path(entry.path.clone()))?;
            files.push(InfoFile { path, length: entry.length, md5sum: None });
        }
        Layout::Multi { files }
    } else {
        Layout::Single { length: walked.entries[0].length, md5sum: None }
    };

    let name = if walked.is_directory {
        walked.base_dir.file_name()
    } else {
        walked.entries[0].path.file_name()
    }
    .and_then(|n| n.to_str())
    .ok_or_else(|| ConfigError::NonUtf8Path(request.source.clone()))?
    .to_owned();

    let mut info = Info::new(name, piece_exp, digests, layout);
    info.set_private(request.options.private);
    info.set_source(request.options.source.clone());
    if request.options.entropy == Some(true) {
        let bytes: [u8; 16] = rand::thread_rng().gen();
        info.insert_entropy(bytes.to_vec());
    }

    let mut metainfo = Metainfo::new(info);
    apply_tracker_fields(&mut metainfo, &request.options)?;
    metainfo.set_comment(request.options.comment.clone());
    if request.options.no_creator != Some(true) {
        metainfo.set_created_by(Some(format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))));
    }
    if request.options.no_date != Some(true) {
        metainfo.set_creation_date(Some(chrono::Utc::now().timestamp()));
    }

    Ok(metainfo)
}

/// Mirrors `trackers` into `announce` and, when there is more than one, an
/// `announce-list` with one tier per tracker (each tracker is tried as a
/// fallback, not raced in parallel within a tier).
fn apply_tracker_fields(metainfo: &mut Metainfo, options: &PresetOptions) -> Result<(), ConfigError> {
    let Some(trackers) = options.trackers.as_ref().filter(|t| !t.is_empty()) else {
        return Ok(());
    };
    for url in trackers {
        if !tracker::is_valid_url(url) {
            return Err(ConfigError::InvalidTrackerUrl(url.clone()));
        }
    }

    metainfo.set_announce(Some(trackers[0].clone()));
    if trackers.len() > 1 {
        metainfo.set_announce_list(Some(trackers.iter().map(|t| vec![t.clone()]).collect()));
    }
    metainfo.sync_primary_announce();

    if let Some(webseeds) = &options.webseeds {
        metainfo.set_url_list(webseeds.clone());
    }

    Ok(())
}

fn primary_tracker_label(options: &PresetOptions) -> Option<&'static str> {
    options.trackers.as_ref()?.first().and_then(|url| tracker::lookup(url)).map(|rule| rule.label)
}

/// `<source-basename>.torrent`, optionally prefixed with `<tracker-label>_`.
pub fn default_output_path(source: &Path, tracker_label: Option<&str>, suppress_prefix: bool) -> PathBuf {
    let stem = source.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_else(|| "output".to_string());

    let file_name = match (tracker_label, suppress_prefix) {
        (Some(label), false) => format!("{label}_{stem}.torrent"),
        _ => format!("{stem}.torrent"),
    };

    PathBuf::from(file_name)
}
