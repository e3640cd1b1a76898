//! The parallel piece hasher and verifier.
//!
//! The piece index range `[0, P)` is split into contiguous, non-overlapping
//! sub-ranges, one per worker thread; there is no shared work queue and no
//! work-stealing. Each worker walks the ordered file list forward from a
//! cursor that only ever advances, opening files on first touch and closing
//! them when the worker returns. This keeps the digest vector race-free
//! without locking: `create` hands each worker a disjoint `&mut` slice of
//! the output up front via `split_at_mut`, so every slot is written by
//! exactly one thread.

pub mod cancel;
pub mod progress;
pub mod schedule;

use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use log::{debug, warn};

use crate::error::{ConfigError, HashError, HashResult};
use crate::hash::{DefaultHasher, PieceHasher};
use crate::metainfo::Sha1Digest;
use crate::walk::FileEntry;

pub use cancel::CancelToken;
pub use progress::{NullSink, ProgressSink, RecordingSink};

/// How often the background timer samples the shared counters.
const SAMPLE_INTERVAL: Duration = Duration::from_millis(50);
const SAMPLE_PERIOD: Duration = Duration::from_millis(200);

/// Reason a file could not be read back during verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MissingReason {
    /// The file does not exist at all under the expected path.
    Absent,
    /// The file exists but its size no longer matches the recorded length.
    SizeMismatch,
    /// The file exists and matches in size, but a read failed.
    Io(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingFile {
    pub path: PathBuf,
    pub reason: MissingReason,
}

impl MissingFile {
    /// Renders the same way the original tool prints a missing-file line:
    /// the bare file name, with a `(size mismatch)` suffix when that's why.
    pub fn describe(&self) -> String {
        let name = self.path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_else(|| self.path.display().to_string());
        match &self.reason {
            MissingReason::SizeMismatch => format!("{name} (size mismatch)"),
            MissingReason::Absent | MissingReason::Io(_) => name,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct VerificationResult {
    pub total_pieces: usize,
    pub good_pieces: usize,
    pub bad_pieces: usize,
    pub missing_pieces: usize,
    pub bad_piece_indices: Vec<usize>,
    pub missing_files: Vec<MissingFile>,
}

impl VerificationResult {
    pub fn is_complete(&self) -> bool {
        self.good_pieces == self.total_pieces
    }
}

/// Hashes `entries` (spanning `total` bytes) into `P = ceil(total / 2^piece_exp)`
/// piece digests, using `workers` threads (or a derived count when `None`).
pub fn create(
    entries: &[FileEntry],
    total: u64,
    piece_exp: u32,
    workers: Option<usize>,
    sink: &dyn ProgressSink,
    cancel: &CancelToken,
) -> HashResult<Vec<Sha1Digest>> {
    let piece_len = 1u64 << piece_exp;
    let piece_count = piece_count_for(total, piece_len);
    if piece_count == 0 {
        sink.on_files(entries, 0);
        return Ok(Vec::new());
    }

    let schedule = derive_schedule(entries, total, piece_count, workers)?;
    sink.on_files(entries, schedule.workers);
    debug!("hashing {piece_count} pieces of {piece_len} bytes across {} workers", schedule.workers);

    let ranges = partition(piece_count, schedule.workers);
    let mut digests = vec![[0u8; 20]; piece_count];
    let completed = AtomicUsize::new(0);
    let bytes_hashed = AtomicU64::new(0);
    let done = AtomicBool::new(false);
    let first_error: Mutex<Option<HashError>> = Mutex::new(None);

    std::thread::scope(|scope| {
        scope.spawn(|| progress_timer(&completed, &bytes_hashed, piece_count, &done, sink));

        let mut handles = Vec::with_capacity(ranges.len());
        let mut remaining: &mut [Sha1Digest] = &mut digests;
        for range in &ranges {
            let (chunk, rest) = remaining.split_at_mut(range.len());
            remaining = rest;
            let lo = range.start;
            let cancel = cancel.clone();
            let buffer_size = schedule.buffer_size;
            handles.push(scope.spawn(move || {
                hash_range_create(entries, total, piece_len, lo, chunk, buffer_size, &completed, &bytes_hashed, &cancel)
            }));
        }

        for handle in handles {
            if let Err(err) = handle.join().expect("hasher worker thread panicked") {
                let mut guard = first_error.lock().unwrap();
                if guard.is_none() {
                    *guard = Some(err);
                }
            }
        }
        done.store(true, Ordering::SeqCst);
    });

    if let Some(err) = first_error.into_inner().unwrap() {
        return Err(err);
    }

    Ok(digests)
}

/// Re-hashes `entries` against `expected` digests, tolerating missing files
/// and size mismatches instead of aborting.
pub fn verify(
    entries: &[FileEntry],
    total: u64,
    piece_exp: u32,
    expected: &[Sha1Digest],
    workers: Option<usize>,
    sink: &dyn ProgressSink,
    cancel: &CancelToken,
) -> HashResult<VerificationResult> {
    let piece_len = 1u64 << piece_exp;
    let piece_count = expected.len();
    if piece_count == 0 {
        sink.on_files(entries, 0);
        return Ok(VerificationResult::default());
    }

    let schedule = derive_schedule(entries, total, piece_count, workers)?;
    sink.on_files(entries, schedule.workers);

    let ranges = partition(piece_count, schedule.workers);
    let completed = AtomicUsize::new(0);
    let bytes_hashed = AtomicU64::new(0);
    let done = AtomicBool::new(false);
    let good = AtomicUsize::new(0);
    let missing_pieces = AtomicUsize::new(0);
    let bad_indices: Mutex<Vec<usize>> = Mutex::new(Vec::new());
    let missing_files: Mutex<BTreeMap<PathBuf, MissingReason>> = Mutex::new(BTreeMap::new());
    let cancelled = AtomicBool::new(false);

    std::thread::scope(|scope| {
        scope.spawn(|| progress_timer(&completed, &bytes_hashed, piece_count, &done, sink));

        let mut handles = Vec::with_capacity(ranges.len());
        for range in &ranges {
            let lo = range.start;
            let hi = range.end;
            let cancel = cancel.clone();
            let buffer_size = schedule.buffer_size;
            handles.push(scope.spawn(move || {
                hash_range_verify(
                    entries,
                    total,
                    piece_len,
                    lo,
                    hi,
                    expected,
                    buffer_size,
                    &completed,
                    &bytes_hashed,
                    &good,
                    &missing_pieces,
                    &bad_indices,
                    &missing_files,
                    &cancel,
                )
            }));
        }

        for handle in handles {
            if handle.join().expect("hasher worker thread panicked") {
                cancelled.store(true, Ordering::SeqCst);
            }
        }
        done.store(true, Ordering::SeqCst);
    });

    if cancelled.load(Ordering::SeqCst) {
        return Err(HashError::Canceled);
    }

    let mut bad_piece_indices = bad_indices.into_inner().unwrap();
    bad_piece_indices.sort_unstable();
    let missing_files = missing_files
        .into_inner()
        .unwrap()
        .into_iter()
        .map(|(path, reason)| MissingFile { path, reason })
        .collect();

    for missing in &missing_files {
        warn!("verify: {} is unreadable: {:?}", missing.path.display(), missing.reason);
    }

    Ok(VerificationResult {
        total_pieces: piece_count,
        good_pieces: good.load(Ordering::SeqCst),
        bad_pieces: bad_piece_indices.len(),
        missing_pieces: missing_pieces.load(Ordering::SeqCst),
        bad_piece_indices,
        missing_files,
    })
}

pub fn piece_count_for(total: u64, piece_len: u64) -> usize {
    if total == 0 {
        0
    } else {
        ((total + piece_len - 1) / piece_len) as usize
    }
}

fn derive_schedule(entries: &[FileEntry], total: u64, piece_count: usize, pinned: Option<usize>) -> HashResult<schedule::Schedule> {
    if pinned == Some(0) && !entries.is_empty() {
        return Err(ConfigError::ZeroWorkers(0).into());
    }
    let cpu_count = std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1);
    Ok(schedule::derive(total, entries.len(), piece_count, cpu_count, pinned))
}

/// Splits `[0, piece_count)` into `workers` contiguous, roughly-equal ranges.
fn partition(piece_count: usize, workers: usize) -> Vec<std::ops::Range<usize>> {
    let workers = workers.max(1);
    let chunk = (piece_count + workers - 1) / workers;
    let mut ranges = Vec::new();
    let mut lo = 0;
    while lo < piece_count {
        let hi = (lo + chunk).min(piece_count);
        ranges.push(lo..hi);
        lo = hi;
    }
    ranges
}

/// Index of the first file entry whose span could contain `offset`, per the
/// walker's monotone ordering. Zero-length files are skipped naturally: the
/// same predicate that finds the starting file also steps over them inside
/// the hashing loop.
fn cursor_for_offset(entries: &[FileEntry], offset: u64) -> usize {
    entries.partition_point(|e| e.offset + e.length <= offset)
}

fn progress_timer(completed: &AtomicUsize, bytes_hashed: &AtomicU64, total_pieces: usize, done: &AtomicBool, sink: &dyn ProgressSink) {
    let mut last_sample = Instant::now();
    let mut last_bytes = 0u64;
    let mut accumulated = Duration::ZERO;

    loop {
        if done.load(Ordering::SeqCst) {
            let bytes_now = bytes_hashed.load(Ordering::Relaxed);
            let elapsed = last_sample.elapsed().as_secs_f64().max(f64::EPSILON);
            let rate = (bytes_now.saturating_sub(last_bytes)) as f64 / elapsed;
            sink.on_progress(completed.load(Ordering::Relaxed), total_pieces, rate);
            return;
        }

        std::thread::sleep(SAMPLE_INTERVAL);
        accumulated += SAMPLE_INTERVAL;
        if accumulated < SAMPLE_PERIOD {
            continue;
        }
        accumulated = Duration::ZERO;

        let now = Instant::now();
        let bytes_now = bytes_hashed.load(Ordering::Relaxed);
        let elapsed = now.duration_since(last_sample).as_secs_f64().max(f64::EPSILON);
        let rate = (bytes_now.saturating_sub(last_bytes)) as f64 / elapsed;
        sink.on_progress(completed.load(Ordering::Relaxed), total_pieces, rate);
        last_sample = now;
        last_bytes = bytes_now;
    }
}

/// Per-worker open-file cache entry. Tracks the read cursor so a worker
/// never re-seeks when the next read continues where the last one left off.
struct OpenFile {
    file: File,
    pos: u64,
}

impl OpenFile {
    fn open(path: &Path) -> io::Result<OpenFile> {
        Ok(OpenFile { file: File::open(path)?, pos: u64::MAX })
    }

    /// Reads exactly `len` bytes starting at `offset`, feeding each
    /// `buffer`-sized chunk to `on_chunk` as it is read.
    fn read_into(&mut self, offset: u64, len: u64, buffer: &mut [u8], mut on_chunk: impl FnMut(&[u8])) -> io::Result<()> {
        if self.pos != offset {
            self.file.seek(SeekFrom::Start(offset))?;
        }
        let mut remaining = len;
        while remaining > 0 {
            let chunk_len = remaining.min(buffer.len() as u64) as usize;
            self.file.read_exact(&mut buffer[..chunk_len])?;
            on_chunk(&buffer[..chunk_len]);
            remaining -= chunk_len as u64;
        }
        self.pos = offset + len;
        Ok(())
    }
}

#[allow(clippy::too_many_arguments)]
fn hash_range_create(
    entries: &[FileEntry],
    total: u64,
    piece_len: u64,
    lo: usize,
    out: &mut [Sha1Digest],
    buffer_size: usize,
    completed: &AtomicUsize,
    bytes_hashed: &AtomicU64,
    cancel: &CancelToken,
) -> HashResult<()> {
    let mut buffer = vec![0u8; buffer_size];
    let mut open_files: HashMap<usize, OpenFile> = HashMap::new();
    let mut cursor = cursor_for_offset(entries, lo as u64 * piece_len);

    for (slot, i) in (lo..lo + out.len()).enumerate() {
        if cancel.is_canceled() {
            return Err(HashError::Canceled);
        }

        let abs_start = i as u64 * piece_len;
        let abs_end = ((i as u64 + 1) * piece_len).min(total);

        let mut hasher = DefaultHasher::default();
        let mut pos = abs_start;
        while pos < abs_end {
            while entries[cursor].offset + entries[cursor].length <= pos {
                cursor += 1;
            }
            let file = &entries[cursor];
            let file_offset = pos - file.offset;
            let file_end = (abs_end - file.offset).min(file.length);
            let to_read = file_end - file_offset;

            let handle = match open_files.get_mut(&cursor) {
                Some(handle) => handle,
                None => {
                    let opened = OpenFile::open(&file.path).map_err(|source| HashError::Io { path: file.path.clone(), source })?;
                    open_files.entry(cursor).or_insert(opened)
                }
            };

            handle
                .read_into(file_offset, to_read, &mut buffer, |chunk| {
                    hasher.update(chunk);
                    bytes_hashed.fetch_add(chunk.len() as u64, Ordering::Relaxed);
                })
                .map_err(|source| HashError::Io { path: file.path.clone(), source })?;

            pos += to_read;
        }

        out[slot] = hasher.finalize();
        completed.fetch_add(1, Ordering::Relaxed);
    }

    Ok(())
}

/// Per-file status a verify worker caches after its first encounter with a
/// given file index, so the expensive `fs::metadata` check happens once.
enum VerifyFile {
    Ok(OpenFile),
    Bad(MissingReason),
}

/// Runs one worker's contiguous `[lo, hi)` piece range during verification.
/// Returns whether the worker observed cancellation.
#[allow(clippy::too_many_arguments)]
fn hash_range_verify(
    entries: &[FileEntry],
    total: u64,
    piece_len: u64,
    lo: usize,
    hi: usize,
    expected: &[Sha1Digest],
    buffer_size: usize,
    completed: &AtomicUsize,
    bytes_hashed: &AtomicU64,
    good: &AtomicUsize,
    missing_pieces: &AtomicUsize,
    bad_indices: &Mutex<Vec<usize>>,
    missing_files: &Mutex<BTreeMap<PathBuf, MissingReason>>,
    cancel: &CancelToken,
) -> bool {
    let mut buffer = vec![0u8; buffer_size];
    let mut files: HashMap<usize, VerifyFile> = HashMap::new();
    let mut cursor = cursor_for_offset(entries, lo as u64 * piece_len);

    for i in lo..hi {
        if cancel.is_canceled() {
            return true;
        }

        let abs_start = i as u64 * piece_len;
        let abs_end = ((i as u64 + 1) * piece_len).min(total);

        let mut hasher = DefaultHasher::default();
        let mut piece_missing = false;
        let mut pos = abs_start;

        while pos < abs_end {
            while entries[cursor].offset + entries[cursor].length <= pos {
                cursor += 1;
            }
            let file = &entries[cursor];
            let file_offset = pos - file.offset;
            let file_end = (abs_end - file.offset).min(file.length);
            let to_read = file_end - file_offset;

            let status = files.entry(cursor).or_insert_with(|| check_file(file));
            match status {
                VerifyFile::Bad(reason) => {
                    piece_missing = true;
                    record_missing(missing_files, file.path.clone(), reason.clone());
                }
                VerifyFile::Ok(handle) => {
                    let result = handle.read_into(file_offset, to_read, &mut buffer, |chunk| {
                        if !piece_missing {
                            hasher.update(chunk);
                        }
                        bytes_hashed.fetch_add(chunk.len() as u64, Ordering::Relaxed);
                    });
                    if let Err(err) = result {
                        piece_missing = true;
                        record_missing(missing_files, file.path.clone(), MissingReason::Io(err.to_string()));
                    }
                }
            }

            pos += to_read;
        }

        if piece_missing {
            missing_pieces.fetch_add(1, Ordering::Relaxed);
        } else if hasher.finalize() == expected[i] {
            good.fetch_add(1, Ordering::Relaxed);
        } else {
            bad_indices.lock().unwrap().push(i);
        }

        completed.fetch_add(1, Ordering::Relaxed);
    }

    false
}

fn check_file(file: &FileEntry) -> VerifyFile {
    match std::fs::metadata(&file.path) {
        Ok(meta) if meta.len() == file.length => match OpenFile::open(&file.path) {
            Ok(handle) => VerifyFile::Ok(handle),
            Err(err) => VerifyFile::Bad(MissingReason::Io(err.to_string())),
        },
        Ok(_) => VerifyFile::Bad(MissingReason::SizeMismatch),
        Err(_) => VerifyFile::Bad(MissingReason::Absent),
    }
}

fn record_missing(missing_files: &Mutex<BTreeMap<PathBuf, MissingReason>>, path: PathBuf, reason: MissingReason) {
    missing_files.lock().unwrap().entry(path).or_insert(reason);
}
