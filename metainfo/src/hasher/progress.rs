//! The capability trait through which `hasher` reports progress to a UI.
//! This is deliberately separate from the `log` crate: `log` carries
//! diagnostics for operators, `ProgressSink` carries state a caller wants to
//! render (a progress bar, a file count, a throughput figure).

use std::sync::Mutex;

use crate::walk::FileEntry;

pub trait ProgressSink: Send + Sync {
    fn on_files(&self, _entries: &[FileEntry], _workers: usize) {}
    fn on_progress(&self, _completed_pieces: usize, _total_pieces: usize, _bytes_per_sec: f64) {}
    fn on_message(&self, _message: &str) {}
}

/// The default sink: discards everything.
pub struct NullSink;

impl ProgressSink for NullSink {}

/// A sink that records every callback, for use in tests.
#[derive(Default)]
pub struct RecordingSink {
    pub messages: Mutex<Vec<String>>,
    pub progress: Mutex<Vec<(usize, usize)>>,
}

impl ProgressSink for RecordingSink {
    fn on_progress(&self, completed_pieces: usize, total_pieces: usize, _bytes_per_sec: f64) {
        self.progress.lock().unwrap().push((completed_pieces, total_pieces));
    }

    fn on_message(&self, message: &str) {
        self.messages.lock().unwrap().push(message.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_sink_accumulates_progress_calls() {
        let sink = RecordingSink::default();
        sink.on_progress(1, 4, 0.0);
        sink.on_progress(2, 4, 0.0);
        assert_eq!(*sink.progress.lock().unwrap(), vec![(1, 4), (2, 4)]);
    }

    #[test]
    fn null_sink_accepts_every_callback_without_panicking() {
        let sink = NullSink;
        sink.on_files(&[], 1);
        sink.on_progress(0, 0, 0.0);
        sink.on_message("hello");
    }
}
