//! Parsing, building, hashing, and verifying BitTorrent metainfo (`.torrent`)
//! files.
//!
//! This crate is the core torrent engine behind a metainfo CLI: it owns the
//! bencode wire format, the in-memory metainfo model, the file-tree walker,
//! piece-length policy, the parallel piece hasher/verifier, the tracker rule
//! table and validator, and the preset-driven create/modify operations.
//! Argument parsing, YAML preset loading, and progress rendering are left to
//! callers; this crate exposes typed inputs and outputs for all of them.

mod atomic;
pub mod create;
pub mod error;
mod hash;
pub mod hasher;
pub mod inspect;
pub mod keys;
pub mod metainfo;
pub mod modify;
pub mod piece_length;
pub mod preset;
pub mod tracker;
pub mod verify;
pub mod walk;

pub use create::{create, CreateRequest};
pub use error::{ConfigError, CreateError, HashError, LoadError, ModifyError, VerifyError, WalkError};
pub use hash::{DefaultHasher, PieceHasher};
pub use hasher::{CancelToken, MissingFile, MissingReason, NullSink, ProgressSink, RecordingSink, VerificationResult};
pub use inspect::{inspect, InspectLayout, InspectSummary};
pub use metainfo::{Info, InfoFile, Layout, Metainfo, Sha1Digest};
pub use piece_length::{PieceLengthOptions, MAX_EXP, MIN_EXP};
pub use preset::{merge as merge_preset_options, BatchJob, PresetOptions};
pub use tracker::{validate, RuleResult, RuleStatus, TrackerRule, TRACKER_RULES};
pub use verify::verify as verify_content;
pub use walk::{walk, FileEntry, WalkedFiles};
