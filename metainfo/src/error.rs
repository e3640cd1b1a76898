//! Error types for the metainfo core: invalid configuration, file-walk
//! failures, malformed or invariant-violating metainfo documents, I/O
//! failures during hashing/verification, and cooperative cancellation.

use std::io;
use std::path::PathBuf;

use bencode::{ConvertError, DecodeError as BenDecodeError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("piece length exponent {exp} is outside the allowed range [{min}, {max}]")]
    PieceLengthOutOfRange { exp: u32, min: u32, max: u32 },

    #[error("piece length exponent {exp} exceeds tracker {tracker}'s cap of {cap}")]
    TrackerCapExceeded { exp: u32, cap: u32, tracker: String },

    #[error("malformed glob pattern {pattern:?}: {source}")]
    BadPattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    #[error("{0} workers requested but the file set is non-empty")]
    ZeroWorkers(usize),

    #[error("contradictory options: {0}")]
    Contradictory(String),

    #[error("path {0:?} contains a component that is not valid UTF-8")]
    NonUtf8Path(PathBuf),

    #[error("tracker url {0:?} is not a well-formed url")]
    InvalidTrackerUrl(String),
}

#[derive(Debug, Error)]
pub enum WalkError {
    #[error("source path {0:?} does not exist")]
    NotFound(PathBuf),

    #[error("no files found under {0:?}")]
    Empty(PathBuf),

    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("malformed bencode: {0}")]
    Bencode(#[from] BenDecodeError),

    #[error("malformed metainfo field: {0}")]
    Field(#[from] ConvertError),

    #[error("{0}")]
    Invariant(String),
}

#[derive(Debug, Error)]
pub enum HashError {
    #[error("I/O error hashing {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("hashing was canceled")]
    Canceled,
}

#[derive(Debug, Error)]
pub enum CreateError {
    #[error(transparent)]
    Walk(#[from] WalkError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Hash(#[from] HashError),

    #[error("failed to write {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Error)]
pub enum VerifyError {
    #[error(transparent)]
    Hash(#[from] HashError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Load(#[from] LoadError),
}

#[derive(Debug, Error)]
pub enum ModifyError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("malformed tracker url {0:?}")]
    BadTrackerUrl(String),

    #[error("refusing to overwrite input path {0:?} without an explicit allow-overwrite request")]
    WouldOverwriteInput(PathBuf),

    #[error("failed to write {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

pub type ConfigResult<T> = Result<T, ConfigError>;
pub type WalkResult<T> = Result<T, WalkError>;
pub type LoadResult<T> = Result<T, LoadError>;
pub type HashResult<T> = Result<T, HashError>;
pub type ModifyResult<T> = Result<T, ModifyError>;
