//! Errors produced while parsing or converting bencode values.

use thiserror::Error;

/// Errors that can occur while decoding a bencoded byte stream.
#[derive(Debug, Error, Eq, PartialEq, Clone)]
pub enum DecodeError {
    #[error("unexpected end of bytes at position {pos}")]
    UnexpectedEof { pos: usize },

    #[error("invalid type token found at position {pos}")]
    InvalidToken { pos: usize },

    #[error("integer at position {pos} has no terminating delimiter")]
    UnterminatedInteger { pos: usize },

    #[error("integer at position {pos} is not valid UTF-8 or not base-10")]
    InvalidInteger { pos: usize },

    #[error("integer at position {pos} has illegal leading zero padding")]
    IntegerZeroPadding { pos: usize },

    #[error("integer at position {pos} is an illegal negative zero")]
    IntegerNegativeZero { pos: usize },

    #[error("byte-string length at position {pos} is negative")]
    NegativeLength { pos: usize },

    #[error("byte-string length at position {pos} overflows the remaining buffer")]
    LengthOverflow { pos: usize },

    #[error("dictionary key at position {pos} is not in ascending byte order")]
    KeyNotAscending { pos: usize },

    #[error("dictionary has a duplicate key at position {pos}")]
    DuplicateKey { pos: usize },

    #[error("{len} trailing bytes after the top-level value")]
    TrailingBytes { len: usize },
}

/// Errors raised when an accessor expects a value of a different shape or type.
#[derive(Debug, Error, Eq, PartialEq, Clone)]
pub enum ConvertError {
    #[error("missing key {key:?}")]
    MissingKey { key: Vec<u8> },

    #[error("key {key:?} was expected to be a {expected}")]
    WrongType { key: Vec<u8>, expected: &'static str },
}

pub type DecodeResult<T> = Result<T, DecodeError>;
pub type ConvertResult<T> = Result<T, ConvertError>;
