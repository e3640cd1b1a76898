//! Bencode dictionary key constants for the fields defined by the metainfo
//! wire format, extended with the non-standard keys this crate also reads
//! and writes (`url-list`, `source`, `entropy`).

/// Keys found within the root dictionary of a metainfo file.
pub const INFO: &[u8] = b"info";
pub const ANNOUNCE: &[u8] = b"announce";
pub const ANNOUNCE_LIST: &[u8] = b"announce-list";
pub const URL_LIST: &[u8] = b"url-list";
pub const COMMENT: &[u8] = b"comment";
pub const CREATED_BY: &[u8] = b"created by";
pub const CREATION_DATE: &[u8] = b"creation date";
pub const ENCODING: &[u8] = b"encoding";

/// Keys found within the info dictionary of a metainfo file.
pub const PIECE_LENGTH: &[u8] = b"piece length";
pub const PIECES: &[u8] = b"pieces";
pub const PRIVATE: &[u8] = b"private";
pub const NAME: &[u8] = b"name";
pub const FILES: &[u8] = b"files";
pub const SOURCE: &[u8] = b"source";
/// Non-standard key deliberately inserted to randomize the info hash.
pub const ENTROPY: &[u8] = b"entropy";

/// Keys found within the info dictionary (single-file) or a file dictionary
/// (multi-file) of a metainfo file.
pub const LENGTH: &[u8] = b"length";
pub const MD5SUM: &[u8] = b"md5sum";
pub const PATH: &[u8] = b"path";
