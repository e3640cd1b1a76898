//! A small, canonical bencode codec.
//!
//! Bencode has exactly four types: byte-strings, integers, lists, and
//! dictionaries. Dictionaries are ordered maps keyed by raw byte-strings in
//! ascending byte order; [`Value::Dict`] enforces that ordering structurally
//! by storing entries in a `BTreeMap<Vec<u8>, Value>`, so [`encode`] never
//! has to re-sort anything and [`decode`] rejects wire data that isn't
//! already sorted.

pub mod decode;
pub mod encode;
pub mod error;
pub mod value;

pub use decode::{decode, decode_at};
pub use encode::encode;
pub use error::{ConvertError, ConvertResult, DecodeError, DecodeResult};
pub use value::{Dict, DictExt, Value};
