//! The in-memory representation of a bencode document.

use std::collections::BTreeMap;

use crate::error::{ConvertError, ConvertResult};

/// An ordered dictionary keyed by raw byte-strings.
///
/// `BTreeMap<Vec<u8>, _>` orders its keys by byte value, which is exactly the
/// ascending ordering the bencode wire format requires on encode.
pub type Dict = BTreeMap<Vec<u8>, Value>;

/// One of the four bencode types: byte-string, integer, list, or dictionary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Bytes(Vec<u8>),
    Int(i64),
    List(Vec<Value>),
    Dict(Dict),
}

impl Value {
    pub fn bytes<B: Into<Vec<u8>>>(b: B) -> Value {
        Value::Bytes(b.into())
    }

    pub fn str<S: AsRef<str>>(s: S) -> Value {
        Value::Bytes(s.as_ref().as_bytes().to_vec())
    }

    pub fn dict() -> Value {
        Value::Dict(Dict::new())
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        self.as_bytes().and_then(|b| std::str::from_utf8(b).ok())
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_list_mut(&mut self) -> Option<&mut Vec<Value>> {
        match self {
            Value::List(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_dict(&self) -> Option<&Dict> {
        match self {
            Value::Dict(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_dict_mut(&mut self) -> Option<&mut Dict> {
        match self {
            Value::Dict(d) => Some(d),
            _ => None,
        }
    }

    pub fn into_dict(self) -> Option<Dict> {
        match self {
            Value::Dict(d) => Some(d),
            _ => None,
        }
    }
}

/// Convenience lookups against a [`Dict`] that translate a missing or
/// mis-shaped key into a [`ConvertError`] carrying the offending key.
pub trait DictExt {
    fn require(&self, key: &[u8]) -> ConvertResult<&Value>;
    fn require_int(&self, key: &[u8]) -> ConvertResult<i64>;
    fn require_bytes(&self, key: &[u8]) -> ConvertResult<&[u8]>;
    fn require_str(&self, key: &[u8]) -> ConvertResult<&str>;
    fn require_list(&self, key: &[u8]) -> ConvertResult<&[Value]>;
    fn require_dict(&self, key: &[u8]) -> ConvertResult<&Dict>;

    fn opt_int(&self, key: &[u8]) -> Option<i64>;
    fn opt_bytes(&self, key: &[u8]) -> Option<&[u8]>;
    fn opt_str(&self, key: &[u8]) -> Option<&str>;
    fn opt_list(&self, key: &[u8]) -> Option<&[Value]>;
}

impl DictExt for Dict {
    fn require(&self, key: &[u8]) -> ConvertResult<&Value> {
        self.get(key).ok_or_else(|| ConvertError::MissingKey { key: key.to_vec() })
    }

    fn require_int(&self, key: &[u8]) -> ConvertResult<i64> {
        self.require(key)?.as_int().ok_or_else(|| ConvertError::WrongType {
            key: key.to_vec(),
            expected: "integer",
        })
    }

    fn require_bytes(&self, key: &[u8]) -> ConvertResult<&[u8]> {
        self.require(key)?.as_bytes().ok_or_else(|| ConvertError::WrongType {
            key: key.to_vec(),
            expected: "byte-string",
        })
    }

    fn require_str(&self, key: &[u8]) -> ConvertResult<&str> {
        self.require(key)?.as_str().ok_or_else(|| ConvertError::WrongType {
            key: key.to_vec(),
            expected: "utf-8 byte-string",
        })
    }

    fn require_list(&self, key: &[u8]) -> ConvertResult<&[Value]> {
        self.require(key)?.as_list().ok_or_else(|| ConvertError::WrongType {
            key: key.to_vec(),
            expected: "list",
        })
    }

    fn require_dict(&self, key: &[u8]) -> ConvertResult<&Dict> {
        self.require(key)?.as_dict().ok_or_else(|| ConvertError::WrongType {
            key: key.to_vec(),
            expected: "dictionary",
        })
    }

    fn opt_int(&self, key: &[u8]) -> Option<i64> {
        self.get(key).and_then(Value::as_int)
    }

    fn opt_bytes(&self, key: &[u8]) -> Option<&[u8]> {
        self.get(key).and_then(Value::as_bytes)
    }

    fn opt_str(&self, key: &[u8]) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    fn opt_list(&self, key: &[u8]) -> Option<&[Value]> {
        self.get(key).and_then(Value::as_list)
    }
}
