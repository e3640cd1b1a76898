//! Stack based bencode decoder.
//!
//! Recursive containers are decoded iteratively via an explicit stack so that
//! deeply nested lists (as seen in adversarial or fuzzed `.torrent` files)
//! cannot blow the call stack.

use crate::error::{DecodeError, DecodeResult};
use crate::value::{Dict, Value};

const BEN_END: u8 = b'e';
const DICT_START: u8 = b'd';
const LIST_START: u8 = b'l';
const INT_START: u8 = b'i';
const BYTE_LEN_LOW: u8 = b'0';
const BYTE_LEN_HIGH: u8 = b'9';
const BYTE_LEN_END: u8 = b':';

/// An in-progress value on the decode stack: either a bare value (list/dict
/// element) or a dictionary entry still waiting to be inserted under its key.
enum Frame {
    Value(Value),
    Keyed(Vec<u8>, Value),
}

/// Decodes a single top-level bencode value. Trailing bytes after the value
/// are rejected.
pub fn decode(bytes: &[u8]) -> DecodeResult<Value> {
    let (value, end_pos) = decode_at(bytes, 0)?;

    if end_pos != bytes.len() {
        return Err(DecodeError::TrailingBytes { len: bytes.len() - end_pos });
    }

    Ok(value)
}

/// Decodes a single bencode value starting at `pos`, returning the value and
/// the position immediately following it. Unlike [`decode`], trailing bytes
/// are permitted (used to find the raw sub-slice of the `info` dictionary).
pub fn decode_at(bytes: &[u8], pos: usize) -> DecodeResult<(Value, usize)> {
    let mut stack: Vec<Frame> = Vec::new();
    let (shallow, mut pos) = decode_shallow(bytes, pos)?;
    stack.push(Frame::Value(shallow));

    loop {
        let top = stack.pop().expect("bencode: stack unexpectedly empty");

        let is_container = matches!(
            top,
            Frame::Value(Value::List(_))
                | Frame::Value(Value::Dict(_))
                | Frame::Keyed(_, Value::List(_))
                | Frame::Keyed(_, Value::Dict(_))
        );

        if !is_container {
            // Scalar (int/bytes) frame: immediately collapse into its parent.
            if let Some(done) = collapse(&mut stack, top, pos)? {
                return Ok((done, pos));
            }
            continue;
        }

        let next_byte = peek(bytes, pos)?;
        if next_byte == BEN_END {
            pos += 1;
            if let Some(done) = collapse(&mut stack, top, pos)? {
                return Ok((done, pos));
            }
            continue;
        }

        match top {
            Frame::Value(Value::List(_)) | Frame::Keyed(_, Value::List(_)) => {
                stack.push(top);
                let (shallow, new_pos) = decode_shallow(bytes, pos)?;
                pos = new_pos;
                stack.push(Frame::Value(shallow));
            }
            Frame::Value(Value::Dict(_)) | Frame::Keyed(_, Value::Dict(_)) => {
                stack.push(top);
                let (key, new_pos) = decode_byte_string(bytes, pos)?;
                pos = new_pos;
                let (shallow, new_pos) = decode_shallow(bytes, pos)?;
                pos = new_pos;
                stack.push(Frame::Keyed(key.to_vec(), shallow));
            }
            _ => unreachable!(),
        }
    }
}

/// Collapses `child` into whatever frame is now on top of `stack`. Returns
/// the fully decoded value once the stack has been emptied.
fn collapse(stack: &mut Vec<Frame>, child: Frame, pos: usize) -> DecodeResult<Option<Value>> {
    let Some(parent) = stack.pop() else {
        return Ok(Some(match child {
            Frame::Value(v) => v,
            Frame::Keyed(..) => unreachable!("bencode: top-level value cannot be keyed"),
        }));
    };

    match parent {
        Frame::Value(Value::List(mut list)) => {
            let Frame::Value(v) = child else {
                unreachable!("bencode: dict entry cannot collapse into a list")
            };
            list.push(v);
            stack.push(Frame::Value(Value::List(list)));
        }
        Frame::Keyed(key, Value::List(mut list)) => {
            let Frame::Value(v) = child else {
                unreachable!("bencode: dict entry cannot collapse into a list")
            };
            list.push(v);
            stack.push(Frame::Keyed(key, Value::List(list)));
        }
        Frame::Value(Value::Dict(mut dict)) => {
            let Frame::Keyed(entry_key, v) = child else {
                unreachable!("bencode: bare value cannot collapse into a dict")
            };
            insert_ascending(&mut dict, entry_key, v, pos)?;
            stack.push(Frame::Value(Value::Dict(dict)));
        }
        Frame::Keyed(key, Value::Dict(mut dict)) => {
            let Frame::Keyed(entry_key, v) = child else {
                unreachable!("bencode: bare value cannot collapse into a dict")
            };
            insert_ascending(&mut dict, entry_key, v, pos)?;
            stack.push(Frame::Keyed(key, Value::Dict(dict)));
        }
        _ => unreachable!("bencode: cannot collapse into a scalar frame"),
    }

    Ok(None)
}

/// Inserts `key` into `dict`, rejecting keys that are out of ascending order
/// or that duplicate an existing entry. The wire format requires ascending
/// order on encode; rejecting it on decode catches corrupt or hand-crafted
/// files before they can silently change the info hash.
fn insert_ascending(dict: &mut Dict, key: Vec<u8>, value: Value, pos: usize) -> DecodeResult<()> {
    if let Some((last_key, _)) = dict.iter().next_back() {
        if key < *last_key {
            return Err(DecodeError::KeyNotAscending { pos });
        }
        if key == *last_key {
            return Err(DecodeError::DuplicateKey { pos });
        }
    }

    dict.insert(key, value);
    Ok(())
}

/// Decodes the next shallow bencode type. Any recursive types are
/// initialized empty; their terminating byte is consumed by the caller once
/// all entries have been decoded.
fn decode_shallow(bytes: &[u8], pos: usize) -> DecodeResult<(Value, usize)> {
    match peek(bytes, pos)? {
        INT_START => {
            let (n, pos) = decode_int(bytes, pos + 1, BEN_END)?;
            Ok((Value::Int(n), pos))
        }
        LIST_START => Ok((Value::List(Vec::new()), pos + 1)),
        DICT_START => Ok((Value::Dict(Dict::new()), pos + 1)),
        BYTE_LEN_LOW..=BYTE_LEN_HIGH => {
            let (bytes, pos) = decode_byte_string(bytes, pos)?;
            Ok((Value::Bytes(bytes.to_vec()), pos))
        }
        _ => Err(DecodeError::InvalidToken { pos }),
    }
}

/// Returns the parsed integer and the position of the byte following the
/// delimiter.
fn decode_int(bytes: &[u8], pos: usize, delim: u8) -> DecodeResult<(i64, usize)> {
    let remaining = &bytes[pos..];
    let rel_end = remaining
        .iter()
        .position(|&b| b == delim)
        .ok_or(DecodeError::UnterminatedInteger { pos })?;
    let digits = &remaining[..rel_end];

    if digits.len() > 1 {
        if digits[0] == b'-' && digits[1] == b'0' {
            return Err(DecodeError::IntegerNegativeZero { pos });
        }
        if digits[0] == b'0' {
            return Err(DecodeError::IntegerZeroPadding { pos });
        }
    }

    let as_str = std::str::from_utf8(digits).map_err(|_| DecodeError::InvalidInteger { pos })?;
    let n: i64 = as_str.parse().map_err(|_| DecodeError::InvalidInteger { pos })?;

    Ok((n, pos + rel_end + 1))
}

/// Decodes a `<len>:<bytes>` byte-string, returning a slice into `bytes`.
fn decode_byte_string(bytes: &[u8], pos: usize) -> DecodeResult<(&[u8], usize)> {
    let (len, start) = decode_int(bytes, pos, BYTE_LEN_END)?;

    if len < 0 {
        return Err(DecodeError::NegativeLength { pos });
    }
    let len = len as usize;

    if len > bytes.len() - start {
        return Err(DecodeError::LengthOverflow { pos });
    }

    let end = start + len;
    Ok((&bytes[start..end], end))
}

fn peek(bytes: &[u8], pos: usize) -> DecodeResult<u8> {
    bytes.get(pos).copied().ok_or(DecodeError::UnexpectedEof { pos })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_integers() {
        assert_eq!(decode(b"i500e").unwrap(), Value::Int(500));
        assert_eq!(decode(b"i-500e").unwrap(), Value::Int(-500));
        assert_eq!(decode(b"i0e").unwrap(), Value::Int(0));
    }

    #[test]
    fn decodes_byte_strings() {
        assert_eq!(decode(b"4:spam").unwrap(), Value::bytes(&b"spam"[..]));
        assert_eq!(decode(b"0:").unwrap(), Value::bytes(&b""[..]));
    }

    #[test]
    fn decodes_lists_and_dicts() {
        let value = decode(b"d4:spaml1:a1:bee").unwrap();
        let dict = value.as_dict().unwrap();
        let list = dict.get(b"spam".as_slice()).unwrap().as_list().unwrap();
        assert_eq!(list[0].as_str(), Some("a"));
        assert_eq!(list[1].as_str(), Some("b"));
    }

    #[test]
    fn rejects_unordered_keys() {
        assert!(matches!(
            decode(b"d5:z_key5:value5:a_key5:valuee"),
            Err(DecodeError::KeyNotAscending { .. })
        ));
    }

    #[test]
    fn rejects_duplicate_keys() {
        assert!(matches!(
            decode(b"d5:a_keyi0e5:a_key7:a_valuee"),
            Err(DecodeError::DuplicateKey { .. })
        ));
    }

    #[test]
    fn rejects_leading_zero_and_negative_zero() {
        assert!(matches!(
            decode(b"i0500e"),
            Err(DecodeError::IntegerZeroPadding { .. })
        ));
        assert!(matches!(
            decode(b"i-0e"),
            Err(DecodeError::IntegerNegativeZero { .. })
        ));
    }

    #[test]
    fn rejects_trailing_bytes() {
        assert!(matches!(
            decode(b"i5eextra"),
            Err(DecodeError::TrailingBytes { .. })
        ));
    }

    #[test]
    fn deep_nesting_does_not_overflow_the_stack() {
        let depth = 50_000;
        let mut bytes = vec![b'l'; depth];
        bytes.extend(vec![b'e'; depth]);

        decode(&bytes).expect("iterative decode must not recurse");
    }
}
