//! Canonical bencode encoder.
//!
//! Dictionary keys are emitted in ascending byte order because `Dict` is a
//! `BTreeMap<Vec<u8>, Value>`, which already iterates that way. There is
//! nothing else for the encoder to sort: this is what keeps the encoding
//! deterministic and the info hash stable across a load/save round trip.

use crate::value::Value;

const INT_START: u8 = b'i';
const LIST_START: u8 = b'l';
const DICT_START: u8 = b'd';
const BEN_END: u8 = b'e';
const BYTE_LEN_END: u8 = b':';

pub fn encode(value: &Value) -> Vec<u8> {
    let mut out = Vec::new();
    encode_into(value, &mut out);
    out
}

fn encode_into(value: &Value, out: &mut Vec<u8>) {
    match value {
        Value::Int(n) => encode_int(*n, out),
        Value::Bytes(b) => encode_bytes(b, out),
        Value::List(list) => {
            out.push(LIST_START);
            for item in list {
                encode_into(item, out);
            }
            out.push(BEN_END);
        }
        Value::Dict(dict) => {
            out.push(DICT_START);
            for (key, value) in dict.iter() {
                encode_bytes(key, out);
                encode_into(value, out);
            }
            out.push(BEN_END);
        }
    }
}

fn encode_int(n: i64, out: &mut Vec<u8>) {
    out.push(INT_START);
    out.extend(n.to_string().into_bytes());
    out.push(BEN_END);
}

fn encode_bytes(bytes: &[u8], out: &mut Vec<u8>) {
    out.extend(bytes.len().to_string().into_bytes());
    out.push(BYTE_LEN_END);
    out.extend_from_slice(bytes);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::decode;

    #[test]
    fn round_trips_through_decode() {
        let mut dict = crate::value::Dict::new();
        dict.insert(b"z".to_vec(), Value::Int(1));
        dict.insert(b"a".to_vec(), Value::bytes(&b"hi"[..]));
        let value = Value::Dict(dict);

        let bytes = encode(&value);
        // keys must come out sorted regardless of insertion order
        assert_eq!(bytes, b"d1:a2:hi1:zi1ee");

        let decoded = decode(&bytes).unwrap();
        assert_eq!(decoded, value);
    }

    #[test]
    fn encodes_shortest_form_integers() {
        assert_eq!(encode(&Value::Int(0)), b"i0e");
        assert_eq!(encode(&Value::Int(-5)), b"i-5e");
    }
}
