//! Attribute value codec
//!
//! Encoding and decoding of record payloads.
//!
//! ## Payload Format
//! ```text
//! ┌──────────────────┬─────────────────────────────────────┐
//! │ Timestamp (8)    │ Tagged value                        │
//! │ i64 BE, unix ns  │ Tag (1) + variant payload           │
//! └──────────────────┴─────────────────────────────────────┘
//! ```
//!
//! ### Variant Payloads
//! - 's' String / 'n' Number: len (1) + bytes
//! - 'S' StringSet / 'N' NumberSet: count (1) + count × (len (1) + bytes)
//! - 'b' Bytes: len (1) + bytes
//! - 'B' BytesSet: count (1) + count × (len (1) + bytes)
//! - 'o' Bool / 'u' Null: '1' or '0'
//! - 'l' List: count (1) + count × tagged value
//! - 'm' Map: count (1) + count × (len (1) + key + tagged value)

use std::io::{Read, Write};

use crate::error::{Result, ShardError};

use super::value::{AttributeMap, AttributeValue};

// =============================================================================
// Type Tags
// =============================================================================

pub const TAG_STRING: u8 = b's';
pub const TAG_STRING_SET: u8 = b'S';
pub const TAG_NUMBER: u8 = b'n';
pub const TAG_NUMBER_SET: u8 = b'N';
pub const TAG_BYTES: u8 = b'b';
pub const TAG_BYTES_SET: u8 = b'B';
pub const TAG_BOOL: u8 = b'o';
pub const TAG_NULL: u8 = b'u';
pub const TAG_LIST: u8 = b'l';
pub const TAG_MAP: u8 = b'm';

/// Timestamp prefix width
pub const TIMESTAMP_SIZE: usize = 8;

/// Largest value a length byte can carry
pub const MAX_LEN: usize = u8::MAX as usize;

// =============================================================================
// Encoding
// =============================================================================

/// Encode a value and its timestamp
///
/// Format: timestamp (8) + tagged value
pub fn encode<W: Write>(value: &AttributeValue, unix_nano: i64, writer: &mut W) -> Result<()> {
    writer.write_all(&unix_nano.to_be_bytes())?;
    encode_value(value, writer)
}

/// Encode an attribute map as a Map value, without cloning it
pub fn encode_map<W: Write>(map: &AttributeMap, unix_nano: i64, writer: &mut W) -> Result<()> {
    writer.write_all(&unix_nano.to_be_bytes())?;
    writer.write_all(&[TAG_MAP])?;
    write_map(map, writer)
}

/// Encode a single tagged value (no timestamp)
pub fn encode_value<W: Write>(value: &AttributeValue, writer: &mut W) -> Result<()> {
    match value {
        AttributeValue::String(s) => {
            writer.write_all(&[TAG_STRING])?;
            write_bytes(s.as_bytes(), "string", writer)
        }
        AttributeValue::StringSet(set) => {
            writer.write_all(&[TAG_STRING_SET])?;
            write_count(set.len(), "string set", writer)?;
            for s in set {
                write_bytes(s.as_bytes(), "string", writer)?;
            }
            Ok(())
        }
        AttributeValue::Number(n) => {
            writer.write_all(&[TAG_NUMBER])?;
            write_bytes(n.as_bytes(), "number", writer)
        }
        AttributeValue::NumberSet(set) => {
            writer.write_all(&[TAG_NUMBER_SET])?;
            write_count(set.len(), "number set", writer)?;
            for n in set {
                write_bytes(n.as_bytes(), "number", writer)?;
            }
            Ok(())
        }
        AttributeValue::Bytes(b) => {
            writer.write_all(&[TAG_BYTES])?;
            write_bytes(b, "bytes", writer)
        }
        AttributeValue::BytesSet(set) => {
            writer.write_all(&[TAG_BYTES_SET])?;
            write_count(set.len(), "bytes set", writer)?;
            for b in set {
                write_bytes(b, "bytes", writer)?;
            }
            Ok(())
        }
        AttributeValue::Bool(b) => {
            writer.write_all(&[TAG_BOOL])?;
            write_flag(*b, writer)
        }
        AttributeValue::Null => {
            writer.write_all(&[TAG_NULL])?;
            write_flag(true, writer)
        }
        AttributeValue::List(items) => {
            writer.write_all(&[TAG_LIST])?;
            write_count(items.len(), "list", writer)?;
            for item in items {
                encode_value(item, writer)?;
            }
            Ok(())
        }
        AttributeValue::Map(map) => {
            writer.write_all(&[TAG_MAP])?;
            write_map(map, writer)
        }
    }
}

/// Encode a value and timestamp into a fresh buffer
pub fn encode_to_vec(value: &AttributeValue, unix_nano: i64) -> Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(TIMESTAMP_SIZE + 16);
    encode(value, unix_nano, &mut buf)?;
    Ok(buf)
}

fn write_map<W: Write>(map: &AttributeMap, writer: &mut W) -> Result<()> {
    write_count(map.len(), "map", writer)?;
    for (name, value) in map {
        write_bytes(name.as_bytes(), "map key", writer)?;
        encode_value(value, writer)?;
    }
    Ok(())
}

fn write_count<W: Write>(len: usize, what: &'static str, writer: &mut W) -> Result<()> {
    if len > MAX_LEN {
        return Err(ShardError::LengthOverflow { what, len });
    }
    writer.write_all(&[len as u8])?;
    Ok(())
}

fn write_bytes<W: Write>(bytes: &[u8], what: &'static str, writer: &mut W) -> Result<()> {
    write_count(bytes.len(), what, writer)?;
    writer.write_all(bytes)?;
    Ok(())
}

fn write_flag<W: Write>(flag: bool, writer: &mut W) -> Result<()> {
    writer.write_all(&[if flag { b'1' } else { b'0' }])?;
    Ok(())
}

// =============================================================================
// Decoding
// =============================================================================

/// Decode a value and its timestamp
///
/// Returns the value and the unix-nanosecond timestamp
pub fn decode<R: Read>(reader: &mut R) -> Result<(AttributeValue, i64)> {
    let mut ts = [0u8; TIMESTAMP_SIZE];
    reader.read_exact(&mut ts)?;
    let value = decode_value(reader)?;
    Ok((value, i64::from_be_bytes(ts)))
}

/// Decode a single tagged value (no timestamp)
pub fn decode_value<R: Read>(reader: &mut R) -> Result<AttributeValue> {
    let tag = read_u8(reader)?;

    match tag {
        TAG_STRING => Ok(AttributeValue::String(read_string(reader)?)),
        TAG_STRING_SET => Ok(AttributeValue::StringSet(read_string_set(reader)?)),
        TAG_NUMBER => Ok(AttributeValue::Number(read_string(reader)?)),
        TAG_NUMBER_SET => Ok(AttributeValue::NumberSet(read_string_set(reader)?)),
        TAG_BYTES => Ok(AttributeValue::Bytes(read_bytes(reader)?)),
        TAG_BYTES_SET => {
            let count = read_u8(reader)? as usize;
            let mut set = Vec::with_capacity(count);
            for _ in 0..count {
                set.push(read_bytes(reader)?);
            }
            Ok(AttributeValue::BytesSet(set))
        }
        TAG_BOOL => Ok(AttributeValue::Bool(read_u8(reader)? == b'1')),
        TAG_NULL => {
            read_u8(reader)?;
            Ok(AttributeValue::Null)
        }
        TAG_LIST => {
            let count = read_u8(reader)? as usize;
            let mut items = Vec::with_capacity(count);
            for _ in 0..count {
                items.push(decode_value(reader)?);
            }
            Ok(AttributeValue::List(items))
        }
        TAG_MAP => {
            let count = read_u8(reader)? as usize;
            let mut map = AttributeMap::new();
            for _ in 0..count {
                let name = read_string(reader)?;
                let value = decode_value(reader)?;
                map.insert(name, value);
            }
            Ok(AttributeValue::Map(map))
        }
        other => Err(ShardError::UnknownTypeTag(other)),
    }
}

/// Decode a value and timestamp from a byte slice
pub fn decode_from_slice(mut data: &[u8]) -> Result<(AttributeValue, i64)> {
    decode(&mut data)
}

fn read_u8<R: Read>(reader: &mut R) -> Result<u8> {
    let mut byte = [0u8; 1];
    reader.read_exact(&mut byte)?;
    Ok(byte[0])
}

fn read_bytes<R: Read>(reader: &mut R) -> Result<Vec<u8>> {
    let len = read_u8(reader)? as usize;
    let mut bytes = vec![0u8; len];
    reader.read_exact(&mut bytes)?;
    Ok(bytes)
}

fn read_string<R: Read>(reader: &mut R) -> Result<String> {
    let bytes = read_bytes(reader)?;
    String::from_utf8(bytes).map_err(|e| ShardError::Codec(format!("invalid UTF-8: {}", e)))
}

fn read_string_set<R: Read>(reader: &mut R) -> Result<Vec<String>> {
    let count = read_u8(reader)? as usize;
    let mut set = Vec::with_capacity(count);
    for _ in 0..count {
        set.push(read_string(reader)?);
    }
    Ok(set)
}
