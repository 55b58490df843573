//! Fixed-width binary field decoding.
//!
//! ## Record Format
//!
//! NTv2 headers are sequences of 16-byte records:
//!
//! | Field | Size (bytes) | Description                                        |
//! |-------|--------------|----------------------------------------------------|
//! | label | 8            | ASCII record code, e.g. `SUB_NAME`, `S_LAT`        |
//! | value | 8            | string, IEEE-754 double, or 32-bit int + 4 padding |
//!
//! Node records are four consecutive IEEE-754 32-bit floats. Every numeric
//! field in a file shares one byte order.

use crate::{GridError, Result};
use serde::{Deserialize, Serialize};
use std::io::{ErrorKind, Read};

/// Size of one header record (label + value).
pub const RECORD_SIZE: usize = 16;

/// Number of records in a sub-grid header (and in the overview header).
pub const HEADER_RECORDS: usize = 11;

/// Size of a complete sub-grid header.
pub const HEADER_SIZE: usize = RECORD_SIZE * HEADER_RECORDS;

/// Size of one node record: lat shift, lon shift, lat accuracy, lon accuracy.
pub const NODE_SIZE: usize = 16;

/// Byte order of the numeric fields in a grid file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ByteOrder {
    /// Most significant byte first.
    Big,
    /// Least significant byte first.
    Little,
}

impl ByteOrder {
    /// Decode a two's-complement 32-bit integer.
    pub fn i32(self, bytes: [u8; 4]) -> i32 {
        match self {
            ByteOrder::Big => i32::from_be_bytes(bytes),
            ByteOrder::Little => i32::from_le_bytes(bytes),
        }
    }

    /// Decode an IEEE-754 single precision float.
    pub fn f32(self, bytes: [u8; 4]) -> f32 {
        match self {
            ByteOrder::Big => f32::from_be_bytes(bytes),
            ByteOrder::Little => f32::from_le_bytes(bytes),
        }
    }

    /// Decode an IEEE-754 double precision float.
    pub fn f64(self, bytes: [u8; 8]) -> f64 {
        match self {
            ByteOrder::Big => f64::from_be_bytes(bytes),
            ByteOrder::Little => f64::from_le_bytes(bytes),
        }
    }

    /// Decode the integer stored in the leading four bytes of a record value.
    pub fn record_i32(self, value: [u8; 8]) -> i32 {
        self.i32([value[0], value[1], value[2], value[3]])
    }
}

/// Decode a text field, trimming trailing whitespace and NUL padding.
pub fn decode_string(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes)
        .trim_end_matches(|c: char| c.is_whitespace() || c == '\0')
        .to_string()
}

/// Decode a text field verbatim (lossy UTF-8, no trimming).
pub fn decode_raw_string(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

/// Sequential reader over fixed-size records that tracks its byte offset.
///
/// Short reads are reported as [`GridError::Truncated`] with the offset of
/// the record being decoded; no partial value is ever returned.
#[derive(Debug)]
pub struct RecordReader<R> {
    inner: R,
    offset: u64,
    byte_order: ByteOrder,
}

impl<R: Read> RecordReader<R> {
    /// Wrap a reader positioned at `offset` within the grid file.
    pub fn new(inner: R, offset: u64, byte_order: ByteOrder) -> Self {
        Self {
            inner,
            offset,
            byte_order,
        }
    }

    /// Byte order used for numeric fields.
    pub fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    /// Offset of the next unread byte.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Read exactly `N` bytes.
    pub fn read_array<const N: usize>(&mut self, context: &'static str) -> Result<[u8; N]> {
        let mut buf = [0u8; N];
        match self.inner.read_exact(&mut buf) {
            Ok(()) => {
                self.offset += N as u64;
                Ok(buf)
            }
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => Err(GridError::Truncated {
                offset: self.offset,
                needed: N,
                context,
            }),
            Err(e) => Err(e.into()),
        }
    }

    /// Read one header record and return its 8-byte value, discarding the label.
    pub fn record_value(&mut self, context: &'static str) -> Result<[u8; 8]> {
        let record: [u8; RECORD_SIZE] = self.read_array(context)?;
        let mut value = [0u8; 8];
        value.copy_from_slice(&record[8..]);
        Ok(value)
    }

    /// Read a trimmed string record.
    pub fn string_record(&mut self, context: &'static str) -> Result<String> {
        Ok(decode_string(&self.record_value(context)?))
    }

    /// Read an untrimmed string record.
    pub fn raw_string_record(&mut self, context: &'static str) -> Result<String> {
        Ok(decode_raw_string(&self.record_value(context)?))
    }

    /// Read a double record.
    pub fn f64_record(&mut self, context: &'static str) -> Result<f64> {
        let value = self.record_value(context)?;
        Ok(self.byte_order.f64(value))
    }

    /// Read an integer record.
    pub fn i32_record(&mut self, context: &'static str) -> Result<i32> {
        let value = self.record_value(context)?;
        Ok(self.byte_order.record_i32(value))
    }

    /// Read one node record as `[lat_shift, lon_shift, lat_accuracy, lon_accuracy]`.
    pub fn node_record(&mut self) -> Result<[f32; 4]> {
        let bytes: [u8; NODE_SIZE] = self.read_array("node record")?;
        Ok(decode_node(&bytes, self.byte_order))
    }

    /// Release the wrapped reader.
    pub fn into_inner(self) -> R {
        self.inner
    }
}

/// Split a 16-byte node record into its four float fields, in file order.
pub fn decode_node(bytes: &[u8; NODE_SIZE], byte_order: ByteOrder) -> [f32; 4] {
    let mut fields = [0f32; 4];
    for (field, chunk) in fields.iter_mut().zip(bytes.chunks_exact(4)) {
        *field = byte_order.f32([chunk[0], chunk[1], chunk[2], chunk[3]]);
    }
    fields
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_decoding_respects_byte_order() {
        assert_eq!(ByteOrder::Big.i32([0, 0, 0, 11]), 11);
        assert_eq!(ByteOrder::Little.i32([11, 0, 0, 0]), 11);
        assert_eq!(ByteOrder::Little.i32([0xFF, 0xFF, 0xFF, 0xFF]), -1);

        assert_eq!(ByteOrder::Big.f32(1.5f32.to_be_bytes()), 1.5);
        assert_eq!(ByteOrder::Little.f32((-0.25f32).to_le_bytes()), -0.25);
        assert_eq!(ByteOrder::Big.f64(180000.0f64.to_be_bytes()), 180000.0);
        assert_eq!(ByteOrder::Little.f64(30.0f64.to_le_bytes()), 30.0);
    }

    #[test]
    fn test_record_int_uses_leading_bytes() {
        let mut value = [0u8; 8];
        value[..4].copy_from_slice(&1681i32.to_le_bytes());
        assert_eq!(ByteOrder::Little.record_i32(value), 1681);

        value[..4].copy_from_slice(&1681i32.to_be_bytes());
        assert_eq!(ByteOrder::Big.record_i32(value), 1681);
    }

    #[test]
    fn test_decode_string_trims_padding() {
        assert_eq!(decode_string(b"ALbanff "), "ALbanff");
        assert_eq!(decode_string(b"NONE    "), "NONE");
        assert_eq!(decode_string(b"AB\0\0\0\0\0\0"), "AB");
        assert_eq!(decode_raw_string(b"19990101"), "19990101");
    }

    #[test]
    fn test_record_reader_reads_values_and_tracks_offset() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(b"SUB_NAME");
        bytes.extend_from_slice(b"CANADA  ");
        bytes.extend_from_slice(b"S_LAT   ");
        bytes.extend_from_slice(&144000.0f64.to_be_bytes());

        let mut reader = RecordReader::new(bytes.as_slice(), 0, ByteOrder::Big);
        assert_eq!(reader.string_record("name").unwrap(), "CANADA");
        assert_eq!(reader.f64_record("min lat").unwrap(), 144000.0);
        assert_eq!(reader.offset(), 32);
    }

    #[test]
    fn test_record_reader_reports_truncation() {
        let bytes = [0u8; 20];
        let mut reader = RecordReader::new(&bytes[..], 176, ByteOrder::Little);
        reader.record_value("first").unwrap();

        match reader.record_value("second") {
            Err(GridError::Truncated {
                offset,
                needed,
                context,
            }) => {
                assert_eq!(offset, 192);
                assert_eq!(needed, RECORD_SIZE);
                assert_eq!(context, "second");
            }
            other => panic!("expected truncation, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_node_field_order() {
        let mut bytes = [0u8; NODE_SIZE];
        for (i, v) in [1.0f32, 2.0, 3.0, 4.0].iter().enumerate() {
            bytes[i * 4..i * 4 + 4].copy_from_slice(&v.to_le_bytes());
        }
        assert_eq!(decode_node(&bytes, ByteOrder::Little), [1.0, 2.0, 3.0, 4.0]);
    }
}
