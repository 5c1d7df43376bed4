// Copyright 2026 the Candid Wire Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Encoding/decoding primitives for the Candid wire format.

mod leb128;

pub use leb128::{read_sleb128_i64, read_uleb128_u64, write_sleb128_i64, write_uleb128_u64};

use alloc::vec::Vec;
use core::fmt;

/// The uniform status taxonomy threaded through every codec operation.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Error {
    /// An arena limit or decoding quota was exhausted.
    Alloc,
    /// Input ended before the value was complete.
    Truncated,
    /// A LEB128 encoding exceeds its 64-bit target width.
    Overflow,
    /// Structural mismatch: bad magic, duplicate or unsorted label, shape
    /// mismatch between a type and a value, or an out-of-range index.
    InvalidArg,
    /// A constructor this decoder does not implement.
    Unsupported,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Alloc => write!(f, "allocation limit exhausted"),
            Self::Truncated => write!(f, "unexpected end of input"),
            Self::Overflow => write!(f, "integer encoding overflows target width"),
            Self::InvalidArg => write!(f, "invalid structure"),
            Self::Unsupported => write!(f, "unsupported constructor"),
        }
    }
}

impl core::error::Error for Error {}

/// A bounds-checked byte reader with a single forward cursor.
///
/// The deserializer never rewinds; restarting requires a fresh reader over
/// the buffer start.
#[derive(Clone, Debug)]
pub struct Reader<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> Reader<'a> {
    /// Creates a reader over `bytes`.
    #[must_use]
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, offset: 0 }
    }

    /// Returns the current cursor offset.
    #[must_use]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Returns the number of bytes left after the cursor.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.offset
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], Error> {
        let end = self.offset.checked_add(len).ok_or(Error::Truncated)?;
        let slice = self.bytes.get(self.offset..end).ok_or(Error::Truncated)?;
        self.offset = end;
        Ok(slice)
    }

    /// Reads a `u8`.
    pub fn read_u8(&mut self) -> Result<u8, Error> {
        Ok(self.take(1)?[0])
    }

    /// Reads a little-endian `u16`.
    pub fn read_u16_le(&mut self) -> Result<u16, Error> {
        let b = self.take(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    /// Reads a little-endian `u32`.
    pub fn read_u32_le(&mut self) -> Result<u32, Error> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    /// Reads a little-endian `u64`.
    pub fn read_u64_le(&mut self) -> Result<u64, Error> {
        let b = self.take(8)?;
        Ok(u64::from_le_bytes([
            b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7],
        ]))
    }

    /// Reads an unsigned LEB128 integer as `u64`.
    pub fn read_uleb128_u64(&mut self) -> Result<u64, Error> {
        read_uleb128_u64(self.bytes, &mut self.offset)
    }

    /// Reads a signed LEB128 integer as `i64`.
    pub fn read_sleb128_i64(&mut self) -> Result<i64, Error> {
        read_sleb128_i64(self.bytes, &mut self.offset)
    }

    /// Reads one LEB128-encoded integer of arbitrary width and returns its
    /// raw bytes without decoding the magnitude.
    ///
    /// Only the chunk structure is checked; unbounded `nat` and `int`
    /// values keep these bytes verbatim.
    pub fn read_leb128_raw(&mut self) -> Result<&'a [u8], Error> {
        let start = self.offset;
        loop {
            let byte = self.read_u8()?;
            if byte & 0x80 == 0 {
                break;
            }
        }
        Ok(&self.bytes[start..self.offset])
    }

    /// Reads `len` raw bytes.
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], Error> {
        self.take(len)
    }

    /// Reads `len` bytes and validates UTF-8.
    pub fn read_str(&mut self, len: usize) -> Result<&'a str, Error> {
        let b = self.take(len)?;
        core::str::from_utf8(b).map_err(|_| Error::InvalidArg)
    }
}

/// A growable byte sink for the encode path.
#[derive(Clone, Debug, Default)]
pub struct Writer {
    bytes: Vec<u8>,
}

impl Writer {
    /// Creates an empty writer.
    #[must_use]
    pub fn new() -> Self {
        Self { bytes: Vec::new() }
    }

    /// Returns a reference to the written bytes.
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    /// Returns the number of bytes written so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns `true` if nothing has been written yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Consumes the writer and returns the underlying byte buffer.
    #[must_use]
    pub fn into_vec(self) -> Vec<u8> {
        self.bytes
    }

    /// Appends a `u8`.
    pub fn write_u8(&mut self, v: u8) {
        self.bytes.push(v);
    }

    /// Appends a little-endian `u16`.
    pub fn write_u16_le(&mut self, v: u16) {
        self.bytes.extend_from_slice(&v.to_le_bytes());
    }

    /// Appends a little-endian `u32`.
    pub fn write_u32_le(&mut self, v: u32) {
        self.bytes.extend_from_slice(&v.to_le_bytes());
    }

    /// Appends a little-endian `u64`.
    pub fn write_u64_le(&mut self, v: u64) {
        self.bytes.extend_from_slice(&v.to_le_bytes());
    }

    /// Appends an unsigned LEB128 integer (`u64`).
    pub fn write_uleb128_u64(&mut self, v: u64) {
        write_uleb128_u64(&mut self.bytes, v);
    }

    /// Appends an unsigned LEB128 integer (`u32`).
    #[inline(always)]
    pub fn write_uleb128_u32(&mut self, v: u32) {
        self.write_uleb128_u64(u64::from(v));
    }

    /// Appends a signed LEB128 integer (`i64`).
    pub fn write_sleb128_i64(&mut self, v: i64) {
        write_sleb128_i64(&mut self.bytes, v);
    }

    /// Appends raw bytes.
    pub fn write_bytes(&mut self, b: &[u8]) {
        self.bytes.extend_from_slice(b);
    }
}
