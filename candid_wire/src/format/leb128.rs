// Copyright 2026 the Candid Wire Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! LEB128 variable-length integer encoding.
//!
//! Candid uses unsigned LEB128 for lengths, counts, and field-label hashes,
//! and signed LEB128 for type-table tags and indices. Encoding is canonical:
//! zero encodes as a single `0x00` byte and no padding continuation bytes are
//! emitted. Decoding rejects encodings longer than 10 bytes and encodings
//! whose final byte carries bits that would not fit the 64-bit target.

use alloc::vec::Vec;

use crate::format::Error;

const CONTINUATION: u8 = 0x80;
const SIGN_BIT: u8 = 0x40;

/// Appends the unsigned LEB128 encoding of `value` to `out`.
pub fn write_uleb128_u64(out: &mut Vec<u8>, mut value: u64) {
    loop {
        let mut byte = (value & 0x7f) as u8;
        value >>= 7;
        if value != 0 {
            byte |= CONTINUATION;
        }
        out.push(byte);
        if value == 0 {
            break;
        }
    }
}

/// Appends the signed LEB128 encoding of `value` to `out`.
pub fn write_sleb128_i64(out: &mut Vec<u8>, mut value: i64) {
    loop {
        let byte = (value & 0x7f) as u8;
        value >>= 7;
        let sign_clear = byte & SIGN_BIT == 0;
        if (value == 0 && sign_clear) || (value == -1 && !sign_clear) {
            out.push(byte);
            break;
        }
        out.push(byte | CONTINUATION);
    }
}

/// Reads an unsigned LEB128 `u64` from `bytes` starting at `*offset`.
///
/// On success the offset is advanced past the encoding. Returns
/// [`Error::Truncated`] if the input ends before a terminating byte and
/// [`Error::Overflow`] if the value does not fit in 64 bits.
pub fn read_uleb128_u64(bytes: &[u8], offset: &mut usize) -> Result<u64, Error> {
    let mut result: u64 = 0;
    let mut shift: u32 = 0;
    loop {
        let byte = *bytes.get(*offset).ok_or(Error::Truncated)?;
        *offset += 1;
        let chunk = u64::from(byte & 0x7f);
        // The 10th byte holds bit 63 only; an 11th byte never fits.
        if shift > 63 || (shift == 63 && chunk > 1) {
            return Err(Error::Overflow);
        }
        result |= chunk << shift;
        if byte & CONTINUATION == 0 {
            return Ok(result);
        }
        shift += 7;
    }
}

/// Reads a signed LEB128 `i64` from `bytes` starting at `*offset`.
///
/// Fails with [`Error::Truncated`] on a missing terminator and
/// [`Error::Overflow`] when the decoded value falls outside the `i64` range.
pub fn read_sleb128_i64(bytes: &[u8], offset: &mut usize) -> Result<i64, Error> {
    let mut result: i128 = 0;
    let mut shift: u32 = 0;
    loop {
        let byte = *bytes.get(*offset).ok_or(Error::Truncated)?;
        *offset += 1;
        if shift >= 70 {
            return Err(Error::Overflow);
        }
        result |= i128::from(byte & 0x7f) << shift;
        shift += 7;
        if byte & CONTINUATION == 0 {
            if byte & SIGN_BIT != 0 {
                result |= -(1i128 << shift);
            }
            return i64::try_from(result).map_err(|_| Error::Overflow);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    fn uleb(v: u64) -> Vec<u8> {
        let mut out = Vec::new();
        write_uleb128_u64(&mut out, v);
        out
    }

    fn sleb(v: i64) -> Vec<u8> {
        let mut out = Vec::new();
        write_sleb128_i64(&mut out, v);
        out
    }

    #[test]
    fn uleb_canonical_zero() {
        assert_eq!(uleb(0), vec![0x00]);
    }

    #[test]
    fn uleb_known_values() {
        assert_eq!(uleb(1), vec![0x01]);
        assert_eq!(uleb(127), vec![0x7f]);
        assert_eq!(uleb(128), vec![0x80, 0x01]);
        assert_eq!(uleb(624485), vec![0xe5, 0x8e, 0x26]);
        assert_eq!(uleb(u64::MAX).len(), 10);
    }

    #[test]
    fn sleb_known_values() {
        assert_eq!(sleb(0), vec![0x00]);
        assert_eq!(sleb(-1), vec![0x7f]);
        assert_eq!(sleb(63), vec![0x3f]);
        assert_eq!(sleb(64), vec![0xc0, 0x00]);
        assert_eq!(sleb(-64), vec![0x40]);
        assert_eq!(sleb(-65), vec![0xbf, 0x7f]);
        assert_eq!(sleb(-123456), vec![0xc0, 0xbb, 0x78]);
    }

    #[test]
    fn uleb_roundtrip_extremes() {
        for v in [0, 1, 127, 128, 300, u64::from(u32::MAX), u64::MAX] {
            let bytes = uleb(v);
            let mut off = 0;
            assert_eq!(read_uleb128_u64(&bytes, &mut off), Ok(v));
            assert_eq!(off, bytes.len());
        }
    }

    #[test]
    fn sleb_roundtrip_extremes() {
        for v in [0, 1, -1, 63, -64, 64, -65, i64::MAX, i64::MIN] {
            let bytes = sleb(v);
            let mut off = 0;
            assert_eq!(read_sleb128_i64(&bytes, &mut off), Ok(v));
            assert_eq!(off, bytes.len());
        }
    }

    #[test]
    fn uleb_truncated() {
        let mut off = 0;
        assert_eq!(
            read_uleb128_u64(&[0x80, 0x80], &mut off),
            Err(Error::Truncated)
        );
        let mut off = 0;
        assert_eq!(read_uleb128_u64(&[], &mut off), Err(Error::Truncated));
    }

    #[test]
    fn uleb_overflow_eleven_bytes() {
        let bytes = [0x80u8, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x01];
        let mut off = 0;
        assert_eq!(read_uleb128_u64(&bytes, &mut off), Err(Error::Overflow));
    }

    #[test]
    fn uleb_overflow_final_byte_bits() {
        // 10th byte may only carry bit 63.
        let bytes = [0xffu8, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0x02];
        let mut off = 0;
        assert_eq!(read_uleb128_u64(&bytes, &mut off), Err(Error::Overflow));
    }

    #[test]
    fn sleb_overflow_out_of_range() {
        // 2^63 does not fit i64.
        let bytes = [0x80u8, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x01];
        let mut off = 0;
        assert_eq!(read_sleb128_i64(&bytes, &mut off), Err(Error::Overflow));
    }

    #[test]
    fn sleb_truncated() {
        let mut off = 0;
        assert_eq!(read_sleb128_i64(&[0xc0], &mut off), Err(Error::Truncated));
    }
}
