// Copyright 2026 the Candid Wire Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The Candid value model.
//!
//! Values mirror the type graph: arena nodes with integer handles, payload
//! bytes interned in the shared byte pool. Unbounded `nat` and `int` store
//! their raw LEB128 wire bytes so arbitrary-width integers round-trip
//! without a bignum representation.

use alloc::vec::Vec;

use crate::arena::{Arena, ByteRange, ValueId};
use crate::format::{write_sleb128_i64, write_uleb128_u64, Error};
use crate::hash::is_strictly_ascending;
use crate::types::Label;

/// The longest principal payload the wire format admits.
pub const PRINCIPAL_MAX_LEN: usize = 29;

/// One record field or variant payload: label plus value.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ValueField {
    pub label: Label,
    pub value: ValueId,
}

/// A single node of the value graph.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Value {
    Null,
    Reserved,
    Bool(bool),
    /// Unbounded natural; the range holds the raw ULEB128 bytes.
    Nat(ByteRange),
    /// Unbounded integer; the range holds the raw SLEB128 bytes.
    Int(ByteRange),
    Nat8(u8),
    Nat16(u16),
    Nat32(u32),
    Nat64(u64),
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Float32(f32),
    Float64(f64),
    /// UTF-8 text in the byte pool.
    Text(ByteRange),
    /// Raw bytes; serializes as `vec nat8`.
    Blob(ByteRange),
    /// Principal payload, at most [`PRINCIPAL_MAX_LEN`] bytes.
    Principal(ByteRange),
    Opt(Option<ValueId>),
    /// Vector elements, a range in the value-id pool.
    Vec(ByteRange),
    /// Record fields sorted by label hash, a range in the value-field pool.
    Record(ByteRange),
    /// One variant arm: the arm index in the sorted type plus its payload.
    Variant { index: u64, field: ValueField },
    /// A func reference: principal plus method name.
    FuncRef { principal: ByteRange, method: ByteRange },
    /// A service reference: principal only.
    ServiceRef(ByteRange),
}

impl Arena {
    /// Adds an unbounded nat value.
    pub fn val_nat(&mut self, value: u64) -> Result<ValueId, Error> {
        let mut buf = Vec::new();
        write_uleb128_u64(&mut buf, value);
        let range = self.intern_bytes(&buf)?;
        self.push_value(Value::Nat(range))
    }

    /// Adds an unbounded int value.
    pub fn val_int(&mut self, value: i64) -> Result<ValueId, Error> {
        let mut buf = Vec::new();
        write_sleb128_i64(&mut buf, value);
        let range = self.intern_bytes(&buf)?;
        self.push_value(Value::Int(range))
    }

    /// Adds a text value.
    pub fn val_text(&mut self, text: &str) -> Result<ValueId, Error> {
        let range = self.intern_str(text)?;
        self.push_value(Value::Text(range))
    }

    /// Adds a blob value.
    pub fn val_blob(&mut self, data: &[u8]) -> Result<ValueId, Error> {
        let range = self.intern_bytes(data)?;
        self.push_value(Value::Blob(range))
    }

    /// Adds a principal value. Payloads longer than [`PRINCIPAL_MAX_LEN`]
    /// bytes are rejected.
    pub fn val_principal(&mut self, payload: &[u8]) -> Result<ValueId, Error> {
        if payload.len() > PRINCIPAL_MAX_LEN {
            return Err(Error::InvalidArg);
        }
        let range = self.intern_bytes(payload)?;
        self.push_value(Value::Principal(range))
    }

    /// Adds an opt value.
    pub fn val_opt(&mut self, inner: Option<ValueId>) -> Result<ValueId, Error> {
        self.push_value(Value::Opt(inner))
    }

    /// Adds a vector value from its elements.
    pub fn val_vec(&mut self, elements: &[ValueId]) -> Result<ValueId, Error> {
        let range = self.intern_value_ids(elements)?;
        self.push_value(Value::Vec(range))
    }

    /// Adds a record value. Fields are sorted by label hash; duplicate
    /// hashes are rejected.
    pub fn val_record(&mut self, fields: &[ValueField]) -> Result<ValueId, Error> {
        let mut sorted: Vec<ValueField> = fields.to_vec();
        sorted.sort_unstable_by_key(|field| field.label.hash);
        let hashes: Vec<u32> = sorted.iter().map(|field| field.label.hash).collect();
        if !is_strictly_ascending(&hashes) {
            return Err(Error::InvalidArg);
        }
        let range = self.intern_value_fields(&sorted)?;
        self.push_value(Value::Record(range))
    }

    /// Adds a variant value carrying the chosen arm and its payload.
    pub fn val_variant(&mut self, index: u64, field: ValueField) -> Result<ValueId, Error> {
        self.push_value(Value::Variant { index, field })
    }

    /// Adds a func reference value.
    pub fn val_func(&mut self, principal: &[u8], method: &str) -> Result<ValueId, Error> {
        if principal.len() > PRINCIPAL_MAX_LEN {
            return Err(Error::InvalidArg);
        }
        let principal = self.intern_bytes(principal)?;
        let method = self.intern_str(method)?;
        self.push_value(Value::FuncRef { principal, method })
    }

    /// Adds a service reference value.
    pub fn val_service(&mut self, principal: &[u8]) -> Result<ValueId, Error> {
        if principal.len() > PRINCIPAL_MAX_LEN {
            return Err(Error::InvalidArg);
        }
        let range = self.intern_bytes(principal)?;
        self.push_value(Value::ServiceRef(range))
    }
}
