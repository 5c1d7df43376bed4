// Copyright 2026 the Candid Wire Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Streaming message deserialization.
//!
//! [`Deserializer::new`] parses the header eagerly: magic, type table, and
//! argument reference list. Table slots are pre-allocated as `reserved`
//! placeholders and patched as their entries parse, so forward and
//! self-references resolve to plain arena indices. Argument values are then
//! pulled one at a time with [`Deserializer::next`]; the cursor position is
//! observable at every step.
//!
//! Every length read from the wire is checked against the bytes actually
//! remaining before anything is allocated for it.

use alloc::vec::Vec;

use crate::arena::{Arena, TypeId, ValueId};
use crate::format::{Error, Reader};
use crate::subtype::is_subtype;
use crate::types::{opcode, FuncMode, FuncType, Method, Type, TypeEnv, TypeField};
use crate::value::{Value, ValueField, PRINCIPAL_MAX_LEN};
use crate::{MAGIC, MAX_DEPTH};

/// Decode-side resource limits.
#[derive(Copy, Clone, Debug, Default)]
pub struct DecoderConfig {
    /// Upper bound on decoding work, in abstract cost units: four units per
    /// decoded node plus one per payload byte, with the header charged at
    /// four units per byte. `None` means unlimited.
    pub decoding_quota: Option<u64>,
}

/// Pull-based decoder for one message.
#[derive(Debug)]
pub struct Deserializer<'a, 'b> {
    reader: Reader<'a>,
    arena: &'b mut Arena,
    args: Vec<TypeId>,
    arg_index: usize,
    quota: Option<u64>,
}

impl<'a, 'b> Deserializer<'a, 'b> {
    /// Parses the header of `bytes` with no quota.
    pub fn new(arena: &'b mut Arena, bytes: &'a [u8]) -> Result<Self, Error> {
        Self::with_config(arena, bytes, DecoderConfig::default())
    }

    /// Parses the header of `bytes` under `config`.
    pub fn with_config(
        arena: &'b mut Arena,
        bytes: &'a [u8],
        config: DecoderConfig,
    ) -> Result<Self, Error> {
        let mut de = Self {
            reader: Reader::new(bytes),
            arena,
            args: Vec::new(),
            arg_index: 0,
            quota: config.decoding_quota,
        };
        de.parse_header()?;
        Ok(de)
    }

    /// The types of all arguments, in order.
    #[must_use]
    pub fn arg_types(&self) -> &[TypeId] {
        &self.args
    }

    /// The arena holding decoded types and values.
    #[must_use]
    pub fn arena(&self) -> &Arena {
        self.arena
    }

    /// Current cursor offset into the input.
    #[must_use]
    pub fn offset(&self) -> usize {
        self.reader.offset()
    }

    /// Bytes left after the cursor.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.reader.remaining()
    }

    /// Whether every argument has been consumed.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.arg_index == self.args.len()
    }

    /// The wire type of the next argument, if any remain.
    #[must_use]
    pub fn peek_type(&self) -> Option<TypeId> {
        self.args.get(self.arg_index).copied()
    }

    /// Decodes the next argument and returns its wire type and value.
    pub fn next(&mut self) -> Result<(TypeId, ValueId), Error> {
        let ty = *self.args.get(self.arg_index).ok_or(Error::InvalidArg)?;
        let value = self.read_value(ty, 0)?;
        self.arg_index += 1;
        Ok((ty, value))
    }

    /// Decodes the next argument and checks its wire type against
    /// `expected`, resolving `Var` references through `env`.
    pub fn next_with_type(&mut self, env: &TypeEnv, expected: TypeId) -> Result<ValueId, Error> {
        let (wire, value) = self.next()?;
        if !is_subtype(self.arena, env, wire, expected)? {
            return Err(Error::InvalidArg);
        }
        Ok(value)
    }

    /// Drains any unread arguments and verifies the input ends exactly at
    /// the cursor.
    pub fn done(mut self) -> Result<(), Error> {
        while !self.is_done() {
            self.next()?;
        }
        if self.reader.remaining() != 0 {
            return Err(Error::InvalidArg);
        }
        Ok(())
    }

    fn charge(&mut self, cost: u64) -> Result<(), Error> {
        if let Some(quota) = &mut self.quota {
            *quota = quota.checked_sub(cost).ok_or(Error::Alloc)?;
        }
        Ok(())
    }

    fn parse_header(&mut self) -> Result<(), Error> {
        let magic = self.reader.read_bytes(MAGIC.len())?;
        if magic != MAGIC {
            return Err(Error::InvalidArg);
        }

        // Each table entry occupies at least one byte, so a count larger
        // than the remaining input is unsatisfiable.
        let count = self.read_len()?;
        if count > self.reader.remaining() {
            return Err(Error::Truncated);
        }
        let mut slots = Vec::with_capacity(count);
        for _ in 0..count {
            slots.push(self.arena.push_type(Type::Reserved)?);
        }
        for index in 0..count {
            self.parse_entry(&slots, slots[index])?;
        }
        self.check_services(&slots)?;

        let argc = self.read_len()?;
        if argc > self.reader.remaining() {
            return Err(Error::Truncated);
        }
        for _ in 0..argc {
            let reference = self.reader.read_sleb128_i64()?;
            let ty = self.resolve_ref(&slots, reference)?;
            self.args.push(ty);
        }

        let consumed = self.reader.offset() as u64;
        self.charge(consumed.saturating_mul(4))
    }

    /// Reads a ULEB128 length and narrows it to `usize`.
    fn read_len(&mut self) -> Result<usize, Error> {
        let raw = self.reader.read_uleb128_u64()?;
        usize::try_from(raw).map_err(|_| Error::Truncated)
    }

    /// Resolves a wire type reference: a non-negative table index or a
    /// negative primitive opcode. Compound opcodes are only legal at the
    /// head of a table entry.
    fn resolve_ref(&mut self, slots: &[TypeId], reference: i64) -> Result<TypeId, Error> {
        if reference >= 0 {
            return usize::try_from(reference)
                .ok()
                .and_then(|i| slots.get(i))
                .copied()
                .ok_or(Error::InvalidArg);
        }
        let ty = match Type::from_primitive_opcode(reference) {
            Some(ty) => ty,
            // Below the known range: a primitive this decoder postdates.
            None if reference < opcode::PRINCIPAL => return Err(Error::Unsupported),
            // Compound opcodes are only legal at the head of a table entry.
            None => return Err(Error::InvalidArg),
        };
        self.arena.push_type(ty)
    }

    fn parse_entry(&mut self, slots: &[TypeId], slot: TypeId) -> Result<(), Error> {
        let tag = self.reader.read_sleb128_i64()?;
        let ty = match tag {
            opcode::OPT | opcode::VEC => {
                let child = self.reader.read_sleb128_i64()?;
                let child = self.resolve_ref(slots, child)?;
                if tag == opcode::OPT {
                    Type::Opt(child)
                } else {
                    Type::Vec(child)
                }
            }
            opcode::RECORD | opcode::VARIANT => {
                let range = self.parse_fields(slots)?;
                if tag == opcode::RECORD {
                    Type::Record(range)
                } else {
                    Type::Variant(range)
                }
            }
            opcode::FUNC => Type::Func(self.parse_func(slots)?),
            opcode::SERVICE => Type::Service(self.parse_service(slots)?),
            // A tag below the known range is a future compound: its entry is
            // a length-prefixed blob to skip, and the slot stays reserved.
            tag if tag < opcode::PRINCIPAL => {
                let len = self.read_len()?;
                self.reader.read_bytes(len)?;
                return Ok(());
            }
            // Primitives and non-negative tags never head a table entry.
            _ => return Err(Error::InvalidArg),
        };
        self.arena.replace_type(slot, ty)
    }

    fn parse_fields(&mut self, slots: &[TypeId]) -> Result<crate::arena::ByteRange, Error> {
        let count = self.read_len()?;
        if count > self.reader.remaining() {
            return Err(Error::Truncated);
        }
        let mut fields = Vec::with_capacity(count);
        let mut prev: Option<u32> = None;
        for _ in 0..count {
            let hash = self.reader.read_uleb128_u64()?;
            let hash = u32::try_from(hash).map_err(|_| Error::InvalidArg)?;
            if prev.is_some_and(|p| p >= hash) {
                return Err(Error::InvalidArg);
            }
            prev = Some(hash);
            let reference = self.reader.read_sleb128_i64()?;
            let ty = self.resolve_ref(slots, reference)?;
            fields.push(TypeField {
                label: crate::types::Label::id(hash),
                ty,
            });
        }
        self.arena.intern_type_fields(&fields)
    }

    fn parse_func(&mut self, slots: &[TypeId]) -> Result<FuncType, Error> {
        let mut lists = [crate::arena::ByteRange { offset: 0, len: 0 }; 2];
        for list in &mut lists {
            let count = self.read_len()?;
            if count > self.reader.remaining() {
                return Err(Error::Truncated);
            }
            let mut ids = Vec::with_capacity(count);
            for _ in 0..count {
                let reference = self.reader.read_sleb128_i64()?;
                ids.push(self.resolve_ref(slots, reference)?);
            }
            *list = self.arena.intern_type_ids(&ids)?;
        }
        let mode_count = self.read_len()?;
        if mode_count > 1 {
            return Err(Error::InvalidArg);
        }
        let mut modes = Vec::with_capacity(mode_count);
        for _ in 0..mode_count {
            modes.push(FuncMode::from_wire(self.reader.read_u8()?)?);
        }
        Ok(FuncType {
            args: lists[0],
            rets: lists[1],
            modes: self.arena.intern_func_modes(&modes)?,
        })
    }

    fn parse_service(&mut self, slots: &[TypeId]) -> Result<crate::arena::ByteRange, Error> {
        let count = self.read_len()?;
        if count > self.reader.remaining() {
            return Err(Error::Truncated);
        }
        let mut methods = Vec::with_capacity(count);
        let mut prev: Option<&[u8]> = None;
        for _ in 0..count {
            let len = self.read_len()?;
            let name = self.reader.read_bytes(len)?;
            core::str::from_utf8(name).map_err(|_| Error::InvalidArg)?;
            if prev.is_some_and(|p| p >= name) {
                return Err(Error::InvalidArg);
            }
            prev = Some(name);
            let reference = self.reader.read_sleb128_i64()?;
            let ty = self.resolve_ref(slots, reference)?;
            let name = self.arena.intern_bytes(name)?;
            methods.push(Method { name, ty });
        }
        self.arena.intern_methods(&methods)
    }

    /// Service methods must reference func entries. This runs after the
    /// whole table parses because a method may point at a later slot.
    fn check_services(&self, slots: &[TypeId]) -> Result<(), Error> {
        for &slot in slots {
            let Type::Service(range) = self.arena.ty(slot)? else {
                continue;
            };
            for method in self.arena.methods(range)? {
                match self.arena.ty(method.ty)? {
                    // Reserved covers slots degraded from future tags.
                    Type::Func(_) | Type::Reserved => {}
                    _ => return Err(Error::InvalidArg),
                }
            }
        }
        Ok(())
    }

    fn read_value(&mut self, ty: TypeId, depth: usize) -> Result<ValueId, Error> {
        // Recursive types can unroll into arbitrarily deep values.
        if depth >= MAX_DEPTH {
            return Err(Error::Alloc);
        }
        self.charge(4)?;
        let value = match self.arena.ty(ty)? {
            Type::Null => Value::Null,
            Type::Reserved => Value::Reserved,
            Type::Empty => return Err(Error::InvalidArg),
            Type::Bool => match self.reader.read_u8()? {
                0 => Value::Bool(false),
                1 => Value::Bool(true),
                _ => return Err(Error::InvalidArg),
            },
            Type::Nat => {
                let raw = self.reader.read_leb128_raw()?;
                self.charge(raw.len() as u64)?;
                Value::Nat(self.arena.intern_bytes(raw)?)
            }
            Type::Int => {
                let raw = self.reader.read_leb128_raw()?;
                self.charge(raw.len() as u64)?;
                Value::Int(self.arena.intern_bytes(raw)?)
            }
            Type::Nat8 => Value::Nat8(self.reader.read_u8()?),
            Type::Nat16 => Value::Nat16(self.reader.read_u16_le()?),
            Type::Nat32 => Value::Nat32(self.reader.read_u32_le()?),
            Type::Nat64 => Value::Nat64(self.reader.read_u64_le()?),
            Type::Int8 => Value::Int8(self.reader.read_u8()? as i8),
            Type::Int16 => Value::Int16(self.reader.read_u16_le()? as i16),
            Type::Int32 => Value::Int32(self.reader.read_u32_le()? as i32),
            Type::Int64 => Value::Int64(self.reader.read_u64_le()? as i64),
            Type::Float32 => Value::Float32(f32::from_bits(self.reader.read_u32_le()?)),
            Type::Float64 => Value::Float64(f64::from_bits(self.reader.read_u64_le()?)),
            Type::Text => {
                let len = self.read_len()?;
                self.charge(len as u64)?;
                let text = self.reader.read_str(len)?;
                Value::Text(self.arena.intern_bytes(text.as_bytes())?)
            }
            Type::Principal => Value::Principal(self.read_principal()?),
            Type::Opt(inner) => match self.reader.read_u8()? {
                0 => Value::Opt(None),
                1 => Value::Opt(Some(self.read_value(inner, depth + 1)?)),
                _ => return Err(Error::InvalidArg),
            },
            Type::Vec(inner) => {
                let len = self.read_len()?;
                if self.arena.ty(inner)? == Type::Nat8 {
                    self.charge(len as u64)?;
                    let bytes = self.reader.read_bytes(len)?;
                    Value::Blob(self.arena.intern_bytes(bytes)?)
                } else {
                    // Elements such as `null` occupy zero payload bytes, so
                    // the count-versus-remaining check only applies to
                    // element types with a wire footprint.
                    if len > self.reader.remaining() && !zero_size_type(self.arena, inner)? {
                        return Err(Error::Truncated);
                    }
                    let mut elements = Vec::with_capacity(len.min(self.reader.remaining()));
                    for _ in 0..len {
                        elements.push(self.read_value(inner, depth + 1)?);
                    }
                    Value::Vec(self.arena.intern_value_ids(&elements)?)
                }
            }
            Type::Record(range) => {
                let type_fields = self.arena.type_fields(range)?.to_vec();
                let mut fields = Vec::with_capacity(type_fields.len());
                for tf in type_fields {
                    let value = self.read_value(tf.ty, depth + 1)?;
                    fields.push(ValueField {
                        label: tf.label,
                        value,
                    });
                }
                Value::Record(self.arena.intern_value_fields(&fields)?)
            }
            Type::Variant(range) => {
                let arms = self.arena.type_fields(range)?.to_vec();
                let index = self.reader.read_uleb128_u64()?;
                let arm = usize::try_from(index)
                    .ok()
                    .and_then(|i| arms.get(i).copied())
                    .ok_or(Error::InvalidArg)?;
                let value = self.read_value(arm.ty, depth + 1)?;
                Value::Variant {
                    index,
                    field: ValueField {
                        label: arm.label,
                        value,
                    },
                }
            }
            Type::Func(_) => {
                let principal = self.read_principal()?;
                let len = self.read_len()?;
                self.charge(len as u64)?;
                let method = self.reader.read_str(len)?;
                Value::FuncRef {
                    principal,
                    method: self.arena.intern_bytes(method.as_bytes())?,
                }
            }
            Type::Service(_) => Value::ServiceRef(self.read_principal()?),
            // Wire types are structural; `Var` never appears here.
            Type::Var(_) => return Err(Error::InvalidArg),
        };
        self.arena.push_value(value)
    }

    fn read_principal(&mut self) -> Result<crate::arena::ByteRange, Error> {
        // Only the transparent form is accepted.
        if self.reader.read_u8()? != 0x01 {
            return Err(Error::InvalidArg);
        }
        let len = self.read_len()?;
        if len > PRINCIPAL_MAX_LEN {
            return Err(Error::InvalidArg);
        }
        self.charge(len as u64)?;
        let payload = self.reader.read_bytes(len)?;
        self.arena.intern_bytes(payload)
    }
}

/// Whether every value of `ty` occupies zero payload bytes: `null`,
/// `reserved`, or a record built solely from such types.
fn zero_size_type(arena: &Arena, ty: TypeId) -> Result<bool, Error> {
    let mut visited = Vec::new();
    zero_size_type_inner(arena, ty, &mut visited)
}

fn zero_size_type_inner(arena: &Arena, ty: TypeId, visited: &mut Vec<TypeId>) -> Result<bool, Error> {
    match arena.ty(ty)? {
        Type::Null | Type::Reserved => Ok(true),
        Type::Record(range) => {
            // A record cycle reached here admits no finite value; the depth
            // bound in `read_value` rejects it regardless of the answer.
            if visited.len() >= MAX_DEPTH || visited.contains(&ty) {
                return Ok(true);
            }
            visited.push(ty);
            for field in arena.type_fields(range)? {
                if !zero_size_type_inner(arena, field.ty, visited)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        _ => Ok(false),
    }
}
