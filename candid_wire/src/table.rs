// Copyright 2026 the Candid Wire Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Wire type-table construction.
//!
//! Compound types are deduplicated into a table of SLEB128-tagged entries;
//! type references inside entries and in the argument list are either a
//! non-negative table index or a negative primitive opcode. A compound type
//! claims its table index before its children are walked, so recursive
//! types terminate on the already-assigned index.

use alloc::collections::BTreeMap;
use alloc::vec::Vec;

use crate::arena::{Arena, TypeId};
use crate::format::{write_sleb128_i64, write_uleb128_u64, Error, Writer};
use crate::types::{opcode, Type, TypeEnv};
use crate::MAX_DEPTH;

/// Builds the type table and argument reference list for one message.
pub struct TypeTableBuilder<'a> {
    arena: &'a Arena,
    env: &'a TypeEnv,
    indices: BTreeMap<u32, i64>,
    entries: Vec<Vec<u8>>,
    arg_refs: Vec<i64>,
}

impl<'a> TypeTableBuilder<'a> {
    /// Creates an empty builder over `arena`, resolving `Var` references
    /// through `env`.
    #[must_use]
    pub fn new(arena: &'a Arena, env: &'a TypeEnv) -> Self {
        Self {
            arena,
            env,
            indices: BTreeMap::new(),
            entries: Vec::new(),
            arg_refs: Vec::new(),
        }
    }

    /// Registers one top-level argument type, adding any compound types it
    /// reaches to the table.
    pub fn add_arg(&mut self, ty: TypeId) -> Result<(), Error> {
        let reference = self.reference(ty, 0)?;
        self.arg_refs.push(reference);
        Ok(())
    }

    /// Number of table entries emitted so far.
    #[must_use]
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// Returns the table reference for `id`: a table index for compounds, a
    /// negative opcode for primitives.
    fn reference(&mut self, id: TypeId, depth: usize) -> Result<i64, Error> {
        if depth >= MAX_DEPTH {
            return Err(Error::Alloc);
        }
        let ty = self.arena.ty(id)?;
        if let Type::Var(_) = ty {
            let resolved = self.env.trace(self.arena, id)?;
            return self.reference(resolved, depth + 1);
        }
        if let Some(op) = ty.primitive_opcode() {
            return Ok(op);
        }
        if let Some(&index) = self.indices.get(&id.0) {
            return Ok(index);
        }
        let index = i64::try_from(self.entries.len()).map_err(|_| Error::Alloc)?;
        self.indices.insert(id.0, index);
        self.entries.push(Vec::new());
        let entry = self.build_entry(ty, depth)?;
        self.entries[index as usize] = entry;
        Ok(index)
    }

    fn build_entry(&mut self, ty: Type, depth: usize) -> Result<Vec<u8>, Error> {
        let arena = self.arena;
        let mut buf = Vec::new();
        match ty {
            Type::Opt(inner) => {
                write_sleb128_i64(&mut buf, opcode::OPT);
                let r = self.reference(inner, depth + 1)?;
                write_sleb128_i64(&mut buf, r);
            }
            Type::Vec(inner) => {
                write_sleb128_i64(&mut buf, opcode::VEC);
                let r = self.reference(inner, depth + 1)?;
                write_sleb128_i64(&mut buf, r);
            }
            Type::Record(fields) | Type::Variant(fields) => {
                let tag = if matches!(ty, Type::Record(_)) {
                    opcode::RECORD
                } else {
                    opcode::VARIANT
                };
                write_sleb128_i64(&mut buf, tag);
                let fields = arena.type_fields(fields)?;
                write_uleb128_u64(&mut buf, fields.len() as u64);
                for field in fields {
                    write_uleb128_u64(&mut buf, u64::from(field.label.hash));
                    let r = self.reference(field.ty, depth + 1)?;
                    write_sleb128_i64(&mut buf, r);
                }
            }
            Type::Func(func) => {
                write_sleb128_i64(&mut buf, opcode::FUNC);
                for range in [func.args, func.rets] {
                    let ids = arena.type_ids(range)?;
                    write_uleb128_u64(&mut buf, ids.len() as u64);
                    for &id in ids {
                        let r = self.reference(id, depth + 1)?;
                        write_sleb128_i64(&mut buf, r);
                    }
                }
                let modes = arena.func_modes(func.modes)?;
                write_uleb128_u64(&mut buf, modes.len() as u64);
                for mode in modes {
                    buf.push(mode.to_wire());
                }
            }
            Type::Service(methods) => {
                write_sleb128_i64(&mut buf, opcode::SERVICE);
                let methods = arena.methods(methods)?;
                write_uleb128_u64(&mut buf, methods.len() as u64);
                for method in methods {
                    let name = arena.bytes(method.name)?;
                    write_uleb128_u64(&mut buf, name.len() as u64);
                    buf.extend_from_slice(name);
                    let resolved = self.env.trace(arena, method.ty)?;
                    if !matches!(arena.ty(resolved)?, Type::Func(_)) {
                        return Err(Error::InvalidArg);
                    }
                    let r = self.reference(method.ty, depth + 1)?;
                    write_sleb128_i64(&mut buf, r);
                }
            }
            // Primitives and Var never reach here.
            _ => return Err(Error::InvalidArg),
        }
        Ok(buf)
    }

    /// Writes the table section: entry count, entries, then the argument
    /// count and argument references.
    pub fn encode(&self, out: &mut Writer) {
        out.write_uleb128_u64(self.entries.len() as u64);
        for entry in &self.entries {
            out.write_bytes(entry);
        }
        out.write_uleb128_u64(self.arg_refs.len() as u64);
        for &reference in &self.arg_refs {
            out.write_sleb128_i64(reference);
        }
    }
}
