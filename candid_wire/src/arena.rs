// Copyright 2026 the Candid Wire Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Bulk-allocating arena shared by type and value graphs.
//!
//! All codec objects live in packed per-kind pools and reference each other
//! through integer handles ([`TypeId`], [`ValueId`]) or [`ByteRange`] slices
//! into a pool. Cycles in the type graph are therefore plain index references
//! and the whole graph is released as one unit when the arena is dropped.
//!
//! Handles are only meaningful for the arena that produced them; no
//! per-object free exists.

use alloc::vec::Vec;
use core::mem::size_of;

use crate::format::Error;
use crate::types::{FuncMode, Method, Type, TypeField};
use crate::value::{Value, ValueField};

/// Handle to a type node in an [`Arena`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TypeId(pub u32);

/// Handle to a value node in an [`Arena`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ValueId(pub u32);

/// A (offset, len) range into one of the arena pools.
///
/// The pool a range indexes is determined by the field that stores it; a
/// range into `bytes` counts bytes while a range into `type_fields` counts
/// field entries.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ByteRange {
    /// Start offset in pool entries.
    pub offset: u32,
    /// Length in pool entries.
    pub len: u32,
}

impl ByteRange {
    pub(crate) fn end(self) -> Result<u32, Error> {
        self.offset.checked_add(self.len).ok_or(Error::InvalidArg)
    }

    pub(crate) fn as_usize(self) -> Result<(usize, usize), Error> {
        Ok((self.offset as usize, self.end()? as usize))
    }
}

/// The arena backing a single encode or decode scope.
#[derive(Clone, Debug, Default)]
pub struct Arena {
    types: Vec<Type>,
    values: Vec<Value>,
    type_fields: Vec<TypeField>,
    value_fields: Vec<ValueField>,
    type_ids: Vec<TypeId>,
    value_ids: Vec<ValueId>,
    methods: Vec<Method>,
    func_modes: Vec<FuncMode>,
    bytes: Vec<u8>,
    limit: Option<usize>,
    used: usize,
}

impl Arena {
    /// Creates an empty arena with no byte limit.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an arena that pre-reserves roughly `capacity_hint` bytes of
    /// payload storage.
    #[must_use]
    pub fn with_capacity(capacity_hint: usize) -> Self {
        let mut arena = Self::default();
        arena.bytes.reserve(capacity_hint);
        arena
    }

    /// Creates an arena whose total storage is capped at `limit` bytes.
    ///
    /// Once the cap is reached every further allocation fails with
    /// [`Error::Alloc`].
    #[must_use]
    pub fn with_limit(limit: usize) -> Self {
        Self {
            limit: Some(limit),
            ..Self::default()
        }
    }

    /// Returns the approximate number of bytes allocated so far.
    #[must_use]
    pub fn used(&self) -> usize {
        self.used
    }

    fn charge(&mut self, cost: usize) -> Result<(), Error> {
        let used = self.used.checked_add(cost).ok_or(Error::Alloc)?;
        if let Some(limit) = self.limit {
            if used > limit {
                return Err(Error::Alloc);
            }
        }
        self.used = used;
        Ok(())
    }

    fn range_from(offset: usize, len: usize) -> Result<ByteRange, Error> {
        Ok(ByteRange {
            offset: u32::try_from(offset).map_err(|_| Error::Alloc)?,
            len: u32::try_from(len).map_err(|_| Error::Alloc)?,
        })
    }

    /// Copies `data` into the byte pool.
    pub fn intern_bytes(&mut self, data: &[u8]) -> Result<ByteRange, Error> {
        self.charge(data.len())?;
        let range = Self::range_from(self.bytes.len(), data.len())?;
        self.bytes.extend_from_slice(data);
        Ok(range)
    }

    /// Copies a UTF-8 string into the byte pool.
    pub fn intern_str(&mut self, s: &str) -> Result<ByteRange, Error> {
        self.intern_bytes(s.as_bytes())
    }

    /// Returns the bytes referenced by `range`.
    pub fn bytes(&self, range: ByteRange) -> Result<&[u8], Error> {
        let (start, end) = range.as_usize()?;
        self.bytes.get(start..end).ok_or(Error::InvalidArg)
    }

    /// Returns the UTF-8 string referenced by `range`.
    pub fn str_slice(&self, range: ByteRange) -> Result<&str, Error> {
        core::str::from_utf8(self.bytes(range)?).map_err(|_| Error::InvalidArg)
    }

    /// Appends a type node and returns its handle.
    pub fn push_type(&mut self, ty: Type) -> Result<TypeId, Error> {
        self.charge(size_of::<Type>())?;
        let id = u32::try_from(self.types.len()).map_err(|_| Error::Alloc)?;
        self.types.push(ty);
        Ok(TypeId(id))
    }

    /// Returns the type node behind `id`.
    pub fn ty(&self, id: TypeId) -> Result<Type, Error> {
        self.types
            .get(id.0 as usize)
            .copied()
            .ok_or(Error::InvalidArg)
    }

    /// Overwrites an existing type node in place.
    ///
    /// Used by the deserializer to patch pre-allocated table slots once their
    /// entries have been parsed, which is how forward and self references
    /// become cycles.
    pub(crate) fn replace_type(&mut self, id: TypeId, ty: Type) -> Result<(), Error> {
        let slot = self.types.get_mut(id.0 as usize).ok_or(Error::InvalidArg)?;
        *slot = ty;
        Ok(())
    }

    /// Appends a value node and returns its handle.
    pub fn push_value(&mut self, value: Value) -> Result<ValueId, Error> {
        self.charge(size_of::<Value>())?;
        let id = u32::try_from(self.values.len()).map_err(|_| Error::Alloc)?;
        self.values.push(value);
        Ok(ValueId(id))
    }

    /// Returns the value node behind `id`.
    pub fn value(&self, id: ValueId) -> Result<Value, Error> {
        self.values
            .get(id.0 as usize)
            .copied()
            .ok_or(Error::InvalidArg)
    }

    /// Copies a type-field slice into the field pool.
    pub fn intern_type_fields(&mut self, fields: &[TypeField]) -> Result<ByteRange, Error> {
        self.charge(fields.len() * size_of::<TypeField>())?;
        let range = Self::range_from(self.type_fields.len(), fields.len())?;
        self.type_fields.extend_from_slice(fields);
        Ok(range)
    }

    /// Returns the type fields referenced by `range`.
    pub fn type_fields(&self, range: ByteRange) -> Result<&[TypeField], Error> {
        let (start, end) = range.as_usize()?;
        self.type_fields.get(start..end).ok_or(Error::InvalidArg)
    }

    /// Copies a value-field slice into the field pool.
    pub fn intern_value_fields(&mut self, fields: &[ValueField]) -> Result<ByteRange, Error> {
        self.charge(fields.len() * size_of::<ValueField>())?;
        let range = Self::range_from(self.value_fields.len(), fields.len())?;
        self.value_fields.extend_from_slice(fields);
        Ok(range)
    }

    /// Returns the value fields referenced by `range`.
    pub fn value_fields(&self, range: ByteRange) -> Result<&[ValueField], Error> {
        let (start, end) = range.as_usize()?;
        self.value_fields.get(start..end).ok_or(Error::InvalidArg)
    }

    /// Copies a type-id slice into the id pool (func args/rets).
    pub fn intern_type_ids(&mut self, ids: &[TypeId]) -> Result<ByteRange, Error> {
        self.charge(ids.len() * size_of::<TypeId>())?;
        let range = Self::range_from(self.type_ids.len(), ids.len())?;
        self.type_ids.extend_from_slice(ids);
        Ok(range)
    }

    /// Returns the type ids referenced by `range`.
    pub fn type_ids(&self, range: ByteRange) -> Result<&[TypeId], Error> {
        let (start, end) = range.as_usize()?;
        self.type_ids.get(start..end).ok_or(Error::InvalidArg)
    }

    /// Copies a value-id slice into the id pool (vec elements).
    pub fn intern_value_ids(&mut self, ids: &[ValueId]) -> Result<ByteRange, Error> {
        self.charge(ids.len() * size_of::<ValueId>())?;
        let range = Self::range_from(self.value_ids.len(), ids.len())?;
        self.value_ids.extend_from_slice(ids);
        Ok(range)
    }

    /// Returns the value ids referenced by `range`.
    pub fn value_ids(&self, range: ByteRange) -> Result<&[ValueId], Error> {
        let (start, end) = range.as_usize()?;
        self.value_ids.get(start..end).ok_or(Error::InvalidArg)
    }

    /// Copies a service-method slice into the method pool.
    pub fn intern_methods(&mut self, methods: &[Method]) -> Result<ByteRange, Error> {
        self.charge(methods.len() * size_of::<Method>())?;
        let range = Self::range_from(self.methods.len(), methods.len())?;
        self.methods.extend_from_slice(methods);
        Ok(range)
    }

    /// Returns the service methods referenced by `range`.
    pub fn methods(&self, range: ByteRange) -> Result<&[Method], Error> {
        let (start, end) = range.as_usize()?;
        self.methods.get(start..end).ok_or(Error::InvalidArg)
    }

    /// Copies a func-mode slice into the mode pool.
    pub fn intern_func_modes(&mut self, modes: &[FuncMode]) -> Result<ByteRange, Error> {
        self.charge(modes.len() * size_of::<FuncMode>())?;
        let range = Self::range_from(self.func_modes.len(), modes.len())?;
        self.func_modes.extend_from_slice(modes);
        Ok(range)
    }

    /// Returns the func modes referenced by `range`.
    pub fn func_modes(&self, range: ByteRange) -> Result<&[FuncMode], Error> {
        let (start, end) = range.as_usize()?;
        self.func_modes.get(start..end).ok_or(Error::InvalidArg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intern_and_read_back() {
        let mut arena = Arena::new();
        let r = arena.intern_bytes(b"hello").unwrap();
        assert_eq!(arena.bytes(r).unwrap(), b"hello");
        assert_eq!(arena.str_slice(r).unwrap(), "hello");
    }

    #[test]
    fn limit_surfaces_alloc() {
        let mut arena = Arena::with_limit(4);
        assert_eq!(arena.intern_bytes(b"toolong"), Err(Error::Alloc));
        assert!(arena.intern_bytes(b"ok").is_ok());
    }

    #[test]
    fn out_of_range_handle_is_rejected() {
        let arena = Arena::new();
        assert_eq!(arena.ty(TypeId(0)), Err(Error::InvalidArg));
        assert_eq!(arena.value(ValueId(9)), Err(Error::InvalidArg));
    }

    #[test]
    fn ranges_stay_valid_across_growth() {
        let mut arena = Arena::new();
        let a = arena.intern_bytes(b"aa").unwrap();
        for _ in 0..100 {
            arena.intern_bytes(&[0u8; 64]).unwrap();
        }
        assert_eq!(arena.bytes(a).unwrap(), b"aa");
    }
}
