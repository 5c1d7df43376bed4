// Copyright 2026 the Candid Wire Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The Candid type graph.
//!
//! Types are arena nodes referencing their children through [`TypeId`]
//! handles, so recursive types are ordinary index cycles. Record and variant
//! fields, func signatures, and service method lists live in shared arena
//! pools behind [`ByteRange`] handles.

use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;

use crate::arena::{Arena, ByteRange, TypeId};
use crate::format::Error;
use crate::hash::{field_hash, is_strictly_ascending};

/// Wire opcodes for the type-table encoding. Primitives are written as
/// negative SLEB128 tags wherever a type reference is expected; compound
/// tags only appear at the head of a table entry.
pub(crate) mod opcode {
    pub const NULL: i64 = -1;
    pub const BOOL: i64 = -2;
    pub const NAT: i64 = -3;
    pub const INT: i64 = -4;
    pub const NAT8: i64 = -5;
    pub const NAT16: i64 = -6;
    pub const NAT32: i64 = -7;
    pub const NAT64: i64 = -8;
    pub const INT8: i64 = -9;
    pub const INT16: i64 = -10;
    pub const INT32: i64 = -11;
    pub const INT64: i64 = -12;
    pub const FLOAT32: i64 = -13;
    pub const FLOAT64: i64 = -14;
    pub const TEXT: i64 = -15;
    pub const RESERVED: i64 = -16;
    pub const EMPTY: i64 = -17;
    pub const OPT: i64 = -18;
    pub const VEC: i64 = -19;
    pub const RECORD: i64 = -20;
    pub const VARIANT: i64 = -21;
    pub const FUNC: i64 = -22;
    pub const SERVICE: i64 = -23;
    pub const PRINCIPAL: i64 = -24;
}

/// A record or variant field label.
///
/// Named labels keep the original name alongside the hash for diagnostics
/// and textual output; labels decoded from the wire carry only the hash.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Label {
    pub hash: u32,
    pub name: Option<ByteRange>,
}

impl Label {
    /// Creates a numeric label from an explicit id.
    #[must_use]
    pub fn id(id: u32) -> Self {
        Self { hash: id, name: None }
    }

    /// Creates a named label, interning the name in `arena`.
    pub fn named(arena: &mut Arena, name: &str) -> Result<Self, Error> {
        Ok(Self {
            hash: field_hash(name),
            name: Some(arena.intern_str(name)?),
        })
    }
}

/// One record or variant field: label plus element type.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TypeField {
    pub label: Label,
    pub ty: TypeId,
}

/// One service method: name plus func type.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Method {
    pub name: ByteRange,
    pub ty: TypeId,
}

/// Func annotation modes.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FuncMode {
    Query,
    Oneway,
    CompositeQuery,
}

impl FuncMode {
    pub(crate) fn to_wire(self) -> u8 {
        match self {
            Self::Query => 1,
            Self::Oneway => 2,
            Self::CompositeQuery => 3,
        }
    }

    pub(crate) fn from_wire(byte: u8) -> Result<Self, Error> {
        match byte {
            1 => Ok(Self::Query),
            2 => Ok(Self::Oneway),
            3 => Ok(Self::CompositeQuery),
            _ => Err(Error::InvalidArg),
        }
    }
}

/// A func type: argument and return type lists plus annotation modes.
///
/// `args` and `rets` range over the arena type-id pool, `modes` over the
/// func-mode pool.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct FuncType {
    pub args: ByteRange,
    pub rets: ByteRange,
    pub modes: ByteRange,
}

/// A single node of the Candid type graph.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Type {
    Null,
    Bool,
    Nat,
    Int,
    Nat8,
    Nat16,
    Nat32,
    Nat64,
    Int8,
    Int16,
    Int32,
    Int64,
    Float32,
    Float64,
    Text,
    Reserved,
    Empty,
    Principal,
    /// `opt T`.
    Opt(TypeId),
    /// `vec T`; `vec nat8` is the blob type.
    Vec(TypeId),
    /// Record fields, sorted by ascending label hash.
    Record(ByteRange),
    /// Variant arms, sorted by ascending label hash.
    Variant(ByteRange),
    /// A func signature.
    Func(FuncType),
    /// Service methods, sorted by ascending name.
    Service(ByteRange),
    /// A named reference resolved through a [`TypeEnv`]. The range holds the
    /// name bytes.
    Var(ByteRange),
}

impl Type {
    /// Returns the wire opcode if this is a primitive type.
    #[must_use]
    pub(crate) fn primitive_opcode(self) -> Option<i64> {
        match self {
            Self::Null => Some(opcode::NULL),
            Self::Bool => Some(opcode::BOOL),
            Self::Nat => Some(opcode::NAT),
            Self::Int => Some(opcode::INT),
            Self::Nat8 => Some(opcode::NAT8),
            Self::Nat16 => Some(opcode::NAT16),
            Self::Nat32 => Some(opcode::NAT32),
            Self::Nat64 => Some(opcode::NAT64),
            Self::Int8 => Some(opcode::INT8),
            Self::Int16 => Some(opcode::INT16),
            Self::Int32 => Some(opcode::INT32),
            Self::Int64 => Some(opcode::INT64),
            Self::Float32 => Some(opcode::FLOAT32),
            Self::Float64 => Some(opcode::FLOAT64),
            Self::Text => Some(opcode::TEXT),
            Self::Reserved => Some(opcode::RESERVED),
            Self::Empty => Some(opcode::EMPTY),
            Self::Principal => Some(opcode::PRINCIPAL),
            _ => None,
        }
    }

    pub(crate) fn from_primitive_opcode(op: i64) -> Option<Self> {
        match op {
            opcode::NULL => Some(Self::Null),
            opcode::BOOL => Some(Self::Bool),
            opcode::NAT => Some(Self::Nat),
            opcode::INT => Some(Self::Int),
            opcode::NAT8 => Some(Self::Nat8),
            opcode::NAT16 => Some(Self::Nat16),
            opcode::NAT32 => Some(Self::Nat32),
            opcode::NAT64 => Some(Self::Nat64),
            opcode::INT8 => Some(Self::Int8),
            opcode::INT16 => Some(Self::Int16),
            opcode::INT32 => Some(Self::Int32),
            opcode::INT64 => Some(Self::Int64),
            opcode::FLOAT32 => Some(Self::Float32),
            opcode::FLOAT64 => Some(Self::Float64),
            opcode::TEXT => Some(Self::Text),
            opcode::RESERVED => Some(Self::Reserved),
            opcode::EMPTY => Some(Self::Empty),
            opcode::PRINCIPAL => Some(Self::Principal),
            _ => None,
        }
    }
}

impl Arena {
    /// Adds an `opt T` node.
    pub fn ty_opt(&mut self, inner: TypeId) -> Result<TypeId, Error> {
        self.push_type(Type::Opt(inner))
    }

    /// Adds a `vec T` node.
    pub fn ty_vec(&mut self, inner: TypeId) -> Result<TypeId, Error> {
        self.push_type(Type::Vec(inner))
    }

    /// Adds a record node. Fields are sorted by label hash; duplicate hashes
    /// are rejected.
    pub fn ty_record(&mut self, fields: &[TypeField]) -> Result<TypeId, Error> {
        let range = self.sorted_fields(fields)?;
        self.push_type(Type::Record(range))
    }

    /// Adds a variant node. Arms are sorted by label hash; duplicate hashes
    /// are rejected.
    pub fn ty_variant(&mut self, arms: &[TypeField]) -> Result<TypeId, Error> {
        let range = self.sorted_fields(arms)?;
        self.push_type(Type::Variant(range))
    }

    fn sorted_fields(&mut self, fields: &[TypeField]) -> Result<ByteRange, Error> {
        let mut sorted: Vec<TypeField> = fields.to_vec();
        sorted.sort_unstable_by_key(|field| field.label.hash);
        let hashes: Vec<u32> = sorted.iter().map(|field| field.label.hash).collect();
        if !is_strictly_ascending(&hashes) {
            return Err(Error::InvalidArg);
        }
        self.intern_type_fields(&sorted)
    }

    /// Adds a func node from argument types, return types, and modes.
    pub fn ty_func(
        &mut self,
        args: &[TypeId],
        rets: &[TypeId],
        modes: &[FuncMode],
    ) -> Result<TypeId, Error> {
        let func = FuncType {
            args: self.intern_type_ids(args)?,
            rets: self.intern_type_ids(rets)?,
            modes: self.intern_func_modes(modes)?,
        };
        self.push_type(Type::Func(func))
    }

    /// Adds a service node. Methods are sorted by name; duplicate names are
    /// rejected.
    pub fn ty_service(&mut self, methods: &[(&str, TypeId)]) -> Result<TypeId, Error> {
        let mut sorted: Vec<(&str, TypeId)> = methods.to_vec();
        sorted.sort_unstable_by(|a, b| a.0.cmp(b.0));
        if sorted.windows(2).any(|pair| pair[0].0 >= pair[1].0) {
            return Err(Error::InvalidArg);
        }
        let mut entries = Vec::with_capacity(sorted.len());
        for (name, ty) in sorted {
            entries.push(Method {
                name: self.intern_str(name)?,
                ty,
            });
        }
        let range = self.intern_methods(&entries)?;
        self.push_type(Type::Service(range))
    }

    /// Adds a named type reference to be resolved through a [`TypeEnv`].
    pub fn ty_var(&mut self, name: &str) -> Result<TypeId, Error> {
        let range = self.intern_str(name)?;
        self.push_type(Type::Var(range))
    }
}

/// Maps type names to their definitions, backing [`Type::Var`] references.
#[derive(Clone, Debug, Default)]
pub struct TypeEnv {
    bindings: BTreeMap<String, TypeId>,
}

impl TypeEnv {
    /// Creates an empty environment.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `name` to `id`. Re-binding to the same id is a no-op; binding
    /// to a different id is rejected.
    pub fn insert(&mut self, name: &str, id: TypeId) -> Result<(), Error> {
        match self.bindings.get(name) {
            Some(existing) if *existing != id => Err(Error::InvalidArg),
            Some(_) => Ok(()),
            None => {
                self.bindings.insert(String::from(name), id);
                Ok(())
            }
        }
    }

    /// Looks up a binding.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<TypeId> {
        self.bindings.get(name).copied()
    }

    /// Number of bindings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Whether the environment holds no bindings.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Follows `Var` links until a structural type is reached.
    ///
    /// A chain longer than the number of bindings means the references form
    /// a pure `Var` loop, which is rejected.
    pub fn trace(&self, arena: &Arena, id: TypeId) -> Result<TypeId, Error> {
        let mut current = id;
        let mut hops = 0usize;
        while let Type::Var(name) = arena.ty(current)? {
            hops += 1;
            if hops > self.bindings.len() {
                return Err(Error::InvalidArg);
            }
            let name = arena.str_slice(name)?;
            current = self.get(name).ok_or(Error::InvalidArg)?;
        }
        Ok(current)
    }
}
