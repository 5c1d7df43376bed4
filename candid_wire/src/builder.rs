// Copyright 2026 the Candid Wire Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! One-shot message construction.
//!
//! [`Builder`] collects typed argument values, then emits a complete
//! message: `DIDL` magic, type table, argument references, and payloads.
//! Convenience `arg_*` methods cover the common leaf values; [`Builder::arg`]
//! takes an explicit type for everything else.

use alloc::vec::Vec;

use crate::arena::{Arena, TypeId, ValueId};
use crate::format::{Error, Writer};
use crate::ser::write_value;
use crate::table::TypeTableBuilder;
use crate::types::{Type, TypeEnv};
use crate::value::{Value, ValueField};
use crate::{MAGIC, MAX_DEPTH};

/// Accumulates arguments for one message.
pub struct Builder<'a> {
    arena: &'a mut Arena,
    env: TypeEnv,
    args: Vec<(TypeId, ValueId)>,
}

impl<'a> Builder<'a> {
    /// Creates a builder with an empty type environment.
    pub fn new(arena: &'a mut Arena) -> Self {
        Self::with_env(arena, TypeEnv::new())
    }

    /// Creates a builder resolving `Var` references through `env`.
    pub fn with_env(arena: &'a mut Arena, env: TypeEnv) -> Self {
        Self {
            arena,
            env,
            args: Vec::new(),
        }
    }

    /// Exposes the arena for building types and values.
    pub fn arena(&mut self) -> &mut Arena {
        self.arena
    }

    /// Appends an argument with an explicit type.
    pub fn arg(&mut self, ty: TypeId, value: ValueId) -> Result<&mut Self, Error> {
        self.args.push((ty, value));
        Ok(self)
    }

    /// Appends an argument, inferring its type from the value shape.
    ///
    /// Variant, func, and service values cannot be inferred; they carry less
    /// information than their types (arm sets, signatures) and need
    /// [`Builder::arg`].
    pub fn arg_value(&mut self, value: ValueId) -> Result<&mut Self, Error> {
        let ty = infer_type(self.arena, value, 0)?;
        self.arg(ty, value)
    }

    /// Appends a `null` argument.
    pub fn arg_null(&mut self) -> Result<&mut Self, Error> {
        let value = self.arena.push_value(Value::Null)?;
        self.arg_value(value)
    }

    /// Appends a `bool` argument.
    pub fn arg_bool(&mut self, value: bool) -> Result<&mut Self, Error> {
        let value = self.arena.push_value(Value::Bool(value))?;
        self.arg_value(value)
    }

    /// Appends an unbounded `nat` argument.
    pub fn arg_nat(&mut self, value: u64) -> Result<&mut Self, Error> {
        let value = self.arena.val_nat(value)?;
        self.arg_value(value)
    }

    /// Appends an unbounded `int` argument.
    pub fn arg_int(&mut self, value: i64) -> Result<&mut Self, Error> {
        let value = self.arena.val_int(value)?;
        self.arg_value(value)
    }

    /// Appends a `float64` argument.
    pub fn arg_float64(&mut self, value: f64) -> Result<&mut Self, Error> {
        let value = self.arena.push_value(Value::Float64(value))?;
        self.arg_value(value)
    }

    /// Appends a `text` argument.
    pub fn arg_text(&mut self, value: &str) -> Result<&mut Self, Error> {
        let value = self.arena.val_text(value)?;
        self.arg_value(value)
    }

    /// Appends a `vec nat8` argument.
    pub fn arg_blob(&mut self, value: &[u8]) -> Result<&mut Self, Error> {
        let value = self.arena.val_blob(value)?;
        self.arg_value(value)
    }

    /// Appends a `principal` argument.
    pub fn arg_principal(&mut self, payload: &[u8]) -> Result<&mut Self, Error> {
        let value = self.arena.val_principal(payload)?;
        self.arg_value(value)
    }

    /// Serializes the collected arguments into a complete message.
    pub fn serialize(&self) -> Result<Vec<u8>, Error> {
        let arena: &Arena = self.arena;
        let mut table = TypeTableBuilder::new(arena, &self.env);
        for &(ty, _) in &self.args {
            table.add_arg(ty)?;
        }
        let mut out = Writer::new();
        out.write_bytes(&MAGIC);
        table.encode(&mut out);
        for &(ty, value) in &self.args {
            write_value(&mut out, arena, &self.env, ty, value)?;
        }
        Ok(out.into_vec())
    }
}

/// Infers the type of `value` from its shape.
fn infer_type(arena: &mut Arena, value: ValueId, depth: usize) -> Result<TypeId, Error> {
    if depth >= MAX_DEPTH {
        return Err(Error::Alloc);
    }
    let val = arena.value(value)?;
    let ty = match val {
        Value::Null => Type::Null,
        Value::Reserved => Type::Reserved,
        Value::Bool(_) => Type::Bool,
        Value::Nat(_) => Type::Nat,
        Value::Int(_) => Type::Int,
        Value::Nat8(_) => Type::Nat8,
        Value::Nat16(_) => Type::Nat16,
        Value::Nat32(_) => Type::Nat32,
        Value::Nat64(_) => Type::Nat64,
        Value::Int8(_) => Type::Int8,
        Value::Int16(_) => Type::Int16,
        Value::Int32(_) => Type::Int32,
        Value::Int64(_) => Type::Int64,
        Value::Float32(_) => Type::Float32,
        Value::Float64(_) => Type::Float64,
        Value::Text(_) => Type::Text,
        Value::Principal(_) => Type::Principal,
        Value::Blob(_) => {
            let nat8 = arena.push_type(Type::Nat8)?;
            return arena.ty_vec(nat8);
        }
        Value::Opt(None) => {
            // `opt null` is the least committed optional type.
            let null = arena.push_type(Type::Null)?;
            return arena.ty_opt(null);
        }
        Value::Opt(Some(inner)) => {
            let inner = infer_type(arena, inner, depth + 1)?;
            return arena.ty_opt(inner);
        }
        Value::Vec(range) => {
            let elements = arena.value_ids(range)?.to_vec();
            let elem_ty = match elements.first() {
                // An empty vector commits to nothing.
                None => arena.push_type(Type::Empty)?,
                Some(&first) => infer_type(arena, first, depth + 1)?,
            };
            return arena.ty_vec(elem_ty);
        }
        Value::Record(range) => {
            let value_fields = arena.value_fields(range)?.to_vec();
            let mut type_fields = Vec::with_capacity(value_fields.len());
            for ValueField { label, value } in value_fields {
                let ty = infer_type(arena, value, depth + 1)?;
                type_fields.push(crate::types::TypeField { label, ty });
            }
            return arena.ty_record(&type_fields);
        }
        Value::Variant { .. } | Value::FuncRef { .. } | Value::ServiceRef(_) => {
            return Err(Error::InvalidArg)
        }
    };
    arena.push_type(ty)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_text_message() {
        let mut arena = Arena::new();
        let mut builder = Builder::new(&mut arena);
        builder.arg_text("hello").unwrap();
        assert_eq!(
            builder.serialize().unwrap(),
            [
                0x44, 0x49, 0x44, 0x4C, // magic
                0x00, // empty table
                0x01, 0x71, // one arg: text
                0x05, b'h', b'e', b'l', b'l', b'o',
            ]
        );
    }

    #[test]
    fn empty_message_is_just_header() {
        let mut arena = Arena::new();
        let builder = Builder::new(&mut arena);
        assert_eq!(
            builder.serialize().unwrap(),
            [0x44, 0x49, 0x44, 0x4C, 0x00, 0x00]
        );
    }

    #[test]
    fn none_infers_opt_null() {
        let mut arena = Arena::new();
        let mut builder = Builder::new(&mut arena);
        let none = builder.arena().val_opt(None).unwrap();
        builder.arg_value(none).unwrap();
        // Table: one entry `opt null`; payload: absent flag.
        assert_eq!(
            builder.serialize().unwrap(),
            [0x44, 0x49, 0x44, 0x4C, 0x01, 0x6E, 0x7F, 0x01, 0x00, 0x00]
        );
    }

    #[test]
    fn empty_vec_infers_vec_empty() {
        let mut arena = Arena::new();
        let mut builder = Builder::new(&mut arena);
        let empty = builder.arena().val_vec(&[]).unwrap();
        builder.arg_value(empty).unwrap();
        assert_eq!(
            builder.serialize().unwrap(),
            [0x44, 0x49, 0x44, 0x4C, 0x01, 0x6D, 0x6F, 0x01, 0x00, 0x00]
        );
    }

    #[test]
    fn variant_cannot_be_inferred() {
        let mut arena = Arena::new();
        let payload = arena.push_value(Value::Null).unwrap();
        let field = ValueField {
            label: crate::types::Label::id(0),
            value: payload,
        };
        let value = arena.val_variant(0, field).unwrap();
        let mut builder = Builder::new(&mut arena);
        assert!(builder.arg_value(value).is_err());
    }
}
