// Copyright 2026 the Candid Wire Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Type-directed value serialization.
//!
//! Every value is written under an explicit type; the serializer checks at
//! each step that the value's shape matches the type and rejects mismatches
//! rather than guessing. Payload sections carry no tags of their own, so
//! this pairing is what makes the bytes decodable.

use crate::arena::{Arena, TypeId, ValueId};
use crate::format::{Error, Writer};
use crate::types::{Type, TypeEnv};
use crate::value::Value;
use crate::MAX_DEPTH;

/// Writes `value` under `ty` into `out`.
pub fn write_value(
    out: &mut Writer,
    arena: &Arena,
    env: &TypeEnv,
    ty: TypeId,
    value: ValueId,
) -> Result<(), Error> {
    write_value_at(out, arena, env, ty, value, 0)
}

fn write_value_at(
    out: &mut Writer,
    arena: &Arena,
    env: &TypeEnv,
    ty: TypeId,
    value: ValueId,
    depth: usize,
) -> Result<(), Error> {
    // Arena type graphs may contain cycles.
    if depth >= MAX_DEPTH {
        return Err(Error::Alloc);
    }
    let resolved = env.trace(arena, ty)?;
    let ty = arena.ty(resolved)?;
    let val = arena.value(value)?;

    // reserved swallows any value and writes nothing.
    if let Type::Reserved = ty {
        return Ok(());
    }

    match (ty, val) {
        (Type::Null, Value::Null) => {}
        (Type::Bool, Value::Bool(b)) => out.write_u8(u8::from(b)),
        (Type::Nat, Value::Nat(raw)) => out.write_bytes(arena.bytes(raw)?),
        (Type::Int, Value::Int(raw)) => out.write_bytes(arena.bytes(raw)?),
        (Type::Nat8, Value::Nat8(x)) => out.write_u8(x),
        (Type::Nat16, Value::Nat16(x)) => out.write_u16_le(x),
        (Type::Nat32, Value::Nat32(x)) => out.write_u32_le(x),
        (Type::Nat64, Value::Nat64(x)) => out.write_u64_le(x),
        (Type::Int8, Value::Int8(x)) => out.write_u8(x as u8),
        (Type::Int16, Value::Int16(x)) => out.write_u16_le(x as u16),
        (Type::Int32, Value::Int32(x)) => out.write_u32_le(x as u32),
        (Type::Int64, Value::Int64(x)) => out.write_u64_le(x as u64),
        (Type::Float32, Value::Float32(x)) => out.write_u32_le(x.to_bits()),
        (Type::Float64, Value::Float64(x)) => out.write_u64_le(x.to_bits()),
        (Type::Text, Value::Text(range)) => {
            let bytes = arena.bytes(range)?;
            out.write_uleb128_u64(bytes.len() as u64);
            out.write_bytes(bytes);
        }
        (Type::Principal, Value::Principal(range)) => {
            write_principal(out, arena.bytes(range)?);
        }
        (Type::Opt(_), Value::Opt(None)) => out.write_u8(0x00),
        (Type::Opt(inner), Value::Opt(Some(payload))) => {
            out.write_u8(0x01);
            write_value_at(out, arena, env, inner, payload, depth + 1)?;
        }
        (Type::Vec(inner), Value::Blob(range)) => {
            // A blob is only valid under vec nat8.
            let elem = env.trace(arena, inner)?;
            if arena.ty(elem)? != Type::Nat8 {
                return Err(Error::InvalidArg);
            }
            let bytes = arena.bytes(range)?;
            out.write_uleb128_u64(bytes.len() as u64);
            out.write_bytes(bytes);
        }
        (Type::Vec(inner), Value::Vec(range)) => {
            let elements = arena.value_ids(range)?;
            out.write_uleb128_u64(elements.len() as u64);
            for &element in elements {
                write_value_at(out, arena, env, inner, element, depth + 1)?;
            }
        }
        (Type::Record(type_fields), Value::Record(value_fields)) => {
            let type_fields = arena.type_fields(type_fields)?;
            let value_fields = arena.value_fields(value_fields)?;
            if type_fields.len() != value_fields.len() {
                return Err(Error::InvalidArg);
            }
            for (tf, vf) in type_fields.iter().zip(value_fields) {
                if tf.label.hash != vf.label.hash {
                    return Err(Error::InvalidArg);
                }
                write_value_at(out, arena, env, tf.ty, vf.value, depth + 1)?;
            }
        }
        (Type::Variant(arms), Value::Variant { index, field }) => {
            let arms = arena.type_fields(arms)?;
            let arm = usize::try_from(index)
                .ok()
                .and_then(|i| arms.get(i))
                .ok_or(Error::InvalidArg)?;
            if arm.label.hash != field.label.hash {
                return Err(Error::InvalidArg);
            }
            out.write_uleb128_u64(index);
            write_value_at(out, arena, env, arm.ty, field.value, depth + 1)?;
        }
        (Type::Func(_), Value::FuncRef { principal, method }) => {
            write_principal(out, arena.bytes(principal)?);
            let method = arena.bytes(method)?;
            out.write_uleb128_u64(method.len() as u64);
            out.write_bytes(method);
        }
        (Type::Service(_), Value::ServiceRef(principal)) => {
            write_principal(out, arena.bytes(principal)?);
        }
        // empty has no values; everything else is a shape mismatch.
        _ => return Err(Error::InvalidArg),
    }
    Ok(())
}

fn write_principal(out: &mut Writer, payload: &[u8]) {
    out.write_u8(0x01);
    out.write_uleb128_u64(payload.len() as u64);
    out.write_bytes(payload);
}
