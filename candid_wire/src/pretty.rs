// Copyright 2026 the Candid Wire Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Textual rendering of types and values for diagnostics.
//!
//! The output follows the Candid textual syntax closely enough to read in
//! logs and test failures; it is not a parseable interchange format.
//! Principals and oversized integers render as hex.

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt::Write as _;

use crate::arena::{Arena, ByteRange, TypeId, ValueId};
use crate::format::{Error, Reader};
use crate::types::{Label, Type};
use crate::value::Value;
use crate::MAX_DEPTH;

/// Renders a type as text.
pub fn type_to_text(arena: &Arena, ty: TypeId) -> Result<String, Error> {
    let mut out = String::new();
    let mut in_progress = Vec::new();
    write_type(&mut out, arena, &mut in_progress, ty)?;
    Ok(out)
}

/// Renders a value as text.
pub fn value_to_text(arena: &Arena, value: ValueId) -> Result<String, Error> {
    let mut out = String::new();
    write_value(&mut out, arena, value, 0)?;
    Ok(out)
}

fn write_type(
    out: &mut String,
    arena: &Arena,
    in_progress: &mut Vec<TypeId>,
    ty: TypeId,
) -> Result<(), Error> {
    let node = arena.ty(ty)?;
    let name = match node {
        Type::Null => "null",
        Type::Bool => "bool",
        Type::Nat => "nat",
        Type::Int => "int",
        Type::Nat8 => "nat8",
        Type::Nat16 => "nat16",
        Type::Nat32 => "nat32",
        Type::Nat64 => "nat64",
        Type::Int8 => "int8",
        Type::Int16 => "int16",
        Type::Int32 => "int32",
        Type::Int64 => "int64",
        Type::Float32 => "float32",
        Type::Float64 => "float64",
        Type::Text => "text",
        Type::Reserved => "reserved",
        Type::Empty => "empty",
        Type::Principal => "principal",
        _ => "",
    };
    if !name.is_empty() {
        out.push_str(name);
        return Ok(());
    }
    if let Type::Var(range) = node {
        out.push_str(arena.str_slice(range)?);
        return Ok(());
    }
    // Anonymous cycles (decoded tables) print an ellipsis at the knot.
    if in_progress.contains(&ty) {
        out.push_str("...");
        return Ok(());
    }
    if in_progress.len() >= MAX_DEPTH {
        return Err(Error::Alloc);
    }
    in_progress.push(ty);
    match node {
        Type::Opt(inner) => {
            out.push_str("opt ");
            write_type(out, arena, in_progress, inner)?;
        }
        Type::Vec(inner) => {
            out.push_str("vec ");
            write_type(out, arena, in_progress, inner)?;
        }
        Type::Record(fields) | Type::Variant(fields) => {
            out.push_str(if matches!(node, Type::Record(_)) {
                "record {"
            } else {
                "variant {"
            });
            for (i, field) in arena.type_fields(fields)?.iter().enumerate() {
                out.push_str(if i == 0 { " " } else { "; " });
                write_label(out, arena, field.label)?;
                out.push_str(" : ");
                write_type(out, arena, in_progress, field.ty)?;
            }
            out.push_str(" }");
        }
        Type::Func(func) => {
            out.push_str("func (");
            for (i, &arg) in arena.type_ids(func.args)?.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_type(out, arena, in_progress, arg)?;
            }
            out.push_str(") -> (");
            for (i, &ret) in arena.type_ids(func.rets)?.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_type(out, arena, in_progress, ret)?;
            }
            out.push(')');
            for mode in arena.func_modes(func.modes)? {
                out.push_str(match mode {
                    crate::types::FuncMode::Query => " query",
                    crate::types::FuncMode::Oneway => " oneway",
                    crate::types::FuncMode::CompositeQuery => " composite_query",
                });
            }
        }
        Type::Service(methods) => {
            out.push_str("service {");
            for (i, method) in arena.methods(methods)?.iter().enumerate() {
                out.push_str(if i == 0 { " " } else { "; " });
                out.push_str(arena.str_slice(method.name)?);
                out.push_str(" : ");
                write_type(out, arena, in_progress, method.ty)?;
            }
            out.push_str(" }");
        }
        _ => {}
    }
    in_progress.pop();
    Ok(())
}

fn write_label(out: &mut String, arena: &Arena, label: Label) -> Result<(), Error> {
    match label.name {
        Some(range) => out.push_str(arena.str_slice(range)?),
        None => {
            let _ = write!(out, "{}", label.hash);
        }
    }
    Ok(())
}

fn write_value(out: &mut String, arena: &Arena, value: ValueId, depth: usize) -> Result<(), Error> {
    if depth >= MAX_DEPTH {
        return Err(Error::Alloc);
    }
    match arena.value(value)? {
        Value::Null => out.push_str("null"),
        Value::Reserved => out.push_str("reserved"),
        Value::Bool(b) => out.push_str(if b { "true" } else { "false" }),
        Value::Nat(raw) => write_leb_unsigned(out, arena, raw)?,
        Value::Int(raw) => write_leb_signed(out, arena, raw)?,
        Value::Nat8(x) => {
            let _ = write!(out, "{x}");
        }
        Value::Nat16(x) => {
            let _ = write!(out, "{x}");
        }
        Value::Nat32(x) => {
            let _ = write!(out, "{x}");
        }
        Value::Nat64(x) => {
            let _ = write!(out, "{x}");
        }
        Value::Int8(x) => {
            let _ = write!(out, "{x}");
        }
        Value::Int16(x) => {
            let _ = write!(out, "{x}");
        }
        Value::Int32(x) => {
            let _ = write!(out, "{x}");
        }
        Value::Int64(x) => {
            let _ = write!(out, "{x}");
        }
        Value::Float32(x) => {
            let _ = write!(out, "{x}");
        }
        Value::Float64(x) => {
            let _ = write!(out, "{x}");
        }
        Value::Text(range) => {
            out.push('"');
            out.push_str(arena.str_slice(range)?);
            out.push('"');
        }
        Value::Blob(range) => {
            out.push_str("blob \"");
            write_hex(out, arena.bytes(range)?);
            out.push('"');
        }
        Value::Principal(range) => {
            out.push_str("principal \"");
            write_hex(out, arena.bytes(range)?);
            out.push('"');
        }
        Value::Opt(None) => out.push_str("null"),
        Value::Opt(Some(inner)) => {
            out.push_str("opt ");
            write_value(out, arena, inner, depth + 1)?;
        }
        Value::Vec(range) => {
            out.push_str("vec {");
            for (i, &element) in arena.value_ids(range)?.iter().enumerate() {
                out.push_str(if i == 0 { " " } else { "; " });
                write_value(out, arena, element, depth + 1)?;
            }
            out.push_str(" }");
        }
        Value::Record(range) => {
            out.push_str("record {");
            for (i, field) in arena.value_fields(range)?.iter().enumerate() {
                out.push_str(if i == 0 { " " } else { "; " });
                write_label(out, arena, field.label)?;
                out.push_str(" = ");
                write_value(out, arena, field.value, depth + 1)?;
            }
            out.push_str(" }");
        }
        Value::Variant { field, .. } => {
            out.push_str("variant { ");
            write_label(out, arena, field.label)?;
            out.push_str(" = ");
            write_value(out, arena, field.value, depth + 1)?;
            out.push_str(" }");
        }
        Value::FuncRef { principal, method } => {
            out.push_str("func \"");
            write_hex(out, arena.bytes(principal)?);
            out.push_str("\".");
            out.push_str(arena.str_slice(method)?);
        }
        Value::ServiceRef(range) => {
            out.push_str("service \"");
            write_hex(out, arena.bytes(range)?);
            out.push('"');
        }
    }
    Ok(())
}

fn write_leb_unsigned(out: &mut String, arena: &Arena, raw: ByteRange) -> Result<(), Error> {
    let bytes = arena.bytes(raw)?;
    match Reader::new(bytes).read_uleb128_u64() {
        Ok(v) => {
            let _ = write!(out, "{v}");
        }
        // Wider than 64 bits: show the raw encoding.
        Err(_) => {
            out.push_str("nat(0x");
            write_hex(out, bytes);
            out.push(')');
        }
    }
    Ok(())
}

fn write_leb_signed(out: &mut String, arena: &Arena, raw: ByteRange) -> Result<(), Error> {
    let bytes = arena.bytes(raw)?;
    match Reader::new(bytes).read_sleb128_i64() {
        Ok(v) => {
            let _ = write!(out, "{v}");
        }
        Err(_) => {
            out.push_str("int(0x");
            write_hex(out, bytes);
            out.push(')');
        }
    }
    Ok(())
}

fn write_hex(out: &mut String, bytes: &[u8]) {
    for byte in bytes {
        let _ = write!(out, "{byte:02x}");
    }
}
