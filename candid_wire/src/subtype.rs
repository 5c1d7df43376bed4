// Copyright 2026 the Candid Wire Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Structural subtyping between type graphs.
//!
//! Implements the upgrade relation used when decoding at an expected type:
//! a message encoded at `sub` is acceptable wherever `sup` is expected.
//! The check is coinductive: a pair of compound types is assumed related
//! while its constituents are examined, so recursive types terminate on the
//! assumption instead of looping.

use alloc::collections::BTreeSet;

use crate::arena::{Arena, TypeId};
use crate::format::Error;
use crate::types::{Type, TypeEnv};
use crate::MAX_DEPTH;

/// Returns whether `sub` is a subtype of `sup`, resolving `Var` references
/// through `env`.
pub fn is_subtype(arena: &Arena, env: &TypeEnv, sub: TypeId, sup: TypeId) -> Result<bool, Error> {
    let mut gamma = BTreeSet::new();
    check(&mut gamma, arena, env, sub, sup, 0)
}

fn check(
    gamma: &mut BTreeSet<(u32, u32)>,
    arena: &Arena,
    env: &TypeEnv,
    sub: TypeId,
    sup: TypeId,
    depth: usize,
) -> Result<bool, Error> {
    if depth >= MAX_DEPTH {
        return Err(Error::Alloc);
    }
    let sub = env.trace(arena, sub)?;
    let sup = env.trace(arena, sup)?;
    let s = arena.ty(sub)?;
    let t = arena.ty(sup)?;

    match (s, t) {
        // Top and bottom of the lattice.
        (_, Type::Reserved) => return Ok(true),
        (Type::Empty, _) => return Ok(true),
        // Every type upgrades into an optional slot; a decoder that cannot
        // relate the constituents falls back to `none`.
        (_, Type::Opt(_)) => return Ok(true),
        (Type::Nat, Type::Int) => return Ok(true),
        _ => {}
    }
    if s == t && s.primitive_opcode().is_some() {
        return Ok(true);
    }

    // Assume the pair holds while examining constituents.
    if !gamma.insert((sub.0, sup.0)) {
        return Ok(true);
    }

    match (s, t) {
        (Type::Vec(a), Type::Vec(b)) => check(gamma, arena, env, a, b, depth + 1),
        (Type::Record(sub_fields), Type::Record(sup_fields)) => {
            let sub_fields = arena.type_fields(sub_fields)?;
            let sup_fields = arena.type_fields(sup_fields)?;
            // Both sides are hash-sorted; walk them as a merge.
            let mut i = 0;
            for sup_field in sup_fields {
                while i < sub_fields.len() && sub_fields[i].label.hash < sup_field.label.hash {
                    i += 1;
                }
                match sub_fields.get(i) {
                    Some(sub_field) if sub_field.label.hash == sup_field.label.hash => {
                        if !check(gamma, arena, env, sub_field.ty, sup_field.ty, depth + 1)? {
                            return Ok(false);
                        }
                    }
                    // A field absent from the message must be one the
                    // expected type can default.
                    _ => {
                        if !is_defaultable(arena, env, sup_field.ty)? {
                            return Ok(false);
                        }
                    }
                }
            }
            Ok(true)
        }
        (Type::Variant(sub_arms), Type::Variant(sup_arms)) => {
            let sub_arms = arena.type_fields(sub_arms)?;
            let sup_arms = arena.type_fields(sup_arms)?;
            let mut i = 0;
            for sub_arm in sub_arms {
                while i < sup_arms.len() && sup_arms[i].label.hash < sub_arm.label.hash {
                    i += 1;
                }
                match sup_arms.get(i) {
                    Some(sup_arm) if sup_arm.label.hash == sub_arm.label.hash => {
                        if !check(gamma, arena, env, sub_arm.ty, sup_arm.ty, depth + 1)? {
                            return Ok(false);
                        }
                    }
                    _ => return Ok(false),
                }
            }
            Ok(true)
        }
        (Type::Func(sub_func), Type::Func(sup_func)) => {
            let sub_modes = arena.func_modes(sub_func.modes)?;
            let sup_modes = arena.func_modes(sup_func.modes)?;
            if sub_modes.len() != sup_modes.len()
                || sub_modes.iter().any(|m| !sup_modes.contains(m))
            {
                return Ok(false);
            }
            // Arguments are contravariant, results covariant.
            let sub_args = arena.type_ids(sub_func.args)?;
            let sup_args = arena.type_ids(sup_func.args)?;
            for (i, &sup_arg) in sup_args.iter().enumerate() {
                match sub_args.get(i) {
                    Some(&sub_arg) => {
                        if !check(gamma, arena, env, sup_arg, sub_arg, depth + 1)? {
                            return Ok(false);
                        }
                    }
                    None => {
                        if !is_defaultable(arena, env, sup_arg)? {
                            return Ok(false);
                        }
                    }
                }
            }
            let sub_rets = arena.type_ids(sub_func.rets)?;
            let sup_rets = arena.type_ids(sup_func.rets)?;
            for (i, &sup_ret) in sup_rets.iter().enumerate() {
                match sub_rets.get(i) {
                    Some(&sub_ret) => {
                        if !check(gamma, arena, env, sub_ret, sup_ret, depth + 1)? {
                            return Ok(false);
                        }
                    }
                    None => {
                        if !is_defaultable(arena, env, sup_ret)? {
                            return Ok(false);
                        }
                    }
                }
            }
            Ok(true)
        }
        (Type::Service(sub_methods), Type::Service(sup_methods)) => {
            let sub_methods = arena.methods(sub_methods)?;
            let sup_methods = arena.methods(sup_methods)?;
            // Both lists are name-sorted.
            let mut i = 0;
            for sup_method in sup_methods {
                let sup_name = arena.bytes(sup_method.name)?;
                while i < sub_methods.len() && arena.bytes(sub_methods[i].name)? < sup_name {
                    i += 1;
                }
                match sub_methods.get(i) {
                    Some(sub_method) if arena.bytes(sub_method.name)? == sup_name => {
                        if !check(gamma, arena, env, sub_method.ty, sup_method.ty, depth + 1)? {
                            return Ok(false);
                        }
                    }
                    _ => return Ok(false),
                }
            }
            Ok(true)
        }
        _ => Ok(false),
    }
}

/// Whether a value of `ty` can be conjured when the message omits it.
fn is_defaultable(arena: &Arena, env: &TypeEnv, ty: TypeId) -> Result<bool, Error> {
    let ty = env.trace(arena, ty)?;
    Ok(matches!(
        arena.ty(ty)?,
        Type::Opt(_) | Type::Reserved | Type::Null
    ))
}
