// Copyright 2026 the Candid Wire Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

#![allow(missing_docs, reason = "integration test crate")]

use candid_wire::arena::Arena;
use candid_wire::builder::Builder;
use candid_wire::de::{DecoderConfig, Deserializer};
use candid_wire::format::{write_sleb128_i64, write_uleb128_u64, Error, Reader};
use candid_wire::hash::field_hash;
use candid_wire::pretty::{type_to_text, value_to_text};
use candid_wire::subtype::is_subtype;
use candid_wire::types::{FuncMode, Label, Type, TypeEnv, TypeField};
use candid_wire::value::{Value, ValueField};

use pretty_assertions::assert_eq;

#[test]
fn golden_single_text_message() {
    let mut arena = Arena::new();
    let mut builder = Builder::new(&mut arena);
    builder.arg_text("hello").unwrap();

    // This test is intentionally strict: it locks in the header and payload
    // encoding for the simplest message as a regression signal.
    let expected: &[u8] = &[
        0x44, 0x49, 0x44, 0x4C, // magic "DIDL"
        0x00, // empty type table
        0x01, 0x71, // one argument: text
        0x05, b'h', b'e', b'l', b'l', b'o',
    ];
    assert_eq!(builder.serialize().unwrap(), expected);
}

#[test]
fn golden_named_record_message() {
    let mut arena = Arena::new();
    let text = arena.push_type(Type::Text).unwrap();
    let nat32 = arena.push_type(Type::Nat32).unwrap();
    let name = Label::named(&mut arena, "name").unwrap();
    let age = Label::named(&mut arena, "age").unwrap();
    let record_ty = arena
        .ty_record(&[
            TypeField { label: name, ty: text },
            TypeField { label: age, ty: nat32 },
        ])
        .unwrap();
    let v_name = arena.val_text("a").unwrap();
    let v_age = arena.push_value(Value::Nat32(7)).unwrap();
    let record = arena
        .val_record(&[
            ValueField { label: name, value: v_name },
            ValueField { label: age, value: v_age },
        ])
        .unwrap();

    let mut builder = Builder::new(&mut arena);
    builder.arg(record_ty, record).unwrap();

    let mut expected = vec![0x44, 0x49, 0x44, 0x4C];
    expected.push(0x01); // one table entry
    write_sleb128_i64(&mut expected, -20); // record
    expected.push(0x02); // two fields, ascending hash
    write_uleb128_u64(&mut expected, u64::from(field_hash("age")));
    write_sleb128_i64(&mut expected, -7); // nat32
    write_uleb128_u64(&mut expected, u64::from(field_hash("name")));
    write_sleb128_i64(&mut expected, -15); // text
    expected.extend_from_slice(&[0x01, 0x00]); // one arg, table index 0
    expected.extend_from_slice(&[0x07, 0x00, 0x00, 0x00]); // age, little endian
    expected.extend_from_slice(&[0x01, b'a']); // name
    assert_eq!(builder.serialize().unwrap(), expected);
}

#[test]
fn golden_option_values() {
    let mut arena = Arena::new();
    let nat = arena.push_type(Type::Nat).unwrap();
    let opt = arena.ty_opt(nat).unwrap();
    let none = arena.val_opt(None).unwrap();
    let zero = arena.val_nat(0).unwrap();
    let some = arena.val_opt(Some(zero)).unwrap();

    let mut builder = Builder::new(&mut arena);
    builder.arg(opt, none).unwrap();
    builder.arg(opt, some).unwrap();

    let expected: &[u8] = &[
        0x44, 0x49, 0x44, 0x4C, // magic
        0x01, 0x6E, 0x7D, // table: opt nat
        0x02, 0x00, 0x00, // two args, both index 0
        0x00, // none
        0x01, 0x00, // some 0
    ];
    assert_eq!(builder.serialize().unwrap(), expected);

    let mut arena2 = Arena::new();
    let mut de = Deserializer::new(&mut arena2, expected).unwrap();
    let (_, first) = de.next().unwrap();
    assert_eq!(de.arena().value(first).unwrap(), Value::Opt(None));
    let (_, second) = de.next().unwrap();
    let Value::Opt(Some(inner)) = de.arena().value(second).unwrap() else {
        panic!("expected some");
    };
    let Value::Nat(raw) = de.arena().value(inner).unwrap() else {
        panic!("expected nat");
    };
    assert_eq!(de.arena().bytes(raw).unwrap(), [0x00]);
    de.done().unwrap();
}

#[test]
fn recursive_list_roundtrips() {
    // type list = opt record { head : nat; tail : list }
    let mut arena = Arena::new();
    let mut env = TypeEnv::new();
    let nat = arena.push_type(Type::Nat).unwrap();
    let list_ref = arena.ty_var("list").unwrap();
    let head = Label::named(&mut arena, "head").unwrap();
    let tail = Label::named(&mut arena, "tail").unwrap();
    let node_ty = arena
        .ty_record(&[
            TypeField { label: head, ty: nat },
            TypeField { label: tail, ty: list_ref },
        ])
        .unwrap();
    let list_ty = arena.ty_opt(node_ty).unwrap();
    env.insert("list", list_ty).unwrap();

    // [1, 2]
    let nil = arena.val_opt(None).unwrap();
    let two = arena.val_nat(2).unwrap();
    let node2 = arena
        .val_record(&[
            ValueField { label: head, value: two },
            ValueField { label: tail, value: nil },
        ])
        .unwrap();
    let cell2 = arena.val_opt(Some(node2)).unwrap();
    let one = arena.val_nat(1).unwrap();
    let node1 = arena
        .val_record(&[
            ValueField { label: head, value: one },
            ValueField { label: tail, value: cell2 },
        ])
        .unwrap();
    let cell1 = arena.val_opt(Some(node1)).unwrap();

    let mut builder = Builder::with_env(&mut arena, env);
    builder.arg(list_ty, cell1).unwrap();
    let bytes = builder.serialize().unwrap();

    let mut arena2 = Arena::new();
    let mut de = Deserializer::new(&mut arena2, &bytes).unwrap();
    let (wire_ty, value) = de.next().unwrap();

    // The decoded table knots the recursion back into itself.
    assert_eq!(type_to_text(de.arena(), wire_ty).unwrap(), "opt record { 1158359328 : nat; 1291237008 : ... }");

    let mut heads = Vec::new();
    let mut cursor = value;
    loop {
        match de.arena().value(cursor).unwrap() {
            Value::Opt(None) => break,
            Value::Opt(Some(node)) => {
                let Value::Record(fields) = de.arena().value(node).unwrap() else {
                    panic!("expected record");
                };
                let fields = de.arena().value_fields(fields).unwrap();
                let Value::Nat(raw) = de.arena().value(fields[0].value).unwrap() else {
                    panic!("expected nat head");
                };
                let head = Reader::new(de.arena().bytes(raw).unwrap())
                    .read_uleb128_u64()
                    .unwrap();
                heads.push(head);
                cursor = fields[1].value;
            }
            other => panic!("unexpected node {other:?}"),
        }
    }
    assert_eq!(heads, [1, 2]);
    de.done().unwrap();
}

#[test]
fn service_reference_roundtrips() {
    let mut arena = Arena::new();
    let text = arena.push_type(Type::Text).unwrap();
    let func_ty = arena.ty_func(&[text], &[text], &[FuncMode::Query]).unwrap();
    let service_ty = arena
        .ty_service(&[("get", func_ty), ("head", func_ty), ("post", func_ty)])
        .unwrap();
    let principal = [0x00, 0x01, 0x02];
    let service_val = arena.val_service(&principal).unwrap();

    let mut builder = Builder::new(&mut arena);
    builder.arg(service_ty, service_val).unwrap();
    let bytes = builder.serialize().unwrap();

    let mut arena2 = Arena::new();
    let mut de = Deserializer::new(&mut arena2, &bytes).unwrap();
    let (wire_ty, value) = de.next().unwrap();
    assert_eq!(
        type_to_text(de.arena(), wire_ty).unwrap(),
        "service { get : func (text) -> (text) query; \
         head : func (text) -> (text) query; \
         post : func (text) -> (text) query }"
    );
    let Value::ServiceRef(range) = de.arena().value(value).unwrap() else {
        panic!("expected service reference");
    };
    assert_eq!(de.arena().bytes(range).unwrap(), principal);
    de.done().unwrap();
}

#[test]
fn func_reference_roundtrips() {
    let mut arena = Arena::new();
    let nat = arena.push_type(Type::Nat).unwrap();
    let func_ty = arena.ty_func(&[nat], &[], &[FuncMode::Oneway]).unwrap();
    let func_val = arena.val_func(&[0xAB, 0xCD], "notify").unwrap();

    let mut builder = Builder::new(&mut arena);
    builder.arg(func_ty, func_val).unwrap();
    let bytes = builder.serialize().unwrap();

    let mut arena2 = Arena::new();
    let mut de = Deserializer::new(&mut arena2, &bytes).unwrap();
    let (_, value) = de.next().unwrap();
    let Value::FuncRef { principal, method } = de.arena().value(value).unwrap() else {
        panic!("expected func reference");
    };
    assert_eq!(de.arena().bytes(principal).unwrap(), [0xAB, 0xCD]);
    assert_eq!(de.arena().str_slice(method).unwrap(), "notify");
    de.done().unwrap();
}

#[test]
fn principal_roundtrips() {
    let payload = [0xEF, 0xCD, 0xAB, 0x02];
    let mut arena = Arena::new();
    let mut builder = Builder::new(&mut arena);
    builder.arg_principal(&payload).unwrap();
    let bytes = builder.serialize().unwrap();

    // principal opcode, then the transparent form: flag, length, payload.
    let expected = [
        0x44, 0x49, 0x44, 0x4C, 0x00, 0x01, 0x68, 0x01, 0x04, 0xEF, 0xCD, 0xAB, 0x02,
    ];
    assert_eq!(bytes, expected);

    let mut arena2 = Arena::new();
    let mut de = Deserializer::new(&mut arena2, &bytes).unwrap();
    let (ty, value) = de.next().unwrap();
    assert_eq!(de.arena().ty(ty).unwrap(), Type::Principal);
    let Value::Principal(range) = de.arena().value(value).unwrap() else {
        panic!("expected principal");
    };
    assert_eq!(de.arena().bytes(range).unwrap(), payload);
    de.done().unwrap();
}

#[test]
fn decode_at_expected_type_accepts_width_subtyping() {
    // Encode record { a : nat; b : text }.
    let mut arena = Arena::new();
    let nat = arena.push_type(Type::Nat).unwrap();
    let text = arena.push_type(Type::Text).unwrap();
    let a = Label::named(&mut arena, "a").unwrap();
    let b = Label::named(&mut arena, "b").unwrap();
    let wide = arena
        .ty_record(&[
            TypeField { label: a, ty: nat },
            TypeField { label: b, ty: text },
        ])
        .unwrap();
    let v_a = arena.val_nat(5).unwrap();
    let v_b = arena.val_text("x").unwrap();
    let record = arena
        .val_record(&[
            ValueField { label: a, value: v_a },
            ValueField { label: b, value: v_b },
        ])
        .unwrap();
    let mut builder = Builder::new(&mut arena);
    builder.arg(wide, record).unwrap();
    let bytes = builder.serialize().unwrap();

    // Expected types live in the same arena as the decoded table, so build
    // them before handing the arena to the decoder.
    let mut arena3 = Arena::new();
    let a3 = Label::named(&mut arena3, "a").unwrap();
    let int3 = arena3.push_type(Type::Int).unwrap();
    let narrow3 = arena3
        .ty_record(&[TypeField { label: a3, ty: int3 }])
        .unwrap();
    let c3 = Label::named(&mut arena3, "c").unwrap();
    let text3 = arena3.push_type(Type::Text).unwrap();
    let needs_c = arena3
        .ty_record(&[
            TypeField { label: a3, ty: int3 },
            TypeField { label: c3, ty: text3 },
        ])
        .unwrap();

    let env = TypeEnv::new();
    let mut de = Deserializer::new(&mut arena3, &bytes).unwrap();
    let value = de.next_with_type(&env, narrow3).unwrap();
    let Value::Record(_) = de.arena().value(value).unwrap() else {
        panic!("expected record");
    };
    de.done().unwrap();

    // Expecting a required field the message lacks: rejected.
    let mut de = Deserializer::new(&mut arena3, &bytes).unwrap();
    assert_eq!(de.next_with_type(&env, needs_c), Err(Error::InvalidArg));
}

#[test]
fn field_declaration_order_does_not_change_bytes() {
    let encode = |first_name: bool| {
        let mut arena = Arena::new();
        let text = arena.push_type(Type::Text).unwrap();
        let nat = arena.push_type(Type::Nat).unwrap();
        let name = Label::named(&mut arena, "name").unwrap();
        let age = Label::named(&mut arena, "age").unwrap();
        let fields_ty = if first_name {
            [TypeField { label: name, ty: text }, TypeField { label: age, ty: nat }]
        } else {
            [TypeField { label: age, ty: nat }, TypeField { label: name, ty: text }]
        };
        let ty = arena.ty_record(&fields_ty).unwrap();
        let v_name = arena.val_text("z").unwrap();
        let v_age = arena.val_nat(1).unwrap();
        let fields_val = if first_name {
            [
                ValueField { label: name, value: v_name },
                ValueField { label: age, value: v_age },
            ]
        } else {
            [
                ValueField { label: age, value: v_age },
                ValueField { label: name, value: v_name },
            ]
        };
        let value = arena.val_record(&fields_val).unwrap();
        let mut builder = Builder::new(&mut arena);
        builder.arg(ty, value).unwrap();
        builder.serialize().unwrap()
    };
    assert_eq!(encode(true), encode(false));
}

#[test]
fn rejects_malformed_messages() {
    let cases: &[(&[u8], Error)] = &[
        // Wrong magic.
        (b"DIDX\x00\x00", Error::InvalidArg),
        // Table count larger than the input.
        (&[0x44, 0x49, 0x44, 0x4C, 0xFF, 0x7F], Error::Truncated),
        // Argument referencing a table index that does not exist.
        (&[0x44, 0x49, 0x44, 0x4C, 0x00, 0x01, 0x05], Error::InvalidArg),
        // A primitive opcode heading a table entry.
        (&[0x44, 0x49, 0x44, 0x4C, 0x01, 0x7D, 0x00, 0x00], Error::InvalidArg),
        // Func entry carrying two annotation modes.
        (
            &[0x44, 0x49, 0x44, 0x4C, 0x01, 0x6A, 0x00, 0x00, 0x02, 0x01, 0x02, 0x00, 0x00],
            Error::InvalidArg,
        ),
        // Service entry with unsorted method names.
        (
            &[
                0x44, 0x49, 0x44, 0x4C, 0x02, // two entries
                0x6A, 0x00, 0x00, 0x00, // func () -> ()
                0x69, 0x02, 0x01, b'b', 0x00, 0x01, b'a', 0x00, // service { b; a }
                0x00, 0x00, // no args
            ],
            Error::InvalidArg,
        ),
    ];
    for (bytes, expected) in cases {
        let mut arena = Arena::new();
        let result = Deserializer::new(&mut arena, bytes).map(|_| ());
        assert_eq!(result.unwrap_err(), *expected, "input {bytes:02X?}");
    }
}

#[test]
fn rejects_truncated_payloads() {
    let mut arena = Arena::new();
    let mut builder = Builder::new(&mut arena);
    builder.arg_text("truncate me").unwrap();
    builder.arg_nat(1_000_000).unwrap();
    let bytes = builder.serialize().unwrap();

    // Every strict prefix either fails to parse or fails to drain.
    for len in 0..bytes.len() {
        let mut arena = Arena::new();
        let result = Deserializer::new(&mut arena, &bytes[..len]).and_then(|de| de.done());
        assert!(result.is_err(), "prefix of {len} bytes was accepted");
    }
}

#[test]
fn decoding_quota_bounds_work() {
    let mut arena = Arena::new();
    let mut builder = Builder::new(&mut arena);
    let elements: Vec<_> = (0..64)
        .map(|i| builder.arena().val_nat(i).unwrap())
        .collect();
    let vec_val = builder.arena().val_vec(&elements).unwrap();
    builder.arg_value(vec_val).unwrap();
    let bytes = builder.serialize().unwrap();

    let tight = DecoderConfig { decoding_quota: Some(64) };
    let mut arena2 = Arena::new();
    let result = Deserializer::with_config(&mut arena2, &bytes, tight)
        .and_then(|mut de| de.next().map(|_| ()));
    assert_eq!(result.unwrap_err(), Error::Alloc);

    let roomy = DecoderConfig { decoding_quota: Some(10_000) };
    let mut arena3 = Arena::new();
    let de = Deserializer::with_config(&mut arena3, &bytes, roomy).unwrap();
    de.done().unwrap();
}

#[test]
fn nat_int_subtype_accepted_on_decode() {
    let mut arena = Arena::new();
    let mut builder = Builder::new(&mut arena);
    builder.arg_nat(7).unwrap();
    let bytes = builder.serialize().unwrap();

    let mut arena2 = Arena::new();
    let int = arena2.push_type(Type::Int).unwrap();
    let env = TypeEnv::new();
    let mut de = Deserializer::new(&mut arena2, &bytes).unwrap();
    let value = de.next_with_type(&env, int).unwrap();
    assert!(matches!(de.arena().value(value).unwrap(), Value::Nat(_)));
    de.done().unwrap();
}

#[test]
fn pretty_output_is_stable() {
    let mut arena = Arena::new();
    let bool_ty = arena.push_type(Type::Bool).unwrap();
    let opt_ty = arena.ty_opt(bool_ty).unwrap();
    assert_eq!(type_to_text(&arena, opt_ty).unwrap(), "opt bool");

    let v = arena.push_value(Value::Bool(true)).unwrap();
    let some = arena.val_opt(Some(v)).unwrap();
    assert_eq!(value_to_text(&arena, some).unwrap(), "opt true");
}

#[test]
fn subtype_relation_spot_checks() {
    let mut arena = Arena::new();
    let env = TypeEnv::new();
    let nat = arena.push_type(Type::Nat).unwrap();
    let int = arena.push_type(Type::Int).unwrap();
    let reserved = arena.push_type(Type::Reserved).unwrap();
    let empty = arena.push_type(Type::Empty).unwrap();
    let opt_int = arena.ty_opt(int).unwrap();
    assert!(is_subtype(&arena, &env, nat, int).unwrap());
    assert!(is_subtype(&arena, &env, nat, reserved).unwrap());
    assert!(is_subtype(&arena, &env, empty, nat).unwrap());
    assert!(is_subtype(&arena, &env, nat, opt_int).unwrap());
    assert!(!is_subtype(&arena, &env, int, nat).unwrap());
}

mod props {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn uleb128_roundtrips(value: u64) {
            let mut buf = Vec::new();
            write_uleb128_u64(&mut buf, value);
            let mut offset = 0;
            let back = candid_wire::format::read_uleb128_u64(&buf, &mut offset).unwrap();
            prop_assert_eq!(back, value);
            prop_assert_eq!(offset, buf.len());
        }

        #[test]
        fn sleb128_roundtrips(value: i64) {
            let mut buf = Vec::new();
            write_sleb128_i64(&mut buf, value);
            let mut offset = 0;
            let back = candid_wire::format::read_sleb128_i64(&buf, &mut offset).unwrap();
            prop_assert_eq!(back, value);
            prop_assert_eq!(offset, buf.len());
        }

        #[test]
        fn text_arguments_roundtrip(texts in proptest::collection::vec(".*", 0..8)) {
            let mut arena = Arena::new();
            let mut builder = Builder::new(&mut arena);
            for text in &texts {
                builder.arg_text(text).unwrap();
            }
            let bytes = builder.serialize().unwrap();

            let mut arena2 = Arena::new();
            let mut de = Deserializer::new(&mut arena2, &bytes).unwrap();
            for text in &texts {
                let (_, value) = de.next().unwrap();
                let Value::Text(range) = de.arena().value(value).unwrap() else {
                    panic!("expected text");
                };
                prop_assert_eq!(de.arena().str_slice(range).unwrap(), text.as_str());
            }
            de.done().unwrap();
        }

        #[test]
        fn arbitrary_input_never_panics(bytes in proptest::collection::vec(any::<u8>(), 0..256)) {
            let mut arena = Arena::new();
            let _ = Deserializer::new(&mut arena, &bytes).and_then(|de| de.done());
        }
    }
}
