// Copyright 2026 the Candid Wire Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! `candid_wire`: an arena-backed codec for the Candid binary wire format.
//!
//! Messages are self-describing: a `DIDL` header carries a type table
//! describing every compound type in the payload, followed by the argument
//! values themselves. This crate builds and parses that format around a
//! packed [`arena::Arena`] — types and values are integer-indexed nodes, so
//! recursive types are plain index cycles and a whole message graph is
//! released in one free.
//!
//! ## Example
//!
//! ```
//! extern crate alloc;
//!
//! use candid_wire::arena::Arena;
//! use candid_wire::builder::Builder;
//! use candid_wire::de::Deserializer;
//! use candid_wire::value::Value;
//!
//! let mut arena = Arena::new();
//! let mut builder = Builder::new(&mut arena);
//! builder.arg_text("hello")?;
//! builder.arg_nat(42)?;
//! let bytes = builder.serialize()?;
//!
//! let mut arena = Arena::new();
//! let mut de = Deserializer::new(&mut arena, &bytes)?;
//! let (_, first) = de.next()?;
//! let Value::Text(range) = de.arena().value(first)? else {
//!     unreachable!()
//! };
//! assert_eq!(de.arena().str_slice(range)?, "hello");
//! de.done()?;
//! # Ok::<(), candid_wire::format::Error>(())
//! ```

#![no_std]

extern crate alloc;

pub mod arena;
pub mod builder;
pub mod de;
pub mod format;
pub mod hash;
pub mod pretty;
pub mod ser;
pub mod subtype;
pub mod table;
pub mod types;
pub mod value;

/// The four magic bytes opening every message.
pub const MAGIC: [u8; 4] = *b"DIDL";

/// Maximum nesting depth for types and values. Deeper structures fail
/// with [`format::Error::Alloc`] on both the encode and decode paths.
pub const MAX_DEPTH: usize = 512;
