// Copyright 2026 the Candid Wire Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Benchmarks for `candid_wire` live under `benches/`.
