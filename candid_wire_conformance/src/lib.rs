// Copyright 2026 the Candid Wire Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Conformance tests for `candid_wire` live under `tests/`.
