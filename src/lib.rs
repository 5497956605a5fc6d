//! Purpose: Shared core library crate used by the `jsongate` CLI and tests.
//! Exports: `api` (limits, gate, token sources, violations, rejection reports).
//! Role: Streaming structural validation for untrusted JSON payloads.
//! Invariants: `api` is the stable surface; internal modules stay private.
//! Invariants: Core modules prefer explicit inputs/outputs over hidden state.
pub mod api;

mod core;
