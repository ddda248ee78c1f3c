//! Test helpers and factories, mirroring the teacher's
//! `backend/shared/src/testing` module (§F of SPEC_FULL.md). Gated behind
//! `#[cfg(test)]` in `lib.rs` — there is no externally-facing `tests/`
//! crate here, so this stays private to the crate's own unit tests.

pub mod factories;
pub mod helpers;

pub use factories::*;
pub use helpers::*;
