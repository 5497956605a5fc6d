//! Purpose: Define the stable public Rust API boundary for jsongate.
//! Exports: Limit configuration, the gate, token sources, and failure types.
//! Role: Public, additive-only surface; hides internal scanning modules.
//! Invariants: This module is the only public path to the validator core.
//! Invariants: Internal modules remain private and are not directly exposed.

mod gate;
mod report;

#[doc(hidden)]
pub use crate::core::error::to_exit_code;
pub use crate::core::error::{Violation, ViolationKind};
pub use crate::core::lexer::{JsonLexer, LexError};
pub use crate::core::limits::Limits;
pub use crate::core::token::{Token, TokenSource};
pub use gate::{Gate, ScanResult};
pub use report::Rejection;
