//! Purpose: Define the host-facing entry points for limit checking.
//! Exports: `Gate`, `ScanResult`.
//! Role: Stable boundary for hosts; one immutable limit bundle, many checks.
//! Invariants: A `Gate` holds no per-call state; concurrent checks share it freely.
//! Invariants: Payload bytes are only borrowed; success leaves them untouched.
//! Invariants: Lexical faults carry a byte offset; limit violations do not.

use std::error::Error as StdError;
use std::io::Read;

use crate::core::error::Violation;
use crate::core::lexer::{JsonLexer, LexError};
use crate::core::limits::Limits;
use crate::core::scan::scan;
use crate::core::token::TokenSource;

pub type ScanResult = Result<(), Violation>;

/// A configured validator. Checks any number of payloads against one set of
/// limits; `Ok(())` means the payload may pass downstream unchanged.
#[derive(Clone, Debug)]
pub struct Gate {
    limits: Limits,
}

impl Gate {
    pub fn new(limits: Limits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    pub fn check_str(&self, payload: &str) -> ScanResult {
        self.check_bytes(payload.as_bytes())
    }

    pub fn check_bytes(&self, payload: &[u8]) -> ScanResult {
        let mut lexer = JsonLexer::from_slice(payload);
        scan(&mut lexer, &self.limits).map_err(lift_lex_offset)
    }

    /// Check a payload as it arrives. Stops pulling from `reader` at the
    /// first violation.
    pub fn check_reader<R: Read>(&self, reader: R) -> ScanResult {
        let mut lexer = JsonLexer::new(reader);
        scan(&mut lexer, &self.limits).map_err(lift_lex_offset)
    }

    /// Check a pre-tokenized stream from a foreign lexer. Foreign sources
    /// have no byte stream, so rejections carry no offset.
    pub fn check_tokens<S: TokenSource>(&self, source: &mut S) -> ScanResult {
        scan(source, &self.limits)
    }
}

// Copy the fault position out of an attached lex error so rejections carry
// it structurally, not only in the cause text.
fn lift_lex_offset(violation: Violation) -> Violation {
    let offset = StdError::source(&violation)
        .and_then(|source| source.downcast_ref::<LexError>())
        .map(LexError::offset);
    match offset {
        Some(offset) => violation.with_offset(offset),
        None => violation,
    }
}
