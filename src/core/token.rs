use std::error::Error as StdError;

/// One lexical event from a JSON document stream. Scalar tokens other than
/// strings are bare markers; the scanner never inspects their text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Token {
    ObjectStart,
    ObjectEnd,
    ArrayStart,
    ArrayEnd,
    FieldName(String),
    StringValue(String),
    Number,
    Bool,
    Null,
}

/// Pull-based token stream over exactly one JSON document.
///
/// `Ok(Some(token))` yields the next event. `Ok(None)` means the document is
/// complete and any trailing bytes were whitespace. `Err` reports a lexical
/// or transport fault. The stream is forward-only and consumed once.
///
/// A conformant source emits balanced structure tokens and distinguishes
/// field names from string values by grammatical position.
pub trait TokenSource {
    type Error: StdError + Send + Sync + 'static;

    fn next_token(&mut self) -> Result<Option<Token>, Self::Error>;
}

impl<S: TokenSource + ?Sized> TokenSource for &mut S {
    type Error = S::Error;

    fn next_token(&mut self) -> Result<Option<Token>, Self::Error> {
        (**self).next_token()
    }
}
