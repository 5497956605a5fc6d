//! Purpose: Provide the default streaming tokenizer over one JSON document.
//! Exports: `JsonLexer`, `LexError`.
//! Role: Reference `TokenSource` for byte slices and incremental readers.
//! Invariants: Input is pulled chunk by chunk; nothing is read past a fault.
//! Invariants: Container bookkeeping is an explicit scope stack, never recursion.
//! Invariants: Errors carry the byte offset where lexing stopped.

use std::error::Error as StdError;
use std::fmt;
use std::io::{self, Read};

use crate::core::token::{Token, TokenSource};

const READ_CHUNK: usize = 8 * 1024;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LexError {
    message: String,
    offset: u64,
}

impl LexError {
    fn new(message: impl Into<String>, offset: u64) -> Self {
        Self {
            message: message.into(),
            offset,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at byte {}", self.message, self.offset)
    }
}

impl StdError for LexError {}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Scope {
    Object(ObjectExpect),
    Array(ArrayExpect),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ObjectExpect {
    NameOrEnd,
    Name,
    Colon,
    Value,
    CommaOrEnd,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ArrayExpect {
    ValueOrEnd,
    Value,
    CommaOrEnd,
}

pub struct JsonLexer<R: Read> {
    reader: R,
    buf: Box<[u8]>,
    buf_pos: usize,
    buf_len: usize,
    offset: u64,
    scopes: Vec<Scope>,
    finished: bool,
}

impl<R: Read> JsonLexer<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: vec![0u8; READ_CHUNK].into_boxed_slice(),
            buf_pos: 0,
            buf_len: 0,
            offset: 0,
            scopes: Vec::new(),
            finished: false,
        }
    }

    /// Byte offset of the next unread input byte.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    fn lex_next(&mut self) -> Result<Option<Token>, LexError> {
        loop {
            self.skip_whitespace()?;
            if self.finished {
                return match self.peek()? {
                    None => Ok(None),
                    Some(_) => Err(self.fail("trailing characters after document")),
                };
            }
            let Some(byte) = self.peek()? else {
                return Err(self.fail("unexpected end of input"));
            };
            match self.scopes.last().copied() {
                None => return Ok(Some(self.lex_value(byte)?)),
                Some(Scope::Object(expect)) => match expect {
                    ObjectExpect::NameOrEnd => {
                        if byte == b'}' {
                            self.advance();
                            return Ok(Some(self.close_object()));
                        }
                        if byte == b'"' {
                            return Ok(Some(self.lex_field_name()?));
                        }
                        return Err(self.fail("expected field name or '}'"));
                    }
                    ObjectExpect::Name => {
                        if byte == b'"' {
                            return Ok(Some(self.lex_field_name()?));
                        }
                        return Err(self.fail("expected field name"));
                    }
                    ObjectExpect::Colon => {
                        if byte != b':' {
                            return Err(self.fail("expected ':' after field name"));
                        }
                        self.advance();
                        self.set_object_expect(ObjectExpect::Value);
                    }
                    ObjectExpect::Value => return Ok(Some(self.lex_value(byte)?)),
                    ObjectExpect::CommaOrEnd => {
                        if byte == b',' {
                            self.advance();
                            self.set_object_expect(ObjectExpect::Name);
                            continue;
                        }
                        if byte == b'}' {
                            self.advance();
                            return Ok(Some(self.close_object()));
                        }
                        return Err(self.fail("expected ',' or '}' in object"));
                    }
                },
                Some(Scope::Array(expect)) => match expect {
                    ArrayExpect::ValueOrEnd => {
                        if byte == b']' {
                            self.advance();
                            return Ok(Some(self.close_array()));
                        }
                        return Ok(Some(self.lex_value(byte)?));
                    }
                    ArrayExpect::Value => return Ok(Some(self.lex_value(byte)?)),
                    ArrayExpect::CommaOrEnd => {
                        if byte == b',' {
                            self.advance();
                            self.set_array_expect(ArrayExpect::Value);
                            continue;
                        }
                        if byte == b']' {
                            self.advance();
                            return Ok(Some(self.close_array()));
                        }
                        return Err(self.fail("expected ',' or ']' in array"));
                    }
                },
            }
        }
    }

    fn lex_value(&mut self, first: u8) -> Result<Token, LexError> {
        match first {
            b'{' => {
                self.advance();
                self.scopes.push(Scope::Object(ObjectExpect::NameOrEnd));
                Ok(Token::ObjectStart)
            }
            b'[' => {
                self.advance();
                self.scopes.push(Scope::Array(ArrayExpect::ValueOrEnd));
                Ok(Token::ArrayStart)
            }
            b'"' => {
                let text = self.lex_string()?;
                self.leave_value();
                Ok(Token::StringValue(text))
            }
            b'-' | b'0'..=b'9' => {
                self.lex_number()?;
                self.leave_value();
                Ok(Token::Number)
            }
            b't' => {
                self.expect_literal(b"true")?;
                self.leave_value();
                Ok(Token::Bool)
            }
            b'f' => {
                self.expect_literal(b"false")?;
                self.leave_value();
                Ok(Token::Bool)
            }
            b'n' => {
                self.expect_literal(b"null")?;
                self.leave_value();
                Ok(Token::Null)
            }
            _ => Err(self.fail("unexpected character")),
        }
    }

    fn lex_field_name(&mut self) -> Result<Token, LexError> {
        let name = self.lex_string()?;
        self.set_object_expect(ObjectExpect::Colon);
        Ok(Token::FieldName(name))
    }

    fn close_object(&mut self) -> Token {
        self.scopes.pop();
        self.leave_value();
        Token::ObjectEnd
    }

    fn close_array(&mut self) -> Token {
        self.scopes.pop();
        self.leave_value();
        Token::ArrayEnd
    }

    // A value just finished; position the enclosing scope after it.
    fn leave_value(&mut self) {
        match self.scopes.last_mut() {
            None => self.finished = true,
            Some(Scope::Object(expect)) => *expect = ObjectExpect::CommaOrEnd,
            Some(Scope::Array(expect)) => *expect = ArrayExpect::CommaOrEnd,
        }
    }

    fn set_object_expect(&mut self, expect: ObjectExpect) {
        if let Some(Scope::Object(slot)) = self.scopes.last_mut() {
            *slot = expect;
        }
    }

    fn set_array_expect(&mut self, expect: ArrayExpect) {
        if let Some(Scope::Array(slot)) = self.scopes.last_mut() {
            *slot = expect;
        }
    }

    fn lex_string(&mut self) -> Result<String, LexError> {
        self.advance();
        let mut raw: Vec<u8> = Vec::new();
        loop {
            let Some(byte) = self.bump()? else {
                return Err(self.fail("unterminated string"));
            };
            match byte {
                b'"' => break,
                b'\\' => self.lex_escape(&mut raw)?,
                0x00..=0x1f => {
                    return Err(LexError::new(
                        "unescaped control character in string",
                        self.offset - 1,
                    ));
                }
                _ => raw.push(byte),
            }
        }
        String::from_utf8(raw).map_err(|_| self.fail("invalid utf-8 in string"))
    }

    fn lex_escape(&mut self, out: &mut Vec<u8>) -> Result<(), LexError> {
        let Some(byte) = self.bump()? else {
            return Err(self.fail("unterminated escape sequence"));
        };
        match byte {
            b'"' => out.push(b'"'),
            b'\\' => out.push(b'\\'),
            b'/' => out.push(b'/'),
            b'b' => out.push(0x08),
            b'f' => out.push(0x0c),
            b'n' => out.push(b'\n'),
            b'r' => out.push(b'\r'),
            b't' => out.push(b'\t'),
            b'u' => {
                let unit = self.lex_hex_unit()?;
                let decoded = if (0xd800..=0xdbff).contains(&unit) {
                    self.lex_low_surrogate(unit)?
                } else if (0xdc00..=0xdfff).contains(&unit) {
                    return Err(self.fail("unpaired low surrogate in string escape"));
                } else {
                    char::from_u32(u32::from(unit))
                        .ok_or_else(|| self.fail("invalid unicode escape"))?
                };
                let mut encoded = [0u8; 4];
                out.extend_from_slice(decoded.encode_utf8(&mut encoded).as_bytes());
            }
            _ => return Err(LexError::new("invalid escape character", self.offset - 1)),
        }
        Ok(())
    }

    fn lex_hex_unit(&mut self) -> Result<u16, LexError> {
        let mut unit: u16 = 0;
        for _ in 0..4 {
            let Some(byte) = self.bump()? else {
                return Err(self.fail("unterminated unicode escape"));
            };
            let digit = match byte {
                b'0'..=b'9' => byte - b'0',
                b'a'..=b'f' => byte - b'a' + 10,
                b'A'..=b'F' => byte - b'A' + 10,
                _ => {
                    return Err(LexError::new(
                        "invalid hex digit in unicode escape",
                        self.offset - 1,
                    ));
                }
            };
            unit = unit << 4 | u16::from(digit);
        }
        Ok(unit)
    }

    fn lex_low_surrogate(&mut self, high: u16) -> Result<char, LexError> {
        if self.bump()? != Some(b'\\') || self.bump()? != Some(b'u') {
            return Err(self.fail("unpaired high surrogate in string escape"));
        }
        let low = self.lex_hex_unit()?;
        if !(0xdc00..=0xdfff).contains(&low) {
            return Err(self.fail("unpaired high surrogate in string escape"));
        }
        let code = 0x10000 + (u32::from(high - 0xd800) << 10) + u32::from(low - 0xdc00);
        char::from_u32(code).ok_or_else(|| self.fail("invalid unicode escape"))
    }

    fn lex_number(&mut self) -> Result<(), LexError> {
        if self.peek()? == Some(b'-') {
            self.advance();
        }
        match self.peek()? {
            Some(b'0') => {
                self.advance();
                if matches!(self.peek()?, Some(b'0'..=b'9')) {
                    return Err(self.fail("leading zero in number"));
                }
            }
            Some(b'1'..=b'9') => {
                self.advance();
                self.skip_digits()?;
            }
            _ => return Err(self.fail("invalid number")),
        }
        if self.peek()? == Some(b'.') {
            self.advance();
            self.require_digits("expected digit after decimal point")?;
        }
        if matches!(self.peek()?, Some(b'e' | b'E')) {
            self.advance();
            if matches!(self.peek()?, Some(b'+' | b'-')) {
                self.advance();
            }
            self.require_digits("expected digit in exponent")?;
        }
        Ok(())
    }

    fn skip_digits(&mut self) -> Result<(), LexError> {
        while matches!(self.peek()?, Some(b'0'..=b'9')) {
            self.advance();
        }
        Ok(())
    }

    fn require_digits(&mut self, message: &str) -> Result<(), LexError> {
        if !matches!(self.peek()?, Some(b'0'..=b'9')) {
            return Err(self.fail(message));
        }
        self.skip_digits()
    }

    fn expect_literal(&mut self, literal: &'static [u8]) -> Result<(), LexError> {
        for expected in literal {
            if self.bump()? != Some(*expected) {
                return Err(self.fail("invalid literal"));
            }
        }
        Ok(())
    }

    fn skip_whitespace(&mut self) -> Result<(), LexError> {
        while matches!(self.peek()?, Some(b' ' | b'\t' | b'\n' | b'\r')) {
            self.advance();
        }
        Ok(())
    }

    fn peek(&mut self) -> Result<Option<u8>, LexError> {
        if self.buf_pos == self.buf_len {
            self.fill()?;
            if self.buf_len == 0 {
                return Ok(None);
            }
        }
        Ok(Some(self.buf[self.buf_pos]))
    }

    fn bump(&mut self) -> Result<Option<u8>, LexError> {
        let byte = self.peek()?;
        if byte.is_some() {
            self.advance();
        }
        Ok(byte)
    }

    // Only valid immediately after a successful peek.
    fn advance(&mut self) {
        self.buf_pos += 1;
        self.offset += 1;
    }

    fn fill(&mut self) -> Result<(), LexError> {
        loop {
            match self.reader.read(&mut self.buf) {
                Ok(read) => {
                    self.buf_pos = 0;
                    self.buf_len = read;
                    return Ok(());
                }
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => {
                    return Err(LexError::new(format!("read failed: {err}"), self.offset));
                }
            }
        }
    }

    fn fail(&self, message: &str) -> LexError {
        LexError::new(message, self.offset)
    }
}

impl<'a> JsonLexer<&'a [u8]> {
    pub fn from_slice(input: &'a [u8]) -> Self {
        JsonLexer::new(input)
    }
}

impl<R: Read> TokenSource for JsonLexer<R> {
    type Error = LexError;

    fn next_token(&mut self) -> Result<Option<Token>, Self::Error> {
        self.lex_next()
    }
}
