//! Purpose: Enforce structural limits over a JSON token stream in one pass.
//! Exports: `scan`.
//! Role: The validator core; polymorphic over any `TokenSource`.
//! Invariants: Checks fire in token order and the first violation ends the scan.
//! Invariants: Depth counts objects only; field count is global; array counts are per frame.
//! Invariants: Traversal state is an explicit frame stack, never native recursion.

use crate::core::error::{snippet, Violation, ViolationKind};
use crate::core::limits::Limits;
use crate::core::token::{Token, TokenSource};

const MESSAGE_SNIPPET_CHARS: usize = 200;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Frame {
    Object,
    Array { entries: u64 },
}

/// Consume one document from `source`, failing on the first limit violation
/// or lexical fault. Success means the source reported a clean end with all
/// containers closed.
pub fn scan<S: TokenSource>(source: &mut S, limits: &Limits) -> Result<(), Violation> {
    let mut frames: Vec<Frame> = Vec::new();
    let mut depth: u64 = 0;
    let mut field_count: u64 = 0;
    let mut complete = false;

    loop {
        let token = match source.next_token() {
            Ok(Some(token)) => token,
            Ok(None) => {
                if complete {
                    return Ok(());
                }
                return Err(malformed("unexpected end of json data"));
            }
            Err(err) => {
                return Err(Violation::new(ViolationKind::MalformedJson)
                    .with_message("invalid json data")
                    .with_source(err));
            }
        };
        if complete {
            return Err(malformed("unexpected token after document end"));
        }

        match token {
            Token::ObjectStart => {
                depth += 1;
                if let Some(bound) = effective(limits.max_depth()) {
                    if depth > bound as u64 {
                        return Err(depth_violation(bound));
                    }
                }
                frames.push(Frame::Object);
            }
            Token::ObjectEnd => {
                if !matches!(frames.pop(), Some(Frame::Object)) {
                    return Err(malformed("mismatched object close from token source"));
                }
                depth -= 1;
                complete_element(&mut frames, limits)?;
            }
            Token::ArrayStart => {
                frames.push(Frame::Array { entries: 0 });
            }
            Token::ArrayEnd => {
                if !matches!(frames.pop(), Some(Frame::Array { .. })) {
                    return Err(malformed("mismatched array close from token source"));
                }
                complete_element(&mut frames, limits)?;
            }
            Token::FieldName(name) => {
                if !matches!(frames.last(), Some(Frame::Object)) {
                    return Err(malformed("field name outside an object"));
                }
                field_count += 1;
                if let Some(bound) = effective(limits.max_entries()) {
                    if field_count > bound as u64 {
                        return Err(entries_violation(bound));
                    }
                }
                if let Some(bound) = effective(limits.max_name_length()) {
                    if char_length(&name) > bound as u64 {
                        return Err(name_violation(bound, name));
                    }
                }
            }
            Token::StringValue(text) => {
                if let Some(bound) = effective(limits.max_value_length()) {
                    if char_length(&text) > bound as u64 {
                        return Err(value_violation(bound, text));
                    }
                }
                complete_element(&mut frames, limits)?;
            }
            Token::Number | Token::Bool | Token::Null => {
                complete_element(&mut frames, limits)?;
            }
        }

        if frames.is_empty() {
            complete = true;
        }
    }
}

// One element of the enclosing array just finished, if there is one.
fn complete_element(frames: &mut [Frame], limits: &Limits) -> Result<(), Violation> {
    if let Some(Frame::Array { entries }) = frames.last_mut() {
        *entries += 1;
        if let Some(bound) = effective(limits.max_array_size()) {
            if *entries > bound as u64 {
                return Err(array_violation(bound));
            }
        }
    }
    Ok(())
}

// The "absent or negative means unbounded" rule lives here.
fn effective(bound: Option<i64>) -> Option<i64> {
    bound.filter(|value| *value >= 0)
}

fn char_length(text: &str) -> u64 {
    text.chars().count() as u64
}

fn malformed(message: &str) -> Violation {
    Violation::new(ViolationKind::MalformedJson).with_message(message)
}

fn depth_violation(bound: i64) -> Violation {
    Violation::new(ViolationKind::MaxDepthExceeded)
        .with_message(format!("max depth exceeded for json (max: {bound})"))
        .with_limit(bound)
}

fn entries_violation(bound: i64) -> Violation {
    Violation::new(ViolationKind::MaxEntriesExceeded)
        .with_message(format!(
            "max number of entries exceeded for json (max: {bound})"
        ))
        .with_limit(bound)
}

fn name_violation(bound: i64, name: String) -> Violation {
    Violation::new(ViolationKind::MaxNameLengthExceeded)
        .with_message(format!(
            "max length exceeded for field name [{}] (max: {bound})",
            snippet(&name, MESSAGE_SNIPPET_CHARS)
        ))
        .with_limit(bound)
        .with_offending(name)
}

fn value_violation(bound: i64, value: String) -> Violation {
    Violation::new(ViolationKind::MaxValueLengthExceeded)
        .with_message(format!(
            "max length exceeded for field value [{}] (max: {bound})",
            snippet(&value, MESSAGE_SNIPPET_CHARS)
        ))
        .with_limit(bound)
        .with_offending(value)
}

fn array_violation(bound: i64) -> Violation {
    Violation::new(ViolationKind::MaxArraySizeExceeded)
        .with_message(format!("max entry count exceeded for array (max: {bound})"))
        .with_limit(bound)
}

#[cfg(test)]
mod tests {
    use super::scan;
    use crate::core::error::ViolationKind;
    use crate::core::lexer::JsonLexer;
    use crate::core::limits::Limits;
    use crate::core::token::{Token, TokenSource};
    use std::convert::Infallible;
    use std::error::Error as StdError;

    fn check(input: &str, limits: &Limits) -> Result<(), crate::core::error::Violation> {
        let mut lexer = JsonLexer::from_slice(input.as_bytes());
        scan(&mut lexer, limits)
    }

    struct VecSource {
        tokens: std::vec::IntoIter<Token>,
    }

    impl VecSource {
        fn new(tokens: Vec<Token>) -> Self {
            Self {
                tokens: tokens.into_iter(),
            }
        }
    }

    impl TokenSource for VecSource {
        type Error = Infallible;

        fn next_token(&mut self) -> Result<Option<Token>, Self::Error> {
            Ok(self.tokens.next())
        }
    }

    struct FailingSource;

    impl TokenSource for FailingSource {
        type Error = std::io::Error;

        fn next_token(&mut self) -> Result<Option<Token>, Self::Error> {
            Err(std::io::Error::other("socket reset"))
        }
    }

    #[test]
    fn depth_counts_objects_not_arrays() {
        let limits = Limits::unbounded().with_max_depth(2);
        check(r#"{"a": {"b": 1}}"#, &limits).expect("two object levels fit");
        check(r#"[[[[[{"a": {"b": 1}}]]]]]"#, &limits).expect("array nesting is free");

        let err = check(r#"{"a": {"b": {"c": 1}}}"#, &limits).expect_err("should fail");
        assert_eq!(err.kind(), ViolationKind::MaxDepthExceeded);
        assert_eq!(err.limit(), Some(2));
    }

    #[test]
    fn depth_fires_at_object_open() {
        let limits = Limits::unbounded().with_max_depth(0);
        let err = check("{}", &limits).expect_err("should fail");
        assert_eq!(err.kind(), ViolationKind::MaxDepthExceeded);
        check("[1, 2]", &limits).expect("scalar arrays have zero depth");
    }

    #[test]
    fn field_count_is_global_across_nesting() {
        let limits = Limits::unbounded().with_max_entries(3);
        check(r#"{"a": 1, "b": {"c": 2}}"#, &limits).expect("three fields fit");

        let err = check(r#"{"a": 1, "b": {"c": 2, "d": 3}}"#, &limits).expect_err("should fail");
        assert_eq!(err.kind(), ViolationKind::MaxEntriesExceeded);
    }

    #[test]
    fn entries_check_fires_before_name_length() {
        let limits = Limits::unbounded().with_max_entries(1).with_max_name_length(2);
        let err = check(r#"{"ok": 1, "toolong": 2}"#, &limits).expect_err("should fail");
        assert_eq!(err.kind(), ViolationKind::MaxEntriesExceeded);
    }

    #[test]
    fn name_length_counts_chars_and_keeps_offender() {
        let limits = Limits::unbounded().with_max_name_length(4);
        check(r#"{"éléé": 1}"#, &limits).expect("four chars fit");

        let err = check(r#"{"élévé": 1}"#, &limits).expect_err("should fail");
        assert_eq!(err.kind(), ViolationKind::MaxNameLengthExceeded);
        assert_eq!(err.offending(), Some("élévé"));
        assert_eq!(err.limit(), Some(4));
        let message = err.message().expect("message");
        assert!(message.contains("[élévé]"));
        assert!(message.contains("(max: 4)"));
    }

    #[test]
    fn value_length_applies_to_any_string_value() {
        let limits = Limits::unbounded().with_max_value_length(5);
        check(r#"{"a": "12345"}"#, &limits).expect("at the bound");

        let in_object = check(r#"{"a": "123456"}"#, &limits).expect_err("should fail");
        assert_eq!(in_object.kind(), ViolationKind::MaxValueLengthExceeded);

        let in_array = check(r#"["123456"]"#, &limits).expect_err("should fail");
        assert_eq!(in_array.kind(), ViolationKind::MaxValueLengthExceeded);

        let top_level = check(r#""123456""#, &limits).expect_err("should fail");
        assert_eq!(top_level.kind(), ViolationKind::MaxValueLengthExceeded);

        check("[123456]", &limits).expect("numbers have no length check");
    }

    #[test]
    fn array_counts_are_independent_per_array() {
        let limits = Limits::unbounded().with_max_array_size(2);
        check(r#"{"a": [1, 2], "b": [3, 4], "c": [5, 6]}"#, &limits)
            .expect("sibling arrays do not share counts");
        check("[[1, 2], [3, 4]]", &limits).expect("nested arrays do not share counts");

        let err = check("[1, [2, 3, 4]]", &limits).expect_err("should fail");
        assert_eq!(err.kind(), ViolationKind::MaxArraySizeExceeded);
    }

    #[test]
    fn nested_value_counts_once_at_its_close() {
        let limits = Limits::unbounded().with_max_array_size(2);
        check(r#"[{"a": 1, "b": 2, "c": 3}, [4, 5]]"#, &limits)
            .expect("two elements, each with busy interiors");
    }

    #[test]
    fn objects_inside_arrays_share_depth_and_field_state() {
        let depth_limits = Limits::unbounded().with_max_depth(1);
        let err = check(r#"[{"a": {"b": 1}}]"#, &depth_limits).expect_err("should fail");
        assert_eq!(err.kind(), ViolationKind::MaxDepthExceeded);

        let entry_limits = Limits::unbounded().with_max_entries(2);
        let err = check(r#"[{"a": 1}, {"b": 2}, {"c": 3}]"#, &entry_limits).expect_err("should fail");
        assert_eq!(err.kind(), ViolationKind::MaxEntriesExceeded);
    }

    #[test]
    fn negative_bounds_disable_checks() {
        let limits = Limits::unbounded()
            .with_max_depth(-1)
            .with_max_entries(-1)
            .with_max_array_size(-1)
            .with_max_name_length(-1)
            .with_max_value_length(-1);
        check(
            r#"{"deep": {"deep": {"deep": {"list": [1, 2, 3, 4, 5], "text": "abcdefgh"}}}}"#,
            &limits,
        )
        .expect("negative bounds mean unbounded");
    }

    #[test]
    fn lexical_faults_map_to_malformed_json() {
        let limits = Limits::unbounded();
        let err = check(r#"{"a": }"#, &limits).expect_err("should fail");
        assert_eq!(err.kind(), ViolationKind::MalformedJson);
        assert!(err.source().is_some(), "lex error should be attached");
    }

    #[test]
    fn foreign_source_mismatches_are_malformed() {
        let limits = Limits::unbounded();

        let unmatched_close = scan(&mut VecSource::new(vec![Token::ObjectEnd]), &limits)
            .expect_err("should fail");
        assert_eq!(unmatched_close.kind(), ViolationKind::MalformedJson);

        let stray_name = scan(
            &mut VecSource::new(vec![
                Token::ArrayStart,
                Token::FieldName("a".to_string()),
            ]),
            &limits,
        )
        .expect_err("should fail");
        assert_eq!(stray_name.kind(), ViolationKind::MalformedJson);

        let truncated = scan(
            &mut VecSource::new(vec![Token::ObjectStart]),
            &limits,
        )
        .expect_err("should fail");
        assert_eq!(truncated.kind(), ViolationKind::MalformedJson);

        let empty = scan(&mut VecSource::new(Vec::new()), &limits).expect_err("should fail");
        assert_eq!(empty.kind(), ViolationKind::MalformedJson);

        let extra = scan(
            &mut VecSource::new(vec![Token::Null, Token::Null]),
            &limits,
        )
        .expect_err("should fail");
        assert_eq!(extra.kind(), ViolationKind::MalformedJson);
    }

    #[test]
    fn source_faults_map_to_malformed_json() {
        let err = scan(&mut FailingSource, &Limits::unbounded()).expect_err("should fail");
        assert_eq!(err.kind(), ViolationKind::MalformedJson);
        let source = err.source().expect("source attached");
        assert!(source.to_string().contains("socket reset"));
    }

    #[test]
    fn long_offenders_are_snipped_in_messages() {
        let limits = Limits::unbounded().with_max_value_length(10);
        let long_value = "x".repeat(500);
        let err = check(&format!(r#"{{"a": "{long_value}"}}"#), &limits).expect_err("should fail");
        let message = err.message().expect("message");
        assert!(message.len() < 300, "message stays bounded");
        assert!(message.contains("..."));
        assert_eq!(err.offending(), Some(long_value.as_str()));
    }
}
