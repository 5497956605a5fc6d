//! Purpose: Lock limit semantics end to end through the public `Gate`.
//! Exports: Integration tests only (no runtime exports).
//! Role: Exercise the checker the way embedding hosts do, limit by limit.
//! Invariants: Reason codes, context fields, and first-violation ordering stay stable.

use jsongate::api::{Gate, JsonLexer, Limits, Token, TokenSource, Violation, to_exit_code};

fn reject(limits: Limits, payload: &str) -> Violation {
    Gate::new(limits).check_str(payload).expect_err("should fail")
}

struct CountingSource<S> {
    inner: S,
    pulls: usize,
}

impl<S> CountingSource<S> {
    fn new(inner: S) -> Self {
        Self { inner, pulls: 0 }
    }
}

impl<S: TokenSource> TokenSource for CountingSource<S> {
    type Error = S::Error;

    fn next_token(&mut self) -> Result<Option<Token>, Self::Error> {
        self.pulls += 1;
        self.inner.next_token()
    }
}

#[test]
fn generous_limits_accept_a_typical_payload() {
    let limits = Limits::unbounded()
        .with_max_depth(20)
        .with_max_entries(200)
        .with_max_array_size(100)
        .with_max_name_length(64)
        .with_max_value_length(4096);
    let payload = r#"{
        "user": {"name": "alice", "tags": ["ops", "billing"]},
        "active": true,
        "score": 12.5,
        "note": null
    }"#;
    Gate::new(limits).check_str(payload).expect("should pass");
}

#[test]
fn default_limits_are_unbounded() {
    let gate = Gate::new(Limits::default());
    let deep = format!("{}1{}", "[".repeat(300), "]".repeat(300));
    gate.check_str(&deep).expect("no limits configured");

    let wide = (0..500)
        .map(|i| format!(r#""k{i}": {i}"#))
        .collect::<Vec<_>>()
        .join(", ");
    gate.check_str(&format!("{{{wide}}}"))
        .expect("no limits configured");
}

#[test]
fn junk_input_is_rejected_as_malformed() {
    let err = reject(Limits::unbounded(), "Invalid");
    assert_eq!(err.kind().code(), "MALFORMED_JSON");
    assert_eq!(to_exit_code(err.kind()), 1);
}

#[test]
fn long_field_names_are_rejected_with_context() {
    let err = reject(
        Limits::unbounded().with_max_name_length(4),
        r#"{"valid": 1234}"#,
    );
    assert_eq!(err.kind().code(), "MAX_NAME_LENGTH_EXCEEDED");
    assert_eq!(err.limit(), Some(4));
    assert_eq!(err.offending(), Some("valid"));
}

#[test]
fn long_string_values_are_rejected_with_context() {
    let err = reject(
        Limits::unbounded().with_max_value_length(8),
        r#"{"n": "123456789"}"#,
    );
    assert_eq!(err.kind().code(), "MAX_VALUE_LENGTH_EXCEEDED");
    assert_eq!(err.limit(), Some(8));
    assert_eq!(err.offending(), Some("123456789"));
}

#[test]
fn field_count_is_capped_across_the_document() {
    let limits = Limits::unbounded().with_max_entries(2);
    Gate::new(limits)
        .check_str(r#"{"a": 1, "b": 2}"#)
        .expect("two fields fit");

    let err = reject(limits, r#"{"a": 1, "b": 2, "c": 3}"#);
    assert_eq!(err.kind().code(), "MAX_ENTRIES_EXCEEDED");

    let nested = reject(limits, r#"{"a": {"b": {"c": 1}}}"#);
    assert_eq!(nested.kind().code(), "MAX_ENTRIES_EXCEEDED");
}

#[test]
fn arrays_are_capped_per_array() {
    let limits = Limits::unbounded().with_max_array_size(2);
    Gate::new(limits)
        .check_str(r#"{"a": [1, 2], "b": [3, 4]}"#)
        .expect("sibling arrays count separately");

    let err = reject(limits, "[1, 2, 3]");
    assert_eq!(err.kind().code(), "MAX_ARRAY_SIZE_EXCEEDED");
    assert_eq!(err.limit(), Some(2));
}

#[test]
fn nesting_depth_counts_objects_only() {
    let limits = Limits::unbounded().with_max_depth(1);
    Gate::new(limits)
        .check_str(r#"[[[{"a": 1}]]]"#)
        .expect("arrays are free");

    let err = reject(limits, r#"{"a": {"b": 1}}"#);
    assert_eq!(err.kind().code(), "MAX_DEPTH_EXCEEDED");
}

#[test]
fn earliest_violation_in_token_order_wins() {
    // The oversized string is seen before its enclosing array element
    // completes, so the value check fires first.
    let limits = Limits::unbounded()
        .with_max_value_length(3)
        .with_max_array_size(1);
    let err = reject(limits, r#"["123456789", "x"]"#);
    assert_eq!(err.kind().code(), "MAX_VALUE_LENGTH_EXCEEDED");

    // Entry accounting happens before the name length check on the same token.
    let ordered = reject(
        Limits::unbounded().with_max_entries(1).with_max_name_length(2),
        r#"{"ok": 1, "toolong": 2}"#,
    );
    assert_eq!(ordered.kind().code(), "MAX_ENTRIES_EXCEEDED");
}

#[test]
fn rejection_stops_pulling_tokens() {
    let wide = (0..100)
        .map(|i| format!(r#""k{i}": {i}"#))
        .collect::<Vec<_>>()
        .join(", ");
    let payload = format!("{{{wide}}}");

    let mut source = CountingSource::new(JsonLexer::from_slice(payload.as_bytes()));
    let gate = Gate::new(Limits::unbounded().with_max_entries(1));
    gate.check_tokens(&mut source).expect_err("should fail");

    // ObjectStart, k0, 0, then the fatal k1. Nothing after the verdict.
    assert_eq!(source.pulls, 4);
}

#[test]
fn rejected_payloads_report_one_violation_only() {
    // Every limit is violated somewhere; only the first is reported.
    let limits = Limits::unbounded()
        .with_max_depth(1)
        .with_max_entries(3)
        .with_max_array_size(1)
        .with_max_name_length(6)
        .with_max_value_length(4);
    let err = reject(
        limits,
        r#"{"outer": {"alongname": "toolongvalue", "list": [1, 2, 3]}}"#,
    );
    assert_eq!(err.kind().code(), "MAX_DEPTH_EXCEEDED");
}
