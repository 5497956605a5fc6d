use std::error::Error as StdError;
use std::fmt;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum ViolationKind {
    MalformedJson,
    MaxDepthExceeded,
    MaxEntriesExceeded,
    MaxNameLengthExceeded,
    MaxValueLengthExceeded,
    MaxArraySizeExceeded,
}

impl ViolationKind {
    /// Stable reason-code string carried on rejection reports.
    pub fn code(self) -> &'static str {
        match self {
            ViolationKind::MalformedJson => "MALFORMED_JSON",
            ViolationKind::MaxDepthExceeded => "MAX_DEPTH_EXCEEDED",
            ViolationKind::MaxEntriesExceeded => "MAX_ENTRIES_EXCEEDED",
            ViolationKind::MaxNameLengthExceeded => "MAX_NAME_LENGTH_EXCEEDED",
            ViolationKind::MaxValueLengthExceeded => "MAX_VALUE_LENGTH_EXCEEDED",
            ViolationKind::MaxArraySizeExceeded => "MAX_ARRAY_SIZE_EXCEEDED",
        }
    }
}

#[derive(Debug)]
pub struct Violation {
    kind: ViolationKind,
    message: Option<String>,
    limit: Option<i64>,
    offending: Option<String>,
    offset: Option<u64>,
    source: Option<Box<dyn StdError + Send + Sync>>,
}

impl Violation {
    pub fn new(kind: ViolationKind) -> Self {
        Self {
            kind,
            message: None,
            limit: None,
            offending: None,
            offset: None,
            source: None,
        }
    }

    pub fn kind(&self) -> ViolationKind {
        self.kind
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_offending(mut self, offending: impl Into<String>) -> Self {
        self.offending = Some(offending.into());
        self
    }

    pub fn with_offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn with_source(mut self, source: impl StdError + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn limit(&self) -> Option<i64> {
        self.limit
    }

    pub fn offending(&self) -> Option<&str> {
        self.offending.as_deref()
    }

    pub fn offset(&self) -> Option<u64> {
        self.offset
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind.code())?;
        if let Some(message) = &self.message {
            write!(f, ": {message}")?;
        }
        if let Some(offset) = self.offset {
            write!(f, " (offset: {offset})")?;
        }
        Ok(())
    }
}

impl StdError for Violation {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|source| source.as_ref() as &(dyn StdError + 'static))
    }
}

pub fn to_exit_code(kind: ViolationKind) -> i32 {
    match kind {
        ViolationKind::MalformedJson => 1,
        ViolationKind::MaxDepthExceeded => 2,
        ViolationKind::MaxEntriesExceeded => 3,
        ViolationKind::MaxNameLengthExceeded => 4,
        ViolationKind::MaxValueLengthExceeded => 5,
        ViolationKind::MaxArraySizeExceeded => 6,
    }
}

// Bounded excerpt of offending text for messages and reports. Counts chars,
// not bytes, so multi-byte input cannot split a code point.
pub(crate) fn snippet(input: &str, max_chars: usize) -> String {
    if input.chars().count() <= max_chars {
        return input.to_string();
    }
    let suffix = "...";
    if max_chars <= suffix.len() {
        return suffix[..max_chars].to_string();
    }
    let take = max_chars - suffix.len();
    let mut out: String = input.chars().take(take).collect();
    out.push_str(suffix);
    out
}

#[cfg(test)]
mod tests {
    use super::{snippet, to_exit_code, Violation, ViolationKind};

    #[test]
    fn exit_code_mapping_is_stable() {
        let cases = [
            (ViolationKind::MalformedJson, 1),
            (ViolationKind::MaxDepthExceeded, 2),
            (ViolationKind::MaxEntriesExceeded, 3),
            (ViolationKind::MaxNameLengthExceeded, 4),
            (ViolationKind::MaxValueLengthExceeded, 5),
            (ViolationKind::MaxArraySizeExceeded, 6),
        ];

        for (kind, code) in cases {
            assert_eq!(to_exit_code(kind), code);
        }
    }

    #[test]
    fn reason_codes_are_stable() {
        let cases = [
            (ViolationKind::MalformedJson, "MALFORMED_JSON"),
            (ViolationKind::MaxDepthExceeded, "MAX_DEPTH_EXCEEDED"),
            (ViolationKind::MaxEntriesExceeded, "MAX_ENTRIES_EXCEEDED"),
            (
                ViolationKind::MaxNameLengthExceeded,
                "MAX_NAME_LENGTH_EXCEEDED",
            ),
            (
                ViolationKind::MaxValueLengthExceeded,
                "MAX_VALUE_LENGTH_EXCEEDED",
            ),
            (
                ViolationKind::MaxArraySizeExceeded,
                "MAX_ARRAY_SIZE_EXCEEDED",
            ),
        ];

        for (kind, code) in cases {
            assert_eq!(kind.code(), code);
        }
    }

    #[test]
    fn display_includes_code_message_and_offset() {
        let violation = Violation::new(ViolationKind::MalformedJson)
            .with_message("unexpected character")
            .with_offset(17);
        assert_eq!(
            violation.to_string(),
            "MALFORMED_JSON: unexpected character (offset: 17)"
        );
    }

    #[test]
    fn builders_attach_context() {
        let violation = Violation::new(ViolationKind::MaxNameLengthExceeded)
            .with_limit(4)
            .with_offending("toolong");
        assert_eq!(violation.kind(), ViolationKind::MaxNameLengthExceeded);
        assert_eq!(violation.limit(), Some(4));
        assert_eq!(violation.offending(), Some("toolong"));
        assert!(violation.message().is_none());
        assert!(violation.offset().is_none());
    }

    #[test]
    fn snippet_truncates_on_char_boundaries() {
        assert_eq!(snippet("short", 10), "short");
        assert_eq!(snippet("abcdefghij", 8), "abcde...");
        assert_eq!(snippet("éééééééééé", 8), "ééééé...");
    }
}
