//! Purpose: Build serializable rejection reports from violations.
//! Exports: `Rejection`.
//! Role: The failure shape hosts forward outward (response bodies, logs).
//! Invariants: `code` is the stable reason-code string, never a Debug render.
//! Invariants: Offending text is truncated to the caller's snippet budget.

use serde::Serialize;

use crate::core::error::{snippet, Violation, ViolationKind};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Rejection {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offending: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<u64>,
}

impl Rejection {
    pub fn from_violation(violation: &Violation, max_snippet_chars: usize) -> Self {
        Self {
            code: violation.kind().code().to_string(),
            message: rejection_message(violation),
            limit: violation.limit(),
            offending: violation
                .offending()
                .map(|text| snippet(text, max_snippet_chars)),
            offset: violation.offset(),
        }
    }
}

fn rejection_message(violation: &Violation) -> String {
    if let Some(message) = violation.message() {
        return message.to_string();
    }
    match violation.kind() {
        ViolationKind::MalformedJson => "invalid json data".to_string(),
        ViolationKind::MaxDepthExceeded => "max depth exceeded for json".to_string(),
        ViolationKind::MaxEntriesExceeded => "max number of entries exceeded for json".to_string(),
        ViolationKind::MaxNameLengthExceeded => "max length exceeded for field name".to_string(),
        ViolationKind::MaxValueLengthExceeded => "max length exceeded for field value".to_string(),
        ViolationKind::MaxArraySizeExceeded => "max entry count exceeded for array".to_string(),
    }
}
