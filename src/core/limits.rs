use serde::{Deserialize, Serialize};

/// Structural bounds applied to a scanned document. Every bound is optional;
/// an absent or negative value leaves that dimension unbounded.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Limits {
    max_depth: Option<i64>,
    max_entries: Option<i64>,
    max_array_size: Option<i64>,
    max_name_length: Option<i64>,
    max_value_length: Option<i64>,
}

impl Limits {
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn with_max_depth(mut self, max_depth: i64) -> Self {
        self.max_depth = Some(max_depth);
        self
    }

    pub fn with_max_entries(mut self, max_entries: i64) -> Self {
        self.max_entries = Some(max_entries);
        self
    }

    pub fn with_max_array_size(mut self, max_array_size: i64) -> Self {
        self.max_array_size = Some(max_array_size);
        self
    }

    pub fn with_max_name_length(mut self, max_name_length: i64) -> Self {
        self.max_name_length = Some(max_name_length);
        self
    }

    pub fn with_max_value_length(mut self, max_value_length: i64) -> Self {
        self.max_value_length = Some(max_value_length);
        self
    }

    pub fn max_depth(&self) -> Option<i64> {
        self.max_depth
    }

    pub fn max_entries(&self) -> Option<i64> {
        self.max_entries
    }

    pub fn max_array_size(&self) -> Option<i64> {
        self.max_array_size
    }

    pub fn max_name_length(&self) -> Option<i64> {
        self.max_name_length
    }

    pub fn max_value_length(&self) -> Option<i64> {
        self.max_value_length
    }

    pub fn has_max_depth(&self) -> bool {
        is_effective(self.max_depth)
    }

    pub fn has_max_entries(&self) -> bool {
        is_effective(self.max_entries)
    }

    pub fn has_max_array_size(&self) -> bool {
        is_effective(self.max_array_size)
    }

    pub fn has_max_name_length(&self) -> bool {
        is_effective(self.max_name_length)
    }

    pub fn has_max_value_length(&self) -> bool {
        is_effective(self.max_value_length)
    }
}

fn is_effective(bound: Option<i64>) -> bool {
    matches!(bound, Some(value) if value >= 0)
}
