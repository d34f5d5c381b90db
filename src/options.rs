//! Lint run configuration: which checks to run.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Check-selection filters.
///
/// Precedence: a non-empty [`include_check_ids`](Self::include_check_ids) is
/// authoritative and short-circuits everything else; otherwise include-labels
/// (narrowed by exclude-IDs) apply; otherwise all checks minus exclude-IDs
/// and exclude-labels.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LintOptions {
    pub include_check_ids: HashSet<String>,
    pub exclude_check_ids: HashSet<String>,
    /// Key/value label pairs; a check matches if any of its labels equals
    /// any listed pair.
    pub include_check_labels: Vec<(String, String)>,
    pub exclude_check_labels: Vec<(String, String)>,
}

impl LintOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn include_id(mut self, id: impl Into<String>) -> Self {
        self.include_check_ids.insert(id.into());
        self
    }

    pub fn exclude_id(mut self, id: impl Into<String>) -> Self {
        self.exclude_check_ids.insert(id.into());
        self
    }

    pub fn include_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.include_check_labels.push((key.into(), value.into()));
        self
    }

    pub fn exclude_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.exclude_check_labels.push((key.into(), value.into()));
        self
    }
}
