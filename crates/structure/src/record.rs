use serde::{Deserialize, Serialize};

/// A successfully fetched structure file.
///
/// Records are immutable: a newer fetch supersedes the record rather than
/// mutating it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructureRecord {
    /// Lowercase identifier the record was requested under.
    pub id: String,
    /// Filtered structure text as returned by the proxy.
    pub raw_text: String,
}

impl StructureRecord {
    pub fn new(id: &str, raw_text: impl Into<String>) -> Self {
        Self {
            id: normalize_id(id).unwrap_or_default(),
            raw_text: raw_text.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.raw_text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.raw_text.is_empty()
    }
}

/// Trims and lowercases a user-supplied identifier.
///
/// Returns `None` when nothing is left after trimming.
pub fn normalize_id(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.to_ascii_lowercase())
}
