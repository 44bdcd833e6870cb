//! Correlation keys: the numeric token that identifies "the same" file across
//! the primary folder and every synced folder.

use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::path::Path;
use std::sync::LazyLock;

/// Digits in parentheses immediately before the extension, e.g. `photo (247).jpg`.
static PARENTHESIZED_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\((\d+)\)\.[a-zA-Z]+$").expect("valid identifier pattern"));

/// Identifier shared by corresponding files in different folders.
///
/// Compared textually: `(042)` and `(42)` are different keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct CorrelationKey(String);

impl CorrelationKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CorrelationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({})", self.0)
    }
}

/// Strategy for pulling a correlation key out of a file name
pub trait KeyExtractor {
    fn extract(&self, file_name: &str) -> Option<CorrelationKey>;

    fn extract_from_path(&self, path: &Path) -> Option<CorrelationKey> {
        path.file_name()
            .and_then(|name| name.to_str())
            .and_then(|name| self.extract(name))
    }
}

/// The `name (<digits>).ext` naming convention
#[derive(Debug, Clone, Copy, Default)]
pub struct ParenthesizedId;

impl KeyExtractor for ParenthesizedId {
    fn extract(&self, file_name: &str) -> Option<CorrelationKey> {
        PARENTHESIZED_ID
            .captures(file_name)
            .and_then(|caps| caps.get(1))
            .map(|m| CorrelationKey::new(m.as_str()))
    }
}

/// Extract the key from a path using the default naming convention
pub fn extract_key(path: &Path) -> Option<CorrelationKey> {
    ParenthesizedId.extract_from_path(path)
}
