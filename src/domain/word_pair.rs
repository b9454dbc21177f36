// ============================================================
// Layer 3 — WordPair Domain Type
// ============================================================
// One row of a transliteration CSV: a word in the Latin source
// script and its rendering in the target script.
//
// Example:
//   source: "namaste"
//   target: "नमस्ते"

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordPair {
    /// Latin-script word fed to the encoder
    pub source: String,

    /// Target-script word the decoder should produce
    pub target: String,
}

impl WordPair {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }

    /// Length of the target word in characters (not bytes).
    pub fn target_len(&self) -> usize {
        self.target.chars().count()
    }
}
