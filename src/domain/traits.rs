// ============================================================
// Layer 3 — Core Traits
// ============================================================
// The application layer talks to these traits, not to the
// concrete CSV loader or the Burn-backed model.

use anyhow::Result;
use crate::domain::word_pair::WordPair;

// ─── PairSource ───────────────────────────────────────────────────────────────
/// Anything that can produce word pairs.
///
/// Implementations:
///   - CsvPairLoader → reads a header-less two-column CSV file
pub trait PairSource {
    fn load_pairs(&self) -> Result<Vec<WordPair>>;
}

// ─── Transliterator ───────────────────────────────────────────────────────────
/// Anything that can convert a source-script word to the target script.
///
/// Implementations:
///   - TransliterateUseCase → greedy decoding with a trained checkpoint
pub trait Transliterator {
    fn transliterate(&self, word: &str) -> Result<String>;
}
