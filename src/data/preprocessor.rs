// ============================================================
// Layer 4 — Word Preprocessor
// ============================================================
// Cleans a raw CSV cell before it reaches the alphabet.
//
// Exported word lists often carry invisible junk:
//   - Byte order marks (U+FEFF) on the first cell of a file
//   - Zero-width spaces / joiners left over from copy-paste
//   - Stray tabs, carriage returns or other control characters
//
// Any of these would otherwise become a "character" with its
// own index and pollute the vocabulary.
//
// Zero-width joiner / non-joiner (U+200D, U+200C) are kept:
// in Indic scripts they change how conjuncts render and are
// part of the target spelling.

pub struct Preprocessor {
    /// Lower-case the word (used for the Latin source side)
    lowercase: bool,
}

impl Preprocessor {
    /// Preprocessor for Latin-script source words (lower-cases).
    pub fn source() -> Self {
        Self { lowercase: true }
    }

    /// Preprocessor for target-script words (case is left alone).
    pub fn target() -> Self {
        Self { lowercase: false }
    }

    /// Clean one word. Returns an owned String, possibly empty.
    pub fn clean(&self, word: &str) -> String {
        let stripped: String = word
            .chars()
            .filter(|&c| !matches!(c, '\u{FEFF}' | '\u{200B}' | '\u{00AD}'))
            .filter(|c| !c.is_control())
            .collect();

        let trimmed = stripped.trim();
        if self.lowercase {
            trimmed.to_lowercase()
        } else {
            trimmed.to_string()
        }
    }
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self::target()
    }
}
