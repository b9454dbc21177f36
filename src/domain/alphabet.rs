// ============================================================
// Layer 3 — Alphabet (character vocabulary)
// ============================================================
// Maps every character seen in the training words to a stable
// integer index, and back again.
//
// Three indices are reserved before any real character:
//
//   0  SOS  start-of-sequence, first decoder input
//   1  EOS  end-of-sequence, appended to every encoded word
//   2  PAD  filler used to square off a batch
//
// Real characters get indices 3, 4, 5, ... in first-seen order.
// Once an index is handed out it never changes.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::word_pair::WordPair;

pub const SOS_INDEX: usize = 0;
pub const EOS_INDEX: usize = 1;
pub const PAD_INDEX: usize = 2;

/// Number of indices taken by the SOS / EOS / PAD markers.
pub const RESERVED: usize = 3;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AlphabetError {
    #[error("character {ch:?} is not in the '{alphabet}' alphabet")]
    UnknownChar { ch: char, alphabet: String },
}

/// Character <-> index mapping with frequency counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "AlphabetRecord", into = "AlphabetRecord")]
pub struct Alphabet {
    name:    String,
    symbols: Vec<char>,
    counts:  Vec<usize>,
    index:   HashMap<char, usize>,
}

impl Alphabet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name:    name.into(),
            symbols: Vec::new(),
            counts:  Vec::new(),
            index:   HashMap::new(),
        }
    }

    /// Register every character of `word`, assigning new indices to
    /// characters not seen before and counting every occurrence.
    pub fn add_word(&mut self, word: &str) {
        for ch in word.chars() {
            match self.index.get(&ch) {
                Some(&idx) => self.counts[idx - RESERVED] += 1,
                None => {
                    self.index.insert(ch, self.symbols.len() + RESERVED);
                    self.symbols.push(ch);
                    self.counts.push(1);
                }
            }
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Total vocabulary size, markers included.
    pub fn len(&self) -> usize {
        self.symbols.len() + RESERVED
    }

    /// True when no real character has been added yet.
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn index_of(&self, ch: char) -> Result<usize, AlphabetError> {
        self.index.get(&ch).copied().ok_or_else(|| AlphabetError::UnknownChar {
            ch,
            alphabet: self.name.clone(),
        })
    }

    pub fn char_at(&self, index: usize) -> Option<char> {
        index.checked_sub(RESERVED).and_then(|i| self.symbols.get(i)).copied()
    }

    /// How often `ch` appeared while the alphabet was built (0 if never).
    pub fn count(&self, ch: char) -> usize {
        self.index.get(&ch).map_or(0, |&idx| self.counts[idx - RESERVED])
    }

    /// Turn decoder output back into text.
    /// SOS and PAD are skipped and decoding stops at the first EOS.
    pub fn decode(&self, indices: &[usize]) -> String {
        indices
            .iter()
            .take_while(|&&i| i != EOS_INDEX)
            .filter_map(|&i| self.char_at(i))
            .collect()
    }
}

/// Build the source and target alphabets from the training pairs only.
pub fn build_alphabets(
    pairs:       &[WordPair],
    source_name: &str,
    target_name: &str,
) -> (Alphabet, Alphabet) {
    let mut source = Alphabet::new(source_name);
    let mut target = Alphabet::new(target_name);
    for pair in pairs {
        source.add_word(&pair.source);
        target.add_word(&pair.target);
    }
    (source, target)
}

// On-disk form: the index map is derived from `symbols`, so only the
// ordered symbol list and the counts are written.
#[derive(Serialize, Deserialize)]
struct AlphabetRecord {
    name:    String,
    symbols: Vec<char>,
    counts:  Vec<usize>,
}

impl From<AlphabetRecord> for Alphabet {
    fn from(r: AlphabetRecord) -> Self {
        let index = r
            .symbols
            .iter()
            .enumerate()
            .map(|(i, &c)| (c, i + RESERVED))
            .collect();
        let mut counts = r.counts;
        counts.resize(r.symbols.len(), 0);
        Self { name: r.name, symbols: r.symbols, counts, index }
    }
}

impl From<Alphabet> for AlphabetRecord {
    fn from(a: Alphabet) -> Self {
        Self { name: a.name, symbols: a.symbols, counts: a.counts }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_markers_are_reserved() {
        let mut a = Alphabet::new("eng");
        assert_eq!(a.len(), RESERVED);
        a.add_word("ab");
        assert_eq!(a.index_of('a'), Ok(3));
        assert_eq!(a.index_of('b'), Ok(4));
        assert_eq!(a.len(), 5);
    }

    #[test]
    fn test_indices_are_stable() {
        let mut a = Alphabet::new("eng");
        a.add_word("cab");
        let before = a.index_of('a').unwrap();
        a.add_word("zebra");
        a.add_word("aaaa");
        assert_eq!(a.index_of('a').unwrap(), before);
        assert_eq!(a.index_of('c').unwrap(), 3);
    }

    #[test]
    fn test_counts_every_occurrence() {
        let mut a = Alphabet::new("eng");
        a.add_word("banana");
        assert_eq!(a.count('a'), 3);
        assert_eq!(a.count('n'), 2);
        assert_eq!(a.count('b'), 1);
        assert_eq!(a.count('q'), 0);
    }

    #[test]
    fn test_unknown_char_is_an_error() {
        let a = Alphabet::new("hin");
        let err = a.index_of('x').unwrap_err();
        assert_eq!(err, AlphabetError::UnknownChar { ch: 'x', alphabet: "hin".into() });
    }

    #[test]
    fn test_decode_stops_at_eos_and_skips_markers() {
        let mut a = Alphabet::new("hin");
        a.add_word("नम");
        let n = a.index_of('न').unwrap();
        let m = a.index_of('म').unwrap();
        let out = a.decode(&[SOS_INDEX, n, PAD_INDEX, m, EOS_INDEX, n]);
        assert_eq!(out, "नम");
    }

    #[test]
    fn test_build_from_pairs() {
        let pairs = vec![WordPair::new("ab", "अब"), WordPair::new("ba", "बा")];
        let (src, tgt) = build_alphabets(&pairs, "eng", "hin");
        assert_eq!(src.len(), RESERVED + 2);
        assert!("अबा".chars().all(|c| tgt.index_of(c).is_ok()));
        assert_eq!(tgt.name(), "hin");
    }

    #[test]
    fn test_json_roundtrip_rebuilds_index() {
        let mut a = Alphabet::new("eng");
        a.add_word("hello");
        let json = serde_json::to_string(&a).unwrap();
        let back: Alphabet = serde_json::from_str(&json).unwrap();
        assert_eq!(back, a);
        assert_eq!(back.index_of('l'), a.index_of('l'));
    }
}
