// ============================================================
// Layer 4 — Word Encoder
// ============================================================
// Converts words into index sequences and squares batches off
// with padding.
//
//   source "ghar"  →  [g, h, a, r, EOS]
//   target "घर"    →  [SOS, घ, र, EOS]
//
// The decoder is fed SOS as its first input, so only target
// sequences carry it. Both sides end in EOS so the model learns
// where a word stops.

use crate::domain::alphabet::{Alphabet, AlphabetError, EOS_INDEX, SOS_INDEX};
use crate::domain::word_pair::WordPair;

/// One word pair as index sequences, before padding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedPair {
    pub source: Vec<usize>,
    pub target: Vec<usize>,
}

pub fn encode_source(word: &str, alphabet: &Alphabet) -> Result<Vec<usize>, AlphabetError> {
    let mut ids = word
        .chars()
        .map(|c| alphabet.index_of(c))
        .collect::<Result<Vec<_>, _>>()?;
    ids.push(EOS_INDEX);
    Ok(ids)
}

pub fn encode_target(word: &str, alphabet: &Alphabet) -> Result<Vec<usize>, AlphabetError> {
    let mut ids = Vec::with_capacity(word.len() + 2);
    ids.push(SOS_INDEX);
    for c in word.chars() {
        ids.push(alphabet.index_of(c)?);
    }
    ids.push(EOS_INDEX);
    Ok(ids)
}

pub fn encode_pair(
    pair:   &WordPair,
    source: &Alphabet,
    target: &Alphabet,
) -> Result<EncodedPair, AlphabetError> {
    Ok(EncodedPair {
        source: encode_source(&pair.source, source)?,
        target: encode_target(&pair.target, target)?,
    })
}

/// Encode every pair, dropping those that use characters the
/// alphabets have never seen. Returns the kept pairs and the
/// number dropped.
pub fn encode_all(
    pairs:  &[WordPair],
    source: &Alphabet,
    target: &Alphabet,
) -> (Vec<EncodedPair>, usize) {
    let mut dropped = 0usize;
    let encoded = pairs
        .iter()
        .filter_map(|p| match encode_pair(p, source, target) {
            Ok(e) => Some(e),
            Err(e) => {
                tracing::debug!("Dropping pair {:?} -> {:?}: {}", p.source, p.target, e);
                dropped += 1;
                None
            }
        })
        .collect();
    (encoded, dropped)
}

/// Right-pad every row to the longest one and flatten row-major.
/// Returns the flat values (as i32, Burn's Int input type) and the
/// padded sequence length.
pub fn pad_batch<'a, I>(rows: I, pad: usize) -> (Vec<i32>, usize)
where
    I: IntoIterator<Item = &'a [usize]>,
    I::IntoIter: Clone,
{
    let rows    = rows.into_iter();
    let seq_len = rows.clone().map(|r| r.len()).max().unwrap_or(0);

    let mut flat = Vec::new();
    for row in rows {
        flat.extend(row.iter().map(|&x| x as i32));
        flat.extend(std::iter::repeat(pad as i32).take(seq_len - row.len()));
    }
    (flat, seq_len)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::alphabet::PAD_INDEX;

    fn alphabets() -> (Alphabet, Alphabet) {
        let mut s = Alphabet::new("eng");
        let mut t = Alphabet::new("hin");
        s.add_word("ghar");
        t.add_word("घर");
        (s, t)
    }

    #[test]
    fn test_source_ends_in_eos() {
        let (s, _) = alphabets();
        assert_eq!(encode_source("ghar", &s).unwrap(), vec![3, 4, 5, 6, EOS_INDEX]);
    }

    #[test]
    fn test_target_is_wrapped_in_sos_eos() {
        let (_, t) = alphabets();
        assert_eq!(encode_target("घर", &t).unwrap(), vec![SOS_INDEX, 3, 4, EOS_INDEX]);
    }

    #[test]
    fn test_unknown_character_fails() {
        let (s, _) = alphabets();
        assert!(encode_source("ghaz", &s).is_err());
    }

    #[test]
    fn test_encode_all_drops_unknown() {
        let (s, t) = alphabets();
        let pairs = vec![WordPair::new("ghar", "घर"), WordPair::new("xyz", "घर")];
        let (kept, dropped) = encode_all(&pairs, &s, &t);
        assert_eq!(kept.len(), 1);
        assert_eq!(dropped, 1);
    }

    #[test]
    fn test_pad_batch_to_longest_row() {
        let rows: Vec<Vec<usize>> = vec![vec![3, 1], vec![3, 4, 5, 1]];
        let (flat, seq_len) = pad_batch(rows.iter().map(|r| r.as_slice()), PAD_INDEX);
        assert_eq!(seq_len, 4);
        assert_eq!(flat, vec![3, 1, 2, 2, 3, 4, 5, 1]);
    }

    #[test]
    fn test_pad_batch_empty() {
        let rows: Vec<Vec<usize>> = Vec::new();
        let (flat, seq_len) = pad_batch(rows.iter().map(|r| r.as_slice()), PAD_INDEX);
        assert!(flat.is_empty());
        assert_eq!(seq_len, 0);
    }
}
