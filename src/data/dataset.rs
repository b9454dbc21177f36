use std::sync::Arc;

use burn::data::dataset::Dataset;

use crate::data::encoder::EncodedPair;

/// Encoded word pairs behind an `Arc`, so the same split can feed
/// several data loaders (shuffled training pass and ordered
/// evaluation pass) without copying.
///
/// `unscored` counts words of the split that could not be encoded
/// (characters never seen in training). They are not in the dataset
/// but still count as wrong in the split's word accuracy.
#[derive(Clone)]
pub struct TranslitDataset {
    pairs:    Arc<Vec<EncodedPair>>,
    unscored: usize,
}

impl TranslitDataset {
    pub fn new(pairs: Vec<EncodedPair>) -> Self {
        Self { pairs: Arc::new(pairs), unscored: 0 }
    }

    pub fn with_unscored(mut self, unscored: usize) -> Self {
        self.unscored = unscored;
        self
    }

    pub fn unscored(&self) -> usize {
        self.unscored
    }

    pub fn sample_count(&self) -> usize {
        self.pairs.len()
    }

    /// Longest target sequence, SOS and EOS included.
    pub fn max_target_len(&self) -> usize {
        self.pairs.iter().map(|p| p.target.len()).max().unwrap_or(0)
    }
}

impl Dataset<EncodedPair> for TranslitDataset {
    fn get(&self, index: usize) -> Option<EncodedPair> {
        self.pairs.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.pairs.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_storage() {
        let ds = TranslitDataset::new(vec![
            EncodedPair { source: vec![3, 1], target: vec![0, 3, 1] },
            EncodedPair { source: vec![4, 1], target: vec![0, 4, 5, 1] },
        ]);
        let other = ds.clone();
        assert_eq!(other.len(), 2);
        assert_eq!(ds.max_target_len(), 4);
        assert_eq!(other.get(1).unwrap().source, vec![4, 1]);
        assert!(ds.get(2).is_none());
        assert_eq!(ds.unscored(), 0);
    }

    #[test]
    fn test_unscored_words_are_not_samples() {
        let ds = TranslitDataset::new(vec![EncodedPair { source: vec![3, 1], target: vec![0, 3, 1] }])
            .with_unscored(2);
        assert_eq!(ds.len(), 1);
        assert_eq!(ds.unscored(), 2);
    }
}
