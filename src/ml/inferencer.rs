// ============================================================
// Layer 5 — Inferencer
// ============================================================
// Loads a trained checkpoint and transliterates single words
// with greedy decoding: start from SOS, feed back the argmax,
// stop at EOS or after max_len characters.

use anyhow::{ensure, Result};
use burn::prelude::*;

use crate::data::{encoder::encode_source, preprocessor::Preprocessor};
use crate::domain::alphabet::Alphabet;
use crate::infra::{alphabet_store::AlphabetStore, checkpoint::CheckpointManager};
use crate::ml::seq2seq::Seq2Seq;

pub const DEFAULT_MAX_LEN: usize = 30;

pub struct Inferencer<B: Backend> {
    model:   Seq2Seq<B>,
    source:  Alphabet,
    target:  Alphabet,
    clean:   Preprocessor,
    max_len: usize,
    device:  B::Device,
}

impl<B: Backend> Inferencer<B> {
    pub fn from_checkpoint(ckpt: &CheckpointManager, max_len: usize, device: B::Device) -> Result<Self> {
        let (source, target) = AlphabetStore::new(ckpt.dir()).load()?;

        // Dropout is off outside of autodiff training, so the stored
        // dropout value can stay as is.
        let model_cfg = ckpt.load_model_config()?;
        ensure!(
            model_cfg.source_vocab == source.len() && model_cfg.target_vocab == target.len(),
            "checkpoint vocab sizes ({}, {}) do not match the saved alphabets ({}, {})",
            model_cfg.source_vocab, model_cfg.target_vocab, source.len(), target.len(),
        );

        let model: Seq2Seq<B> = model_cfg.init(&device);
        let model = ckpt.load_model(model, &device)?;
        tracing::info!("Model loaded from checkpoint ({} cell)", model_cfg.cell_type);

        Self::new(model, source, target, max_len, device)
    }

    pub fn new(
        model:   Seq2Seq<B>,
        source:  Alphabet,
        target:  Alphabet,
        max_len: usize,
        device:  B::Device,
    ) -> Result<Self> {
        ensure!(max_len > 0, "max_len must be at least 1");
        Ok(Self { model, source, target, clean: Preprocessor::source(), max_len, device })
    }

    /// Transliterate one word. Fails if the word is empty after cleaning
    /// or contains a character the source alphabet has never seen.
    pub fn predict(&self, word: &str) -> Result<String> {
        let word = self.clean.clean(word);
        ensure!(!word.is_empty(), "nothing to transliterate");

        let ids = encode_source(&word, &self.source)?;
        let len = ids.len();
        let ids: Vec<i32> = ids.into_iter().map(|i| i as i32).collect();

        let input = Tensor::<B, 1, Int>::from_ints(ids.as_slice(), &self.device).reshape([1, len]);
        let decoded: Vec<usize> = self
            .model
            .greedy_decode(input, self.max_len)
            .into_data()
            .iter::<i64>()
            .map(|i| i as usize)
            .collect();

        let out = self.target.decode(&decoded);
        tracing::debug!("'{}' -> '{}' ({:?})", word, out, decoded);
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{alphabet::build_alphabets, word_pair::WordPair};
    use crate::ml::{recurrent::CellType, seq2seq::Seq2SeqConfig};
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    fn inferencer(max_len: usize) -> Result<Inferencer<TestBackend>> {
        let pairs = vec![WordPair::new("ka", "का"), WordPair::new("ma", "मा")];
        let (source, target) = build_alphabets(&pairs, "eng", "hin");
        let model = Seq2SeqConfig::new(CellType::Lstm, source.len(), target.len())
            .with_embedding_size(4)
            .with_hidden_size(8)
            .with_encoder_layers(1)
            .with_decoder_layers(2)
            .init(&Default::default());
        Inferencer::new(model, source, target, max_len, Default::default())
    }

    #[test]
    fn test_output_never_exceeds_max_len() {
        let inf = inferencer(3).unwrap();
        let out = inf.predict("kama").unwrap();
        assert!(out.chars().count() <= 3);
        assert!(out.chars().all(|c| "कामा".contains(c)));
    }

    #[test]
    fn test_unknown_character_is_an_error() {
        let inf = inferencer(5).unwrap();
        let err = inf.predict("kaz").unwrap_err();
        assert!(err.to_string().contains("'z'"));
    }

    #[test]
    fn test_source_is_lowercased() {
        assert!(inferencer(5).unwrap().predict("KA").is_ok());
    }

    #[test]
    fn test_zero_max_len_rejected() {
        assert!(inferencer(0).is_err());
    }

    #[test]
    fn test_empty_word_rejected() {
        assert!(inferencer(5).unwrap().predict("   ").is_err());
    }

    #[test]
    fn test_from_checkpoint_needs_training_artifacts() {
        let dir  = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::new(dir.path());
        assert!(Inferencer::<TestBackend>::from_checkpoint(&ckpt, 5, Default::default()).is_err());
    }
}
