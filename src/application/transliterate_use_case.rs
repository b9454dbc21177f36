// ============================================================
// Layer 2 — Transliterate Use Case
// ============================================================
// Loads the trained model, alphabets and architecture from the
// checkpoint directory once, then converts words on request.

use anyhow::Result;
use burn::prelude::Backend;

use crate::domain::traits::Transliterator;
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::inferencer::Inferencer;

pub struct TransliterateUseCase<B: Backend> {
    inferencer: Inferencer<B>,
}

impl<B: Backend> TransliterateUseCase<B> {
    pub fn new(checkpoint_dir: &str, max_len: usize, device: B::Device) -> Result<Self> {
        let ckpt       = CheckpointManager::new(checkpoint_dir);
        let inferencer = Inferencer::from_checkpoint(&ckpt, max_len, device)?;
        Ok(Self { inferencer })
    }
}

impl<B: Backend> Transliterator for TransliterateUseCase<B> {
    fn transliterate(&self, word: &str) -> Result<String> {
        self.inferencer.predict(word)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::train_use_case::{TrainConfig, TrainUseCase};
    use crate::ml::trainer::BackendKind;
    use burn::backend::NdArray;
    use std::fs;

    #[test]
    fn test_transliterates_after_training() {
        let dir = tempfile::tempdir().unwrap();
        let train = dir.path().join("train.csv");
        let valid = dir.path().join("valid.csv");
        fs::write(&train, "ka,का\nkam,काम\nma,मा\nnam,नाम\n").unwrap();
        fs::write(&valid, "man,मान\n").unwrap();

        let ckpt_dir = dir.path().join("ckpt").to_string_lossy().into_owned();
        let cfg = TrainConfig {
            train_file:     Some(train.to_string_lossy().into_owned()),
            valid_file:     Some(valid.to_string_lossy().into_owned()),
            checkpoint_dir: ckpt_dir.clone(),
            epochs:         1,
            batch_size:     2,
            embedding_size: 4,
            hidden_size:    8,
            encoder_layers: 1,
            decoder_layers: 1,
            backend:        BackendKind::Ndarray,
            ..TrainConfig::default()
        };
        TrainUseCase::new(cfg).execute().unwrap();

        let use_case = TransliterateUseCase::<NdArray>::new(&ckpt_dir, 4, Default::default()).unwrap();
        let out = use_case.transliterate("kam").unwrap();
        assert!(out.chars().count() <= 4);
        assert!(use_case.transliterate("xyz").is_err());
    }
}
