// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Saves and restores model weights using Burn's CompactRecorder.
//
// File layout:
//   checkpoints/
//     model_epoch_1.mpk    ← weights after epoch 1
//     model_epoch_2.mpk    ← weights after epoch 2
//     ...
//     latest_epoch.json    ← last epoch written
//     best_epoch.json      ← epoch with the lowest validation loss
//     train_config.json    ← the run's TrainConfig
//     model_config.json    ← Seq2SeqConfig (architecture + vocab sizes)
//     alphabets.json       ← written by AlphabetStore
//
// Inference rebuilds the model from model_config.json and then
// loads the best epoch's weights (falling back to the latest).

use anyhow::{Context, Result};
use std::{
    fs,
    path::{Path, PathBuf},
};
use burn::{
    prelude::*,
    record::{CompactRecorder, Recorder},
};

use crate::application::train_use_case::TrainConfig;
use crate::ml::seq2seq::{Seq2Seq, Seq2SeqConfig};

const LATEST_EPOCH_FILE: &str = "latest_epoch.json";
const BEST_EPOCH_FILE:   &str = "best_epoch.json";
const TRAIN_CONFIG_FILE: &str = "train_config.json";
const MODEL_CONFIG_FILE: &str = "model_config.json";

/// Manages saving and loading of model checkpoints.
/// All files are stored in the configured directory.
pub struct CheckpointManager {
    dir: PathBuf,
}

impl CheckpointManager {
    /// Creates the directory if it doesn't already exist.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        if let Err(e) = fs::create_dir_all(&dir) {
            tracing::warn!("Cannot create checkpoint dir '{}': {}", dir.display(), e);
        }
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write {dir}/model_epoch_{epoch}.mpk and move the latest pointer.
    pub fn save_model<B: Backend>(&self, model: &Seq2Seq<B>, epoch: usize) -> Result<()> {
        // Recorder adds the extension
        let path = self.dir.join(format!("model_epoch_{epoch}"));

        CompactRecorder::new()
            .record(model.clone().into_record(), path.clone())
            .with_context(|| format!("Failed to save checkpoint to '{}'", path.display()))?;

        self.write_epoch(LATEST_EPOCH_FILE, epoch)?;
        tracing::debug!("Saved checkpoint: epoch {}", epoch);
        Ok(())
    }

    /// Point best_epoch.json at an epoch that has already been saved.
    pub fn mark_best(&self, epoch: usize) -> Result<()> {
        self.write_epoch(BEST_EPOCH_FILE, epoch)
    }

    /// Load the best epoch's weights, or the latest if no best was recorded.
    ///
    /// `model` must have the architecture the checkpoint was written with.
    pub fn load_model<B: Backend>(&self, model: Seq2Seq<B>, device: &B::Device) -> Result<Seq2Seq<B>> {
        let epoch = match self.best_epoch()? {
            Some(epoch) => epoch,
            None => self.latest_epoch()?,
        };
        self.load_epoch(model, epoch, device)
    }

    pub fn load_epoch<B: Backend>(
        &self,
        model:  Seq2Seq<B>,
        epoch:  usize,
        device: &B::Device,
    ) -> Result<Seq2Seq<B>> {
        let path = self.dir.join(format!("model_epoch_{epoch}"));
        tracing::info!("Loading checkpoint from epoch {}", epoch);

        let record = CompactRecorder::new()
            .load(path.clone(), device)
            .with_context(|| {
                format!(
                    "Cannot load checkpoint '{}'. Have you trained the model first?",
                    path.display()
                )
            })?;

        Ok(model.load_record(record))
    }

    pub fn save_config(&self, cfg: &TrainConfig) -> Result<()> {
        self.write_json(TRAIN_CONFIG_FILE, cfg)
    }

    /// The inferencer rebuilds the exact architecture from this file.
    pub fn save_model_config(&self, cfg: &Seq2SeqConfig) -> Result<()> {
        self.write_json(MODEL_CONFIG_FILE, cfg)
    }

    pub fn load_model_config(&self) -> Result<Seq2SeqConfig> {
        self.read_json(MODEL_CONFIG_FILE)
    }

    /// Returns an error if training hasn't been run yet.
    pub fn latest_epoch(&self) -> Result<usize> {
        let path = self.dir.join(LATEST_EPOCH_FILE);
        let s = fs::read_to_string(&path)
            .with_context(|| format!("Cannot find '{}'. Have you run 'train' first?", path.display()))?;
        Ok(serde_json::from_str::<usize>(&s)?)
    }

    pub fn best_epoch(&self) -> Result<Option<usize>> {
        let path = self.dir.join(BEST_EPOCH_FILE);
        if !path.exists() {
            return Ok(None);
        }
        let s = fs::read_to_string(&path)
            .with_context(|| format!("Cannot read '{}'", path.display()))?;
        Ok(Some(serde_json::from_str::<usize>(&s)?))
    }

    fn write_epoch(&self, file: &str, epoch: usize) -> Result<()> {
        fs::write(self.dir.join(file), serde_json::to_string(&epoch)?)
            .with_context(|| format!("Failed to write {file}"))
    }

    fn write_json<T: serde::Serialize>(&self, file: &str, value: &T) -> Result<()> {
        let path = self.dir.join(file);
        let json = serde_json::to_string_pretty(value)?;
        fs::write(&path, json)
            .with_context(|| format!("Cannot write '{}'", path.display()))?;
        tracing::debug!("Saved '{}'", path.display());
        Ok(())
    }

    fn read_json<T: serde::de::DeserializeOwned>(&self, file: &str) -> Result<T> {
        let path = self.dir.join(file);
        let json = fs::read_to_string(&path).with_context(|| {
            format!(
                "Cannot read '{}'. Make sure you have run 'train' before 'transliterate'.",
                path.display()
            )
        })?;
        serde_json::from_str(&json).with_context(|| format!("Malformed '{}'", path.display()))
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::recurrent::CellType;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    fn tiny_config() -> Seq2SeqConfig {
        Seq2SeqConfig::new(CellType::Gru, 5, 6)
            .with_embedding_size(4)
            .with_hidden_size(4)
            .with_encoder_layers(1)
            .with_decoder_layers(1)
            .with_bidirectional(false)
    }

    #[test]
    fn test_latest_epoch_missing_is_error() {
        let dir  = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::new(dir.path());
        assert!(ckpt.latest_epoch().is_err());
        assert_eq!(ckpt.best_epoch().unwrap(), None);
    }

    #[test]
    fn test_best_epoch_wins_over_latest() {
        let dir    = tempfile::tempdir().unwrap();
        let ckpt   = CheckpointManager::new(dir.path());
        let device = Default::default();
        let model: Seq2Seq<TestBackend> = tiny_config().init(&device);

        ckpt.save_model(&model, 1).unwrap();
        ckpt.mark_best(1).unwrap();
        ckpt.save_model(&model, 2).unwrap();

        assert_eq!(ckpt.latest_epoch().unwrap(), 2);
        assert_eq!(ckpt.best_epoch().unwrap(), Some(1));

        let fresh: Seq2Seq<TestBackend> = tiny_config().init(&device);
        assert!(ckpt.load_model(fresh, &device).is_ok());
    }

    #[test]
    fn test_model_config_survives_disk() {
        let dir  = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::new(dir.path());
        ckpt.save_model_config(&tiny_config()).unwrap();

        let loaded = ckpt.load_model_config().unwrap();
        assert_eq!(loaded.cell_type, CellType::Gru);
        assert_eq!(loaded.target_vocab, 6);
        assert!(!loaded.bidirectional);
    }

    #[test]
    fn test_load_specific_epoch() {
        let dir    = tempfile::tempdir().unwrap();
        let ckpt   = CheckpointManager::new(dir.path());
        let device = Default::default();
        let model: Seq2Seq<TestBackend> = tiny_config().init(&device);
        ckpt.save_model(&model, 3).unwrap();

        let fresh: Seq2Seq<TestBackend> = tiny_config().init(&device);
        let loaded = ckpt.load_epoch(fresh, 3, &device).unwrap();

        let source = Tensor::<TestBackend, 1, Int>::from_ints([3, 4, 1], &device).reshape([1, 3]);
        assert_eq!(loaded.greedy_decode(source, 5).dims(), [1, 5]);

        let other: Seq2Seq<TestBackend> = tiny_config().init(&device);
        assert!(ckpt.load_epoch(other, 4, &device).is_err());
    }
}
