// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates the full training pipeline in order:
//
//   Step 1: Validate the config
//   Step 2: Load train / valid / test CSV files   (Layer 4 - data)
//   Step 3: Split off validation if no file       (Layer 4 - data)
//   Step 4: Build + save alphabets                (Layer 6 - infra)
//   Step 5: Encode pairs, build datasets          (Layer 4 - data)
//   Step 6: Save configs for inference            (Layer 6 - infra)
//   Step 7: Open metrics sinks                    (Layer 6 - infra)
//   Step 8: Run training loop                     (Layer 5 - ml)

use anyhow::{bail, ensure, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::data::{
    dataset::TranslitDataset,
    encoder::encode_all,
    loader::CsvPairLoader,
    splitter::split_train_val,
};
use crate::domain::{alphabet::Alphabet, traits::PairSource, word_pair::WordPair};
use crate::infra::{
    alphabet_store::AlphabetStore,
    checkpoint::CheckpointManager,
    metrics::{ExperimentTracker, MetricsLogger, MetricsSink, TrainingSummary},
};
use crate::ml::{
    recurrent::CellType,
    seq2seq::Seq2SeqConfig,
    trainer::{run_training, BackendKind, OptimizerKind, TrainingData},
};

/// Name given to the Latin-script source alphabet.
pub const SOURCE_LANG: &str = "eng";

// ─── Training Configuration ──────────────────────────────────────────────────
// All hyperparameters for a training run. Saved to disk so the run can be
// inspected (and mirrored to the tracking log) later.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    pub data_dir:       String,
    pub target_lang:    String,
    pub train_file:     Option<String>,
    pub valid_file:     Option<String>,
    pub test_file:      Option<String>,
    pub valid_fraction: f64,
    pub checkpoint_dir: String,

    pub epochs:          usize,
    pub batch_size:      usize,
    pub learning_rate:   f64,
    pub optimizer:       OptimizerKind,
    pub teacher_forcing: f64,
    pub clip_norm:       f64,
    pub seed:            u64,
    pub backend:         BackendKind,

    pub cell_type:      CellType,
    pub embedding_size: usize,
    pub hidden_size:    usize,
    pub encoder_layers: usize,
    pub decoder_layers: usize,
    pub dropout:        f64,
    pub bidirectional:  bool,

    pub track:         bool,
    pub wandb_project: String,
    pub wandb_entity:  String,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            data_dir:       "aksharantar_sampled".to_string(),
            target_lang:    "hin".to_string(),
            train_file:     None,
            valid_file:     None,
            test_file:      None,
            valid_fraction: 0.2,
            checkpoint_dir: "checkpoints".to_string(),

            epochs:          10,
            batch_size:      32,
            learning_rate:   1e-3,
            optimizer:       OptimizerKind::Adam,
            teacher_forcing: 0.5,
            clip_norm:       1.0,
            seed:            42,
            backend:         BackendKind::Wgpu,

            cell_type:      CellType::Lstm,
            embedding_size: 128,
            hidden_size:    512,
            encoder_layers: 4,
            decoder_layers: 4,
            dropout:        0.2,
            bidirectional:  true,

            track:         false,
            wandb_project: "translit-seq2seq".to_string(),
            wandb_entity:  "local".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Split {
    Train,
    Valid,
    Test,
}

impl Split {
    fn suffix(self) -> &'static str {
        match self {
            Split::Train => "train",
            Split::Valid => "valid",
            Split::Test  => "test",
        }
    }
}

impl TrainConfig {
    /// Explicit file if given, else `{data_dir}/{lang}/{lang}_{split}.csv`.
    pub fn split_path(&self, split: Split) -> PathBuf {
        let explicit = match split {
            Split::Train => &self.train_file,
            Split::Valid => &self.valid_file,
            Split::Test  => &self.test_file,
        };
        match explicit {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(&self.data_dir)
                .join(&self.target_lang)
                .join(format!("{}_{}.csv", self.target_lang, split.suffix())),
        }
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(self.epochs > 0, "epochs must be positive");
        ensure!(self.batch_size > 0, "batch size must be positive");
        ensure!(self.embedding_size > 0, "embedding size must be positive");
        ensure!(self.hidden_size > 0, "hidden size must be positive");
        ensure!(self.encoder_layers > 0, "encoder needs at least one layer");
        ensure!(self.decoder_layers > 0, "decoder needs at least one layer");
        ensure!((0.0..=1.0).contains(&self.dropout), "dropout must be in [0, 1], got {}", self.dropout);
        ensure!(
            (0.0..=1.0).contains(&self.teacher_forcing),
            "teacher-forcing ratio must be in [0, 1], got {}",
            self.teacher_forcing,
        );
        ensure!(
            self.valid_fraction > 0.0 && self.valid_fraction < 1.0,
            "validation fraction must be in (0, 1), got {}",
            self.valid_fraction,
        );
        ensure!(self.learning_rate > 0.0, "learning rate must be positive");
        ensure!(self.clip_norm > 0.0, "clip norm must be positive");
        Ok(())
    }

    pub fn model_config(&self, source: &Alphabet, target: &Alphabet) -> Seq2SeqConfig {
        Seq2SeqConfig::new(self.cell_type, source.len(), target.len())
            .with_embedding_size(self.embedding_size)
            .with_hidden_size(self.hidden_size)
            .with_encoder_layers(self.encoder_layers)
            .with_decoder_layers(self.decoder_layers)
            .with_dropout(self.dropout)
            .with_bidirectional(self.bidirectional)
    }
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    /// Execute the full training pipeline end to end
    pub fn execute(&self) -> Result<TrainingSummary> {
        let cfg = &self.config;

        // ── Step 1: Validate ──────────────────────────────────────────────────
        cfg.validate()?;

        // ── Step 2: Load word pairs ───────────────────────────────────────────
        let train_loader = CsvPairLoader::new(cfg.split_path(Split::Train));
        if !train_loader.exists() {
            bail!("Training file '{}' not found", train_loader.path().display());
        }
        let train_pairs = train_loader.load_pairs()?;
        ensure!(!train_pairs.is_empty(), "training file '{}' has no usable pairs", train_loader.path().display());

        let valid_pairs = load_optional(cfg.split_path(Split::Valid))?;
        let test_pairs  = load_optional(cfg.split_path(Split::Test))?;

        // ── Step 3: Hold out validation data if there is no file ──────────────
        let (train_pairs, valid_pairs) = match valid_pairs {
            Some(valid) => (train_pairs, valid),
            None => {
                tracing::info!(
                    "No validation file, holding back {:.0}% of the training pairs",
                    cfg.valid_fraction * 100.0,
                );
                split_train_val(train_pairs, 1.0 - cfg.valid_fraction, cfg.seed)
            }
        };
        ensure!(!train_pairs.is_empty(), "training set is empty after the validation split");

        let longest = train_pairs.iter().map(WordPair::target_len).max().unwrap_or(0);
        tracing::info!("{} training pairs, longest target word {} chars", train_pairs.len(), longest);

        // ── Step 4: Alphabets (training data only) ────────────────────────────
        let (source, target) = AlphabetStore::new(&cfg.checkpoint_dir)
            .build_and_save(&train_pairs, SOURCE_LANG, &cfg.target_lang)?;

        // ── Step 5: Encode + datasets ─────────────────────────────────────────
        let train = encode_split("training", &train_pairs, &source, &target);
        let valid = encode_split("validation", &valid_pairs, &source, &target);
        let test  = test_pairs.map(|pairs| encode_split("test", &pairs, &source, &target));

        // ── Step 6: Save configs for inference ────────────────────────────────
        let model_cfg = cfg.model_config(&source, &target);
        let ckpt = CheckpointManager::new(&cfg.checkpoint_dir);
        ckpt.save_config(cfg)?;
        ckpt.save_model_config(&model_cfg)?;

        // ── Step 7: Metrics sinks ─────────────────────────────────────────────
        let logger = MetricsLogger::new(&cfg.checkpoint_dir)?;
        tracing::info!("Writing epoch metrics to '{}'", logger.csv_path().display());
        let mut sinks: Vec<Box<dyn MetricsSink>> = vec![Box::new(logger)];
        if cfg.track {
            sinks.push(Box::new(ExperimentTracker::new(
                &cfg.checkpoint_dir,
                &cfg.wandb_project,
                &cfg.wandb_entity,
                cfg,
            )?));
        }

        // ── Step 8: Run training loop (Layer 5) ───────────────────────────────
        let data = TrainingData { train, valid, test };
        run_training(cfg, &model_cfg, data, &ckpt, &mut sinks)
    }
}

/// Some(pairs) if the file exists, None otherwise.
fn load_optional(path: PathBuf) -> Result<Option<Vec<WordPair>>> {
    let loader = CsvPairLoader::new(path);
    if !loader.exists() {
        tracing::debug!("No file at '{}'", loader.path().display());
        return Ok(None);
    }
    loader.load_pairs().map(Some)
}

fn encode_split(
    name:   &str,
    pairs:  &[WordPair],
    source: &Alphabet,
    target: &Alphabet,
) -> TranslitDataset {
    let (encoded, dropped) = encode_all(pairs, source, target);
    if dropped > 0 {
        tracing::warn!(
            "{} {} pairs use characters not seen in training; they are counted as wrong",
            dropped, name,
        );
    }
    TranslitDataset::new(encoded).with_unscored(dropped)
}
