// ============================================================
// Layer 5 — Training Loop
// ============================================================
// Epoch loop: teacher-forced training pass, then a validation
// pass (no teacher forcing) over both the training and the
// validation split, a checkpoint, and a metrics row.
//
// Backends:
//   - Training runs on Autodiff<Wgpu> (or Autodiff<NdArray>)
//   - model.valid() drops to the inner backend for evaluation,
//     which also switches dropout off
//
// Gradient clipping is not done by hand: every optimizer is
// built with a GradientClippingConfig::Norm and Burn clips
// inside optim.step().

use std::sync::Arc;

use anyhow::{ensure, Result};
use burn::{
    backend::{ndarray::NdArrayDevice, wgpu::WgpuDevice, Autodiff, NdArray, Wgpu},
    data::dataloader::{DataLoader, DataLoaderBuilder},
    grad_clipping::GradientClippingConfig,
    module::AutodiffModule,
    optim::{AdamConfig, AdamWConfig, GradientsParams, Optimizer, RmsPropConfig, SgdConfig},
    prelude::*,
    tensor::backend::AutodiffBackend,
};
use rand::{rngs::StdRng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::application::train_use_case::TrainConfig;
use crate::data::{
    batcher::{TranslitBatch, TranslitBatcher},
    dataset::TranslitDataset,
};
use crate::domain::alphabet::PAD_INDEX;
use crate::infra::checkpoint::CheckpointManager;
use crate::infra::metrics::{EpochMetrics, MetricsSink, SplitScore, TrainingSummary};
use crate::ml::seq2seq::{count_correct_words, predictions, sequence_loss, Seq2Seq, Seq2SeqConfig};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OptimizerKind {
    Sgd,
    #[default]
    Adam,
    Adamw,
    Rmsprop,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    Wgpu,
    Ndarray,
}

/// The three splits, already encoded.
pub struct TrainingData {
    pub train: TranslitDataset,
    pub valid: TranslitDataset,
    pub test:  Option<TranslitDataset>,
}

pub fn run_training(
    cfg:       &TrainConfig,
    model_cfg: &Seq2SeqConfig,
    data:      TrainingData,
    ckpt:      &CheckpointManager,
    sinks:     &mut [Box<dyn MetricsSink>],
) -> Result<TrainingSummary> {
    match cfg.backend {
        BackendKind::Wgpu => {
            let device = WgpuDevice::default();
            tracing::info!("Using WGPU device: {:?}", device);
            fit::<Autodiff<Wgpu>>(cfg, model_cfg, data, ckpt, sinks, device)
        }
        BackendKind::Ndarray => {
            let device = NdArrayDevice::default();
            tracing::info!("Using NdArray device: {:?}", device);
            fit::<Autodiff<NdArray>>(cfg, model_cfg, data, ckpt, sinks, device)
        }
    }
}

/// Build the model and the configured optimizer, then train.
pub fn fit<B: AutodiffBackend>(
    cfg:       &TrainConfig,
    model_cfg: &Seq2SeqConfig,
    data:      TrainingData,
    ckpt:      &CheckpointManager,
    sinks:     &mut [Box<dyn MetricsSink>],
    device:    B::Device,
) -> Result<TrainingSummary> {
    let model: Seq2Seq<B> = model_cfg.init(&device);
    tracing::info!(
        "Model ready: {} cell, {}+{} layers, hidden={}, bidirectional={}, {} parameters",
        model_cfg.cell_type, model_cfg.encoder_layers, model_cfg.decoder_layers,
        model_cfg.hidden_size, model.encoder.stack.is_bidirectional(), model.num_params(),
    );

    let clip = Some(GradientClippingConfig::Norm(cfg.clip_norm as f32));

    match cfg.optimizer {
        OptimizerKind::Adam => {
            let optim = AdamConfig::new().with_grad_clipping(clip).init::<B, Seq2Seq<B>>();
            train_loop(model, optim, cfg, data, ckpt, sinks, &device)
        }
        OptimizerKind::Adamw => {
            let optim = AdamWConfig::new().with_grad_clipping(clip).init::<B, Seq2Seq<B>>();
            train_loop(model, optim, cfg, data, ckpt, sinks, &device)
        }
        OptimizerKind::Sgd => {
            let optim = SgdConfig::new().with_gradient_clipping(clip).init::<B, Seq2Seq<B>>();
            train_loop(model, optim, cfg, data, ckpt, sinks, &device)
        }
        OptimizerKind::Rmsprop => {
            let optim = RmsPropConfig::new().with_grad_clipping(clip).init::<B, Seq2Seq<B>>();
            train_loop(model, optim, cfg, data, ckpt, sinks, &device)
        }
    }
}

fn train_loop<B, O>(
    mut model: Seq2Seq<B>,
    mut optim: O,
    cfg:       &TrainConfig,
    data:      TrainingData,
    ckpt:      &CheckpointManager,
    sinks:     &mut [Box<dyn MetricsSink>],
    device:    &B::Device,
) -> Result<TrainingSummary>
where
    B: AutodiffBackend,
    O: Optimizer<Seq2Seq<B>, B>,
{
    ensure!(data.train.sample_count() > 0, "training set is empty");

    let mut rng = StdRng::seed_from_u64(cfg.seed);
    tracing::info!(
        "{} training / {} validation words, longest target sequence {}",
        data.train.sample_count(), data.valid.sample_count(), data.train.max_target_len(),
    );

    // ── Loaders ───────────────────────────────────────────────────────────────
    // Shuffled autodiff loader for the update pass; ordered inner-backend
    // loaders for evaluation.
    let train_loader: Arc<dyn DataLoader<B, TranslitBatch<B>>> =
        DataLoaderBuilder::new(TranslitBatcher::new())
            .batch_size(cfg.batch_size)
            .shuffle(cfg.seed)
            .num_workers(1)
            .set_device(device.clone())
            .build(data.train.clone());

    let valid_unscored = data.valid.unscored();
    let test_unscored  = data.test.as_ref().map_or(0, TranslitDataset::unscored);

    let train_eval_loader = eval_loader::<B::InnerBackend>(cfg, data.train, device.clone());
    let valid_loader      = eval_loader::<B::InnerBackend>(cfg, data.valid, device.clone());
    let test_loader       = data.test.map(|ds| eval_loader::<B::InnerBackend>(cfg, ds, device.clone()));

    let mut best_val_loss = f64::INFINITY;
    let mut best: Option<(usize, SplitScore, Seq2Seq<B::InnerBackend>)> = None;

    // ── Epoch loop ────────────────────────────────────────────────────────────
    for epoch in 1..=cfg.epochs {
        println!("====================================");
        println!("[Epoch {} / {}]", epoch, cfg.epochs);

        let mut forced_loss_sum = 0.0f64;
        let mut batches = 0usize;

        for batch in train_loader.iter() {
            let logits = model.forward(batch.source, batch.target.clone(), cfg.teacher_forcing, &mut rng);
            let loss   = sequence_loss(logits, batch.target);

            forced_loss_sum += loss.clone().into_scalar().elem::<f64>();
            batches += 1;

            let grads = GradientsParams::from_grads(loss.backward(), &model);
            model = optim.step(cfg.learning_rate, model, grads);
        }
        tracing::debug!(
            "Epoch {} teacher-forced loss {:.4} over {} batches",
            epoch, forced_loss_sum / batches.max(1) as f64, batches,
        );

        // ── Validation phase ──────────────────────────────────────────────────
        let model_valid = model.valid();
        let train_score = evaluate(&model_valid, train_eval_loader.iter(), 0);
        let val_score   = evaluate(&model_valid, valid_loader.iter(), valid_unscored);

        println!("Training Loss: {:.2}", train_score.loss);
        println!("Training Accuracy: {:.2}", train_score.accuracy);
        println!("Validation Loss: {:.2}", val_score.loss);
        println!("Validation Accuracy: {:.2}", val_score.accuracy);

        let metrics = EpochMetrics::new(epoch, train_score, val_score);
        for sink in sinks.iter_mut() {
            sink.log(&metrics)?;
        }

        ckpt.save_model(&model, epoch)?;
        if metrics.is_improvement(best_val_loss) {
            best_val_loss = val_score.loss;
            ckpt.mark_best(epoch)?;
            best = Some((epoch, val_score, model_valid));
            tracing::info!("New best validation loss {:.4} at epoch {}", best_val_loss, epoch);
        }
    }

    let (best_epoch, best_score, best_model) = match best {
        Some(b) => b,
        // Validation loss was never finite (e.g. NaN): fall back to the
        // final weights.
        None => {
            let final_model = model.valid();
            let score = evaluate(&final_model, valid_loader.iter(), valid_unscored);
            (cfg.epochs, score, final_model)
        }
    };

    let test_score = test_loader.map(|loader| {
        let score = evaluate(&best_model, loader.iter(), test_unscored);
        println!("Test Loss: {:.4}", score.loss);
        println!("Test Accuracy: {:.2}", score.accuracy);
        score
    });

    let summary = TrainingSummary { best_epoch, best_valid: best_score, test: test_score };
    for sink in sinks.iter_mut() {
        sink.finish(&summary)?;
    }

    tracing::info!("Training complete! Best epoch: {}", best_epoch);
    Ok(summary)
}

fn eval_loader<B: Backend>(
    cfg:     &TrainConfig,
    dataset: TranslitDataset,
    device:  B::Device,
) -> Arc<dyn DataLoader<B, TranslitBatch<B>>> {
    DataLoaderBuilder::new(TranslitBatcher::new())
        .batch_size(cfg.batch_size)
        .num_workers(1)
        .set_device(device)
        .build(dataset)
}

/// Mean batch loss and word accuracy (percent) with teacher forcing off.
///
/// `unscored` words of the split never reached the model (unencodable
/// characters); they are counted as wrong.
pub fn evaluate<B, I>(model: &Seq2Seq<B>, batches: I, unscored: usize) -> SplitScore
where
    B: Backend,
    I: IntoIterator<Item = TranslitBatch<B>>,
{
    // Never drawn from at ratio 0.0, but forward() wants one.
    let mut rng = StdRng::seed_from_u64(0);

    let mut loss_sum = 0.0f64;
    let mut batches_seen = 0usize;
    let mut correct = 0usize;
    let mut words = 0usize;

    for batch in batches {
        let [batch_size, tgt_len] = batch.target.dims();
        let logits = model.forward(batch.source, batch.target.clone(), 0.0, &mut rng);

        loss_sum += sequence_loss(logits.clone(), batch.target.clone())
            .into_scalar()
            .elem::<f64>();
        batches_seen += 1;

        let target_tail = batch.target.slice([0..batch_size, 1..tgt_len]);
        correct += count_correct_words(predictions(logits), target_tail, PAD_INDEX);
        words   += batch_size;
    }

    SplitScore {
        loss:     if batches_seen > 0 { loss_sum / batches_seen as f64 } else { f64::NAN },
        accuracy: word_accuracy(correct, words, unscored),
    }
}

/// Percentage of correct words over every word of the split.
pub fn word_accuracy(correct: usize, scored: usize, unscored: usize) -> f64 {
    let total = scored + unscored;
    if total == 0 {
        return 0.0;
    }
    correct as f64 / total as f64 * 100.0
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::encoder::EncodedPair;
    use crate::ml::recurrent::CellType;
    use burn::data::dataloader::batcher::Batcher;

    type TestBackend = Autodiff<NdArray>;

    fn pairs() -> Vec<EncodedPair> {
        vec![
            EncodedPair { source: vec![3, 4, 1], target: vec![0, 3, 4, 1] },
            EncodedPair { source: vec![4, 1],    target: vec![0, 5, 1] },
            EncodedPair { source: vec![5, 3, 1], target: vec![0, 4, 3, 1] },
            EncodedPair { source: vec![3, 1],    target: vec![0, 3, 1] },
        ]
    }

    fn tiny_config() -> Seq2SeqConfig {
        Seq2SeqConfig::new(CellType::Lstm, 6, 6)
            .with_embedding_size(8)
            .with_hidden_size(16)
            .with_encoder_layers(1)
            .with_decoder_layers(1)
            .with_dropout(0.0)
    }

    #[test]
    fn test_repeated_steps_reduce_loss() {
        let device = Default::default();
        let mut model: Seq2Seq<TestBackend> = tiny_config().init(&device);
        let mut optim = AdamConfig::new()
            .with_grad_clipping(Some(GradientClippingConfig::Norm(1.0)))
            .init::<TestBackend, Seq2Seq<TestBackend>>();
        let batch: TranslitBatch<TestBackend> = TranslitBatcher::new().batch(pairs(), &device);
        let mut rng = StdRng::seed_from_u64(1);

        let mut losses = Vec::new();
        for _ in 0..30 {
            let logits = model.forward(batch.source.clone(), batch.target.clone(), 1.0, &mut rng);
            let loss   = sequence_loss(logits, batch.target.clone());
            losses.push(loss.clone().into_scalar().elem::<f64>());
            let grads = GradientsParams::from_grads(loss.backward(), &model);
            model = optim.step(1e-2, model, grads);
        }
        assert!(losses[29] < losses[0], "loss did not go down: {:?}", losses);
    }

    #[test]
    fn test_evaluate_counts_every_word() {
        let device = Default::default();
        let model: Seq2Seq<NdArray> = tiny_config().init(&device);
        let batcher = TranslitBatcher::new();
        let all = pairs();
        let batches: Vec<TranslitBatch<NdArray>> = vec![
            batcher.batch(all[..3].to_vec(), &device),
            batcher.batch(all[3..].to_vec(), &device),
        ];
        let score = evaluate(&model, batches, 0);
        assert!(score.loss.is_finite());
        assert!((0.0..=100.0).contains(&score.accuracy));
    }

    #[test]
    fn test_unscored_words_count_as_wrong() {
        // one encodable word plus two that never reached the model
        assert!((word_accuracy(1, 1, 2) - 100.0 / 3.0).abs() < 1e-9);
        assert_eq!(word_accuracy(0, 0, 2), 0.0);
        assert_eq!(word_accuracy(2, 2, 0), 100.0);

        let device = Default::default();
        let model: Seq2Seq<NdArray> = tiny_config().init(&device);
        let batch: TranslitBatch<NdArray> = TranslitBatcher::new().batch(pairs()[..1].to_vec(), &device);
        let score = evaluate(&model, vec![batch], 2);
        assert!(score.accuracy <= 100.0 / 3.0 + 1e-9, "accuracy {}", score.accuracy);
    }

    #[test]
    fn test_evaluate_empty_split() {
        let model: Seq2Seq<NdArray> = tiny_config().init(&Default::default());
        let score = evaluate(&model, Vec::<TranslitBatch<NdArray>>::new(), 0);
        assert!(score.loss.is_nan());
        assert_eq!(score.accuracy, 0.0);
    }

    #[test]
    fn test_fit_writes_checkpoints_and_summary() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = TrainConfig {
            checkpoint_dir: dir.path().to_string_lossy().into_owned(),
            epochs:         2,
            batch_size:     2,
            backend:        BackendKind::Ndarray,
            ..TrainConfig::default()
        };
        let ckpt = CheckpointManager::new(&cfg.checkpoint_dir);
        let data = TrainingData {
            train: TranslitDataset::new(pairs()),
            valid: TranslitDataset::new(pairs()[..2].to_vec()),
            test:  Some(TranslitDataset::new(pairs()[2..].to_vec()).with_unscored(2)),
        };
        let mut sinks: Vec<Box<dyn MetricsSink>> = Vec::new();

        let summary = fit::<TestBackend>(&cfg, &tiny_config(), data, &ckpt, &mut sinks, Default::default())
            .unwrap();

        assert!((1..=2).contains(&summary.best_epoch));
        // 2 scored + 2 unscored test words: at most half can be right
        let test = summary.test.unwrap();
        assert!(test.accuracy <= 50.0 + 1e-9, "test accuracy {}", test.accuracy);
        assert!(dir.path().join("model_epoch_2.mpk").exists());
        assert!(dir.path().join("best_epoch.json").exists());
    }
}
