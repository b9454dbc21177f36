// ============================================================
// Layer 6 — Metrics Logging
// ============================================================
// Every epoch produces one EpochMetrics row. Rows go to any
// number of MetricsSinks:
//
//   MetricsLogger     → checkpoints/metrics.csv
//   ExperimentTracker → checkpoints/tracking/{project}/{run_id}.jsonl
//
// Example CSV output:
//   epoch,train_loss,train_acc,val_loss,val_acc
//   1,1.812300,4.210000,1.901200,3.875000
//   2,1.402100,12.730000,1.512900,10.125000
//
// Accuracies are word-level percentages (0-100).

use anyhow::{Context, Result};
use std::{
    fs::{self, File, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
    time::{SystemTime, UNIX_EPOCH},
};
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Loss and word accuracy over one split.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SplitScore {
    pub loss:     f64,
    pub accuracy: f64,
}

/// One row of metrics data for a single training epoch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpochMetrics {
    /// Starts at 1
    pub epoch: usize,

    pub train_loss: f64,

    /// % of training words reproduced exactly without teacher forcing
    pub train_acc: f64,

    pub val_loss: f64,

    pub val_acc: f64,
}

impl EpochMetrics {
    pub fn new(epoch: usize, train: SplitScore, valid: SplitScore) -> Self {
        Self {
            epoch,
            train_loss: train.loss,
            train_acc:  train.accuracy,
            val_loss:   valid.loss,
            val_acc:    valid.accuracy,
        }
    }

    /// Returns true if this epoch improved over the previous best val_loss
    pub fn is_improvement(&self, best_val_loss: f64) -> bool {
        self.val_loss < best_val_loss
    }
}

/// End-of-run result handed to every sink once training stops.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingSummary {
    pub best_epoch: usize,
    pub best_valid: SplitScore,
    pub test:       Option<SplitScore>,
}

/// Destination for per-epoch metrics.
pub trait MetricsSink {
    fn log(&mut self, metrics: &EpochMetrics) -> Result<()>;

    fn finish(&mut self, _summary: &TrainingSummary) -> Result<()> {
        Ok(())
    }
}

// ─── CSV ──────────────────────────────────────────────────────────────────────

/// Logs epoch metrics to a CSV file for later analysis.
pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Starts a fresh CSV for this run, replacing any earlier run's rows.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;

        let csv_path = dir.join("metrics.csv");

        // One run per file; epochs would collide otherwise
        let mut f = File::create(&csv_path)
            .with_context(|| format!("Cannot create '{}'", csv_path.display()))?;
        writeln!(f, "epoch,train_loss,train_acc,val_loss,val_acc")?;
        tracing::debug!("Started metrics CSV: '{}'", csv_path.display());

        Ok(Self { csv_path })
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }
}

impl MetricsSink for MetricsLogger {
    fn log(&mut self, m: &EpochMetrics) -> Result<()> {
        let mut f = OpenOptions::new().append(true).open(&self.csv_path)?;

        writeln!(
            f,
            "{},{:.6},{:.6},{:.6},{:.6}",
            m.epoch, m.train_loss, m.train_acc, m.val_loss, m.val_acc,
        )?;

        tracing::debug!(
            "Logged epoch {} metrics: train_loss={:.4}, val_loss={:.4}",
            m.epoch, m.train_loss, m.val_loss,
        );
        Ok(())
    }
}

// ─── Experiment tracking ──────────────────────────────────────────────────────

/// Offline experiment-tracking mirror. Each run gets its own JSON-lines
/// file: a `run` header with the full config, one `epoch` line per
/// epoch and a closing `summary` line. Nothing leaves the machine.
pub struct ExperimentTracker {
    path:   PathBuf,
    run_id: String,
}

impl ExperimentTracker {
    pub fn new<C: Serialize>(
        root:    impl AsRef<Path>,
        project: &str,
        entity:  &str,
        config:  &C,
    ) -> Result<Self> {
        let dir = root.as_ref().join("tracking").join(project);
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create tracking dir '{}'", dir.display()))?;

        let run_id = new_run_id();
        let path   = dir.join(format!("{run_id}.jsonl"));

        let mut tracker = Self { path, run_id };
        tracker.append(&json!({
            "type":    "run",
            "project": project,
            "entity":  entity,
            "run_id":  tracker.run_id,
            "config":  config,
        }))?;

        tracing::info!("Tracking run '{}' in '{}'", tracker.run_id, tracker.path().display());
        Ok(tracker)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn append(&mut self, value: &serde_json::Value) -> Result<()> {
        let mut f = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Cannot open '{}'", self.path.display()))?;
        writeln!(f, "{}", serde_json::to_string(value)?)?;
        Ok(())
    }
}

impl MetricsSink for ExperimentTracker {
    fn log(&mut self, m: &EpochMetrics) -> Result<()> {
        self.append(&json!({
            "type":       "epoch",
            "epoch":      m.epoch,
            "train_loss": m.train_loss,
            "train_acc":  m.train_acc,
            "val_loss":   m.val_loss,
            "val_acc":    m.val_acc,
        }))
    }

    fn finish(&mut self, summary: &TrainingSummary) -> Result<()> {
        self.append(&json!({
            "type":       "summary",
            "best_epoch": summary.best_epoch,
            "best_valid": summary.best_valid,
            "test":       summary.test,
        }))
    }
}

fn new_run_id() -> String {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    format!("run-{}-{:03}", now.as_secs(), now.subsec_millis())
}
