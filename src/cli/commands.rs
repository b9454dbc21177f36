// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the two subcommands, `train` and `transliterate`,
// and all their configurable flags.

use clap::{ArgAction, Args, Subcommand};

use crate::application::train_use_case::TrainConfig;
use crate::ml::{
    inferencer::DEFAULT_MAX_LEN,
    recurrent::CellType,
    trainer::{BackendKind, OptimizerKind},
};

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train the encoder-decoder model on word pairs
    Train(TrainArgs),

    /// Transliterate one word using a trained checkpoint
    Transliterate(TransliterateArgs),
}

/// All arguments for the `train` command.
#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Root of the corpus; files are read from {data_dir}/{lang}/{lang}_{split}.csv
    #[arg(long, default_value = "aksharantar_sampled")]
    pub data_dir: String,

    /// Target language code
    #[arg(long, default_value = "hin")]
    pub target_lang: String,

    /// Override the training CSV path
    #[arg(long)]
    pub train_file: Option<String>,

    /// Override the validation CSV path
    #[arg(long)]
    pub valid_file: Option<String>,

    /// Override the test CSV path
    #[arg(long)]
    pub test_file: Option<String>,

    /// Share of training pairs held out when there is no validation file
    #[arg(long, default_value_t = 0.2)]
    pub valid_fraction: f64,

    /// Where weights, alphabets, configs and metrics are written
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,

    #[arg(long, default_value_t = 10)]
    pub epochs: usize,

    #[arg(long, default_value_t = 32)]
    pub batch_size: usize,

    #[arg(long, default_value_t = 1e-3)]
    pub learning_rate: f64,

    #[arg(long, value_enum, default_value_t = OptimizerKind::Adam)]
    pub optimizer: OptimizerKind,

    /// Probability of feeding the true previous character to the decoder
    #[arg(long, default_value_t = 0.5)]
    pub teacher_forcing: f64,

    /// Max gradient L2 norm, applied to each parameter tensor separately
    /// (not one global norm across the whole model)
    #[arg(long, default_value_t = 1.0)]
    pub clip_norm: f64,

    /// Seeds shuffling, the validation split and teacher forcing
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    #[arg(long, value_enum, default_value_t = BackendKind::Wgpu)]
    pub backend: BackendKind,

    #[arg(long, value_enum, default_value_t = CellType::Lstm)]
    pub cell_type: CellType,

    #[arg(long, default_value_t = 128)]
    pub embedding_size: usize,

    #[arg(long, default_value_t = 512)]
    pub hidden_size: usize,

    #[arg(long, default_value_t = 4)]
    pub encoder_layers: usize,

    #[arg(long, default_value_t = 4)]
    pub decoder_layers: usize,

    #[arg(long, default_value_t = 0.2)]
    pub dropout: f64,

    /// Run the encoder in both directions (`--bidirectional false` to disable)
    #[arg(long, action = ArgAction::Set, default_value_t = true)]
    pub bidirectional: bool,

    /// Mirror metrics to an offline experiment-tracking log
    #[arg(long)]
    pub track: bool,

    #[arg(long, default_value = "translit-seq2seq")]
    pub wandb_project: String,

    #[arg(long, default_value = "local")]
    pub wandb_entity: String,
}

/// Convert CLI TrainArgs into the application-layer TrainConfig.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            data_dir:        a.data_dir,
            target_lang:     a.target_lang,
            train_file:      a.train_file,
            valid_file:      a.valid_file,
            test_file:       a.test_file,
            valid_fraction:  a.valid_fraction,
            checkpoint_dir:  a.checkpoint_dir,
            epochs:          a.epochs,
            batch_size:      a.batch_size,
            learning_rate:   a.learning_rate,
            optimizer:       a.optimizer,
            teacher_forcing: a.teacher_forcing,
            clip_norm:       a.clip_norm,
            seed:            a.seed,
            backend:         a.backend,
            cell_type:       a.cell_type,
            embedding_size:  a.embedding_size,
            hidden_size:     a.hidden_size,
            encoder_layers:  a.encoder_layers,
            decoder_layers:  a.decoder_layers,
            dropout:         a.dropout,
            bidirectional:   a.bidirectional,
            track:           a.track,
            wandb_project:   a.wandb_project,
            wandb_entity:    a.wandb_entity,
        }
    }
}

/// All arguments for the `transliterate` command
#[derive(Args, Debug)]
pub struct TransliterateArgs {
    /// Latin-script word to convert
    #[arg(long)]
    pub word: String,

    /// Directory where checkpoints were saved during training
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,

    /// Maximum number of output characters
    #[arg(long, default_value_t = DEFAULT_MAX_LEN)]
    pub max_len: usize,

    #[arg(long, value_enum, default_value_t = BackendKind::Wgpu)]
    pub backend: BackendKind,
}
