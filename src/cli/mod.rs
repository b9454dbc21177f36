// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Parses command line arguments with clap and hands off to the
// application layer. Two commands are supported:
//   1. `train`         — trains the model on word-pair CSV files
//   2. `transliterate` — loads a checkpoint and converts one word

pub mod commands;

use anyhow::Result;
use burn::backend::{ndarray::NdArrayDevice, wgpu::WgpuDevice, NdArray, Wgpu};
use burn::prelude::Backend;
use clap::Parser;
use commands::{Commands, TrainArgs, TransliterateArgs};

use crate::domain::traits::Transliterator;
use crate::ml::trainer::BackendKind;

#[derive(Parser, Debug)]
#[command(
    name = "translit-seq2seq",
    version,
    about = "Train a character-level encoder-decoder transliteration model, then use it."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Match on the subcommand and dispatch to the correct use case.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)         => run_train(args),
            Commands::Transliterate(args) => run_transliterate(args),
        }
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    use crate::application::train_use_case::TrainUseCase;

    tracing::info!(
        "Starting training: {} cell, target language '{}'",
        args.cell_type, args.target_lang,
    );

    let summary = TrainUseCase::new(args.into()).execute()?;

    println!("Training complete. Best epoch: {}", summary.best_epoch);
    println!(
        "Best validation loss {:.4}, accuracy {:.2}%",
        summary.best_valid.loss, summary.best_valid.accuracy,
    );
    Ok(())
}

fn run_transliterate(args: TransliterateArgs) -> Result<()> {
    let output = match args.backend {
        BackendKind::Wgpu    => transliterate_on::<Wgpu>(&args, WgpuDevice::default())?,
        BackendKind::Ndarray => transliterate_on::<NdArray>(&args, NdArrayDevice::default())?,
    };
    println!("{} -> {}", args.word, output);
    Ok(())
}

fn transliterate_on<B: Backend>(args: &TransliterateArgs, device: B::Device) -> Result<String> {
    use crate::application::transliterate_use_case::TransliterateUseCase;

    let use_case = TransliterateUseCase::<B>::new(&args.checkpoint_dir, args.max_len, device)?;
    use_case.transliterate(&args.word)
}
