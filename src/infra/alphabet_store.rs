// ============================================================
// Layer 6 — Alphabet Store
// ============================================================
// Persists the source and target alphabets next to the model
// weights. The index of every character is fixed by the order
// it was first seen in the training data, so inference must
// reuse exactly these alphabets rather than rebuilding them.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};

use crate::domain::alphabet::{build_alphabets, Alphabet};
use crate::domain::word_pair::WordPair;

const ALPHABETS_FILE: &str = "alphabets.json";

#[derive(Serialize, Deserialize)]
struct AlphabetPair {
    source: Alphabet,
    target: Alphabet,
}

pub struct AlphabetStore {
    dir: PathBuf,
}

impl AlphabetStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Build both alphabets from the training pairs and write them to disk.
    pub fn build_and_save(
        &self,
        pairs:       &[WordPair],
        source_name: &str,
        target_name: &str,
    ) -> Result<(Alphabet, Alphabet)> {
        let (source, target) = build_alphabets(pairs, source_name, target_name);
        tracing::info!(
            "Alphabets built: {} = {} symbols, {} = {} symbols (markers included)",
            source.name(), source.len(), target.name(), target.len(),
        );
        self.save(&source, &target)?;
        Ok((source, target))
    }

    pub fn save(&self, source: &Alphabet, target: &Alphabet) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Cannot create '{}'", self.dir.display()))?;

        let path = self.dir.join(ALPHABETS_FILE);
        let pair = AlphabetPair { source: source.clone(), target: target.clone() };
        fs::write(&path, serde_json::to_string_pretty(&pair)?)
            .with_context(|| format!("Cannot write alphabets to '{}'", path.display()))?;

        tracing::debug!("Saved alphabets to '{}'", path.display());
        Ok(())
    }

    /// Returns (source, target).
    pub fn load(&self) -> Result<(Alphabet, Alphabet)> {
        let path = self.dir.join(ALPHABETS_FILE);
        let json = fs::read_to_string(&path).with_context(|| {
            format!("Cannot read alphabets from '{}'. Have you run 'train' first?", path.display())
        })?;
        let pair: AlphabetPair = serde_json::from_str(&json)
            .with_context(|| format!("Malformed alphabets file '{}'", path.display()))?;
        Ok((pair.source, pair.target))
    }
}
