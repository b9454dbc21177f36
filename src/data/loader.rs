// ============================================================
// Layer 4 — Word Pair Loader
// ============================================================
// Reads transliteration pairs from a header-less CSV file:
//
//   shastragaar,शस्त्रागार
//   bindhya,बिन्द्या
//   ...
//
// Column 0 is the Latin source word, column 1 the target word.
// Extra columns are ignored. Rows whose source or target is
// empty after cleaning are skipped with a debug message rather
// than failing the whole file.

use anyhow::{Context, Result};
use csv::ReaderBuilder;
use std::path::{Path, PathBuf};

use crate::data::preprocessor::Preprocessor;
use crate::domain::traits::PairSource;
use crate::domain::word_pair::WordPair;

/// Loads word pairs from one CSV file.
/// Implements the PairSource trait from Layer 3.
pub struct CsvPairLoader {
    path: PathBuf,
}

impl CsvPairLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }
}

impl PairSource for CsvPairLoader {
    fn load_pairs(&self) -> Result<Vec<WordPair>> {
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(&self.path)
            .with_context(|| format!("Cannot open word-pair file '{}'", self.path.display()))?;

        let src_prep = Preprocessor::source();
        let tgt_prep = Preprocessor::target();

        let mut pairs   = Vec::new();
        let mut skipped = 0usize;

        for (line, record) in reader.records().enumerate() {
            let record = record.with_context(|| {
                format!("Malformed CSV at '{}' row {}", self.path.display(), line + 1)
            })?;

            let source = record.get(0).map(|s| src_prep.clean(s)).unwrap_or_default();
            let target = record.get(1).map(|s| tgt_prep.clean(s)).unwrap_or_default();

            if source.is_empty() || target.is_empty() {
                tracing::debug!("Skipping row {} of '{}': empty word", line + 1, self.path.display());
                skipped += 1;
                continue;
            }
            pairs.push(WordPair::new(source, target));
        }

        if skipped > 0 {
            tracing::warn!("Skipped {} incomplete rows in '{}'", skipped, self.path.display());
        }
        tracing::info!("Loaded {} pairs from '{}'", pairs.len(), self.path.display());
        Ok(pairs)
    }
}
