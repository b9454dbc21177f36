// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything between a CSV file on disk and a tensor batch:
//
//   CSV file
//       │
//       ▼
//   CsvPairLoader     → reads rows, cleans both words
//       │
//       ▼
//   split_train_val   → (only when no validation file exists)
//       │
//       ▼
//   encoder           → words to index sequences (+ SOS / EOS)
//       │
//       ▼
//   TranslitDataset   → implements Burn's Dataset trait
//       │
//       ▼
//   TranslitBatcher   → pads each batch to its longest word
//       │
//       ▼
//   DataLoader        → feeds batches to the training loop

/// Reads header-less two-column CSV files
pub mod loader;

/// Cleans raw CSV cells
pub mod preprocessor;

/// Word to index-sequence conversion and batch padding
pub mod encoder;

/// Implements Burn's Dataset trait for encoded pairs
pub mod dataset;

/// Implements Burn's Batcher trait with per-batch padding
pub mod batcher;

/// Seeded shuffle + train/validation split
pub mod splitter;
