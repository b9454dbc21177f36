// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Everything that touches the checkpoint directory:
//
//   checkpoint.rs     — model weights (CompactRecorder), the
//                       latest/best epoch pointers and both
//                       configs as JSON
//
//   alphabet_store.rs — source/target alphabets as JSON, so
//                       inference maps characters exactly as
//                       training did
//
//   metrics.rs        — per-epoch metrics to CSV and to the
//                       offline experiment-tracking log

/// Model checkpoint saving and loading
pub mod checkpoint;

/// Alphabet persistence
pub mod alphabet_store;

/// Training metrics sinks
pub mod metrics;
