// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// All Burn model code lives here.
//
//   recurrent.rs  — RNN / GRU / LSTM cells behind one enum, and
//                   a multi-layer (optionally bidirectional) stack
//
//   encoder.rs    — embedding + stack, folds the top layer's
//                   final state into a single context state
//
//   decoder.rs    — one-character-at-a-time decoder with a
//                   projection onto the target alphabet
//
//   seq2seq.rs    — encoder + decoder with teacher forcing,
//                   greedy decoding, loss and word accuracy
//
//   trainer.rs    — epoch loop, evaluation, checkpointing
//
//   inferencer.rs — loads a checkpoint and transliterates words

/// Recurrent cells and stacks
pub mod recurrent;

/// Source-word encoder
pub mod encoder;

/// Target-word decoder
pub mod decoder;

/// Encoder-decoder model
pub mod seq2seq;

/// Full training loop with validation and checkpointing
pub mod trainer;

/// Inference engine
pub mod inferencer;
