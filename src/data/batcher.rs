// ============================================================
// Layer 4 — Transliteration Batcher
// ============================================================
// Implements Burn's Batcher trait to turn a Vec<EncodedPair>
// into tensors.
//
// Words have different lengths, so unlike a fixed-length
// pipeline each batch is padded dynamically: source rows are
// padded to the longest source word in THIS batch, target rows
// to the longest target word in THIS batch. Two batches can
// therefore have different shapes.
//
//   Input:  N pairs
//   Output: source [N, S_max], target [N, T_max]
//
// The batcher holds no device; Burn's DataLoader passes the
// device in, so one batcher serves the autodiff training
// loader and the plain inner-backend evaluation loaders.

use burn::{data::dataloader::batcher::Batcher, prelude::*};

use crate::data::encoder::{pad_batch, EncodedPair};
use crate::domain::alphabet::PAD_INDEX;

// ─── TranslitBatch ────────────────────────────────────────────────────────────
#[derive(Debug, Clone)]
pub struct TranslitBatch<B: Backend> {
    /// Source character indices, shape [batch, src_len]
    pub source: Tensor<B, 2, Int>,

    /// Target indices starting with SOS, shape [batch, tgt_len]
    pub target: Tensor<B, 2, Int>,
}

// ─── TranslitBatcher ──────────────────────────────────────────────────────────
#[derive(Clone, Debug)]
pub struct TranslitBatcher {
    pad: usize,
}

impl TranslitBatcher {
    pub fn new() -> Self {
        Self { pad: PAD_INDEX }
    }
}

impl Default for TranslitBatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: Backend> Batcher<B, EncodedPair, TranslitBatch<B>> for TranslitBatcher {
    fn batch(&self, items: Vec<EncodedPair>, device: &B::Device) -> TranslitBatch<B> {
        let batch_size = items.len();

        let (src_flat, src_len) = pad_batch(items.iter().map(|p| p.source.as_slice()), self.pad);
        let (tgt_flat, tgt_len) = pad_batch(items.iter().map(|p| p.target.as_slice()), self.pad);

        let source = Tensor::<B, 1, Int>::from_ints(src_flat.as_slice(), device)
            .reshape([batch_size, src_len]);
        let target = Tensor::<B, 1, Int>::from_ints(tgt_flat.as_slice(), device)
            .reshape([batch_size, tgt_len]);

        TranslitBatch { source, target }
    }
}
