use burn::{nn::loss::CrossEntropyLossConfig, prelude::*};
use rand::Rng;

use crate::domain::alphabet::SOS_INDEX;
use crate::ml::decoder::{Decoder, DecoderConfig};
use crate::ml::encoder::{Encoder, EncoderConfig};
use crate::ml::recurrent::CellType;

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize.
#[derive(Config, Debug)]
pub struct Seq2SeqConfig {
    pub cell_type:    CellType,
    pub source_vocab: usize,
    pub target_vocab: usize,
    #[config(default = 128)]
    pub embedding_size: usize,
    #[config(default = 512)]
    pub hidden_size: usize,
    #[config(default = 4)]
    pub encoder_layers: usize,
    #[config(default = 4)]
    pub decoder_layers: usize,
    #[config(default = 0.2)]
    pub dropout: f64,
    #[config(default = true)]
    pub bidirectional: bool,
}

impl Seq2SeqConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> Seq2Seq<B> {
        let encoder = EncoderConfig::new(
            self.cell_type, self.source_vocab, self.embedding_size,
            self.hidden_size, self.encoder_layers, self.dropout, self.bidirectional,
        )
        .init(device);
        let decoder = DecoderConfig::new(
            self.cell_type, self.target_vocab, self.embedding_size,
            self.hidden_size, self.decoder_layers, self.dropout,
        )
        .init(device);
        Seq2Seq { encoder, decoder }
    }
}

#[derive(Module, Debug)]
pub struct Seq2Seq<B: Backend> {
    pub encoder: Encoder<B>,
    pub decoder: Decoder<B>,
}

impl<B: Backend> Seq2Seq<B> {
    /// source: [batch, src_len], target: [batch, tgt_len] (starting with SOS)
    /// → logits [batch, tgt_len, target_vocab]. Position 0 is all zeros.
    ///
    /// At each step the next decoder input is the ground-truth character
    /// with probability `teacher_force_ratio`, otherwise the decoder's own
    /// argmax. One draw per time step, shared across the batch.
    pub fn forward<R: Rng>(
        &self,
        source:              Tensor<B, 2, Int>,
        target:              Tensor<B, 2, Int>,
        teacher_force_ratio: f64,
        rng:                 &mut R,
    ) -> Tensor<B, 3> {
        let [batch, tgt_len] = target.dims();
        let vocab  = self.decoder.vocab_size;
        let device = target.device();

        let mut state = self.decoder.initial_state(self.encoder.forward(source));

        let mut outputs = Vec::with_capacity(tgt_len);
        outputs.push(Tensor::zeros([batch, 1, vocab], &device));

        let mut input = column(&target, 0);
        for i in 1..tgt_len {
            let (logits, next) = self.decoder.step(input, state);
            state = next;

            let best_guess = logits.clone().argmax(1).reshape([batch]);
            outputs.push(logits.reshape([batch, 1, vocab]));

            let forced = teacher_force_ratio > 0.0 && rng.gen::<f64>() < teacher_force_ratio;
            input = if forced { column(&target, i) } else { best_guess };
        }

        Tensor::cat(outputs, 1)
    }

    /// Decode without any ground truth: start from SOS and feed back the
    /// argmax for `max_len` steps. Returns [batch, max_len] indices; rows
    /// are cut at their first EOS by the caller.
    ///
    /// Panics if `max_len` is 0.
    pub fn greedy_decode(&self, source: Tensor<B, 2, Int>, max_len: usize) -> Tensor<B, 2, Int> {
        assert!(max_len > 0, "greedy decoding needs max_len >= 1");
        let [batch, _] = source.dims();
        let device = source.device();

        let mut state = self.decoder.initial_state(self.encoder.forward(source));
        let mut input = Tensor::<B, 1, Int>::full([batch], SOS_INDEX as i64, &device);

        let mut tokens = Vec::with_capacity(max_len);
        for _ in 0..max_len {
            let (logits, next) = self.decoder.step(input, state);
            state = next;
            input = logits.argmax(1).reshape([batch]);
            tokens.push(input.clone().reshape([batch, 1]));
        }
        Tensor::cat(tokens, 1)
    }
}

/// target[:, i] as a [batch] tensor.
fn column<B: Backend>(target: &Tensor<B, 2, Int>, i: usize) -> Tensor<B, 1, Int> {
    let [batch, _] = target.dims();
    target.clone().slice([0..batch, i..i + 1]).reshape([batch])
}

/// Cross entropy over every position after SOS.
///   logits [batch, T, V] → [batch * (T-1), V]
///   target [batch, T]    → [batch * (T-1)]
/// PAD positions are scored like any other target index.
pub fn sequence_loss<B: Backend>(logits: Tensor<B, 3>, target: Tensor<B, 2, Int>) -> Tensor<B, 1> {
    let [batch, tgt_len, vocab] = logits.dims();
    let steps = tgt_len - 1;

    let logits = logits
        .slice([0..batch, 1..tgt_len, 0..vocab])
        .reshape([batch * steps, vocab]);
    let target = target.slice([0..batch, 1..tgt_len]).reshape([batch * steps]);

    CrossEntropyLossConfig::new()
        .init(&logits.device())
        .forward(logits, target)
}

/// Argmax predictions for every position after SOS: [batch, T-1].
pub fn predictions<B: Backend>(logits: Tensor<B, 3>) -> Tensor<B, 2, Int> {
    let [batch, tgt_len, vocab] = logits.dims();
    logits
        .slice([0..batch, 1..tgt_len, 0..vocab])
        .argmax(2)
        .reshape([batch, tgt_len - 1])
}

/// Number of words predicted exactly. A word counts as correct when every
/// position either matches the target or the target there is `pad`, so
/// padding never counts for or against a word.
///
/// `predicted` and `target` are both [batch, T-1] (SOS already dropped).
pub fn count_correct_words<B: Backend>(
    predicted: Tensor<B, 2, Int>,
    target:    Tensor<B, 2, Int>,
    pad:       usize,
) -> usize {
    let real_char = target.clone().not_equal_elem(pad as i64).int();
    let wrong     = predicted.not_equal(target).int() * real_char;
    let correct: i64 = wrong
        .sum_dim(1)
        .equal_elem(0)
        .int()
        .sum()
        .into_scalar()
        .elem::<i64>();
    correct as usize
}
