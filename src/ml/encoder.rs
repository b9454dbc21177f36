use burn::{
    nn::{Dropout, DropoutConfig, Embedding, EmbeddingConfig},
    prelude::*,
};

use crate::ml::recurrent::{CellType, LayerState, RecurrentStack, RecurrentStackConfig};

#[derive(Config, Debug)]
pub struct EncoderConfig {
    pub cell_type:      CellType,
    pub vocab_size:     usize,
    pub embedding_size: usize,
    pub hidden_size:    usize,
    pub num_layers:     usize,
    pub dropout:        f64,
    pub bidirectional:  bool,
}

impl EncoderConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> Encoder<B> {
        let stack = RecurrentStackConfig::new(
            self.cell_type, self.embedding_size, self.hidden_size, self.num_layers,
        )
        .with_dropout(self.dropout)
        .with_bidirectional(self.bidirectional)
        .init(device);

        Encoder {
            embedding: EmbeddingConfig::new(self.vocab_size, self.embedding_size).init(device),
            dropout:   DropoutConfig::new(self.dropout).init(),
            stack,
        }
    }
}

#[derive(Module, Debug)]
pub struct Encoder<B: Backend> {
    pub embedding: Embedding<B>,
    pub dropout:   Dropout,
    pub stack:     RecurrentStack<B>,
}

impl<B: Backend> Encoder<B> {
    /// source: [batch, src_len] → one folded state [batch, hidden].
    ///
    /// Only the top layer's final state is kept. For a bidirectional
    /// stack the forward and backward final states of that layer are
    /// averaged, so the decoder always sees a single hidden (and, for
    /// LSTM, cell) tensor regardless of directionality.
    pub fn forward(&self, source: Tensor<B, 2, Int>) -> LayerState<B> {
        let [batch, _] = source.dims();
        let device = source.device();

        let embedded = self.dropout.forward(self.embedding.forward(source));
        let mut out  = self.stack.forward(embedded, None);

        let top = out
            .states
            .pop()
            .unwrap_or_else(|| self.stack.zero_state(batch, &device));

        match out.reverse_states.pop() {
            Some(reverse_top) => top.mean(reverse_top),
            None => top,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    fn source() -> Tensor<TestBackend, 2, Int> {
        Tensor::<TestBackend, 1, Int>::from_ints([3, 4, 5, 1, 6, 1, 2, 2], &Default::default())
            .reshape([2, 4])
    }

    #[test]
    fn test_folded_state_shape_for_each_cell() {
        let device = Default::default();
        for cell_type in [CellType::Rnn, CellType::Gru, CellType::Lstm] {
            for bidirectional in [false, true] {
                let encoder = EncoderConfig::new(cell_type, 7, 5, 6, 2, 0.0, bidirectional)
                    .init::<TestBackend>(&device);
                let state = encoder.forward(source());
                assert_eq!(state.hidden.dims(), [2, 6]);
                assert_eq!(state.cell.map(|c| c.dims()), cell_type.has_cell_state().then_some([2, 6]));
            }
        }
    }

    fn flat(t: Tensor<TestBackend, 2>) -> Vec<f32> {
        t.into_data().iter::<f32>().collect()
    }

    fn close(a: &[f32], b: &[f32]) -> bool {
        a.len() == b.len() && a.iter().zip(b).all(|(x, y)| (x - y).abs() < 1e-6)
    }

    #[test]
    fn test_fold_averages_top_layer_directions() {
        let device = Default::default();
        let encoder = EncoderConfig::new(CellType::Lstm, 7, 5, 6, 2, 0.0, true)
            .init::<TestBackend>(&device);

        let out = encoder.stack.forward(encoder.embedding.forward(source()), None);
        let mean_of = |layer: usize| {
            let fwd = &out.states[layer];
            let rev = &out.reverse_states[layer];
            (
                flat((fwd.hidden.clone() + rev.hidden.clone()) / 2.0),
                flat((fwd.cell.clone().unwrap() + rev.cell.clone().unwrap()) / 2.0),
            )
        };
        let (top_hidden, top_cell)   = mean_of(1);
        let (bottom_hidden, _)       = mean_of(0);

        let folded = encoder.forward(source());
        let hidden = flat(folded.hidden);
        assert!(close(&hidden, &top_hidden));
        assert!(close(&flat(folded.cell.unwrap()), &top_cell));
        assert!(!close(&hidden, &bottom_hidden));
    }
}
