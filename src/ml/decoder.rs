use burn::{
    nn::{Dropout, DropoutConfig, Embedding, EmbeddingConfig, Linear, LinearConfig},
    prelude::*,
};

use crate::ml::recurrent::{CellType, LayerState, RecurrentStack, RecurrentStackConfig};

#[derive(Config, Debug)]
pub struct DecoderConfig {
    pub cell_type:      CellType,
    pub vocab_size:     usize,
    pub embedding_size: usize,
    pub hidden_size:    usize,
    pub num_layers:     usize,
    pub dropout:        f64,
}

impl DecoderConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> Decoder<B> {
        let stack = RecurrentStackConfig::new(
            self.cell_type, self.embedding_size, self.hidden_size, self.num_layers,
        )
        .with_dropout(self.dropout)
        .init(device);

        Decoder {
            embedding:  EmbeddingConfig::new(self.vocab_size, self.embedding_size).init(device),
            dropout:    DropoutConfig::new(self.dropout).init(),
            stack,
            projection: LinearConfig::new(self.hidden_size, self.vocab_size).init(device),
            vocab_size: self.vocab_size,
        }
    }
}

/// Generates one target character per call.
#[derive(Module, Debug)]
pub struct Decoder<B: Backend> {
    pub embedding:  Embedding<B>,
    pub dropout:    Dropout,
    pub stack:      RecurrentStack<B>,
    pub projection: Linear<B>,
    pub vocab_size: usize,
}

impl<B: Backend> Decoder<B> {
    /// Seed every decoder layer with the encoder's folded state.
    pub fn initial_state(&self, context: LayerState<B>) -> Vec<LayerState<B>> {
        vec![context; self.stack.num_layers()]
    }

    /// token: [batch] previous character → logits [batch, vocab] and the
    /// updated per-layer state.
    pub fn step(
        &self,
        token: Tensor<B, 1, Int>,
        state: Vec<LayerState<B>>,
    ) -> (Tensor<B, 2>, Vec<LayerState<B>>) {
        let [batch] = token.dims();

        let embedded = self.dropout.forward(self.embedding.forward(token.reshape([batch, 1])));
        let out      = self.stack.forward(embedded, Some(state));

        let [_, _, hidden] = out.output.dims();
        let logits = self.projection.forward(out.output.reshape([batch, hidden]));
        (logits, out.states)
    }
}
