// ============================================================
// Layer 5 — Recurrent Building Blocks
// ============================================================
// A configurable multi-layer, optionally bidirectional stack of
// recurrent cells, shared by the encoder and the decoder.
//
// Cell types:
//   lstm → burn::nn::Lstm   (hidden + cell state)
//   gru  → burn::nn::Gru    (hidden state)
//   rnn  → Elman cell: h_t = tanh(W_x x_t + W_h h_{t-1} + b),
//          composed from two Burn Linear layers since Burn has
//          no plain RNN module. Autodiff handles its gradients.
//
// Burn's recurrent modules are single-layer and batch-major
// ([batch, seq, features]); stacking, direction reversal and
// inter-layer dropout happen here.

use burn::{
    nn::{
        gru::{Gru, GruConfig},
        lstm::{Lstm, LstmConfig, LstmState},
        Dropout, DropoutConfig, Linear, LinearConfig,
    },
    prelude::*,
    tensor::activation::tanh,
};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum CellType {
    Rnn,
    Gru,
    #[default]
    Lstm,
}

impl CellType {
    /// Only LSTM carries a separate cell state.
    pub fn has_cell_state(self) -> bool {
        matches!(self, CellType::Lstm)
    }
}

impl std::fmt::Display for CellType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            CellType::Rnn  => "RNN",
            CellType::Gru  => "GRU",
            CellType::Lstm => "LSTM",
        };
        f.write_str(name)
    }
}

// ─── Per-layer state ──────────────────────────────────────────────────────────

/// Final (or initial) state of one recurrent layer in one direction.
/// `cell` is only present for LSTM.
#[derive(Debug, Clone)]
pub struct LayerState<B: Backend> {
    pub hidden: Tensor<B, 2>,
    pub cell:   Option<Tensor<B, 2>>,
}

impl<B: Backend> LayerState<B> {
    pub fn zeros(batch: usize, d_hidden: usize, with_cell: bool, device: &B::Device) -> Self {
        let hidden = Tensor::zeros([batch, d_hidden], device);
        let cell   = with_cell.then(|| hidden.clone());
        Self { hidden, cell }
    }

    /// Element-wise mean of two states (used to fold the two
    /// directions of a bidirectional encoder into one).
    pub fn mean(self, other: Self) -> Self {
        let hidden = (self.hidden + other.hidden) / 2.0_f64;
        let cell = match (self.cell, other.cell) {
            (Some(a), Some(b)) => Some((a + b) / 2.0_f64),
            (a, _) => a,
        };
        Self { hidden, cell }
    }
}

// ─── Elman RNN cell ───────────────────────────────────────────────────────────

#[derive(Module, Debug)]
pub struct TanhRnn<B: Backend> {
    input:     Linear<B>,
    recurrent: Linear<B>,
    d_hidden:  usize,
}

impl<B: Backend> TanhRnn<B> {
    pub fn new(d_input: usize, d_hidden: usize, device: &B::Device) -> Self {
        Self {
            input:     LinearConfig::new(d_input, d_hidden).init(device),
            recurrent: LinearConfig::new(d_hidden, d_hidden).with_bias(false).init(device),
            d_hidden,
        }
    }

    /// x: [batch, seq, d_input] → hidden states [batch, seq, d_hidden]
    pub fn forward(&self, x: Tensor<B, 3>, state: Option<Tensor<B, 2>>) -> Tensor<B, 3> {
        let [batch, seq_len, _] = x.dims();
        let mut h = state.unwrap_or_else(|| Tensor::zeros([batch, self.d_hidden], &x.device()));

        // The input projection has no time dependency, do it once.
        let projected = self.input.forward(x);

        let mut steps = Vec::with_capacity(seq_len);
        for t in 0..seq_len {
            let x_t = projected
                .clone()
                .slice([0..batch, t..t + 1, 0..self.d_hidden])
                .reshape([batch, self.d_hidden]);
            h = tanh(x_t + self.recurrent.forward(h));
            steps.push(h.clone());
        }
        Tensor::stack(steps, 1)
    }
}

// ─── One layer, one direction ─────────────────────────────────────────────────

#[derive(Module, Debug)]
pub enum RecurrentCell<B: Backend> {
    Rnn(TanhRnn<B>),
    Gru(Gru<B>),
    Lstm(Lstm<B>),
}

impl<B: Backend> RecurrentCell<B> {
    pub fn new(cell_type: CellType, d_input: usize, d_hidden: usize, device: &B::Device) -> Self {
        match cell_type {
            CellType::Rnn  => Self::Rnn(TanhRnn::new(d_input, d_hidden, device)),
            CellType::Gru  => Self::Gru(GruConfig::new(d_input, d_hidden, true).init(device)),
            CellType::Lstm => Self::Lstm(LstmConfig::new(d_input, d_hidden, true).init(device)),
        }
    }

    /// Run the cell over a whole sequence.
    /// Returns all hidden outputs [batch, seq, d_hidden] and the final state.
    pub fn forward(
        &self,
        x:     Tensor<B, 3>,
        state: Option<LayerState<B>>,
    ) -> (Tensor<B, 3>, LayerState<B>) {
        match self {
            Self::Rnn(rnn) => {
                let out = rnn.forward(x, state.map(|s| s.hidden));
                let hidden = last_step(&out);
                (out, LayerState { hidden, cell: None })
            }
            Self::Gru(gru) => {
                let out = gru.forward(x, state.map(|s| s.hidden));
                let hidden = last_step(&out);
                (out, LayerState { hidden, cell: None })
            }
            Self::Lstm(lstm) => {
                let init = state.map(|s| {
                    let cell = s.cell.unwrap_or_else(|| s.hidden.zeros_like());
                    LstmState::new(cell, s.hidden)
                });
                let (out, last) = lstm.forward(x, init);
                (out, LayerState { hidden: last.hidden, cell: Some(last.cell) })
            }
        }
    }
}

/// [batch, seq, d] → [batch, d] at the last time step.
fn last_step<B: Backend>(out: &Tensor<B, 3>) -> Tensor<B, 2> {
    let [batch, seq_len, d] = out.dims();
    out.clone()
        .slice([0..batch, seq_len - 1..seq_len, 0..d])
        .reshape([batch, d])
}

// ─── Stack ────────────────────────────────────────────────────────────────────

#[derive(Config, Debug)]
pub struct RecurrentStackConfig {
    pub cell_type:  CellType,
    pub d_input:    usize,
    pub d_hidden:   usize,
    pub num_layers: usize,
    #[config(default = 0.0)]
    pub dropout: f64,
    #[config(default = false)]
    pub bidirectional: bool,
}

impl RecurrentStackConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> RecurrentStack<B> {
        assert!(self.num_layers > 0, "a recurrent stack needs at least one layer");

        let directions = if self.bidirectional { 2 } else { 1 };
        let layer_input = |layer: usize| {
            if layer == 0 { self.d_input } else { self.d_hidden * directions }
        };

        let fwd_cells = (0..self.num_layers)
            .map(|l| RecurrentCell::new(self.cell_type, layer_input(l), self.d_hidden, device))
            .collect();
        let bwd_cells = if self.bidirectional {
            (0..self.num_layers)
                .map(|l| RecurrentCell::new(self.cell_type, layer_input(l), self.d_hidden, device))
                .collect()
        } else {
            Vec::new()
        };

        RecurrentStack {
            fwd_cells,
            bwd_cells,
            dropout:   DropoutConfig::new(self.dropout).init(),
            d_hidden:  self.d_hidden,
            with_cell: self.cell_type.has_cell_state(),
        }
    }
}

#[derive(Module, Debug)]
pub struct RecurrentStack<B: Backend> {
    fwd_cells: Vec<RecurrentCell<B>>,
    /// Empty unless bidirectional
    bwd_cells: Vec<RecurrentCell<B>>,
    dropout:   Dropout,
    d_hidden:  usize,
    with_cell: bool,
}

pub struct StackOutput<B: Backend> {
    /// Outputs of the top layer, [batch, seq, d_hidden * directions]
    pub output: Tensor<B, 3>,
    /// Final forward-direction state of every layer, bottom to top
    pub states: Vec<LayerState<B>>,
    /// Final backward-direction state of every layer (empty if unidirectional)
    pub reverse_states: Vec<LayerState<B>>,
}

impl<B: Backend> RecurrentStack<B> {
    pub fn num_layers(&self) -> usize {
        self.fwd_cells.len()
    }

    pub fn is_bidirectional(&self) -> bool {
        !self.bwd_cells.is_empty()
    }

    pub fn zero_state(&self, batch: usize, device: &B::Device) -> LayerState<B> {
        LayerState::zeros(batch, self.d_hidden, self.with_cell, device)
    }

    /// input: [batch, seq, d_input]. `init` seeds the forward direction
    /// of each layer (bottom to top); the backward direction always
    /// starts from zeros.
    pub fn forward(&self, input: Tensor<B, 3>, init: Option<Vec<LayerState<B>>>) -> StackOutput<B> {
        let mut init = init.map(Vec::into_iter);
        let top = self.fwd_cells.len().saturating_sub(1);

        let mut x = input;
        let mut states = Vec::with_capacity(self.fwd_cells.len());
        let mut reverse_states = Vec::with_capacity(self.bwd_cells.len());

        for (layer, cell) in self.fwd_cells.iter().enumerate() {
            let layer_init = init.as_mut().and_then(Iterator::next);

            let out = match self.bwd_cells.get(layer) {
                Some(rev) => {
                    let (fwd_out, fwd_state) = cell.forward(x.clone(), layer_init);
                    let (rev_out, rev_state) = rev.forward(x.flip([1]), None);
                    states.push(fwd_state);
                    reverse_states.push(rev_state);
                    Tensor::cat(vec![fwd_out, rev_out.flip([1])], 2)
                }
                None => {
                    let (fwd_out, fwd_state) = cell.forward(x, layer_init);
                    states.push(fwd_state);
                    fwd_out
                }
            };

            // Dropout between layers only, as in cuDNN-style stacks.
            x = if layer < top { self.dropout.forward(out) } else { out };
        }

        StackOutput { output: x, states, reverse_states }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    fn input(batch: usize, seq: usize, d: usize) -> Tensor<TestBackend, 3> {
        Tensor::ones([batch, seq, d], &Default::default())
    }

    #[test]
    fn test_every_cell_type_keeps_batch_and_seq() {
        let device = Default::default();
        for cell_type in [CellType::Rnn, CellType::Gru, CellType::Lstm] {
            let cell = RecurrentCell::<TestBackend>::new(cell_type, 4, 6, &device);
            let (out, state) = cell.forward(input(3, 5, 4), None);
            assert_eq!(out.dims(), [3, 5, 6], "{cell_type}");
            assert_eq!(state.hidden.dims(), [3, 6], "{cell_type}");
            assert_eq!(state.cell.is_some(), cell_type.has_cell_state(), "{cell_type}");
        }
    }

    #[test]
    fn test_rnn_final_state_is_last_output() {
        let device = Default::default();
        let cell = RecurrentCell::<TestBackend>::new(CellType::Rnn, 2, 3, &device);
        let (out, state) = cell.forward(input(1, 4, 2), None);
        let last: Vec<f32> = out.slice([0..1, 3..4, 0..3]).into_data().iter::<f32>().collect();
        let hidden: Vec<f32> = state.hidden.into_data().iter::<f32>().collect();
        assert_eq!(last, hidden);
    }

    #[test]
    fn test_bidirectional_stack_doubles_features() {
        let device = Default::default();
        let stack = RecurrentStackConfig::new(CellType::Gru, 4, 8, 3)
            .with_bidirectional(true)
            .init::<TestBackend>(&device);
        let out = stack.forward(input(2, 7, 4), None);
        assert_eq!(out.output.dims(), [2, 7, 16]);
        assert_eq!(out.states.len(), 3);
        assert_eq!(out.reverse_states.len(), 3);
        assert!(stack.is_bidirectional());
    }

    #[test]
    fn test_unidirectional_stack_uses_init_state() {
        let device = Default::default();
        let stack = RecurrentStackConfig::new(CellType::Lstm, 4, 5, 2).init::<TestBackend>(&device);
        let init = vec![stack.zero_state(2, &device), stack.zero_state(2, &device)];
        let out = stack.forward(input(2, 1, 4), Some(init));
        assert_eq!(out.output.dims(), [2, 1, 5]);
        assert_eq!(out.states.len(), 2);
        assert!(out.reverse_states.is_empty());
        assert_eq!(stack.num_layers(), 2);
    }

    #[test]
    fn test_mean_folds_two_states() {
        let device = Default::default();
        let a = LayerState::<TestBackend> {
            hidden: Tensor::ones([1, 2], &device),
            cell:   Some(Tensor::zeros([1, 2], &device)),
        };
        let b = LayerState::<TestBackend> {
            hidden: Tensor::ones([1, 2], &device) * 3.0,
            cell:   Some(Tensor::ones([1, 2], &device) * 4.0),
        };
        let m = a.mean(b);
        let h: Vec<f32> = m.hidden.into_data().iter::<f32>().collect();
        let c: Vec<f32> = m.cell.unwrap().into_data().iter::<f32>().collect();
        assert_eq!(h, vec![2.0, 2.0]);
        assert_eq!(c, vec![2.0, 2.0]);
    }
}
