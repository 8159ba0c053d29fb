// ============================================================
// Layer 5 — Recurrent Encoder-Decoder Model
// ============================================================
// A GRU-based seq2seq translation model built from Burn modules.
// The GRU cell is assembled from two Linear gate projections so
// the decoder can be driven one step at a time — the training
// loop needs per-step control to mix ground-truth tokens with the
// model's own predictions (teacher forcing).
//
//   Encoder  embeds the source and folds it into one final hidden
//            state per layer
//   Decoder  starts from the encoder state and emits one vocab
//            distribution per step
//   Seq2Seq  runs the full decode loop under a teacher-forcing rate
//
// Reference: Cho et al. (2014) — GRU encoder-decoder
//            Burn Book §3 (Modules)

use burn::{
    nn::{Embedding, EmbeddingConfig, Linear, LinearConfig},
    prelude::*,
    tensor::activation::sigmoid,
};
use rand::Rng;
use serde::{Deserialize, Serialize};

// ─── RnnSpec ──────────────────────────────────────────────────────────────────
/// Architecture hyperparameters for one side of the model. This is
/// the dictionary persisted inside every checkpoint, so it must
/// stay serde-compatible and comparable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RnnSpec {
    /// Vocabulary size (number of embedding rows)
    pub embedding_size: usize,
    /// Embedding vector width
    pub embedding_dim: usize,
    /// Padding token id
    pub pad_id: usize,
    /// Hidden state width of each GRU layer
    pub rnn_dim: usize,
    /// Whether the hidden gate projections carry a bias
    pub rnn_bias: bool,
    /// Number of stacked GRU layers
    pub n_layers: usize,
}

impl RnnSpec {
    pub fn init_encoder<B: Backend>(&self, device: &B::Device) -> Encoder<B> {
        Encoder {
            embedding: EmbeddingConfig::new(self.embedding_size, self.embedding_dim)
                .init(device),
            cells:   self.build_cells(device),
            rnn_dim: self.rnn_dim,
        }
    }

    pub fn init_decoder<B: Backend>(&self, device: &B::Device) -> Decoder<B> {
        Decoder {
            embedding: EmbeddingConfig::new(self.embedding_size, self.embedding_dim)
                .init(device),
            cells:      self.build_cells(device),
            projection: LinearConfig::new(self.rnn_dim, self.embedding_size).init(device),
            rnn_dim:    self.rnn_dim,
        }
    }

    fn build_cells<B: Backend>(&self, device: &B::Device) -> Vec<GruCell<B>> {
        (0..self.n_layers)
            .map(|layer| {
                let d_in = if layer == 0 { self.embedding_dim } else { self.rnn_dim };
                GruCell::new(d_in, self.rnn_dim, self.rnn_bias, device)
            })
            .collect()
    }
}

// ─── GruCell ──────────────────────────────────────────────────────────────────
/// One GRU cell: both gate projections emit the reset, update and
/// candidate pre-activations concatenated along the feature axis.
#[derive(Module, Debug)]
pub struct GruCell<B: Backend> {
    input_gates:  Linear<B>,
    hidden_gates: Linear<B>,
    d_hidden:     usize,
}

impl<B: Backend> GruCell<B> {
    pub fn new(d_input: usize, d_hidden: usize, bias: bool, device: &B::Device) -> Self {
        Self {
            input_gates: LinearConfig::new(d_input, 3 * d_hidden).init(device),
            hidden_gates: LinearConfig::new(d_hidden, 3 * d_hidden)
                .with_bias(bias)
                .init(device),
            d_hidden,
        }
    }

    /// x: [batch, d_input], h: [batch, d_hidden] → [batch, d_hidden]
    pub fn forward(&self, x: Tensor<B, 2>, h: Tensor<B, 2>) -> Tensor<B, 2> {
        let [batch, _] = x.dims();
        let d = self.d_hidden;

        let gx = self.input_gates.forward(x);
        let gh = self.hidden_gates.forward(h.clone());

        let rx = gx.clone().slice([0..batch, 0..d]);
        let zx = gx.clone().slice([0..batch, d..2 * d]);
        let nx = gx.slice([0..batch, 2 * d..3 * d]);

        let rh = gh.clone().slice([0..batch, 0..d]);
        let zh = gh.clone().slice([0..batch, d..2 * d]);
        let nh = gh.slice([0..batch, 2 * d..3 * d]);

        let r = sigmoid(rx + rh);
        let z = sigmoid(zx + zh);
        let n = (nx + r * nh).tanh();

        // h' = (1 - z) * n + z * h
        (z.ones_like() - z.clone()) * n + z * h
    }
}

// ─── Encoder ──────────────────────────────────────────────────────────────────
#[derive(Module, Debug)]
pub struct Encoder<B: Backend> {
    embedding: Embedding<B>,
    cells:     Vec<GruCell<B>>,
    rnn_dim:   usize,
}

impl<B: Backend> Encoder<B> {
    /// src: [batch, seq_len] → final hidden state per layer,
    /// each [batch, rnn_dim].
    pub fn forward(&self, src: Tensor<B, 2, Int>) -> Vec<Tensor<B, 2>> {
        let [batch, seq_len] = src.dims();
        let embedded = self.embedding.forward(src); // [B, T, E]
        let [_, _, emb_dim] = embedded.dims();
        let device = embedded.device();

        let mut hidden: Vec<Tensor<B, 2>> = (0..self.cells.len())
            .map(|_| Tensor::zeros([batch, self.rnn_dim], &device))
            .collect();

        for t in 0..seq_len {
            let mut x = embedded
                .clone()
                .slice([0..batch, t..t + 1, 0..emb_dim])
                .reshape([batch, emb_dim]);
            for (layer, cell) in self.cells.iter().enumerate() {
                let h = cell.forward(x, hidden[layer].clone());
                hidden[layer] = h.clone();
                x = h;
            }
        }
        hidden
    }
}

// ─── Decoder ──────────────────────────────────────────────────────────────────
#[derive(Module, Debug)]
pub struct Decoder<B: Backend> {
    embedding:  Embedding<B>,
    cells:      Vec<GruCell<B>>,
    projection: Linear<B>,
    rnn_dim:    usize,
}

/// Mutable per-sequence decoding state: one hidden tensor per layer.
/// Cloneable so beam search can branch hypotheses.
#[derive(Debug, Clone)]
pub struct DecoderState<B: Backend> {
    hidden: Vec<Tensor<B, 2>>,
}

impl<B: Backend> Decoder<B> {
    /// Seed the decoder state from the encoder's final hidden states.
    /// Layers beyond what the encoder provides start from zeros.
    pub fn init_state(
        &self,
        encoder_hidden: Vec<Tensor<B, 2>>,
        batch: usize,
        device: &B::Device,
    ) -> DecoderState<B> {
        let hidden = (0..self.cells.len())
            .map(|layer| {
                encoder_hidden
                    .get(layer)
                    .cloned()
                    .unwrap_or_else(|| Tensor::zeros([batch, self.rnn_dim], device))
            })
            .collect();
        DecoderState { hidden }
    }

    /// One decoding step. tokens: [batch] → logits [batch, vocab].
    /// The state advances in place.
    pub fn step(&self, tokens: Tensor<B, 1, Int>, state: &mut DecoderState<B>) -> Tensor<B, 2> {
        let [batch] = tokens.dims();
        let embedded = self.embedding.forward(tokens.reshape([batch, 1])); // [B, 1, E]
        let [_, _, emb_dim] = embedded.dims();
        let mut x = embedded.reshape([batch, emb_dim]);

        for (layer, cell) in self.cells.iter().enumerate() {
            let h = cell.forward(x, state.hidden[layer].clone());
            state.hidden[layer] = h.clone();
            x = h;
        }
        self.projection.forward(x)
    }
}

// ─── Seq2Seq ──────────────────────────────────────────────────────────────────
#[derive(Module, Debug)]
pub struct Seq2Seq<B: Backend> {
    pub encoder: Encoder<B>,
    pub decoder: Decoder<B>,
    seq_len: usize,
}

/// Uniform result of a model forward pass. Attention-equipped
/// variants fill `attention` with [batch, tar_len, src_len]
/// weights; the plain RNN model reports None.
#[derive(Debug)]
pub struct Seq2SeqOutput<B: Backend> {
    pub logits:    Tensor<B, 3>,
    pub attention: Option<Tensor<B, 3>>,
}

impl<B: Backend> Seq2Seq<B> {
    pub fn new(encoder: Encoder<B>, decoder: Decoder<B>, seq_len: usize) -> Self {
        Self { encoder, decoder, seq_len }
    }

    pub fn seq_len(&self) -> usize {
        self.seq_len
    }

    /// Full forward pass over a batch.
    ///
    /// At each step the decoder is fed the ground-truth previous
    /// token with probability `teacher_forcing_rate`, otherwise its
    /// own argmax prediction. Rate 1.0 is full forcing; rate 0.0 is
    /// the generation regime.
    pub fn forward(
        &self,
        src:                  Tensor<B, 2, Int>,
        tar_input:            Tensor<B, 2, Int>,
        teacher_forcing_rate: f64,
        rng:                  &mut impl Rng,
    ) -> Seq2SeqOutput<B> {
        let [batch, tar_len] = tar_input.dims();
        let device = src.device();

        let encoder_hidden = self.encoder.forward(src);
        let mut state = self.decoder.init_state(encoder_hidden, batch, &device);

        let mut steps: Vec<Tensor<B, 2>> = Vec::with_capacity(tar_len);
        // the first decoder input is always the sequence-start column
        let mut input = column(&tar_input, 0);

        for t in 0..tar_len {
            let logits_t = self.decoder.step(input.clone(), &mut state);
            if t + 1 < tar_len {
                let force = rng.gen::<f64>() < teacher_forcing_rate;
                input = if force {
                    column(&tar_input, t + 1)
                } else {
                    logits_t.clone().argmax(1).reshape([batch])
                };
            }
            steps.push(logits_t);
        }

        Seq2SeqOutput {
            logits:    Tensor::stack::<3>(steps, 1),
            attention: None,
        }
    }
}

/// Extract column `index` of a [batch, seq_len] Int tensor as [batch].
fn column<B: Backend>(tensor: &Tensor<B, 2, Int>, index: usize) -> Tensor<B, 1, Int> {
    let [batch, _] = tensor.dims();
    tensor
        .clone()
        .slice([0..batch, index..index + 1])
        .reshape([batch])
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    type TestBackend = burn::backend::NdArray;

    fn spec(vocab: usize) -> RnnSpec {
        RnnSpec {
            embedding_size: vocab,
            embedding_dim:  8,
            pad_id:         0,
            rnn_dim:        12,
            rnn_bias:       true,
            n_layers:       2,
        }
    }

    fn int_tensor(rows: &[&[i32]]) -> Tensor<TestBackend, 2, Int> {
        let batch = rows.len();
        let seq = rows[0].len();
        let flat: Vec<i32> = rows.iter().flat_map(|r| r.iter().copied()).collect();
        Tensor::<TestBackend, 1, Int>::from_ints(flat.as_slice(), &Default::default())
            .reshape([batch, seq])
    }

    #[test]
    fn forward_produces_batch_by_time_by_vocab_logits() {
        let device = Default::default();
        let spec = spec(10);
        let model = Seq2Seq::new(
            spec.init_encoder::<TestBackend>(&device),
            spec.init_decoder::<TestBackend>(&device),
            4,
        );

        let src = int_tensor(&[&[4, 5, 0, 0], &[6, 0, 0, 0]]);
        let tar = int_tensor(&[&[1, 7, 8, 0], &[1, 9, 0, 0]]);

        let mut rng = StdRng::seed_from_u64(7);
        let out = model.forward(src, tar, 1.0, &mut rng);
        assert_eq!(out.logits.dims(), [2, 4, 10]);
        assert!(out.attention.is_none());
    }

    #[test]
    fn generation_regime_runs_without_ground_truth() {
        let device = Default::default();
        let spec = spec(10);
        let model = Seq2Seq::new(
            spec.init_encoder::<TestBackend>(&device),
            spec.init_decoder::<TestBackend>(&device),
            4,
        );

        // tar_input carries only the <s> bootstrap; rate 0.0 means the
        // decoder consumes its own predictions for every later step
        let src = int_tensor(&[&[4, 5, 6, 0]]);
        let tar = int_tensor(&[&[1, 0, 0, 0]]);

        let mut rng = StdRng::seed_from_u64(7);
        let out = model.forward(src, tar, 0.0, &mut rng);
        assert_eq!(out.logits.dims(), [1, 4, 10]);
    }

    #[test]
    fn decoder_step_advances_state() {
        let device = Default::default();
        let spec = spec(10);
        let encoder = spec.init_encoder::<TestBackend>(&device);
        let decoder = spec.init_decoder::<TestBackend>(&device);

        let src = int_tensor(&[&[4, 5, 6, 0]]);
        let hidden = encoder.forward(src);
        assert_eq!(hidden.len(), 2);
        assert_eq!(hidden[0].dims(), [1, 12]);

        let mut state = decoder.init_state(hidden, 1, &device);
        let bos = Tensor::<TestBackend, 1, Int>::from_ints([1], &device);
        let logits = decoder.step(bos, &mut state);
        assert_eq!(logits.dims(), [1, 10]);
    }
}
