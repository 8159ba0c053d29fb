// ============================================================
// Layer 5 — Translator (Inference Driver)
// ============================================================
// Rebuilds a trained model from a checkpoint and decodes new
// sentences in the generation regime: the decoder never sees
// ground truth, only its own previous token.
//
// Loading sequence:
//   1. resolve the step (explicit, or latest_step.json)
//   2. read the checkpoint metadata
//   3. reject it if its embedding sizes disagree with the loaded
//      vocabularies
//   4. rebuild the architecture from the stored RnnSpecs and
//      restore the weights
//
// Decoding is greedy for beam width 1, otherwise a standard beam
// search over decoder states (DecoderState is Clone so hypotheses
// can branch). Both stop at </s> or after seq_len tokens — an
// overlong input is truncated, never rejected.

use anyhow::Result;
use burn::{prelude::*, tensor::activation::log_softmax};
use rand::{rngs::StdRng, SeedableRng};

use crate::error::TranslateError;
use crate::infra::checkpoint::CheckpointManager;
use crate::infra::vocab::Vocab;
use crate::ml::bleu::n_gram_precision;
use crate::ml::model::{DecoderState, Seq2Seq};

/// Hard bound on the number of sentences one batch call may carry.
pub const BATCH_LIMIT: usize = 100;

#[derive(Debug)]
pub struct Translator<B: Backend> {
    model:      Seq2Seq<B>,
    src_vocab:  Vocab,
    tar_vocab:  Vocab,
    beam_width: usize,
    device:     B::Device,
}

impl<B: Backend> Translator<B> {
    /// Restore a translator from a saved checkpoint. `step` of None
    /// resolves to the most recent save point.
    pub fn load(
        manager:    &CheckpointManager,
        step:       Option<usize>,
        src_vocab:  Vocab,
        tar_vocab:  Vocab,
        beam_width: usize,
        device:     B::Device,
    ) -> Result<Self> {
        let step = match step {
            Some(step) => step,
            None => manager.latest_step()?,
        };
        let meta = manager.load_meta(step)?;
        meta.ensure_compatible(src_vocab.size(), tar_vocab.size())?;

        let model = Seq2Seq::new(
            meta.encoder_parameter.init_encoder(&device),
            meta.decoder_parameter.init_decoder(&device),
            meta.seq_len,
        );
        let model = manager.load_model(model, step, &device)?;
        tracing::info!("Translator restored from checkpoint step {step}");

        Ok(Self { model, src_vocab, tar_vocab, beam_width: beam_width.max(1), device })
    }

    /// Translate one sentence. Inputs longer than the model's
    /// sequence length are truncated.
    pub fn translate(&self, sentence: &str) -> Result<String> {
        let seq_len = self.model.seq_len();
        let mut ids = self.src_vocab.encode(sentence)?;
        ids.truncate(seq_len);
        let ids = crate::data::dataset::pad_or_truncate(ids, seq_len, self.src_vocab.pad_id());

        let flat: Vec<i32> = ids.iter().map(|&id| id as i32).collect();
        let src = Tensor::<B, 1, Int>::from_ints(flat.as_slice(), &self.device)
            .reshape([1, seq_len]);

        let encoder_hidden = self.model.encoder.forward(src);
        let state = self.model.decoder.init_state(encoder_hidden, 1, &self.device);

        let tokens = if self.beam_width == 1 {
            self.decode_greedy(state, seq_len)?
        } else {
            self.decode_beam(state, seq_len)?
        };
        Ok(self.tar_vocab.decode_sequence(&tokens))
    }

    /// Translate up to BATCH_LIMIT sentences. The bound is checked
    /// before the model is touched, so an oversized batch changes
    /// nothing. Greedy decoding stacks the whole batch into one
    /// forward pass; beam search decodes sentence by sentence.
    pub fn translate_batch(&self, sentences: &[String]) -> Result<Vec<String>> {
        if sentences.len() > BATCH_LIMIT {
            return Err(TranslateError::BatchTooLarge {
                given: sentences.len(),
                limit: BATCH_LIMIT,
            }
            .into());
        }
        if sentences.is_empty() {
            return Ok(Vec::new());
        }
        if self.beam_width > 1 {
            return sentences.iter().map(|s| self.translate(s)).collect();
        }

        let seq_len = self.model.seq_len();
        let batch = sentences.len();

        let mut src_flat = Vec::with_capacity(batch * seq_len);
        for sentence in sentences {
            let ids = crate::data::dataset::pad_or_truncate(
                self.src_vocab.encode(sentence)?,
                seq_len,
                self.src_vocab.pad_id(),
            );
            src_flat.extend(ids.into_iter().map(|id| id as i32));
        }
        let src = Tensor::<B, 1, Int>::from_ints(src_flat.as_slice(), &self.device)
            .reshape([batch, seq_len]);

        // decoder input: only the <s> bootstrap column is ever read
        // at rate 0.0, the rest stays padding
        let mut tar_flat = vec![self.tar_vocab.pad_id() as i32; batch * seq_len];
        for row in 0..batch {
            tar_flat[row * seq_len] = self.tar_vocab.bos_id() as i32;
        }
        let tar = Tensor::<B, 1, Int>::from_ints(tar_flat.as_slice(), &self.device)
            .reshape([batch, seq_len]);

        // rate 0.0 never selects ground truth, so the draw is inert
        let mut rng = StdRng::seed_from_u64(0);
        let output = self.model.forward(src, tar, 0.0, &mut rng);

        let predicted: Vec<u32> = output
            .logits
            .argmax(2)
            .reshape([batch * seq_len])
            .into_data()
            .convert::<i64>()
            .to_vec::<i64>()
            .map_err(|e| anyhow::anyhow!("cannot read predictions back from device: {e:?}"))?
            .into_iter()
            .map(|id| id as u32)
            .collect();

        Ok(predicted
            .chunks(seq_len)
            .map(|row| self.tar_vocab.decode_sequence(row))
            .collect())
    }

    /// Translate one sentence and score it against a reference
    /// translation with BLEU.
    pub fn evaluate(&self, sentence: &str, reference: &str) -> Result<(String, f64)> {
        let predicted = self.translate(sentence)?;
        let bleu = n_gram_precision(&predicted, reference);
        Ok((predicted, bleu))
    }

    // ─── Decoding strategies ──────────────────────────────────────────────────

    fn decode_greedy(&self, mut state: DecoderState<B>, seq_len: usize) -> Result<Vec<u32>> {
        let mut tokens = Vec::with_capacity(seq_len);
        let mut input = self.tar_vocab.bos_id();

        for _ in 0..seq_len {
            let logits = self.step_one(input, &mut state);
            let next = logits
                .argmax(1)
                .reshape([1])
                .into_scalar()
                .elem::<i64>() as u32;
            tokens.push(next);
            if next == self.tar_vocab.eos_id() {
                break;
            }
            input = next;
        }
        Ok(tokens)
    }

    fn decode_beam(&self, state: DecoderState<B>, seq_len: usize) -> Result<Vec<u32>> {
        struct Hypothesis<B: Backend> {
            tokens:   Vec<u32>,
            score:    f64,
            state:    DecoderState<B>,
            finished: bool,
        }

        let eos = self.tar_vocab.eos_id();
        let mut beam = vec![Hypothesis {
            tokens:   Vec::new(),
            score:    0.0,
            state,
            finished: false,
        }];

        for _ in 0..seq_len {
            let mut candidates: Vec<Hypothesis<B>> = Vec::new();

            for hyp in beam {
                if hyp.finished {
                    candidates.push(hyp);
                    continue;
                }
                let input = hyp.tokens.last().copied().unwrap_or(self.tar_vocab.bos_id());
                let mut state = hyp.state.clone();
                let logits = self.step_one(input, &mut state);
                let log_probs = tensor_to_vec(log_softmax(logits, 1))?;

                // best beam_width continuations of this hypothesis
                let mut ranked: Vec<(usize, f32)> =
                    log_probs.into_iter().enumerate().collect();
                ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
                for (id, log_prob) in ranked.into_iter().take(self.beam_width) {
                    let id = id as u32;
                    let mut tokens = hyp.tokens.clone();
                    tokens.push(id);
                    candidates.push(Hypothesis {
                        tokens,
                        score: hyp.score + log_prob as f64,
                        state: state.clone(),
                        finished: id == eos,
                    });
                }
            }

            candidates.sort_by(|a, b| b.score.total_cmp(&a.score));
            candidates.truncate(self.beam_width);
            let all_finished = candidates.iter().all(|h| h.finished);
            beam = candidates;
            if all_finished {
                break;
            }
        }

        Ok(beam.into_iter().next().map(|h| h.tokens).unwrap_or_default())
    }

    /// One decoder step for a single token id.
    fn step_one(&self, token: u32, state: &mut DecoderState<B>) -> Tensor<B, 2> {
        let input = Tensor::<B, 1, Int>::from_ints([token as i32], &self.device);
        self.model.decoder.step(input, state)
    }
}

/// Read a [1, vocab] tensor back into a plain Vec.
fn tensor_to_vec<B: Backend>(tensor: Tensor<B, 2>) -> Result<Vec<f32>> {
    let [_, vocab] = tensor.dims();
    tensor
        .reshape([vocab])
        .into_data()
        .convert::<f32>()
        .to_vec::<f32>()
        .map_err(|e| anyhow::anyhow!("cannot read logits back from device: {e:?}"))
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::checkpoint::CheckpointMeta;
    use crate::ml::model::RnnSpec;
    use burn::optim::{AdamConfig, Optimizer};

    type TestBackend = burn::backend::NdArray;
    type TestAutodiff = burn::backend::Autodiff<TestBackend>;

    fn spec(vocab: usize) -> RnnSpec {
        RnnSpec {
            embedding_size: vocab,
            embedding_dim:  4,
            pad_id:         0,
            rnn_dim:        6,
            rnn_bias:       true,
            n_layers:       1,
        }
    }

    fn vocabs() -> (Vocab, Vocab) {
        let src = Vocab::from_words(["hallo", "welt"]).unwrap();
        let tar = Vocab::from_words(["hello", "world"]).unwrap();
        (src, tar)
    }

    /// Save an untrained toy model at the given step and return the
    /// manager pointing at it.
    fn saved_checkpoint(dir: &std::path::Path, step: usize) -> CheckpointManager {
        let device = Default::default();
        let (src, tar) = vocabs();
        let model = Seq2Seq::<TestAutodiff>::new(
            spec(src.size()).init_encoder(&device),
            spec(tar.size()).init_decoder(&device),
            5,
        );
        let optim = AdamConfig::new().init::<TestAutodiff, Seq2Seq<TestAutodiff>>();
        let manager = CheckpointManager::new(dir);
        let meta = CheckpointMeta {
            epoch:   0,
            steps:   step,
            seq_len: 5,
            encoder_parameter: spec(src.size()),
            decoder_parameter: spec(tar.size()),
        };
        manager.save(&model, optim.to_record(), &meta).unwrap();
        manager
    }

    #[test]
    fn overlong_input_truncates_instead_of_failing() {
        let dir = tempfile::tempdir().unwrap();
        let manager = saved_checkpoint(dir.path(), 0);
        let (src, tar) = vocabs();
        let translator =
            Translator::<TestBackend>::load(&manager, None, src, tar, 1, Default::default())
                .unwrap();

        // 8 words against seq_len 5
        let result = translator.translate("hallo welt hallo welt hallo welt hallo welt");
        assert!(result.is_ok());
    }

    #[test]
    fn greedy_output_is_deterministic() {
        let dir = tempfile::tempdir().unwrap();
        let manager = saved_checkpoint(dir.path(), 0);
        let (src, tar) = vocabs();
        let translator =
            Translator::<TestBackend>::load(&manager, None, src, tar, 1, Default::default())
                .unwrap();

        let a = translator.translate("hallo welt").unwrap();
        let b = translator.translate("hallo welt").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn beam_search_returns_a_translation() {
        let dir = tempfile::tempdir().unwrap();
        let manager = saved_checkpoint(dir.path(), 0);
        let (src, tar) = vocabs();
        let translator =
            Translator::<TestBackend>::load(&manager, None, src, tar, 3, Default::default())
                .unwrap();

        // never more words than the model's sequence length
        let out = translator.translate("hallo welt").unwrap();
        assert!(out.split_whitespace().count() <= 5);
    }

    #[test]
    fn oversized_batch_is_rejected_before_decoding() {
        let dir = tempfile::tempdir().unwrap();
        let manager = saved_checkpoint(dir.path(), 0);
        let (src, tar) = vocabs();
        let translator =
            Translator::<TestBackend>::load(&manager, None, src, tar, 1, Default::default())
                .unwrap();

        let sentences: Vec<String> = (0..BATCH_LIMIT + 1).map(|_| "hallo".to_string()).collect();
        let err = translator.translate_batch(&sentences).unwrap_err();
        match err.downcast_ref::<TranslateError>() {
            Some(TranslateError::BatchTooLarge { given, limit }) => {
                assert_eq!(*given, BATCH_LIMIT + 1);
                assert_eq!(*limit, BATCH_LIMIT);
            }
            other => panic!("expected BatchTooLarge, got {other:?}"),
        }

        // a batch at the bound is fine
        let ok: Vec<String> = (0..3).map(|_| "hallo".to_string()).collect();
        assert_eq!(translator.translate_batch(&ok).unwrap().len(), 3);
    }

    #[test]
    fn batched_decoding_matches_single_sentence_decoding() {
        let dir = tempfile::tempdir().unwrap();
        let manager = saved_checkpoint(dir.path(), 0);
        let (src, tar) = vocabs();
        let translator =
            Translator::<TestBackend>::load(&manager, None, src, tar, 1, Default::default())
                .unwrap();

        let sentences = vec![
            "hallo welt".to_string(),
            "welt".to_string(),
            "hallo hallo welt hallo welt hallo".to_string(), // truncates
        ];
        let batched = translator.translate_batch(&sentences).unwrap();
        assert_eq!(batched.len(), sentences.len());
        for (sentence, from_batch) in sentences.iter().zip(&batched) {
            assert_eq!(&translator.translate(sentence).unwrap(), from_batch);
        }

        assert!(translator.translate_batch(&[]).unwrap().is_empty());
    }

    #[test]
    fn vocabulary_mismatch_is_rejected_at_load_time() {
        let dir = tempfile::tempdir().unwrap();
        let manager = saved_checkpoint(dir.path(), 0);
        // a bigger vocabulary than the checkpoint was trained with
        let wrong = Vocab::from_words(["a", "b", "c", "d", "e", "f"]).unwrap();
        let (_, tar) = vocabs();

        let err = Translator::<TestBackend>::load(
            &manager,
            None,
            wrong,
            tar,
            1,
            Default::default(),
        )
        .unwrap_err();
        match err.downcast_ref::<TranslateError>() {
            Some(TranslateError::CorruptCheckpoint(_)) => {}
            other => panic!("expected CorruptCheckpoint, got {other:?}"),
        }
    }

    #[test]
    fn missing_step_resolves_to_latest() {
        let dir = tempfile::tempdir().unwrap();
        saved_checkpoint(dir.path(), 3);
        let manager = saved_checkpoint(dir.path(), 9);
        let (src, tar) = vocabs();
        // load(None) must pick step 9; both exist, so success proves
        // the pointer was followed
        assert_eq!(manager.latest_step().unwrap(), 9);
        let translator =
            Translator::<TestBackend>::load(&manager, None, src, tar, 1, Default::default());
        assert!(translator.is_ok());
    }

    #[test]
    fn evaluate_scores_against_the_reference() {
        let dir = tempfile::tempdir().unwrap();
        let manager = saved_checkpoint(dir.path(), 0);
        let (src, tar) = vocabs();
        let translator =
            Translator::<TestBackend>::load(&manager, None, src, tar, 1, Default::default())
                .unwrap();

        let (predicted, bleu) = translator.evaluate("hallo welt", "hello world").unwrap();
        assert!((0.0..=1.0).contains(&bleu));
        // an untrained model still yields a well-formed (possibly
        // empty) decoded string
        let _ = predicted;
    }
}
