// ============================================================
// Layer 5 — Metric Aggregator
// ============================================================
// Scores one batch of model output against its labels:
//
//   loss       cross-entropy over [B*T, V] logits vs [B*T] targets,
//              pad positions masked out of the contribution
//   perplexity exp(loss) — may overflow to +inf for large losses,
//              which is an accepted observable condition
//   accuracy   fraction of non-pad positions where argmax(logits)
//              equals the target id
//
// A batch whose targets are all padding has no defined accuracy;
// it is reported as 0.0 with the `degenerate` flag set and the run
// continues.
//
// Reference: Burn Book §5 (Loss Functions)

use burn::{nn::loss::CrossEntropyLossConfig, prelude::*};

// ─── BatchScore ───────────────────────────────────────────────────────────────
/// Scores for one batch. Keeps the loss as a tensor so the trainer
/// can still backpropagate through it; everything else is a scalar.
#[derive(Debug)]
pub struct BatchScore<B: Backend> {
    /// Differentiable loss, shape [1]
    pub loss: Tensor<B, 1>,

    /// loss as a plain scalar, for logging and aggregation
    pub loss_value: f64,

    /// Token-level accuracy over non-pad positions
    pub accuracy: f64,

    /// exp(loss)
    pub perplexity: f64,

    /// True when the batch had zero non-pad target positions
    pub degenerate: bool,
}

/// Score one batch of logits [B, T, V] against targets [B, T].
pub fn score<B: Backend>(
    logits:  Tensor<B, 3>,
    targets: Tensor<B, 2, Int>,
    pad_id:  u32,
) -> BatchScore<B> {
    let [batch, seq_len, vocab] = logits.dims();
    let flat_logits = logits.reshape([batch * seq_len, vocab]);
    let flat_targets = targets.reshape([batch * seq_len]);

    // Cross-entropy with pad positions excluded from the loss
    let criterion = CrossEntropyLossConfig::new()
        .with_pad_tokens(Some(vec![pad_id as usize]))
        .init(&flat_logits.device());
    let loss = criterion.forward(flat_logits.clone(), flat_targets.clone());

    let loss_value: f64 = loss.clone().into_scalar().elem::<f64>();
    let perplexity = loss_value.exp();

    // Accuracy: argmax == target, counted over non-pad positions only
    let predictions = flat_logits.argmax(1).reshape([batch * seq_len]);
    let non_pad = flat_targets.clone().equal_elem(pad_id as i32).bool_not();
    let total: i64 = non_pad.clone().int().sum().into_scalar().elem::<i64>();

    let (accuracy, degenerate) = if total == 0 {
        (0.0, true)
    } else {
        let correct: i64 = (predictions.equal(flat_targets).int() * non_pad.int())
            .sum()
            .into_scalar()
            .elem::<i64>();
        (correct as f64 / total as f64, false)
    };

    BatchScore { loss, loss_value, accuracy, perplexity, degenerate }
}

// ─── RunningMetrics ───────────────────────────────────────────────────────────
/// Accumulates batch-level scalars across one evaluation pass and
/// finalises them into simple arithmetic means. Batch scalars are
/// averaged unweighted by batch size — the historical behavior this
/// system preserves for comparable metric curves.
#[derive(Debug, Default)]
pub struct RunningMetrics {
    total_loss:       f64,
    total_accuracy:   f64,
    total_perplexity: f64,
    count:            usize,
}

impl RunningMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, loss: f64, accuracy: f64, perplexity: f64) {
        self.total_loss += loss;
        self.total_accuracy += accuracy;
        self.total_perplexity += perplexity;
        self.count += 1;
    }

    /// Averages over the recorded batches. An empty pass yields zeros.
    pub fn finish(self) -> (f64, f64, f64) {
        if self.count == 0 {
            return (0.0, 0.0, 0.0);
        }
        let n = self.count as f64;
        (
            self.total_loss / n,
            self.total_accuracy / n,
            self.total_perplexity / n,
        )
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    type TestBackend = burn::backend::NdArray;

    const PAD: u32 = 0;

    fn device() -> <TestBackend as Backend>::Device {
        Default::default()
    }

    /// Logits that put weight 10 on `ids[b][t]` and 0 elsewhere.
    fn one_hot_logits(ids: &[&[u32]], vocab: usize) -> Tensor<TestBackend, 3> {
        let batch = ids.len();
        let seq_len = ids[0].len();
        let mut flat = vec![0.0f32; batch * seq_len * vocab];
        for (b, row) in ids.iter().enumerate() {
            for (t, &id) in row.iter().enumerate() {
                flat[(b * seq_len + t) * vocab + id as usize] = 10.0;
            }
        }
        Tensor::<TestBackend, 1>::from_floats(flat.as_slice(), &device())
            .reshape([batch, seq_len, vocab])
    }

    fn target_tensor(ids: &[&[u32]]) -> Tensor<TestBackend, 2, Int> {
        let batch = ids.len();
        let seq_len = ids[0].len();
        let flat: Vec<i32> = ids.iter().flat_map(|r| r.iter().map(|&x| x as i32)).collect();
        Tensor::<TestBackend, 1, Int>::from_ints(flat.as_slice(), &device())
            .reshape([batch, seq_len])
    }

    #[test]
    fn perfect_predictions_give_accuracy_one() {
        let targets: &[&[u32]] = &[&[4, 3, PAD], &[2, PAD, PAD]];
        let s = score(one_hot_logits(targets, 5), target_tensor(targets), PAD);
        assert!((s.accuracy - 1.0).abs() < 1e-9);
        assert!(!s.degenerate);
        assert!(s.loss_value.is_finite());
    }

    #[test]
    fn wrong_predictions_give_accuracy_zero() {
        let predicted: &[&[u32]] = &[&[1, 1, 1]];
        let targets: &[&[u32]] = &[&[4, 3, 2]];
        let s = score(one_hot_logits(predicted, 5), target_tensor(targets), PAD);
        assert_eq!(s.accuracy, 0.0);
        assert!(!s.degenerate);
    }

    #[test]
    fn pad_positions_do_not_count_toward_accuracy() {
        // correct on the one real position, wrong on the pads
        let predicted: &[&[u32]] = &[&[4, 1, 1]];
        let targets: &[&[u32]] = &[&[4, PAD, PAD]];
        let s = score(one_hot_logits(predicted, 5), target_tensor(targets), PAD);
        assert!((s.accuracy - 1.0).abs() < 1e-9);
    }

    #[test]
    fn all_pad_batch_is_degenerate_not_a_crash() {
        let predicted: &[&[u32]] = &[&[1, 2]];
        let targets: &[&[u32]] = &[&[PAD, PAD]];
        let s = score(one_hot_logits(predicted, 5), target_tensor(targets), PAD);
        assert_eq!(s.accuracy, 0.0);
        assert!(s.degenerate);
    }

    #[test]
    fn accuracy_is_invariant_to_batch_row_order() {
        let a: &[&[u32]] = &[&[4, 3], &[2, 1]];
        let b: &[&[u32]] = &[&[2, 1], &[4, 3]];
        // predictions correct on first row only, in both orderings
        let pred_a: &[&[u32]] = &[&[4, 3], &[3, 4]];
        let pred_b: &[&[u32]] = &[&[3, 4], &[4, 3]];
        let s1 = score(one_hot_logits(pred_a, 5), target_tensor(a), PAD);
        let s2 = score(one_hot_logits(pred_b, 5), target_tensor(b), PAD);
        assert!((s1.accuracy - s2.accuracy).abs() < 1e-9);
        assert!((s1.accuracy - 0.5).abs() < 1e-9);
    }

    #[test]
    fn accuracy_is_sensitive_to_within_sequence_token_order() {
        // the same set of predicted tokens, aligned vs swapped in
        // place — accuracy is positional, so only alignment counts
        let targets: &[&[u32]] = &[&[4, 3]];
        let aligned: &[&[u32]] = &[&[4, 3]];
        let swapped: &[&[u32]] = &[&[3, 4]];

        let s_aligned = score(one_hot_logits(aligned, 5), target_tensor(targets), PAD);
        let s_swapped = score(one_hot_logits(swapped, 5), target_tensor(targets), PAD);
        assert!((s_aligned.accuracy - 1.0).abs() < 1e-9);
        assert_eq!(s_swapped.accuracy, 0.0);
    }

    #[test]
    fn perplexity_is_exp_of_loss() {
        let targets: &[&[u32]] = &[&[4, 3]];
        let s = score(one_hot_logits(targets, 5), target_tensor(targets), PAD);
        assert!((s.perplexity - s.loss_value.exp()).abs() < 1e-9);
    }

    #[test]
    fn running_metrics_average_unweighted() {
        let mut running = RunningMetrics::new();
        running.record(2.0, 0.5, 7.0);
        running.record(4.0, 1.0, 9.0);
        let (loss, acc, ppl) = running.finish();
        assert!((loss - 3.0).abs() < 1e-12);
        assert!((acc - 0.75).abs() < 1e-12);
        assert!((ppl - 8.0).abs() < 1e-12);
    }

    #[test]
    fn empty_pass_finishes_to_zeros() {
        assert_eq!(RunningMetrics::new().finish(), (0.0, 0.0, 0.0));
    }
}
