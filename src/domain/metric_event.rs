// ============================================================
// Layer 3 — Metric Events
// ============================================================
// The training loop emits these at fixed step cadences. The sink
// that consumes them is an abstraction (see traits.rs) so the
// trainer never knows whether metrics land in a CSV file, a
// time-series backend, or a test recorder.

/// One observable metric event from a training run.
///
/// All scalars are batch-level (Train) or pass-level averages
/// (Validation). Perplexity may be +inf for very large losses —
/// that is an accepted, observable condition, not an error.
#[derive(Debug, Clone, PartialEq)]
pub enum MetricEvent {
    /// Per-batch training metrics at the train log cadence.
    Train {
        step:       usize,
        loss:       f64,
        accuracy:   f64,
        perplexity: f64,
    },

    /// Aggregated metrics from one full validation pass, plus the
    /// BLEU score of one illustrative translated sentence.
    Validation {
        step:       usize,
        loss:       f64,
        accuracy:   f64,
        perplexity: f64,
        bleu:       f64,
    },
}

impl MetricEvent {
    /// The global step this event was emitted at.
    pub fn step(&self) -> usize {
        match self {
            MetricEvent::Train { step, .. } => *step,
            MetricEvent::Validation { step, .. } => *step,
        }
    }
}
