// ============================================================
// Layer 6 — Infrastructure
// ============================================================
// Everything that touches the outside world on behalf of the
// upper layers:
//
//   vocab        tokenizer artifacts (load / rebuild / save)
//   checkpoint   durable model + optimizer + metadata records
//   metrics_log  metrics.csv sink
//   interrupt    Ctrl-C → cancellation token
//
// Nothing in this layer knows about training semantics; it only
// persists and restores what it is given.

/// Source/target vocabularies as tokenizer JSON artifacts
pub mod vocab;

/// Checkpoint save / restore, keyed by global step
pub mod checkpoint;

/// CSV metric sink
pub mod metrics_log;

/// Cancellation token wired to Ctrl-C
pub mod interrupt;
