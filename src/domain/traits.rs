// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// By programming against traits instead of concrete types the
// orchestration layers can swap implementations without change:
//   - TextPairLoader implements ParallelCorpus
//   - CsvMetricSink implements MetricSink
//   - tests implement MetricSink with an in-memory recorder
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use anyhow::Result;

use crate::domain::metric_event::MetricEvent;
use crate::domain::sentence_pair::SentencePair;

// ─── ParallelCorpus ───────────────────────────────────────────────────────────
/// Any component that can yield aligned sentence pairs.
///
/// Implementations:
///   - TextPairLoader → line-aligned source/target text files
pub trait ParallelCorpus {
    /// Load all available sentence pairs from this source.
    fn load_all(&self) -> Result<Vec<SentencePair>>;
}

// ─── MetricSink ───────────────────────────────────────────────────────────────
/// Any component that can record metric events from a training run.
///
/// Implementations:
///   - CsvMetricSink → appends rows to metrics.csv
///   - (tests) RecordingSink → collects events in a Vec
pub trait MetricSink {
    /// Record one metric event. Sinks should be cheap — the trainer
    /// calls this inline between batches.
    fn record(&mut self, event: &MetricEvent) -> Result<()>;
}

/// A sink that drops every event. Useful for tests and for running
/// the trainer without a metrics file.
pub struct NullMetricSink;

impl MetricSink for NullMetricSink {
    fn record(&mut self, _event: &MetricEvent) -> Result<()> {
        Ok(())
    }
}
