// ============================================================
// Layer 3 — SentencePair Domain Type
// ============================================================
// One aligned example from the parallel corpus: a source-language
// sentence and its target-language translation. By the time a
// SentencePair exists, the raw files have already been read and
// split into lines — this type knows nothing about file formats.
//
// Reference: Rust Book §5 (Structs and Methods)

use serde::{Deserialize, Serialize};

/// A single aligned source/target sentence pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentencePair {
    /// The source-language sentence, raw text
    pub source: String,

    /// The target-language reference translation, raw text
    pub target: String,
}

impl SentencePair {
    /// Create a new SentencePair.
    /// Uses impl Into<String> so callers can pass &str or String.
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }
}
