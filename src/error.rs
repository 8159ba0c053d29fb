// ============================================================
// Error Taxonomy
// ============================================================
// Every failure class with a contract of its own gets a named
// variant here so callers can match on it. Anything without a
// recovery story stays an anyhow::Error and propagates.
//
// Reference: Rust Book §9 (Error Handling)

use std::path::PathBuf;
use thiserror::Error;

/// Failure classes the training / translation pipeline can surface.
///
/// Recovery policy per variant:
///   - UnsupportedStrategy  → fatal before training starts
///   - VocabularyLoad       → fatal after the corpus-rebuild fallback
///   - CorruptCheckpoint    → fatal at load time, no partial recovery
///   - BatchTooLarge        → fatal for that call, model state untouched
///   - Interrupted          → checkpoint already forced; terminates run
#[derive(Debug, Error)]
pub enum TranslateError {
    /// Unknown teacher-forcing strategy name at schedule construction.
    #[error("unsupported learning method '{0}' (expected TeacherForcing, ScheduledSampling or MixedSampling)")]
    UnsupportedStrategy(String),

    /// Tokenizer artifact missing or unreadable and the corpus
    /// fallback also failed.
    #[error("cannot load or rebuild vocabulary at '{path}': {reason}")]
    VocabularyLoad { path: PathBuf, reason: String },

    /// Checkpoint file missing required fields or its hyperparameters
    /// disagree with the model being reconstructed.
    #[error("corrupt or incompatible checkpoint: {0}")]
    CorruptCheckpoint(String),

    /// Batch translation called with more sentences than the
    /// configured bound. Checked before any model invocation.
    #[error("batch of {given} sentences exceeds translation bound of {limit}")]
    BatchTooLarge { given: usize, limit: usize },

    /// External interrupt honored at a batch boundary. The trainer
    /// saves a checkpoint first, then returns this.
    #[error("training interrupted at epoch {epoch}, step {step} (checkpoint saved)")]
    Interrupted { epoch: usize, step: usize },
}
