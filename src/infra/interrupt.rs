// ============================================================
// Layer 6 — Interrupt Token
// ============================================================
// Cancellation is explicit, not exceptional: the signal handler
// flips a shared flag and the training loop polls it at batch
// boundaries. In-flight forward/backward work is never preempted;
// the trainer saves a checkpoint and returns Interrupted once the
// current batch finishes.

use anyhow::Result;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

/// Shared cancellation flag. Cheap to clone; all clones observe the
/// same state.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Wire this token to Ctrl-C. The handler only sets the flag;
    /// the training loop decides when to act on it.
    pub fn install_ctrlc_handler(&self) -> Result<()> {
        let token = self.clone();
        ctrlc::set_handler(move || {
            tracing::warn!("Interrupt received — will checkpoint at the next batch boundary");
            token.cancel();
        })?;
        Ok(())
    }
}
