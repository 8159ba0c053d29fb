// ============================================================
// Layer 4 — Parallel Corpus Loader
// ============================================================
// Reads a line-aligned pair of text files: line N of the source
// file translates to line N of the target file. Implements the
// ParallelCorpus trait from Layer 3 so the application layer
// never touches file paths directly.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::sentence_pair::SentencePair;
use crate::domain::traits::ParallelCorpus;

/// Loads sentence pairs from two line-aligned text files.
pub struct TextPairLoader {
    src_path: PathBuf,
    tar_path: PathBuf,
}

impl TextPairLoader {
    pub fn new(src_path: impl Into<PathBuf>, tar_path: impl Into<PathBuf>) -> Self {
        Self {
            src_path: src_path.into(),
            tar_path: tar_path.into(),
        }
    }

    fn read_lines(path: &Path) -> Result<Vec<String>> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("cannot read corpus file '{}'", path.display()))?;
        Ok(text.lines().map(|l| l.trim().to_string()).collect())
    }
}

impl ParallelCorpus for TextPairLoader {
    fn load_all(&self) -> Result<Vec<SentencePair>> {
        let src_lines = Self::read_lines(&self.src_path)?;
        let tar_lines = Self::read_lines(&self.tar_path)?;

        // Alignment is by line number; a length mismatch means the
        // tail of the longer file has no counterpart, so it is dropped.
        if src_lines.len() != tar_lines.len() {
            tracing::warn!(
                "corpus line counts differ ({} source, {} target) — truncating to the shorter",
                src_lines.len(),
                tar_lines.len()
            );
        }

        let pairs: Vec<SentencePair> = src_lines
            .into_iter()
            .zip(tar_lines)
            .filter(|(s, t)| !s.is_empty() && !t.is_empty())
            .map(|(s, t)| SentencePair::new(s, t))
            .collect();

        tracing::info!(
            "Loaded {} sentence pairs from '{}' / '{}'",
            pairs.len(),
            self.src_path.display(),
            self.tar_path.display()
        );
        Ok(pairs)
    }
}
