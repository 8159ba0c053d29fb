// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything between raw corpus files and tensor batches:
//
//   parallel text files (one sentence per line, line-aligned)
//       │
//       ▼
//   TextPairLoader       → reads both files, aligns lines
//       │
//       ▼
//   Vocab (Layer 6)      → words to token ids
//       │
//       ▼
//   TranslationDataset   → fixed-length (src, tar_input, tar_output)
//       │                  id triples; implements Burn's Dataset
//       ▼
//   TranslationBatcher   → stacks items into [batch, seq_len] tensors
//       │
//       ▼
//   DataLoader           → feeds batches to the training loop
//
// Reference: Burn Book §4 (Datasets and Dataloaders)

/// Loads line-aligned parallel corpus files
pub mod loader;

/// Fixed-length tokenised examples, Burn Dataset impl
pub mod dataset;

/// Burn Batcher impl producing tensor batches
pub mod batcher;
